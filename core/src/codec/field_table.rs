//! The field-assignment table shared by both decode paths and both encoders.

use std::collections::BTreeMap;
use std::mem;

use serde_json::Value;

use super::DecodeError;
use crate::ledger::Asset;
use crate::ledger::BoxStatus;
use crate::ledger::BoxStatusInfo;
use crate::ledger::Registers;

/// What a decode path does with an explicit `null` field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// `null` behaves like an absent field of a fresh record: the field takes its default.
    ResetToDefault,
    /// `null` leaves the field as it currently is.
    KeepCurrent,
}

/// When an encoder writes a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Always,
    /// Only optional values that are set.
    WhenSet,
    /// Only numbers that are not the `-1` "unknown" sentinel (or any other negative).
    WhenNonNegative,
    /// Only collections with at least one entry.
    WhenNonEmpty,
}

/// Typed location of a field on its record, as a getter/setter pair.
pub enum Slot<T> {
    Str(fn(&T) -> &String, fn(&mut T) -> &mut String),
    OptStr(fn(&T) -> &Option<String>, fn(&mut T) -> &mut Option<String>),
    Long(fn(&T) -> &i64, fn(&mut T) -> &mut i64),
    Int(fn(&T) -> &i32, fn(&mut T) -> &mut i32),
    Bool(fn(&T) -> &bool, fn(&mut T) -> &mut bool),
    Status(fn(&T) -> &BoxStatus, fn(&mut T) -> &mut BoxStatus),
    /// Any JSON value, carried without interpretation.
    Opaque(fn(&T) -> &Option<Value>, fn(&mut T) -> &mut Option<Value>),
    Assets(fn(&T) -> &Vec<Asset>, fn(&mut T) -> &mut Vec<Asset>),
    Registers(fn(&T) -> &Registers, fn(&mut T) -> &mut Registers),
    Statuses(
        fn(&T) -> &Vec<BoxStatusInfo>,
        fn(&mut T) -> &mut Vec<BoxStatusInfo>,
    ),
}

pub struct Field<T> {
    /// Wire name.
    pub name: &'static str,
    pub slot: Slot<T>,
    pub emit: Emit,
}

impl<T> Field<T> {
    pub fn is_emitted(&self, record: &T) -> bool {
        match &self.slot {
            Slot::OptStr(get, _) => self.emit != Emit::WhenSet || get(record).is_some(),
            Slot::Opaque(get, _) => self.emit != Emit::WhenSet || get(record).is_some(),
            Slot::Long(get, _) => self.emit != Emit::WhenNonNegative || *get(record) >= 0,
            Slot::Int(get, _) => self.emit != Emit::WhenNonNegative || *get(record) >= 0,
            Slot::Assets(get, _) => self.emit != Emit::WhenNonEmpty || !get(record).is_empty(),
            Slot::Registers(get, _) => self.emit != Emit::WhenNonEmpty || !get(record).is_empty(),
            Slot::Statuses(get, _) => self.emit != Emit::WhenNonEmpty || !get(record).is_empty(),
            Slot::Str(..) | Slot::Bool(..) | Slot::Status(..) => true,
        }
    }

    /// Copies this field's value from `source` onto `target`.
    pub(crate) fn copy(&self, target: &mut T, source: &T) {
        match &self.slot {
            Slot::Str(get, get_mut) => *get_mut(target) = get(source).clone(),
            Slot::OptStr(get, get_mut) => *get_mut(target) = get(source).clone(),
            Slot::Long(get, get_mut) => *get_mut(target) = *get(source),
            Slot::Int(get, get_mut) => *get_mut(target) = *get(source),
            Slot::Bool(get, get_mut) => *get_mut(target) = *get(source),
            Slot::Status(get, get_mut) => *get_mut(target) = get(source).clone(),
            Slot::Opaque(get, get_mut) => *get_mut(target) = get(source).clone(),
            Slot::Assets(get, get_mut) => *get_mut(target) = get(source).clone(),
            Slot::Registers(get, get_mut) => *get_mut(target) = get(source).clone(),
            Slot::Statuses(get, get_mut) => *get_mut(target) = get(source).clone(),
        }
    }
}

/// An entity with a wire representation described by a field table.
pub trait Record: Default + Sized + 'static {
    /// Name used in error messages, e.g. "box" or "asset".
    const ENTITY: &'static str;

    fn fields() -> &'static [Field<Self>];

    /// Runs once every field of a document has been assigned: checks identity fields and
    /// normalizes values.
    fn finish(&mut self) -> Result<(), DecodeError>;

    fn field(name: &str) -> Option<&'static Field<Self>> {
        Self::fields().iter().find(|f| f.name == name)
    }
}

/// Builds a [`Field`] entry for `$record.$member`.
macro_rules! field {
    ($record:ty, $name:literal, $slot:ident, $member:ident, $emit:ident) => {
        $crate::codec::Field {
            name: $name,
            slot: $crate::codec::Slot::$slot(
                |r: &$record| &r.$member,
                |r: &mut $record| &mut r.$member,
            ),
            emit: $crate::codec::Emit::$emit,
        }
    };
}

pub(crate) use field;

/// A single JSON value as seen by the coercion layer. Containers are only recorded as such,
/// they never coerce to a scalar field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Array,
    Object,
}

impl Scalar {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Int(_) | Scalar::UInt(_) | Scalar::Float(_) => "number",
            Scalar::Str(_) => "string",
            Scalar::Array => "array",
            Scalar::Object => "object",
        }
    }
}

impl From<&Value> for Scalar {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Scalar::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Scalar::UInt(u)
                } else {
                    Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Scalar::Str(s.clone()),
            Value::Array(_) => Scalar::Array,
            Value::Object(_) => Scalar::Object,
        }
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn mismatch(
    entity: &'static str,
    field: &'static str,
    expected: &'static str,
    found: &'static str,
) -> DecodeError {
    DecodeError::TypeMismatch {
        entity,
        field,
        expected,
        found,
    }
}

pub(crate) fn coerce_str(
    entity: &'static str,
    field: &'static str,
    value: Scalar,
) -> Result<Option<String>, DecodeError> {
    match value {
        Scalar::Null => Ok(None),
        Scalar::Str(s) => Ok(Some(s)),
        other => Err(mismatch(entity, field, "string", other.kind())),
    }
}

pub(crate) fn coerce_long(
    entity: &'static str,
    field: &'static str,
    value: Scalar,
) -> Result<Option<i64>, DecodeError> {
    match value {
        Scalar::Null => Ok(None),
        Scalar::Int(i) => Ok(Some(i)),
        Scalar::UInt(u) => i64::try_from(u)
            .map(Some)
            .map_err(|_| mismatch(entity, field, "64-bit integer", "number")),
        other => Err(mismatch(entity, field, "integer", other.kind())),
    }
}

pub(crate) fn coerce_int(
    entity: &'static str,
    field: &'static str,
    value: Scalar,
) -> Result<Option<i32>, DecodeError> {
    let out_of_range = |_| mismatch(entity, field, "32-bit integer", "number");
    match value {
        Scalar::Null => Ok(None),
        Scalar::Int(i) => i32::try_from(i).map(Some).map_err(out_of_range),
        Scalar::UInt(u) => i32::try_from(u).map(Some).map_err(out_of_range),
        other => Err(mismatch(entity, field, "integer", other.kind())),
    }
}

pub(crate) fn coerce_bool(
    entity: &'static str,
    field: &'static str,
    value: Scalar,
) -> Result<Option<bool>, DecodeError> {
    match value {
        Scalar::Null => Ok(None),
        Scalar::Bool(b) => Ok(Some(b)),
        other => Err(mismatch(entity, field, "boolean", other.kind())),
    }
}

pub(crate) fn coerce_status(
    entity: &'static str,
    field: &'static str,
    value: Scalar,
) -> Result<Option<BoxStatus>, DecodeError> {
    Ok(coerce_str(entity, field, value)?.map(BoxStatus::from))
}

/// Writes a decoded field value. `None` stands for a `null` on the wire.
pub(crate) fn store<T: Default, X: Default>(
    target: &mut T,
    get_mut: fn(&mut T) -> &mut X,
    value: Option<X>,
    policy: NullPolicy,
) {
    match (value, policy) {
        (Some(v), _) => *get_mut(target) = v,
        (None, NullPolicy::KeepCurrent) => {}
        (None, NullPolicy::ResetToDefault) => {
            let mut fresh = T::default();
            *get_mut(target) = mem::take(get_mut(&mut fresh));
        }
    }
}

/// A collection of nested records: a sequence, or a map keyed by name.
pub(crate) trait Nested<N>: Default {
    const KEYED: bool;

    fn put(&mut self, key: String, item: N);

    fn shape() -> &'static str {
        if Self::KEYED {
            "object"
        } else {
            "array"
        }
    }
}

impl<N> Nested<N> for Vec<N> {
    const KEYED: bool = false;

    fn put(&mut self, _key: String, item: N) {
        self.push(item);
    }
}

impl<N> Nested<N> for BTreeMap<String, N> {
    const KEYED: bool = true;

    fn put(&mut self, key: String, item: N) {
        self.insert(key, item);
    }
}
