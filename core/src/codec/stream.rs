//! Incremental codec over serde tokens.
//!
//! Field values are pulled with `deserialize_any` so that a value of the wrong JSON type is
//! still consumed in full: a type mismatch fails the record that holds it, while the stream
//! stays positioned for the next record. Only structural problems surface as serde errors.

use std::fmt;
use std::io;
use std::marker::PhantomData;

use serde::de;
use serde::de::DeserializeSeed;
use serde::de::IgnoredAny;
use serde::de::MapAccess;
use serde::de::SeqAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serializer;
use serde_json::Value;

use super::field_table::coerce_bool;
use super::field_table::coerce_int;
use super::field_table::coerce_long;
use super::field_table::coerce_status;
use super::field_table::coerce_str;
use super::field_table::mismatch;
use super::field_table::store;
use super::field_table::Nested;
use super::field_table::Scalar;
use super::BatchResult;
use super::DecodeError;
use super::Field;
use super::NullPolicy;
use super::Record;
use super::Slot;
use crate::ledger::Asset;
use crate::ledger::BoxStatusInfo;
use crate::ledger::Registers;

pub(crate) fn decode_str_into<T: Record>(
    target: &mut T,
    json: &str,
    policy: NullPolicy,
) -> Result<(), DecodeError> {
    let mut de = serde_json::Deserializer::from_str(json);
    RecordSeed { target, policy }.deserialize(&mut de)??;
    de.end()?;
    Ok(())
}

pub(crate) fn decode_reader_into<T: Record, R: io::Read>(
    target: &mut T,
    reader: R,
    policy: NullPolicy,
) -> Result<(), DecodeError> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    RecordSeed { target, policy }.deserialize(&mut de)??;
    de.end()?;
    Ok(())
}

pub(crate) fn decode_batch<'de, T: Record, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BatchResult<T>, D::Error> {
    deserializer.deserialize_any(BatchVisitor {
        allow_envelope: true,
        marker: PhantomData,
    })
}

/// `Deserialize` entry point for entities; record-level errors become `D::Error`.
pub fn deserialize_record<'de, T: Record, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<T, D::Error> {
    FreshSeed::<T>(PhantomData)
        .deserialize(deserializer)?
        .map_err(de::Error::custom)
}

/// `Serialize` entry point for entities, mirroring [`super::tree::encode`].
pub fn serialize_record<T: Record, S: Serializer>(
    record: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let emitted: Vec<&Field<T>> = T::fields()
        .iter()
        .filter(|f| f.is_emitted(record))
        .collect();
    let mut map = serializer.serialize_map(Some(emitted.len()))?;
    for field in emitted {
        match &field.slot {
            Slot::Str(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::OptStr(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Long(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Int(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Bool(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Status(get, _) => map.serialize_entry(field.name, get(record).as_str())?,
            Slot::Opaque(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Assets(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Registers(get, _) => map.serialize_entry(field.name, get(record))?,
            Slot::Statuses(get, _) => map.serialize_entry(field.name, get(record))?,
        }
    }
    map.end()
}

/// Reports a type mismatch for every scalar token. For visitors whose `Value` is
/// `Result<_, DecodeError>` and that provide `fn mismatch(&self, found) -> DecodeError`.
macro_rules! mismatch_on_scalars {
    () => {
        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(Err(self.mismatch("boolean")))
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(Err(self.mismatch("number")))
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(Err(self.mismatch("number")))
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(Err(self.mismatch("number")))
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(Err(self.mismatch("string")))
        }
    };
}

fn drain_seq<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<(), A::Error> {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(())
}

fn drain_map<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(())
}

/// Decodes one record object onto `target`, then runs [`Record::finish`].
pub(crate) struct RecordSeed<'a, T> {
    pub target: &'a mut T,
    pub policy: NullPolicy,
}

impl<'de, 'a, T: Record> DeserializeSeed<'de> for RecordSeed<'a, T> {
    type Value = Result<(), DecodeError>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(RecordVisitor {
            target: self.target,
            policy: self.policy,
        })
    }
}

struct RecordVisitor<'a, T> {
    target: &'a mut T,
    policy: NullPolicy,
}

impl<'a, T: Record> RecordVisitor<'a, T> {
    fn mismatch(&self, found: &'static str) -> DecodeError {
        mismatch(T::ENTITY, "(record)", "object", found)
    }
}

impl<'de, 'a, T: Record> Visitor<'de> for RecordVisitor<'a, T> {
    type Value = Result<(), DecodeError>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a {} object", T::ENTITY)
    }

    mismatch_on_scalars!();

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Err(self.mismatch("null")))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        drain_seq(seq)?;
        Ok(Err(self.mismatch("array")))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let RecordVisitor { target, policy } = self;
        // values of the fields as they were before this object, for repeated keys
        let mut before = T::default();
        // fields in first-seen order, with the outcome of their latest occurrence
        let mut seen: Vec<(&'static str, Option<DecodeError>)> = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            let field = match T::field(&name) {
                Some(field) => field,
                None => {
                    log::trace!("{}: skipping unknown field `{}`", T::ENTITY, name);
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            // a repeated key replaces the earlier occurrence, as it does in a parsed document
            let at = match seen.iter().position(|(seen_name, _)| *seen_name == field.name) {
                Some(at) => {
                    field.copy(target, &before);
                    at
                }
                None => {
                    field.copy(&mut before, target);
                    seen.push((field.name, None));
                    seen.len() - 1
                }
            };
            let seed = SlotSeed {
                field,
                target: &mut *target,
                policy,
            };
            seen[at].1 = map.next_value_seed(seed)?.err();
        }
        Ok(match seen.into_iter().find_map(|(_, outcome)| outcome) {
            Some(e) => Err(e),
            None => target.finish(),
        })
    }
}

/// Decodes a record into a fresh default value.
struct FreshSeed<T>(PhantomData<T>);

impl<'de, T: Record> DeserializeSeed<'de> for FreshSeed<T> {
    type Value = Result<T, DecodeError>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let mut record = T::default();
        let outcome = RecordSeed {
            target: &mut record,
            policy: NullPolicy::KeepCurrent,
        }
        .deserialize(deserializer)?;
        Ok(outcome.map(|()| record))
    }
}

/// Decodes the value of one known field and stores it on the record.
struct SlotSeed<'a, T: 'static> {
    field: &'static Field<T>,
    target: &'a mut T,
    policy: NullPolicy,
}

impl<'de, 'a, T: Record> DeserializeSeed<'de> for SlotSeed<'a, T> {
    type Value = Result<(), DecodeError>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let SlotSeed {
            field,
            target,
            policy,
        } = self;
        let (entity, name) = (T::ENTITY, field.name);
        let stored = match &field.slot {
            Slot::Str(_, get_mut) => coerce_str(entity, name, scalar(deserializer)?)
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::OptStr(_, get_mut) => coerce_str(entity, name, scalar(deserializer)?)
                .map(|v| store(target, *get_mut, v.map(Some), policy)),
            Slot::Long(_, get_mut) => coerce_long(entity, name, scalar(deserializer)?)
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::Int(_, get_mut) => coerce_int(entity, name, scalar(deserializer)?)
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::Bool(_, get_mut) => coerce_bool(entity, name, scalar(deserializer)?)
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::Status(_, get_mut) => coerce_status(entity, name, scalar(deserializer)?)
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::Opaque(_, get_mut) => {
                let raw = Value::deserialize(deserializer)?;
                let v = if raw.is_null() { None } else { Some(Some(raw)) };
                store(target, *get_mut, v, policy);
                Ok(())
            }
            Slot::Assets(_, get_mut) => deserializer
                .deserialize_any(NestedVisitor::<Vec<Asset>, Asset>::new(entity, name))?
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::Registers(_, get_mut) => deserializer
                .deserialize_any(NestedVisitor::<Registers, _>::new(entity, name))?
                .map(|v| store(target, *get_mut, v, policy)),
            Slot::Statuses(_, get_mut) => deserializer
                .deserialize_any(NestedVisitor::<Vec<BoxStatusInfo>, BoxStatusInfo>::new(
                    entity, name,
                ))?
                .map(|v| store(target, *get_mut, v, policy)),
        };
        Ok(stored)
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scalar, D::Error> {
    deserializer.deserialize_any(ScalarVisitor)
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        // same split as `serde_json::Number::as_i64`
        Ok(i64::try_from(v).map_or(Scalar::UInt(v), Scalar::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar::Str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Scalar, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Scalar, A::Error> {
        drain_seq(seq)?;
        Ok(Scalar::Array)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Scalar, A::Error> {
        drain_map(map)?;
        Ok(Scalar::Object)
    }
}

/// Decodes a sequence or a name-keyed map of nested records. `null` yields `Ok(None)`.
struct NestedVisitor<C, N> {
    entity: &'static str,
    field: &'static str,
    marker: PhantomData<(C, N)>,
}

impl<C: Nested<N>, N: Record> NestedVisitor<C, N> {
    fn new(entity: &'static str, field: &'static str) -> Self {
        NestedVisitor {
            entity,
            field,
            marker: PhantomData,
        }
    }

    fn mismatch(&self, found: &'static str) -> DecodeError {
        mismatch(self.entity, self.field, C::shape(), found)
    }
}

impl<'de, C: Nested<N>, N: Record> Visitor<'de> for NestedVisitor<C, N> {
    type Value = Result<Option<C>, DecodeError>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an {} of {} records", C::shape(), N::ENTITY)
    }

    mismatch_on_scalars!();

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Ok(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        if C::KEYED {
            drain_seq(seq)?;
            return Ok(Err(self.mismatch("array")));
        }
        let mut items = C::default();
        let mut first_error = None;
        while let Some(item) = seq.next_element_seed(FreshSeed::<N>(PhantomData))? {
            match item {
                Ok(item) => items.put(String::new(), item),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Ok(first_error.map_or(Ok(Some(items)), Err))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        if !C::KEYED {
            drain_map(map)?;
            return Ok(Err(self.mismatch("object")));
        }
        let mut items = C::default();
        // keys in first-seen order, with the outcome of their latest occurrence
        let mut seen: Vec<(String, Option<DecodeError>)> = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let outcome = match map.next_value_seed(FreshSeed::<N>(PhantomData))? {
                Ok(item) => {
                    items.put(key.clone(), item);
                    None
                }
                Err(e) => Some(e),
            };
            match seen.iter_mut().find(|(seen_key, _)| *seen_key == key) {
                Some(entry) => entry.1 = outcome,
                None => seen.push((key, outcome)),
            }
        }
        Ok(match seen.into_iter().find_map(|(_, outcome)| outcome) {
            Some(e) => Err(e),
            None => Ok(Some(items)),
        })
    }
}

/// A batch is an array of records, optionally wrapped in an explorer page object.
struct BatchVisitor<T> {
    allow_envelope: bool,
    marker: PhantomData<T>,
}

impl<'de, T: Record> DeserializeSeed<'de> for BatchVisitor<T> {
    type Value = BatchResult<T>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, T: Record> Visitor<'de> for BatchVisitor<T> {
    type Value = BatchResult<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.allow_envelope {
            write!(f, "an array of {0} records or a page object with {0} items", T::ENTITY)
        } else {
            write!(f, "an array of {} records", T::ENTITY)
        }
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut batch = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(outcome) = seq.next_element_seed(FreshSeed::<T>(PhantomData))? {
            batch.push(outcome);
        }
        Ok(batch)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        if !self.allow_envelope {
            return Err(de::Error::invalid_type(de::Unexpected::Map, &self));
        }
        let mut batch = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "items" && batch.is_none() {
                batch = Some(map.next_value_seed(BatchVisitor::<T> {
                    allow_envelope: false,
                    marker: PhantomData,
                })?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        batch.ok_or_else(|| de::Error::missing_field("items"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LedgerCodec;
    use crate::ledger::ErgoBox;
    use pretty_assertions::assert_eq;

    #[test]
    fn mismatched_value_is_consumed_and_the_record_fails() {
        let json = r#"[
            { "boxId": "a", "assets": { "tokenId": "t" }, "value": 3 },
            { "boxId": "b", "additionalRegisters": { "R4": 5 } },
            { "boxId": "c" }
        ]"#;
        let batch: BatchResult<ErgoBox> = crate::codec::decode_batch_stream(json).unwrap();
        assert_eq!(
            batch[0].as_ref().unwrap_err(),
            &mismatch("box", "assets", "array", "object")
        );
        assert_eq!(
            batch[1].as_ref().unwrap_err(),
            &mismatch("register", "(record)", "object", "number")
        );
        assert_eq!(batch[2].as_ref().unwrap().box_id, "c");
    }

    #[test]
    fn null_keeps_current_value_on_fresh_decode_too() {
        let b = ErgoBox::decode_stream(
            r#"{ "boxId": "a", "value": null, "mainChain": null, "assets": null }"#,
        )
        .unwrap();
        assert_eq!(b.value, -1);
        assert!(b.main_chain);
        assert!(b.assets.is_empty());
    }

    #[test]
    fn large_unsigned_numbers_are_rejected_for_signed_fields() {
        let err = ErgoBox::decode_stream(r#"{ "boxId": "a", "value": 18446744073709551615 }"#)
            .unwrap_err();
        assert_eq!(err, mismatch("box", "value", "64-bit integer", "number"));
    }

    #[test]
    fn envelope_without_items_is_malformed() {
        assert!(matches!(
            crate::codec::decode_batch_stream::<ErgoBox>(r#"{ "total": 3 }"#),
            Err(DecodeError::MalformedStream(_))
        ));
        assert!(matches!(
            crate::codec::decode_batch_stream::<ErgoBox>(r#"{ "items": { "items": [] } }"#),
            Err(DecodeError::MalformedStream(_))
        ));
    }
}
