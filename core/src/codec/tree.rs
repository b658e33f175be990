//! Whole-document codec over `serde_json::Value`.

use serde_json::Map;
use serde_json::Value;

use super::field_table::coerce_bool;
use super::field_table::coerce_int;
use super::field_table::coerce_long;
use super::field_table::coerce_status;
use super::field_table::coerce_str;
use super::field_table::kind_of;
use super::field_table::mismatch;
use super::field_table::store;
use super::field_table::Nested;
use super::field_table::Scalar;
use super::DecodeError;
use super::Field;
use super::NullPolicy;
use super::Record;
use super::Slot;
use crate::ledger::Asset;
use crate::ledger::BoxStatusInfo;
use crate::ledger::Register;

pub fn decode_record<T: Record>(value: &Value) -> Result<T, DecodeError> {
    let mut record = T::default();
    decode_into(&mut record, value, NullPolicy::ResetToDefault)?;
    Ok(record)
}

/// Assigns every known field of `value` onto `target`, then runs [`Record::finish`].
/// Unknown fields are skipped. On error `target` may be partially updated.
pub fn decode_into<T: Record>(
    target: &mut T,
    value: &Value,
    policy: NullPolicy,
) -> Result<(), DecodeError> {
    let object = value
        .as_object()
        .ok_or_else(|| mismatch(T::ENTITY, "(record)", "object", kind_of(value)))?;
    for (name, raw) in object {
        match T::field(name) {
            Some(field) => assign(target, field, raw, policy)?,
            None => log::trace!("{}: skipping unknown field `{}`", T::ENTITY, name),
        }
    }
    target.finish()
}

fn assign<T: Record>(
    target: &mut T,
    field: &Field<T>,
    raw: &Value,
    policy: NullPolicy,
) -> Result<(), DecodeError> {
    let (entity, name) = (T::ENTITY, field.name);
    match &field.slot {
        Slot::Str(_, get_mut) => {
            let v = coerce_str(entity, name, raw.into())?;
            store(target, *get_mut, v, policy);
        }
        Slot::OptStr(_, get_mut) => {
            let v = coerce_str(entity, name, raw.into())?;
            store(target, *get_mut, v.map(Some), policy);
        }
        Slot::Long(_, get_mut) => {
            let v = coerce_long(entity, name, raw.into())?;
            store(target, *get_mut, v, policy);
        }
        Slot::Int(_, get_mut) => {
            let v = coerce_int(entity, name, raw.into())?;
            store(target, *get_mut, v, policy);
        }
        Slot::Bool(_, get_mut) => {
            let v = coerce_bool(entity, name, raw.into())?;
            store(target, *get_mut, v, policy);
        }
        Slot::Status(_, get_mut) => {
            let v = coerce_status(entity, name, Scalar::from(raw))?;
            store(target, *get_mut, v, policy);
        }
        Slot::Opaque(_, get_mut) => {
            let v = if raw.is_null() {
                None
            } else {
                Some(Some(raw.clone()))
            };
            store(target, *get_mut, v, policy);
        }
        Slot::Assets(_, get_mut) => {
            let v = decode_nested::<Vec<Asset>, Asset>(entity, name, raw)?;
            store(target, *get_mut, v, policy);
        }
        Slot::Registers(_, get_mut) => {
            let v = decode_nested::<_, Register>(entity, name, raw)?;
            store(target, *get_mut, v, policy);
        }
        Slot::Statuses(_, get_mut) => {
            let v = decode_nested::<Vec<BoxStatusInfo>, BoxStatusInfo>(entity, name, raw)?;
            store(target, *get_mut, v, policy);
        }
    }
    Ok(())
}

fn decode_nested<C: Nested<N>, N: Record>(
    entity: &'static str,
    field: &'static str,
    raw: &Value,
) -> Result<Option<C>, DecodeError> {
    let mut items = C::default();
    match raw {
        Value::Null => return Ok(None),
        Value::Array(values) if !C::KEYED => {
            for value in values {
                items.put(String::new(), decode_record(value)?);
            }
        }
        Value::Object(values) if C::KEYED => {
            for (key, value) in values {
                items.put(key.clone(), decode_record(value)?);
            }
        }
        other => return Err(mismatch(entity, field, C::shape(), kind_of(other))),
    }
    Ok(Some(items))
}

/// Builds the document for `record`, writing only the fields its table says to emit.
pub fn encode<T: Record>(record: &T) -> Value {
    let mut object = Map::new();
    for field in T::fields().iter().filter(|f| f.is_emitted(record)) {
        object.insert(field.name.to_owned(), encode_slot(&field.slot, record));
    }
    Value::Object(object)
}

fn encode_slot<T>(slot: &Slot<T>, record: &T) -> Value {
    match slot {
        Slot::Str(get, _) => Value::from(get(record).as_str()),
        Slot::OptStr(get, _) => get(record)
            .as_deref()
            .map_or(Value::Null, Value::from),
        Slot::Long(get, _) => Value::from(*get(record)),
        Slot::Int(get, _) => Value::from(*get(record)),
        Slot::Bool(get, _) => Value::Bool(*get(record)),
        Slot::Status(get, _) => Value::from(get(record).as_str()),
        Slot::Opaque(get, _) => get(record).clone().unwrap_or(Value::Null),
        Slot::Assets(get, _) => Value::Array(get(record).iter().map(encode).collect()),
        Slot::Registers(get, _) => Value::Object(
            get(record)
                .iter()
                .map(|(name, register)| (name.clone(), encode(register)))
                .collect(),
        ),
        Slot::Statuses(get, _) => Value::Array(get(record).iter().map(encode).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ErgoBox;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fields_may_arrive_in_any_order() {
        let a = json!({ "boxId": "b", "value": 10, "index": 2, "mainChain": false });
        let b = json!({ "mainChain": false, "index": 2, "value": 10, "boxId": "b" });
        assert_eq!(
            decode_record::<ErgoBox>(&a).unwrap(),
            decode_record::<ErgoBox>(&b).unwrap()
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let b: ErgoBox = decode_record(&json!({
            "boxId": "b",
            "inclusionHeight": 800000,
            "extension": { "anything": [1, 2, 3] },
        }))
        .unwrap();
        assert_eq!(b.box_id, "b");
    }

    #[test]
    fn record_must_be_an_object() {
        assert_eq!(
            decode_record::<ErgoBox>(&json!(["b"])).unwrap_err(),
            mismatch("box", "(record)", "object", "array")
        );
    }

    #[test]
    fn registers_must_be_an_object() {
        assert_eq!(
            decode_record::<ErgoBox>(&json!({ "boxId": "b", "additionalRegisters": [] }))
                .unwrap_err(),
            mismatch("box", "additionalRegisters", "object", "array")
        );
    }
}
