//! Dual JSON codec for ledger entities.
//!
//! Every entity describes its wire fields once, in a [`Field`] table. The whole-document path
//! ([`tree`]) walks a `serde_json::Value`, the incremental path ([`stream`]) walks serde tokens,
//! and both hand each field value to the same coercion and assignment code, so the two paths
//! accept the same documents and produce the same values. Encoding is driven by the same table,
//! which keeps `encode_tree` and the `Serialize` output byte-for-byte identical.

use std::io;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod field_table;
pub mod stream;
pub mod tree;

pub use self::field_table::Emit;
pub use self::field_table::Field;
pub use self::field_table::NullPolicy;
pub use self::field_table::Record;
pub use self::field_table::Slot;

pub(crate) use self::field_table::field;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{entity} missing {field}")]
    MissingRequiredField {
        entity: &'static str,
        field: &'static str,
    },
    #[error("{entity} field `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed stream: {0}")]
    MalformedStream(String),
}

impl DecodeError {
    pub fn missing(entity: &'static str, field: &'static str) -> Self {
        DecodeError::MissingRequiredField { entity, field }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::MalformedStream(e.to_string())
    }
}

/// Decode/encode operations available on every ledger entity.
pub trait LedgerCodec: Record + Clone + Serialize {
    /// Decodes a fresh record from a parsed JSON document.
    fn decode_tree(value: &Value) -> Result<Self, DecodeError> {
        tree::decode_record(value)
    }

    /// Applies a JSON document onto this record. A `null` field resets it to its default.
    /// Nothing is changed if the document fails to decode.
    fn update_from_tree(&mut self, value: &Value) -> Result<(), DecodeError> {
        let mut draft = self.clone();
        tree::decode_into(&mut draft, value, NullPolicy::ResetToDefault)?;
        *self = draft;
        Ok(())
    }

    /// Decodes a fresh record from serialized JSON without building a document tree.
    fn decode_stream(json: &str) -> Result<Self, DecodeError> {
        let mut record = Self::default();
        stream::decode_str_into(&mut record, json, NullPolicy::KeepCurrent)?;
        Ok(record)
    }

    fn decode_stream_reader<R: io::Read>(reader: R) -> Result<Self, DecodeError> {
        let mut record = Self::default();
        stream::decode_reader_into(&mut record, reader, NullPolicy::KeepCurrent)?;
        Ok(record)
    }

    /// Applies serialized JSON onto this record. A `null` field keeps the current value, which
    /// is what partial-update feeds rely on. Nothing is changed if the input fails to decode.
    fn update_from_stream(&mut self, json: &str) -> Result<(), DecodeError> {
        let mut draft = self.clone();
        stream::decode_str_into(&mut draft, json, NullPolicy::KeepCurrent)?;
        *self = draft;
        Ok(())
    }

    fn encode_tree(&self) -> Value {
        tree::encode(self)
    }

    fn encode_stream(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn encode_stream_to<W: io::Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer(writer, self)
    }
}

impl<T: Record + Clone + Serialize> LedgerCodec for T {}

/// Outcome of decoding a batch: one entry per record, failures next to successes.
pub type BatchResult<T> = Vec<Result<T, DecodeError>>;

/// Decodes every record of a batch document. The document is either a JSON array of records
/// or an explorer page object `{"items": [...], "total": n}`.
pub fn decode_batch_tree<T: Record>(document: &Value) -> Result<BatchResult<T>, DecodeError> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(page) => match page.get("items") {
            Some(Value::Array(items)) => items,
            Some(_) | None => return Err(batch_shape_error()),
        },
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            return Err(batch_shape_error())
        }
    };
    Ok(items.iter().map(tree::decode_record).collect())
}

/// Stream counterpart of [`decode_batch_tree`]. Structural errors fail the whole batch.
pub fn decode_batch_stream<T: Record>(json: &str) -> Result<BatchResult<T>, DecodeError> {
    let mut de = serde_json::Deserializer::from_str(json);
    let batch = stream::decode_batch(&mut de)?;
    de.end()?;
    Ok(batch)
}

pub fn decode_batch_stream_reader<T: Record, R: io::Read>(
    reader: R,
) -> Result<BatchResult<T>, DecodeError> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let batch = stream::decode_batch(&mut de)?;
    de.end()?;
    Ok(batch)
}

fn batch_shape_error() -> DecodeError {
    DecodeError::MalformedStream(
        "expected a JSON array of records or an object with an `items` array".to_string(),
    )
}

/// Implements `Serialize` and `Deserialize` for a [`Record`] through its field table.
macro_rules! impl_record_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $crate::codec::stream::serialize_record(self, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                $crate::codec::stream::deserialize_record(deserializer)
            }
        }
    };
}

pub(crate) use impl_record_serde;
