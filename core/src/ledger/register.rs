use std::collections::BTreeMap;

use serde_json::Value;

use crate::codec::field;
use crate::codec::impl_record_serde;
use crate::codec::DecodeError;
use crate::codec::Field;
use crate::codec::Record;

/// Non-mandatory registers of a box keyed by name ("R4".."R9").
pub type Registers = BTreeMap<String, Register>;

/// A typed register value as reported by the explorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Register {
    /// Base16 of the serialized constant.
    pub serialized_value: String,
    /// e.g. "SColl[SByte]".
    pub sigma_type: String,
    /// Human readable rendering, kept as delivered.
    pub rendered_value: Option<Value>,
}

impl Register {
    pub fn new(serialized_value: &str, sigma_type: &str) -> Self {
        Register {
            serialized_value: serialized_value.to_owned(),
            sigma_type: sigma_type.to_owned(),
            rendered_value: None,
        }
    }
}

const REGISTER_FIELDS: &[Field<Register>] = &[
    field!(Register, "serializedValue", Str, serialized_value, Always),
    field!(Register, "sigmaType", Str, sigma_type, Always),
    field!(Register, "renderedValue", Opaque, rendered_value, WhenSet),
];

impl Record for Register {
    const ENTITY: &'static str = "register";

    fn fields() -> &'static [Field<Self>] {
        REGISTER_FIELDS
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}

impl_record_serde!(Register);
