use super::Asset;
use super::ErgoBox;
use super::Registers;
use crate::box_registry::BoxLookup;
use crate::codec::field;
use crate::codec::impl_record_serde;
use crate::codec::DecodeError;
use crate::codec::Field;
use crate::codec::Record;

/// A box read by a transaction without being spent. It is a reference to an output of another
/// transaction (`output_transaction_id`), so it has no spent/main-chain state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct DataInputBox {
    pub box_id: String,
    pub output_transaction_id: Option<String>,
    pub output_block_id: Option<String>,
    pub value: i64,
    pub index: i32,
    pub output_index: i32,
    pub ergo_tree: Option<String>,
    pub address: Option<String>,
    pub assets: Vec<Asset>,
    pub additional_registers: Registers,
}

impl Default for DataInputBox {
    fn default() -> Self {
        DataInputBox {
            box_id: String::new(),
            output_transaction_id: None,
            output_block_id: None,
            value: -1,
            index: -1,
            output_index: -1,
            ergo_tree: None,
            address: None,
            assets: Vec::new(),
            additional_registers: Registers::new(),
        }
    }
}

impl DataInputBox {
    /// The referenced box, if `lookup` knows it.
    pub fn resolve<'a, L: BoxLookup + ?Sized>(&self, lookup: &'a L) -> Option<&'a ErgoBox> {
        lookup.find_box(&self.box_id)
    }
}

const DATA_INPUT_FIELDS: &[Field<DataInputBox>] = &[
    field!(DataInputBox, "boxId", Str, box_id, Always),
    field!(DataInputBox, "outputTransactionId", OptStr, output_transaction_id, WhenSet),
    field!(DataInputBox, "outputBlockId", OptStr, output_block_id, WhenSet),
    field!(DataInputBox, "value", Long, value, Always),
    field!(DataInputBox, "index", Int, index, Always),
    field!(DataInputBox, "outputIndex", Int, output_index, Always),
    field!(DataInputBox, "ergoTree", OptStr, ergo_tree, Always),
    field!(DataInputBox, "address", OptStr, address, Always),
    field!(DataInputBox, "assets", Assets, assets, WhenNonEmpty),
    field!(DataInputBox, "additionalRegisters", Registers, additional_registers, WhenNonEmpty),
];

impl Record for DataInputBox {
    const ENTITY: &'static str = "data input";

    fn fields() -> &'static [Field<Self>] {
        DATA_INPUT_FIELDS
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.box_id.is_empty() {
            return Err(DecodeError::missing(Self::ENTITY, "boxId"));
        }
        Ok(())
    }
}

impl_record_serde!(DataInputBox);
