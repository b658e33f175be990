use thiserror::Error;

use super::Asset;
use super::Registers;
use crate::codec::field;
use crate::codec::impl_record_serde;
use crate::codec::DecodeError;
use crate::codec::Field;
use crate::codec::Record;

/// A ledger output: value, tokens, script and registers, identified by `box_id`.
///
/// Numeric fields use `-1` for "not reported by the feed", which is distinct from `0`. Other
/// boxes and transactions are referenced by id only.
#[derive(Debug, Clone, PartialEq)]
pub struct ErgoBox {
    pub box_id: String,
    pub transaction_id: Option<String>,
    pub block_id: Option<String>,
    /// nanoERG
    pub value: i64,
    pub index: i32,
    pub global_index: i64,
    pub creation_height: i32,
    pub settlement_height: i32,
    pub ergo_tree: Option<String>,
    pub ergo_tree_constants: Option<String>,
    pub ergo_tree_script: Option<String>,
    pub address: Option<String>,
    pub assets: Vec<Asset>,
    pub additional_registers: Registers,
    /// `None` while unspent.
    pub spent_transaction_id: Option<String>,
    pub main_chain: bool,
}

impl Default for ErgoBox {
    fn default() -> Self {
        ErgoBox {
            box_id: String::new(),
            transaction_id: None,
            block_id: None,
            value: -1,
            index: -1,
            global_index: -1,
            creation_height: -1,
            settlement_height: -1,
            ergo_tree: None,
            ergo_tree_constants: None,
            ergo_tree_script: None,
            address: None,
            assets: Vec::new(),
            additional_registers: Registers::new(),
            spent_transaction_id: None,
            main_chain: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpendError {
    #[error("box {box_id} is already spent by transaction {spent_by}")]
    AlreadySpent { box_id: String, spent_by: String },
}

impl ErgoBox {
    pub fn is_spent(&self) -> bool {
        self.spent_transaction_id.is_some()
    }

    /// Records the transaction that spent this box. A box is spent at most once: marking it
    /// again with the same transaction is a no-op, with another one an error.
    pub fn mark_spent(&mut self, tx_id: &str) -> Result<(), SpendError> {
        match &self.spent_transaction_id {
            None => {
                self.spent_transaction_id = Some(tx_id.to_owned());
                Ok(())
            }
            Some(spent_by) if spent_by == tx_id => Ok(()),
            Some(spent_by) => Err(SpendError::AlreadySpent {
                box_id: self.box_id.clone(),
                spent_by: spent_by.clone(),
            }),
        }
    }

    pub fn register(&self, name: &str) -> Option<&super::Register> {
        self.additional_registers.get(name)
    }

    pub fn token_amount(&self, token_id: &str) -> i64 {
        self.assets
            .iter()
            .filter(|a| a.token_id == token_id)
            .map(|a| a.amount)
            .sum()
    }
}

const BOX_FIELDS: &[Field<ErgoBox>] = &[
    field!(ErgoBox, "boxId", Str, box_id, Always),
    field!(ErgoBox, "transactionId", OptStr, transaction_id, WhenSet),
    field!(ErgoBox, "blockId", OptStr, block_id, WhenSet),
    field!(ErgoBox, "value", Long, value, Always),
    field!(ErgoBox, "index", Int, index, Always),
    field!(ErgoBox, "globalIndex", Long, global_index, WhenNonNegative),
    field!(ErgoBox, "creationHeight", Int, creation_height, WhenNonNegative),
    field!(ErgoBox, "settlementHeight", Int, settlement_height, WhenNonNegative),
    field!(ErgoBox, "ergoTree", OptStr, ergo_tree, Always),
    field!(ErgoBox, "ergoTreeConstants", OptStr, ergo_tree_constants, Always),
    field!(ErgoBox, "ergoTreeScript", OptStr, ergo_tree_script, WhenSet),
    field!(ErgoBox, "address", OptStr, address, Always),
    field!(ErgoBox, "assets", Assets, assets, WhenNonEmpty),
    field!(ErgoBox, "additionalRegisters", Registers, additional_registers, WhenNonEmpty),
    field!(ErgoBox, "spentTransactionId", OptStr, spent_transaction_id, WhenSet),
    field!(ErgoBox, "mainChain", Bool, main_chain, Always),
];

impl Record for ErgoBox {
    const ENTITY: &'static str = "box";

    fn fields() -> &'static [Field<Self>] {
        BOX_FIELDS
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.box_id.is_empty() {
            return Err(DecodeError::missing(Self::ENTITY, "boxId"));
        }
        Ok(())
    }
}

impl_record_serde!(ErgoBox);
