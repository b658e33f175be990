use crate::codec::field;
use crate::codec::impl_record_serde;
use crate::codec::DecodeError;
use crate::codec::Field;
use crate::codec::Record;

/// An amount of one token held by a box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Asset {
    pub token_id: String,
    pub amount: i64,
    /// Position of the token in the box's token list.
    pub index: i32,
    pub name: String,
    /// Never negative once decoded.
    pub decimals: i32,
    /// Wire name `type`, e.g. "EIP-004".
    pub token_type: String,
}

const ASSET_FIELDS: &[Field<Asset>] = &[
    field!(Asset, "tokenId", Str, token_id, Always),
    field!(Asset, "amount", Long, amount, Always),
    field!(Asset, "index", Int, index, Always),
    field!(Asset, "name", Str, name, Always),
    field!(Asset, "decimals", Int, decimals, Always),
    field!(Asset, "type", Str, token_type, Always),
];

impl Record for Asset {
    const ENTITY: &'static str = "asset";

    fn fields() -> &'static [Field<Self>] {
        ASSET_FIELDS
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.token_id.is_empty() {
            return Err(DecodeError::missing(Self::ENTITY, "tokenId"));
        }
        self.decimals = self.decimals.max(0);
        Ok(())
    }
}

impl_record_serde!(Asset);
