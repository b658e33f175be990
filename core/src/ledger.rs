//! Ledger entities as delivered by the feed. Scripts and registers are carried as opaque
//! payloads; nothing here interprets them.

mod asset;
mod box_status;
mod data_input_box;
mod ergo_box;
mod register;
mod transaction;

pub use asset::Asset;
pub use box_status::BoxStatus;
pub use box_status::BoxStatusInfo;
pub use data_input_box::DataInputBox;
pub use ergo_box::ErgoBox;
pub use ergo_box::SpendError;
pub use register::Register;
pub use register::Registers;
pub use transaction::TransactionAggregate;
