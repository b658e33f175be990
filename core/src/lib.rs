//! Ledger box feed core: the box/transaction data model, its tree and stream JSON codecs, and
//! the ordered merge view that keeps a paginated, newest-first collection in sync with
//! repeated partial feed updates.

// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(unused_imports)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod box_registry;
pub mod codec;
pub mod feed_config;
pub mod feed_source;
pub mod ledger;
pub mod logging;
pub mod merge_queue;
pub mod merge_view;

#[cfg(test)]
pub(crate) mod test_utils;
