//! Reads feed batches from local files, either parsed whole into a document tree or decoded
//! incrementally from the byte stream.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use derive_more::From;
use thiserror::Error;

use crate::codec::decode_batch_stream_reader;
use crate::codec::decode_batch_tree;
use crate::codec::BatchResult;
use crate::codec::DecodeError;
use crate::codec::Record;

#[derive(Debug, From, Error)]
pub enum FeedSourceError {
    #[error("feed file io error: {0}")]
    Io(std::io::Error),
    #[error("feed file is not valid JSON: {0}")]
    Json(serde_json::Error),
    #[error("feed decode error: {0}")]
    Decode(DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    /// Parse the whole file into a `serde_json::Value` first.
    Document,
    /// Decode records straight off the file reader.
    Stream,
}

pub fn read_batch<T: Record>(
    path: &Path,
    format: FeedFormat,
) -> Result<BatchResult<T>, FeedSourceError> {
    let reader = BufReader::new(File::open(path)?);
    let batch = match format {
        FeedFormat::Document => {
            let doc: serde_json::Value = serde_json::from_reader(reader)?;
            decode_batch_tree(&doc)?
        }
        FeedFormat::Stream => decode_batch_stream_reader(reader)?,
    };
    log::debug!("read {} {} records from {}", batch.len(), T::ENTITY, path.display());
    Ok(batch)
}

/// Keeps the records that decoded, logging the ones that did not.
pub fn accept<T>(batch: BatchResult<T>, origin: &str) -> Vec<T> {
    batch
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match record {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("{}: skipping record {}: {}", origin, i, e);
                None
            }
        })
        .collect()
}
