use std::fmt;

use crate::codec::field;
use crate::codec::impl_record_serde;
use crate::codec::DecodeError;
use crate::codec::Field;
use crate::codec::Record;
use crate::merge_view::Keyed;

/// Where a box is in its confirmation lifecycle. Statuses this crate does not know are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoxStatus {
    Pending,
    #[default]
    Transmitting,
    Confirmed,
    Other(String),
}

impl BoxStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BoxStatus::Pending => "Pending",
            BoxStatus::Transmitting => "Transmitting",
            BoxStatus::Confirmed => "Confirmed",
            BoxStatus::Other(s) => s,
        }
    }
}

impl From<&str> for BoxStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => BoxStatus::Pending,
            "Transmitting" => BoxStatus::Transmitting,
            "Confirmed" => BoxStatus::Confirmed,
            other => BoxStatus::Other(other.to_owned()),
        }
    }
}

impl From<String> for BoxStatus {
    fn from(s: String) -> Self {
        BoxStatus::from(s.as_str())
    }
}

impl fmt::Display for BoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirmation state of one box, tracked apart from the full box record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxStatusInfo {
    pub box_id: String,
    pub status: BoxStatus,
    pub tx_id: Option<String>,
    pub time_stamp: i64,
}

impl BoxStatusInfo {
    pub fn new(box_id: &str, status: BoxStatus, tx_id: Option<&str>, time_stamp: i64) -> Self {
        BoxStatusInfo {
            box_id: box_id.to_owned(),
            status,
            tx_id: tx_id.map(str::to_owned),
            time_stamp,
        }
    }
}

const STATUS_FIELDS: &[Field<BoxStatusInfo>] = &[
    field!(BoxStatusInfo, "boxId", Str, box_id, Always),
    field!(BoxStatusInfo, "status", Status, status, Always),
    field!(BoxStatusInfo, "txId", OptStr, tx_id, WhenSet),
    field!(BoxStatusInfo, "timeStamp", Long, time_stamp, Always),
];

impl Record for BoxStatusInfo {
    const ENTITY: &'static str = "box status";

    fn fields() -> &'static [Field<Self>] {
        STATUS_FIELDS
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.box_id.is_empty() {
            return Err(DecodeError::missing(Self::ENTITY, "boxId"));
        }
        Ok(())
    }
}

impl_record_serde!(BoxStatusInfo);

impl Keyed for BoxStatusInfo {
    fn identity(&self) -> &str {
        &self.box_id
    }

    fn timestamp(&self) -> i64 {
        self.time_stamp
    }

    fn merge_from(&mut self, incoming: Self) {
        if incoming.time_stamp < self.time_stamp {
            // an older observation only fills in a transaction id that is still unknown
            if self.tx_id.is_none() {
                self.tx_id = incoming.tx_id;
            }
            return;
        }
        self.status = incoming.status;
        if incoming.tx_id.is_some() {
            self.tx_id = incoming.tx_id;
        }
        self.time_stamp = incoming.time_stamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LedgerCodec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn status_defaults_to_transmitting() {
        let s = BoxStatusInfo::decode_tree(&json!({ "boxId": "b", "timeStamp": 5 })).unwrap();
        assert_eq!(s.status, BoxStatus::Transmitting);
        assert_eq!(s.tx_id, None);
    }

    #[test]
    fn unknown_status_is_carried_verbatim() {
        let s = BoxStatusInfo::decode_stream(r#"{ "boxId": "b", "status": "Rejected" }"#).unwrap();
        assert_eq!(s.status, BoxStatus::Other("Rejected".into()));
        assert_eq!(s.encode_tree()["status"], json!("Rejected"));
    }

    #[test]
    fn null_tx_id_does_not_touch_status_or_become_a_sentinel() {
        let mut s = BoxStatusInfo::new("b", BoxStatus::Confirmed, None, 10);
        s.update_from_stream(r#"{ "txId": null, "status": null }"#).unwrap();
        assert_eq!(s, BoxStatusInfo::new("b", BoxStatus::Confirmed, None, 10));

        s.update_from_stream(r#"{ "txId": "tx9" }"#).unwrap();
        s.update_from_stream(r#"{ "txId": null }"#).unwrap();
        assert_eq!(s.tx_id.as_deref(), Some("tx9"));
        assert_eq!(s.status, BoxStatus::Confirmed);
    }

    #[test]
    fn merge_keeps_known_tx_id() {
        let mut s = BoxStatusInfo::new("b", BoxStatus::Pending, Some("tx1"), 10);
        s.merge_from(BoxStatusInfo::new("b", BoxStatus::Confirmed, None, 20));
        assert_eq!(s, BoxStatusInfo::new("b", BoxStatus::Confirmed, Some("tx1"), 20));
    }

    #[test]
    fn older_observation_does_not_roll_status_back() {
        let mut s = BoxStatusInfo::new("b", BoxStatus::Confirmed, None, 20);
        s.merge_from(BoxStatusInfo::new("b", BoxStatus::Pending, Some("tx1"), 10));
        assert_eq!(s, BoxStatusInfo::new("b", BoxStatus::Confirmed, Some("tx1"), 20));

        s.merge_from(BoxStatusInfo::new("b", BoxStatus::Transmitting, Some("tx2"), 5));
        assert_eq!(s, BoxStatusInfo::new("b", BoxStatus::Confirmed, Some("tx1"), 20));
    }
}
