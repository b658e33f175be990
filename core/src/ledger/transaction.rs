use super::BoxStatus;
use super::BoxStatusInfo;
use crate::codec::field;
use crate::codec::impl_record_serde;
use crate::codec::DecodeError;
use crate::codec::Field;
use crate::codec::Record;
use crate::merge_view::Keyed;

/// A transaction together with the status of the boxes it touches. No two entries of `boxes`
/// share a box id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionAggregate {
    pub tx_id: String,
    pub time_stamp: i64,
    boxes: Vec<BoxStatusInfo>,
}

impl TransactionAggregate {
    pub fn new(tx_id: &str, time_stamp: i64) -> Self {
        TransactionAggregate {
            tx_id: tx_id.to_owned(),
            time_stamp,
            boxes: Vec::new(),
        }
    }

    pub fn boxes(&self) -> &[BoxStatusInfo] {
        &self.boxes
    }

    /// Replaces the entry with the same box id in place, or appends a new one.
    pub fn upsert_box(&mut self, info: BoxStatusInfo) {
        match self.index_of(&info.box_id) {
            Some(i) => self.boxes[i] = info,
            None => self.boxes.push(info),
        }
    }

    pub fn lookup(&self, box_id: &str) -> Option<&BoxStatusInfo> {
        self.boxes.iter().find(|b| b.box_id == box_id)
    }

    pub fn index_of(&self, box_id: &str) -> Option<usize> {
        self.boxes.iter().position(|b| b.box_id == box_id)
    }

    /// Moves a known box to `status`; `tx_id` is only overwritten when given. Returns false if
    /// the box is not part of this transaction.
    pub fn update_status(&mut self, box_id: &str, status: BoxStatus, tx_id: Option<&str>) -> bool {
        match self.boxes.iter_mut().find(|b| b.box_id == box_id) {
            Some(entry) => {
                entry.status = status;
                if let Some(tx_id) = tx_id {
                    entry.tx_id = Some(tx_id.to_owned());
                }
                true
            }
            None => false,
        }
    }
}

const TRANSACTION_FIELDS: &[Field<TransactionAggregate>] = &[
    field!(TransactionAggregate, "txId", Str, tx_id, Always),
    field!(TransactionAggregate, "timeStamp", Long, time_stamp, Always),
    field!(TransactionAggregate, "boxes", Statuses, boxes, Always),
];

impl Record for TransactionAggregate {
    const ENTITY: &'static str = "transaction";

    fn fields() -> &'static [Field<Self>] {
        TRANSACTION_FIELDS
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.tx_id.is_empty() {
            return Err(DecodeError::missing(Self::ENTITY, "txId"));
        }
        // feeds may repeat a box; the later entry wins, at the earlier position
        let decoded = std::mem::take(&mut self.boxes);
        for info in decoded {
            self.upsert_box(info);
        }
        Ok(())
    }
}

impl_record_serde!(TransactionAggregate);

impl Keyed for TransactionAggregate {
    fn identity(&self) -> &str {
        &self.tx_id
    }

    fn timestamp(&self) -> i64 {
        self.time_stamp
    }

    fn merge_from(&mut self, incoming: Self) {
        self.time_stamp = self.time_stamp.max(incoming.time_stamp);
        for info in incoming.boxes {
            match self.boxes.iter_mut().find(|b| b.box_id == info.box_id) {
                Some(resident) => resident.merge_from(info),
                None => self.boxes.push(info),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LedgerCodec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn upsert_same_box_twice_keeps_one_entry() {
        let mut tx = TransactionAggregate::new("tx1", 100);
        tx.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Pending, Some("tx1"), 100));
        tx.upsert_box(BoxStatusInfo::new("b2", BoxStatus::Pending, Some("tx1"), 100));
        tx.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Confirmed, Some("tx1"), 120));
        assert_eq!(tx.boxes().len(), 2);
        assert_eq!(tx.index_of("b1"), Some(0));
        assert_eq!(tx.lookup("b1").unwrap().status, BoxStatus::Confirmed);
        assert_eq!(tx.lookup("b3"), None);
        assert_eq!(tx.index_of("b3"), None);
    }

    #[test]
    fn update_status_in_place() {
        let mut tx = TransactionAggregate::new("tx1", 100);
        tx.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Transmitting, None, 100));
        assert!(tx.update_status("b1", BoxStatus::Pending, Some("tx1")));
        assert!(!tx.update_status("b9", BoxStatus::Pending, None));
        assert_eq!(
            tx.lookup("b1"),
            Some(&BoxStatusInfo::new("b1", BoxStatus::Pending, Some("tx1"), 100))
        );
    }

    #[test]
    fn decode_collapses_repeated_boxes() {
        let doc = json!({
            "txId": "tx1",
            "timeStamp": 1700000000000i64,
            "boxes": [
                { "boxId": "b1", "status": "Pending", "timeStamp": 1 },
                { "boxId": "b2", "status": "Pending", "timeStamp": 1 },
                { "boxId": "b1", "status": "Confirmed", "timeStamp": 2 },
            ],
        });
        let tx = TransactionAggregate::decode_tree(&doc).unwrap();
        assert_eq!(tx, TransactionAggregate::decode_stream(&doc.to_string()).unwrap());
        assert_eq!(
            tx.boxes(),
            &[
                BoxStatusInfo::new("b1", BoxStatus::Confirmed, None, 2),
                BoxStatusInfo::new("b2", BoxStatus::Pending, None, 1),
            ]
        );
    }

    #[test]
    fn tx_id_is_required_and_boxes_default_empty() {
        assert_eq!(
            TransactionAggregate::decode_tree(&json!({ "timeStamp": 3 })).unwrap_err(),
            DecodeError::missing("transaction", "txId")
        );
        let tx = TransactionAggregate::decode_tree(&json!({ "txId": "tx1" })).unwrap();
        assert_eq!(tx, TransactionAggregate::new("tx1", 0));
        assert_eq!(
            tx.encode_tree(),
            json!({ "txId": "tx1", "timeStamp": 0, "boxes": [] })
        );
    }

    #[test]
    fn merge_updates_fields_and_upserts_boxes() {
        let mut resident = TransactionAggregate::new("tx1", 100);
        resident.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Pending, None, 100));
        resident.upsert_box(BoxStatusInfo::new("b2", BoxStatus::Pending, None, 100));
        let mut incoming = TransactionAggregate::new("tx1", 150);
        incoming.upsert_box(BoxStatusInfo::new("b2", BoxStatus::Confirmed, None, 150));
        incoming.upsert_box(BoxStatusInfo::new("b3", BoxStatus::Pending, None, 150));

        resident.merge_from(incoming);

        assert_eq!(resident.time_stamp, 150);
        let ids: Vec<_> = resident.boxes().iter().map(|b| b.box_id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2", "b3"]);
        assert_eq!(resident.lookup("b2").unwrap().status, BoxStatus::Confirmed);
    }

    #[test]
    fn older_observation_keeps_timestamp_and_box_statuses() {
        let mut resident = TransactionAggregate::new("tx1", 300);
        resident.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Confirmed, Some("tx1"), 300));
        let mut stale = TransactionAggregate::new("tx1", 100);
        stale.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Pending, Some("tx1"), 100));
        stale.upsert_box(BoxStatusInfo::new("b2", BoxStatus::Pending, Some("tx1"), 100));

        resident.merge_from(stale);

        assert_eq!(resident.time_stamp, 300);
        assert_eq!(
            resident.boxes(),
            &[
                BoxStatusInfo::new("b1", BoxStatus::Confirmed, Some("tx1"), 300),
                BoxStatusInfo::new("b2", BoxStatus::Pending, Some("tx1"), 100),
            ]
        );
    }
}
