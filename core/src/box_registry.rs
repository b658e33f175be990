//! Boxes known to the feed, by id. Transactions and data inputs reference boxes by id only and
//! resolve them here.

use std::collections::HashMap;

use crate::ledger::ErgoBox;
use crate::ledger::SpendError;

pub trait BoxLookup {
    fn find_box(&self, box_id: &str) -> Option<&ErgoBox>;
}

#[derive(Debug, Clone, Default)]
pub struct BoxRegistry {
    boxes: HashMap<String, ErgoBox>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown box {0}")]
    UnknownBox(String),
    #[error("spend error: {0}")]
    Spend(#[from] SpendError),
}

impl BoxRegistry {
    /// Stores `ergo_box`, replacing an earlier observation of the same box. A spending
    /// transaction already recorded for the box survives a newer observation that does not
    /// report one. Returns the replaced box.
    pub fn supersede(&mut self, mut ergo_box: ErgoBox) -> Option<ErgoBox> {
        let previous = self.boxes.remove(&ergo_box.box_id);
        if let Some(prev) = &previous {
            if ergo_box.spent_transaction_id.is_none() && prev.spent_transaction_id.is_some() {
                ergo_box.spent_transaction_id = prev.spent_transaction_id.clone();
            }
        }
        log::trace!("registry: stored box {}", ergo_box.box_id);
        self.boxes.insert(ergo_box.box_id.clone(), ergo_box);
        previous
    }

    pub fn mark_spent(&mut self, box_id: &str, tx_id: &str) -> Result<(), RegistryError> {
        let ergo_box = self
            .boxes
            .get_mut(box_id)
            .ok_or_else(|| RegistryError::UnknownBox(box_id.to_owned()))?;
        ergo_box.mark_spent(tx_id)?;
        Ok(())
    }

    pub fn unspent(&self) -> impl Iterator<Item = &ErgoBox> {
        self.boxes.values().filter(|b| !b.is_spent())
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl BoxLookup for BoxRegistry {
    fn find_box(&self, box_id: &str) -> Option<&ErgoBox> {
        self.boxes.get(box_id)
    }
}

impl<L: BoxLookup + ?Sized> BoxLookup for &L {
    fn find_box(&self, box_id: &str) -> Option<&ErgoBox> {
        (**self).find_box(box_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ergo_box(id: &str, value: i64) -> ErgoBox {
        ErgoBox {
            box_id: id.into(),
            value,
            ..ErgoBox::default()
        }
    }

    #[test]
    fn supersede_replaces_and_returns_previous() {
        let mut registry = BoxRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.supersede(ergo_box("b1", 10)), None);
        let previous = registry.supersede(ergo_box("b1", 20)).unwrap();
        assert_eq!(previous.value, 10);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_box("b1").unwrap().value, 20);
        assert!(registry.find_box("b2").is_none());
    }

    #[test]
    fn spent_state_survives_a_newer_observation() {
        let mut registry = BoxRegistry::default();
        registry.supersede(ergo_box("b1", 10));
        registry.mark_spent("b1", "tx1").unwrap();
        registry.supersede(ergo_box("b1", 10));
        assert_eq!(
            registry.find_box("b1").unwrap().spent_transaction_id.as_deref(),
            Some("tx1")
        );
        assert_eq!(registry.unspent().count(), 0);
    }

    #[test]
    fn mark_spent_errors() {
        let mut registry = BoxRegistry::default();
        assert_eq!(
            registry.mark_spent("nope", "tx1").unwrap_err(),
            RegistryError::UnknownBox("nope".into())
        );
        registry.supersede(ergo_box("b1", 10));
        registry.mark_spent("b1", "tx1").unwrap();
        assert_eq!(
            registry.mark_spent("b1", "tx2").unwrap_err(),
            RegistryError::Spend(SpendError::AlreadySpent {
                box_id: "b1".into(),
                spent_by: "tx1".into(),
            })
        );
    }
}
