//! Newest-first, identity-deduplicated collection fed by repeated partial feed batches, and the
//! paginated window over it that the UI reads.

/// A record the view can order and deduplicate.
pub trait Keyed {
    /// Identity used to match incoming records with resident ones.
    fn identity(&self) -> &str;

    fn timestamp(&self) -> i64;

    /// Applies another observation of the same record onto this one in place. An observation
    /// older than the resident one must not move its timestamp backwards.
    fn merge_from(&mut self, incoming: Self)
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState<'a> {
    /// Nothing to show yet; the UI displays the placeholder instead of rows.
    Empty { placeholder: &'a str },
    Populated,
}

/// One page of the view together with its navigation affordances.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    pub page_index: usize,
    pub page_size: usize,
    pub has_previous: bool,
    pub has_next: bool,
    /// False when everything fits on one page; previous/next are then not shown at all.
    pub controls_visible: bool,
}

#[derive(Debug, Clone)]
pub struct OrderedMergeView<T> {
    records: Vec<T>,
    placeholder: String,
}

impl<T: Keyed> OrderedMergeView<T> {
    pub fn new(placeholder: &str) -> Self {
        OrderedMergeView {
            records: Vec::new(),
            placeholder: placeholder.to_owned(),
        }
    }

    pub fn state(&self) -> ViewState<'_> {
        if self.records.is_empty() {
            ViewState::Empty {
                placeholder: &self.placeholder,
            }
        } else {
            ViewState::Populated
        }
    }

    pub fn set_placeholder(&mut self, placeholder: &str) {
        self.placeholder = placeholder.to_owned();
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&T> {
        self.position(identity).map(|i| &self.records[i])
    }

    /// Returns to the empty state.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Merges a feed batch. Returns true if any record was inserted (the visible order changed),
    /// false if every record only updated a resident one in place.
    ///
    /// On an empty view the batch is taken in feed order, which is newest-first on first load.
    /// Afterwards new records are inserted ahead of the first resident record that is not newer,
    /// and known records are updated without moving.
    pub fn merge<I: IntoIterator<Item = T>>(&mut self, batch: I) -> bool {
        let bootstrap = self.records.is_empty();
        let (mut inserted, mut updated) = (0usize, 0usize);
        for incoming in batch {
            match self.position(incoming.identity()) {
                Some(i) => {
                    self.records[i].merge_from(incoming);
                    updated += 1;
                }
                None if bootstrap => {
                    self.records.push(incoming);
                    inserted += 1;
                }
                None => {
                    let at = self.insertion_point(incoming.timestamp());
                    self.records.insert(at, incoming);
                    inserted += 1;
                }
            }
        }
        log::debug!(
            "merged batch: {} inserted, {} updated, {} resident{}",
            inserted,
            updated,
            self.records.len(),
            if bootstrap { " (bootstrap)" } else { "" }
        );
        inserted > 0
    }

    /// Rows `[page_index * page_size, page_index * page_size + page_size)`, clipped to the view.
    pub fn paginate(&self, page_index: usize, page_size: usize) -> Page<'_, T> {
        let len = self.records.len();
        if page_size == 0 {
            return Page {
                rows: &[],
                page_index,
                page_size,
                has_previous: false,
                has_next: false,
                controls_visible: false,
            };
        }
        let start = page_index.saturating_mul(page_size).min(len);
        let end = start.saturating_add(page_size).min(len);
        let has_next = page_index
            .checked_add(1)
            .and_then(|next| next.checked_mul(page_size))
            .map_or(false, |next_start| next_start < len);
        Page {
            rows: &self.records[start..end],
            page_index,
            page_size,
            has_previous: page_index > 0,
            has_next,
            controls_visible: len > page_size,
        }
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            0
        } else {
            self.records.len().div_ceil(page_size)
        }
    }

    fn position(&self, identity: &str) -> Option<usize> {
        self.records.iter().position(|r| r.identity() == identity)
    }

    fn insertion_point(&self, timestamp: i64) -> usize {
        self.records
            .iter()
            .position(|r| r.timestamp() <= timestamp)
            .unwrap_or(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BoxStatus;
    use crate::ledger::BoxStatusInfo;
    use crate::ledger::TransactionAggregate;
    use crate::test_utils::init_log_tests;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn tx(id: &str, ts: i64) -> TransactionAggregate {
        TransactionAggregate::new(id, ts)
    }

    fn order(view: &OrderedMergeView<TransactionAggregate>) -> Vec<(String, i64)> {
        view.records()
            .iter()
            .map(|t| (t.tx_id.clone(), t.time_stamp))
            .collect()
    }

    fn view_of(records: Vec<TransactionAggregate>) -> OrderedMergeView<TransactionAggregate> {
        let mut view = OrderedMergeView::new("No transactions yet");
        view.merge(records);
        view
    }

    #[test]
    fn bootstrap_keeps_feed_order() {
        init_log_tests();
        let mut view = OrderedMergeView::new("empty");
        assert!(view.merge(vec![tx("a", 100), tx("b", 300), tx("c", 200)]));
        let timestamps: Vec<i64> = view.records().iter().map(|t| t.time_stamp).collect();
        assert_eq!(timestamps, vec![100, 300, 200]);
    }

    #[test]
    fn new_record_is_inserted_by_descending_timestamp() {
        let mut view = view_of(vec![tx("A", 300), tx("B", 200)]);
        assert!(view.merge(vec![tx("X", 250)]));
        assert_eq!(
            order(&view),
            vec![("A".into(), 300), ("X".into(), 250), ("B".into(), 200)]
        );
        view.merge(vec![tx("old", 10), tx("new", 999)]);
        assert_eq!(view.records().first().unwrap().tx_id, "new");
        assert_eq!(view.records().last().unwrap().tx_id, "old");
    }

    #[test]
    fn ties_go_ahead_of_existing_entries() {
        let mut view = view_of(vec![tx("A", 300), tx("B", 200)]);
        view.merge(vec![tx("C", 200)]);
        view.merge(vec![tx("D", 300)]);
        assert_eq!(
            order(&view),
            vec![
                ("D".into(), 300),
                ("A".into(), 300),
                ("C".into(), 200),
                ("B".into(), 200)
            ]
        );
    }

    #[test]
    fn known_record_is_updated_in_place() {
        let mut view = view_of(vec![tx("A", 300), tx("B", 200)]);
        let mut update = tx("B", 400);
        update.upsert_box(BoxStatusInfo::new("b1", BoxStatus::Confirmed, Some("B"), 400));
        assert!(!view.merge(vec![update]));
        assert_eq!(order(&view), vec![("A".into(), 300), ("B".into(), 400)]);
        assert_eq!(
            view.get("B").unwrap().lookup("b1").unwrap().status,
            BoxStatus::Confirmed
        );
    }

    #[test]
    fn stale_update_does_not_move_timestamp_back() {
        let mut view = view_of(vec![tx("A", 300), tx("B", 200)]);
        assert!(!view.merge(vec![tx("A", 100)]));
        assert_eq!(order(&view), vec![("A".into(), 300), ("B".into(), 200)]);
        assert!(view.merge(vec![tx("C", 250)]));
        assert_eq!(
            order(&view),
            vec![("A".into(), 300), ("C".into(), 250), ("B".into(), 200)]
        );
    }

    #[test]
    fn page_count_with_huge_page_size() {
        let view = view_of(vec![tx("A", 1)]);
        assert_eq!(view.page_count(usize::MAX), 1);
        let page = view.paginate(0, usize::MAX);
        assert_eq!(page.rows.len(), 1);
        assert!(!page.has_next);
        assert!(!page.controls_visible);
        assert_eq!(view_of(Vec::new()).page_count(usize::MAX), 0);
    }

    #[test]
    fn duplicates_within_a_bootstrap_batch_collapse() {
        let view = view_of(vec![tx("A", 300), tx("B", 200), tx("A", 310)]);
        assert_eq!(order(&view), vec![("A".into(), 310), ("B".into(), 200)]);
    }

    #[test]
    fn empty_state_carries_placeholder_until_populated() {
        let mut view: OrderedMergeView<TransactionAggregate> = OrderedMergeView::new("Nothing yet");
        assert!(!view.merge(Vec::new()));
        assert_eq!(
            view.state(),
            ViewState::Empty {
                placeholder: "Nothing yet"
            }
        );
        view.merge(vec![tx("A", 1)]);
        assert_eq!(view.state(), ViewState::Populated);
        view.merge(Vec::new());
        assert_eq!(view.state(), ViewState::Populated);
        view.clear();
        view.set_placeholder("Cleared");
        assert_eq!(view.state(), ViewState::Empty { placeholder: "Cleared" });
    }

    #[test]
    fn pagination_windows_and_controls() {
        let view = view_of((0..45).map(|i| tx(&format!("t{}", i), 1000 - i)).collect());
        assert_eq!(view.page_count(20), 3);

        let first = view.paginate(0, 20);
        assert_eq!(first.rows, &view.records()[0..20]);
        assert!(first.has_next);
        assert!(!first.has_previous);
        assert!(first.controls_visible);

        let last = view.paginate(2, 20);
        assert_eq!(last.rows, &view.records()[40..45]);
        assert!(last.has_previous);
        assert!(!last.has_next);

        let beyond = view.paginate(7, 20);
        assert!(beyond.rows.is_empty());
        assert!(!beyond.has_next);
    }

    #[test]
    fn controls_hidden_when_everything_fits() {
        let view = view_of((0..20).map(|i| tx(&format!("t{}", i), 100 - i)).collect());
        let page = view.paginate(0, 20);
        assert_eq!(page.rows.len(), 20);
        assert!(!page.controls_visible);
        assert!(!page.has_next);
        assert!(!view.paginate(0, 0).controls_visible);
        assert_eq!(view.page_count(0), 0);
    }

    proptest! {
        #[test]
        fn inserts_into_sorted_view_keep_it_sorted(
            initial in proptest::collection::vec(0i64..1000, 1..20),
            incoming in proptest::collection::vec(0i64..1000, 0..20),
        ) {
            let mut sorted = initial.clone();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            let mut view = view_of(
                sorted.iter().enumerate().map(|(i, ts)| tx(&format!("r{}", i), *ts)).collect(),
            );
            let inserted = view.merge(
                incoming.iter().enumerate().map(|(i, ts)| tx(&format!("n{}", i), *ts)),
            );
            prop_assert_eq!(inserted, !incoming.is_empty());
            prop_assert_eq!(view.len(), initial.len() + incoming.len());
            let timestamps: Vec<i64> = view.records().iter().map(|t| t.time_stamp).collect();
            prop_assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
