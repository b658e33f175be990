//! Serializes merges onto one consumer. Feed readers on any thread submit batches through a
//! [`FeedSender`]; the thread owning the [`OrderedMergeView`] applies them one at a time, in
//! submission order.

use crossbeam::channel::bounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;
use crossbeam::channel::TryRecvError;
use thiserror::Error;

use crate::merge_view::Keyed;
use crate::merge_view::OrderedMergeView;

#[derive(Debug)]
pub enum FeedMessage<T> {
    Batch(Vec<T>),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("merge queue consumer is gone")]
pub struct QueueClosed;

#[derive(Debug)]
pub struct FeedSender<T> {
    tx: Sender<FeedMessage<T>>,
}

impl<T> Clone for FeedSender<T> {
    fn clone(&self) -> Self {
        FeedSender {
            tx: self.tx.clone(),
        }
    }
}

impl<T> FeedSender<T> {
    /// Blocks while the queue is full.
    pub fn submit(&self, batch: Vec<T>) -> Result<(), QueueClosed> {
        self.tx
            .send(FeedMessage::Batch(batch))
            .map_err(|_| QueueClosed)
    }

    pub fn clear(&self) -> Result<(), QueueClosed> {
        self.tx.send(FeedMessage::Clear).map_err(|_| QueueClosed)
    }
}

#[derive(Debug)]
pub struct MergeQueue<T> {
    rx: Receiver<FeedMessage<T>>,
}

/// Creates a queue holding at most `capacity` pending messages.
pub fn channel<T>(capacity: usize) -> (FeedSender<T>, MergeQueue<T>) {
    let (tx, rx) = bounded(capacity);
    (FeedSender { tx }, MergeQueue { rx })
}

impl<T: Keyed> MergeQueue<T> {
    /// Applies everything already queued without waiting. Returns true if any message changed
    /// the visible order.
    pub fn apply_pending(&self, view: &mut OrderedMergeView<T>) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(msg) => changed |= apply(view, msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return changed,
            }
        }
    }

    /// Applies messages as they arrive until every sender is dropped, calling `on_change` after
    /// each message that changed the visible order.
    pub fn run<F>(&self, view: &mut OrderedMergeView<T>, mut on_change: F)
    where
        F: FnMut(&OrderedMergeView<T>),
    {
        for msg in self.rx.iter() {
            if apply(view, msg) {
                on_change(view);
            }
        }
        log::debug!("merge queue drained, {} records in view", view.len());
    }
}

fn apply<T: Keyed>(view: &mut OrderedMergeView<T>, msg: FeedMessage<T>) -> bool {
    match msg {
        FeedMessage::Batch(batch) => view.merge(batch),
        FeedMessage::Clear => {
            let had_records = !view.is_empty();
            view.clear();
            had_records
        }
    }
}
