//! Single-slot reply channel
//!
//! Queries and volume commands answer through a slot owned by the caller.
//! Writing to the slot replaces any answer the caller has not read yet and
//! never waits for the caller, so a slow consumer cannot stall the player and
//! always reads the most recent answer.

use std::sync::Arc;
use tokio::sync::watch;

/// Writing half of a reply slot, handed to the player with each request
pub struct ReplySlot<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

/// Reading half of a reply slot
#[derive(Debug)]
pub struct ReplyReceiver<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T> ReplySlot<T> {
    /// Create an empty slot
    pub fn new() -> (Self, ReplyReceiver<T>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx: Arc::new(tx) }, ReplyReceiver { rx })
    }

    /// Store `value`, discarding any unread previous answer
    pub(crate) fn publish(&self, value: T) {
        self.tx.send_replace(Some(value));
    }
}

impl<T> Clone for ReplySlot<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> std::fmt::Debug for ReplySlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplySlot").finish_non_exhaustive()
    }
}

impl<T: Clone> ReplyReceiver<T> {
    /// Wait for an answer that has not been read yet
    ///
    /// Returns `None` once every writing half is gone and no unread answer
    /// remains.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }

    /// Take the unread answer, if any, without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        let answer = self.rx.borrow_and_update();
        if answer.has_changed() {
            answer.clone()
        } else {
            None
        }
    }

    /// The most recent answer, read or not
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }
}
