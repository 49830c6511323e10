use parking_lot::{Mutex, MutexGuard};
use std::{collections::VecDeque, sync::Arc};

/// A queued destination and how many times planning to it has failed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pending<W> {
    pub waypoint: W,
    pub failed_attempts: usize,
}

/// FIFO of user-requested destinations.
///
/// Clones share the same underlying queue, so an input handler running on another
/// thread can push while the driving loop pops.
#[derive(Debug)]
pub struct DestinationQueue<W> {
    inner: Arc<Mutex<VecDeque<Pending<W>>>>,
}

impl<W> DestinationQueue<W> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push_back(&self, waypoint: W) {
        self.lock().push_back(Pending {
            waypoint,
            failed_attempts: 0,
        });
    }

    pub fn pop_front(&self) -> Option<W> {
        self.pop_pending().map(|pending| pending.waypoint)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<W>
    where
        W: Clone,
    {
        self.lock()
            .iter()
            .map(|pending| pending.waypoint.clone())
            .collect()
    }

    pub(crate) fn pop_pending(&self) -> Option<Pending<W>> {
        self.lock().pop_front()
    }

    /// Puts a destination that failed to plan behind everything already queued.
    pub(crate) fn requeue(&self, pending: Pending<W>) {
        self.lock().push_back(pending);
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Pending<W>>> {
        self.inner.lock()
    }
}

impl<W> Clone for DestinationQueue<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W> Default for DestinationQueue<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn pops_in_insertion_order() {
        let queue = DestinationQueue::new();
        queue.push_back(1);
        queue.push_back(2);
        queue.push_back(3);

        assert_eq!(queue.pop_front(), Some(1));
        assert_eq!(queue.pop_front(), Some(2));
        assert_eq!(queue.pop_front(), Some(3));
        assert_eq!(queue.pop_front(), None);
    }

    #[test]
    fn requeue_goes_behind_waiting_entries() {
        let queue = DestinationQueue::new();
        queue.push_back("a");
        queue.push_back("b");

        let mut failed = queue.pop_pending().unwrap();
        failed.failed_attempts += 1;
        queue.requeue(failed);

        assert_eq!(queue.snapshot(), vec!["b", "a"]);
        assert_eq!(queue.pop_pending().unwrap().failed_attempts, 0);
        assert_eq!(
            queue.pop_pending(),
            Some(Pending {
                waypoint: "a",
                failed_attempts: 1
            })
        );
    }

    #[test]
    fn clones_share_contents() {
        let queue = DestinationQueue::new();
        let producer = queue.clone();
        producer.push_back(7);
        assert_eq!(queue.len(), 1);
        queue.clear();
        assert!(producer.is_empty());
    }

    #[test]
    fn concurrent_producer_keeps_order() {
        let queue = DestinationQueue::new();
        let producer = queue.clone();

        let handle = thread::spawn(move || {
            for value in 0..1000 {
                producer.push_back(value);
            }
        });

        let mut received = Vec::new();
        while received.len() < 1000 {
            if let Some(value) = queue.pop_front() {
                received.push(value);
            } else {
                thread::yield_now();
            }
        }
        handle.join().unwrap();

        assert!(received.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
