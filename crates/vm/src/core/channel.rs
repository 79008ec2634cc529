use std::{collections::VecDeque, fmt, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// An unbounded FIFO queue of words connecting VMs to each other or to an external driver.
///
/// A [`Channel`] is a handle: cloning it yields another handle to the same queue, so the same
/// channel can be the output of one VM and the input of another. Any number of producers and
/// consumers may use it concurrently; every value is delivered exactly once, in the order it was
/// sent.
///
/// ```
/// use intcode_vm::core::channel::Channel;
///
/// let channel = Channel::new();
/// let handle = channel.clone();
///
/// channel.send(1);
/// channel.send(2);
/// assert_eq!(handle.try_recv(), Some(1));
/// assert_eq!(handle.drain_all(), vec![2]);
/// assert_eq!(channel.try_recv(), None);
/// ```
#[derive(Clone, Default)]
pub struct Channel {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    queue: Mutex<VecDeque<i64>>,
    notify: Notify,
}

impl Channel {
    /// Creates a new, empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel pre-filled with `values`.
    pub fn with_values(values: impl IntoIterator<Item = i64>) -> Self {
        let channel = Self::new();
        channel.inner.queue.lock().extend(values);
        channel
    }

    /// Enqueues a value. Never blocks.
    pub fn send(&self, value: i64) {
        self.inner.queue.lock().push_back(value);
        self.inner.notify.notify_one();
    }

    /// Enqueues every value of `values`, in order. The values become visible to consumers all at
    /// once, never interleaved with values from other producers.
    pub fn send_all(&self, values: impl IntoIterator<Item = i64>) {
        let sent = {
            let mut queue = self.inner.queue.lock();
            let before = queue.len();
            queue.extend(values);
            queue.len() - before
        };
        for _ in 0..sent {
            self.inner.notify.notify_one();
        }
    }

    /// Dequeues the next value, if one is available.
    pub fn try_recv(&self) -> Option<i64> {
        self.inner.queue.lock().pop_front()
    }

    /// Dequeues the next value, suspending the calling task until one is available.
    ///
    /// This is cancel-safe: if the returned future is dropped before completing, no value has
    /// been removed from the channel.
    pub async fn recv(&self) -> i64 {
        loop {
            // register interest before checking, so a concurrent send can't be missed
            let notified = self.inner.notify.notified();
            if let Some(value) = self.try_recv() {
                return value;
            }
            notified.await;
        }
    }

    /// Dequeues every value currently in the channel.
    pub fn drain_all(&self) -> Vec<i64> {
        self.inner.queue.lock().drain(..).collect()
    }

    /// The number of values currently queued.
    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Whether the channel is currently empty.
    pub fn is_empty(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Whether `self` and `other` are handles to the same queue.
    pub fn same_channel(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").field("queue", &*self.inner.queue.lock()).finish()
    }
}
