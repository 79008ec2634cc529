use std::{fmt, time::Duration};

use async_trait::async_trait;
use intcode_config::Configuration;

use super::channel::Channel;

/// Where a VM's Input instruction acquires its values from.
///
/// `acquire` suspends the calling task until a value is ready, or until the source decides to
/// report that nothing is ready yet by returning `None`. A pure blocking source never returns
/// `None`.
#[async_trait]
pub trait InputSource: Send + fmt::Debug {
    /// Acquires the next input value.
    async fn acquire(&mut self) -> Option<i64>;
}

#[async_trait]
impl InputSource for Channel {
    async fn acquire(&mut self) -> Option<i64> {
        Some(self.recv().await)
    }
}

/// A non-blocking input source driven by a caller-supplied poll function.
///
/// When the poll function has nothing ready, the source sleeps for its idle delay (giving
/// producers a chance to run) and reports `None`.
///
/// ```
/// use intcode_vm::core::{channel::Channel, input::{InputSource, Polling}};
/// use std::time::Duration;
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let channel = Channel::with_values([5]);
/// let mut source = Polling::channel(channel, Duration::from_millis(1));
/// assert_eq!(source.acquire().await, Some(5));
/// assert_eq!(source.acquire().await, None);
/// # }
/// ```
pub struct Polling<F> {
    poll: F,
    idle_delay: Duration,
}

impl<F> Polling<F>
where
    F: FnMut() -> Option<i64> + Send,
{
    /// Creates a polling source from a poll function.
    pub fn new(poll: F, idle_delay: Duration) -> Self {
        Self { poll, idle_delay }
    }

    /// Creates a polling source from a poll function, using the configured poll interval.
    pub fn from_config(poll: F, config: &Configuration) -> Self {
        Self::new(poll, config.poll_interval())
    }
}

impl Polling<Box<dyn FnMut() -> Option<i64> + Send>> {
    /// Creates a polling source that drains `channel` without blocking.
    pub fn channel(channel: Channel, idle_delay: Duration) -> Self {
        Self::new(Box::new(move || channel.try_recv()), idle_delay)
    }
}

#[async_trait]
impl<F> InputSource for Polling<F>
where
    F: FnMut() -> Option<i64> + Send,
{
    async fn acquire(&mut self) -> Option<i64> {
        match (self.poll)() {
            Some(value) => Some(value),
            None => {
                tokio::time::sleep(self.idle_delay).await;
                None
            }
        }
    }
}

impl<F> fmt::Debug for Polling<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polling").field("idle_delay", &self.idle_delay).finish_non_exhaustive()
    }
}
