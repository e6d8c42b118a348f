//! Bounded waits for DOM readiness and first-of races between signals.

use core::fmt;
use core::future::Future;
use core::time::Duration;
use dom::{Document, EventKind, NodeId};
use futures::FutureExt as _;
use futures::future::{LocalBoxFuture, select_all};
use log::debug;
use tokio::time::{Instant, sleep};

/// Polling cadence and upper bound for a readiness wait.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout: Duration::from_millis(3000),
        }
    }
}

impl WaitOptions {
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout,
        }
    }
}

/// Floor for the polling cadence so a zero interval still lets the clock advance.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Poll `probe` until it yields something or the timeout elapses.
async fn poll_until<T>(options: WaitOptions, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + options.timeout;
    let interval = options.interval.max(MIN_POLL_INTERVAL);
    loop {
        if let Some(found) = probe() {
            return Some(found);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// First element matching `selector`, or `None` once the timeout elapses.
pub async fn await_selector(
    document: &Document,
    selector: &str,
    options: WaitOptions,
) -> Option<NodeId> {
    let found = poll_until(options, || document.query_selector(selector)).await;
    if found.is_none() {
        debug!("no match for {selector:?} within {:?}", options.timeout);
    }
    found
}

/// Every element matching `selector` once at least one exists.
pub async fn await_all_selector(
    document: &Document,
    selector: &str,
    options: WaitOptions,
) -> Option<Vec<NodeId>> {
    let found = poll_until(options, || {
        let matches = document.query_selector_all(selector);
        (!matches.is_empty()).then_some(matches)
    })
    .await;
    if found.is_none() {
        debug!("no matches for {selector:?} within {:?}", options.timeout);
    }
    found
}

/// One participant of a [`race_first`].
///
/// Whatever the signal registered (an event listener, a timer) is released
/// when the signal is dropped.
pub struct Signal {
    future: LocalBoxFuture<'static, ()>,
}

impl fmt::Debug for Signal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Signal")
    }
}

impl Signal {
    /// Fires on the next `kind` event. The listener is registered immediately.
    pub fn event(document: &Document, kind: EventKind) -> Self {
        let mut subscription = document.listen(kind);
        Self::from_future(async move {
            subscription.next().await;
        })
    }

    pub fn timeout(duration: Duration) -> Self {
        Self::from_future(sleep(duration))
    }

    pub fn from_future(future: impl Future<Output = ()> + 'static) -> Self {
        Self {
            future: future.boxed_local(),
        }
    }
}

/// Index of the first signal to fire. The losers are dropped before this
/// returns. `None` if there was nothing to race.
pub async fn race_first(signals: Vec<Signal>) -> Option<usize> {
    if signals.is_empty() {
        return None;
    }
    let ((), winner, losers) = select_all(signals.into_iter().map(|signal| signal.future)).await;
    drop(losers);
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn empty_race_has_no_winner() {
        assert_eq!(race_first(Vec::new()).await, None);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn shortest_timeout_wins() {
        let winner = race_first(vec![
            Signal::timeout(Duration::from_millis(300)),
            Signal::timeout(Duration::from_millis(10)),
        ])
        .await;
        assert_eq!(winner, Some(1));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn zero_interval_still_advances_to_the_timeout() {
        let options = WaitOptions {
            interval: Duration::ZERO,
            timeout: Duration::from_millis(50),
        };
        let started = Instant::now();
        let mut probes = 0_u32;
        let found: Option<()> = poll_until(options, || {
            probes += 1;
            None
        })
        .await;
        assert_eq!(found, None);
        assert_eq!(started.elapsed(), Duration::from_millis(50));
        assert!(probes <= 51, "polled {probes} times");
    }
}
