//! Trailing-edge, cancellation and re-entrancy behaviour of `Debouncer`.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::let_underscore_must_use,
    reason = "tests fail loudly and ignore repeated logger setup"
)]

use core::cell::RefCell;
use core::time::Duration;
use dom_sync::{DebounceState, Debouncer};
use std::rc::Rc;
use tokio::task::LocalSet;
use tokio::time::sleep;

const WAIT: Duration = Duration::from_millis(300);

fn recording_debouncer() -> (Debouncer<u32>, Rc<RefCell<Vec<u32>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let debouncer = Debouncer::new(WAIT, move |value| {
        sink.borrow_mut().push(value);
        async {}
    });
    (debouncer, calls)
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn burst_collapses_into_one_run_with_the_last_argument() {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let (debouncer, calls) = recording_debouncer();
            for value in 1..=5 {
                debouncer.invoke(value);
                sleep(Duration::from_millis(100)).await;
            }
            assert!(calls.borrow().is_empty());
            sleep(WAIT).await;
            assert_eq!(*calls.borrow(), [5]);
            sleep(WAIT * 3).await;
            assert_eq!(*calls.borrow(), [5]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn separate_quiet_periods_run_separately() {
    LocalSet::new()
        .run_until(async {
            let (debouncer, calls) = recording_debouncer();
            debouncer.invoke(1);
            sleep(WAIT + Duration::from_millis(10)).await;
            debouncer.invoke(2);
            sleep(WAIT + Duration::from_millis(10)).await;
            assert_eq!(*calls.borrow(), [1, 2]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_is_idempotent_and_has_no_side_effects() {
    LocalSet::new()
        .run_until(async {
            let (debouncer, calls) = recording_debouncer();
            debouncer.cancel();
            debouncer.invoke(1);
            debouncer.cancel();
            debouncer.cancel();
            assert_eq!(debouncer.state(), DebounceState::Idle);
            sleep(WAIT * 2).await;
            assert!(calls.borrow().is_empty());

            // Still usable after cancellation.
            debouncer.invoke(7);
            sleep(WAIT * 2).await;
            assert_eq!(*calls.borrow(), [7]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dropping_the_last_handle_cancels_pending_work() {
    LocalSet::new()
        .run_until(async {
            let (debouncer, calls) = recording_debouncer();
            let clone = debouncer.clone();
            debouncer.invoke(1);
            drop(debouncer);
            sleep(WAIT * 2).await;
            assert_eq!(*calls.borrow(), [1]);

            clone.invoke(2);
            drop(clone);
            sleep(WAIT * 2).await;
            assert_eq!(*calls.borrow(), [1]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn running_work_is_not_aborted_by_a_new_invoke() {
    LocalSet::new()
        .run_until(async {
            let finished = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&finished);
            let debouncer = Debouncer::new(WAIT, move |value: u32| {
                let sink = Rc::clone(&sink);
                async move {
                    sleep(Duration::from_millis(200)).await;
                    sink.borrow_mut().push(value);
                }
            });

            debouncer.invoke(1);
            sleep(WAIT + Duration::from_millis(50)).await;
            assert_eq!(debouncer.state(), DebounceState::Running);

            debouncer.invoke(2);
            assert_eq!(debouncer.state(), DebounceState::Pending);
            sleep(Duration::from_millis(200)).await;
            assert_eq!(*finished.borrow(), [1]);

            sleep(WAIT + Duration::from_millis(200)).await;
            assert_eq!(*finished.borrow(), [1, 2]);
            assert_eq!(debouncer.state(), DebounceState::Idle);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_aborts_a_run_in_flight() {
    LocalSet::new()
        .run_until(async {
            let finished = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&finished);
            let debouncer = Debouncer::new(WAIT, move |value: u32| {
                let sink = Rc::clone(&sink);
                async move {
                    sleep(Duration::from_millis(200)).await;
                    sink.borrow_mut().push(value);
                }
            });
            debouncer.invoke(1);
            sleep(WAIT + Duration::from_millis(50)).await;
            debouncer.cancel();
            sleep(WAIT).await;
            assert!(finished.borrow().is_empty());
            assert_eq!(debouncer.state(), DebounceState::Idle);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn work_may_reschedule_itself() {
    LocalSet::new()
        .run_until(async {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let slot: Rc<RefCell<Option<Debouncer<u32>>>> = Rc::new(RefCell::new(None));
            let sink = Rc::clone(&calls);
            let again = Rc::clone(&slot);
            let debouncer = Debouncer::new(WAIT, move |value: u32| {
                sink.borrow_mut().push(value);
                if value < 3
                    && let Some(debouncer) = again.borrow().as_ref()
                {
                    debouncer.invoke(value + 1);
                }
                async {}
            });
            *slot.borrow_mut() = Some(debouncer.clone());

            debouncer.invoke(1);
            sleep(WAIT * 4).await;
            assert_eq!(*calls.borrow(), [1, 2, 3]);
            slot.borrow_mut().take();
        })
        .await;
}
