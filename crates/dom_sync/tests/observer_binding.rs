//! `DomObserverBinding` batching, stale-target filtering and teardown.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "tests fail loudly on broken fixtures"
)]

use core::cell::RefCell;
use core::time::Duration;
use dom::{Document, MutationRecord, ObserveOptions};
use dom_sync::{Debouncer, DomObserverBinding};
use std::rc::Rc;
use tokio::task::LocalSet;
use tokio::time::sleep;

const WAIT: Duration = Duration::from_millis(300);

type Passes = Rc<RefCell<Vec<Vec<MutationRecord>>>>;

fn fixture() -> Document {
    Document::parse_html(
        r#"<div class="protyle">
             <div class="protyle-top"><div class="protyle-background">
               <div class="protyle-background__img"></div>
               <div class="protyle-background__icon fn__none"></div>
             </div></div>
           </div>"#,
    )
    .unwrap()
}

fn binding(document: &Document) -> (DomObserverBinding, Passes) {
    let passes: Passes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&passes);
    let debouncer = Debouncer::new(WAIT, move |batch| {
        sink.borrow_mut().push(batch);
        async {}
    });
    (DomObserverBinding::new(document, debouncer), passes)
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn bursts_collapse_into_one_pass() {
    LocalSet::new()
        .run_until(async {
            let document = fixture();
            let protyle = document.query_selector(".protyle").unwrap();
            let icon = document.query_selector(".protyle-background__icon").unwrap();
            let (binding, passes) = binding(&document);
            assert!(binding.observe(protyle, ObserveOptions::subtree(["class"])));

            for step in 0..4 {
                document.toggle_class(icon, "fn__none");
                sleep(Duration::from_millis(50)).await;
                assert!(passes.borrow().is_empty(), "no pass during burst step {step}");
            }
            sleep(WAIT).await;
            assert_eq!(passes.borrow().len(), 1);
            // The pass carries the last delivered batch.
            assert_eq!(passes.borrow()[0].len(), 1);
            assert_eq!(passes.borrow()[0][0].target, icon);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn records_on_removed_targets_are_not_forwarded() {
    LocalSet::new()
        .run_until(async {
            let document = fixture();
            let protyle = document.query_selector(".protyle").unwrap();
            let top = document.query_selector(".protyle-top").unwrap();
            let icon = document.query_selector(".protyle-background__icon").unwrap();
            let (binding, passes) = binding(&document);
            binding.observe(protyle, ObserveOptions::subtree(["class"]));

            document.add_class(icon, "gone");
            document.remove_node(top);
            sleep(WAIT * 2).await;

            let passes = passes.borrow();
            assert_eq!(passes.len(), 1);
            assert!(passes[0].iter().all(|record| record.target == protyle));
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn removing_the_observed_target_stops_the_binding_firing() {
    LocalSet::new()
        .run_until(async {
            let document = fixture();
            let top = document.query_selector(".protyle-top").unwrap();
            let icon = document.query_selector(".protyle-background__icon").unwrap();
            let (binding, passes) = binding(&document);
            binding.observe(top, ObserveOptions::subtree(["class"]));
            assert_eq!(binding.target_count(), 1);

            let protyle = document.query_selector(".protyle").unwrap();
            let body = document.parent_element(protyle).unwrap();
            document.remove_node(protyle);
            assert_eq!(binding.target_count(), 0);
            document.add_class(icon, "late");
            document.add_class(body, "late");
            sleep(WAIT * 2).await;
            assert!(passes.borrow().is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn disconnect_is_idempotent_and_cancels_pending_work() {
    LocalSet::new()
        .run_until(async {
            let document = fixture();
            let protyle = document.query_selector(".protyle").unwrap();
            let icon = document.query_selector(".protyle-background__icon").unwrap();
            let (binding, passes) = binding(&document);
            binding.observe(protyle, ObserveOptions::subtree(["class"]));

            document.toggle_class(icon, "fn__none");
            sleep(Duration::from_millis(10)).await;
            binding.disconnect();
            binding.disconnect();
            assert!(!binding.is_connected());
            assert_eq!(document.observer_count(), 0);
            assert!(!binding.observe(protyle, ObserveOptions::subtree(["class"])));

            document.toggle_class(icon, "fn__none");
            sleep(WAIT * 2).await;
            assert!(passes.borrow().is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dropping_the_binding_disconnects() {
    LocalSet::new()
        .run_until(async {
            let document = fixture();
            let protyle = document.query_selector(".protyle").unwrap();
            let (binding, passes) = binding(&document);
            binding.observe(protyle, ObserveOptions::subtree(["class"]));
            drop(binding);
            assert_eq!(document.observer_count(), 0);
            document.add_class(protyle, "x");
            sleep(WAIT * 2).await;
            assert!(passes.borrow().is_empty());
        })
        .await;
}
