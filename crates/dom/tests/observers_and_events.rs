//! Mutation observer delivery and listener lifetimes.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::let_underscore_must_use,
    reason = "tests fail loudly and ignore repeated logger setup"
)]

use dom::{Document, Event, EventKind, MutationKind, ObserveOptions, SelectionRange};
use serde_json::json;

fn dock_document() -> Document {
    Document::parse_html(
        r#"<div id="dockLeft" class="dock"></div>
           <div class="layout__dockl layout--float"><div class="inner"></div></div>"#,
    )
    .expect("fixture parses")
}

#[tokio::test(flavor = "current_thread")]
async fn attribute_filter_limits_records() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let dock = document.query_selector("#dockLeft").unwrap();
    let (observer, mut receiver) = document.create_observer();
    assert!(observer.observe(dock, ObserveOptions::attributes(["class"])));

    document.set_attr(dock, "title", "ignored");
    document.add_class(dock, "dock--vertical");
    document.add_class(dock, "dock--vertical");

    let batch = receiver.next_batch().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].target, dock);
    assert_eq!(
        batch[0].kind,
        MutationKind::Attributes {
            name: "class".to_owned(),
            old_value: Some("dock".to_owned()),
        }
    );
}

#[tokio::test(flavor = "current_thread")]
async fn subtree_registration_sees_descendant_changes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let layout = document.query_selector(".layout__dockl").unwrap();
    let inner = document.query_selector(".inner").unwrap();
    let (observer, mut receiver) = document.create_observer();
    observer.observe(layout, ObserveOptions::subtree(["class"]));

    document.add_class(inner, "active");
    let child = document.append_element(inner, "span").unwrap();
    document.remove_node(child);

    let batch = receiver.next_batch().await.unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].attribute_name(), Some("class"));
    assert!(matches!(&batch[1].kind, MutationKind::ChildList { added, .. } if added == &[child]));
    assert!(matches!(&batch[2].kind, MutationKind::ChildList { removed, .. } if removed == &[child]));
}

#[test]
fn disconnect_is_idempotent_and_stops_delivery() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let dock = document.query_selector("#dockLeft").unwrap();
    let (observer, mut receiver) = document.create_observer();
    observer.observe(dock, ObserveOptions::attributes(["class"]));
    assert_eq!(observer.target_count(), 1);

    observer.disconnect();
    observer.disconnect();
    assert!(!observer.is_connected());
    assert_eq!(document.observer_count(), 0);

    document.add_class(dock, "later");
    assert!(receiver.take_pending().is_empty());
    assert!(!observer.observe(dock, ObserveOptions::attributes(["class"])));
}

#[test]
fn removing_an_observed_target_drops_its_registration() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let dock = document.query_selector("#dockLeft").unwrap();
    let (observer, _receiver) = document.create_observer();
    observer.observe(dock, ObserveOptions::attributes(["class"]));
    document.remove_node(dock);
    assert_eq!(observer.target_count(), 0);
    assert!(!observer.observe(dock, ObserveOptions::attributes(["class"])));
}

#[test]
fn dropping_the_observer_unregisters_it() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let (observer, _receiver) = document.create_observer();
    assert_eq!(document.observer_count(), 1);
    drop(observer);
    assert_eq!(document.observer_count(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn listeners_receive_custom_events_until_dropped() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let kind = EventKind::custom("themeChange");
    let mut subscription = document.listen(kind.clone());
    assert_eq!(document.listener_count(&kind), 1);

    let delivered = document.dispatch(&Event::custom("themeChange", json!({ "isDarkMode": true })));
    assert_eq!(delivered, 1);
    let event = subscription.next().await.unwrap();
    assert_eq!(event.detail["isDarkMode"], true);

    drop(subscription);
    assert_eq!(document.listener_count(&kind), 0);
    assert_eq!(document.dispatch(&Event::new(kind)), 0);
}

#[test]
fn selection_changes_are_dispatched() {
    let _ = env_logger::builder().is_test(true).try_init();
    let document = dock_document();
    let inner = document.query_selector(".inner").unwrap();
    let layout = document.query_selector(".layout__dockl").unwrap();
    let mut subscription = document.listen(EventKind::SelectionChange);

    document.set_selection(Some(SelectionRange {
        anchor: inner,
        focus: layout,
    }));
    assert!(subscription.try_next().is_some());
    assert_eq!(document.selection_common_ancestor(), Some(layout));

    document.set_selection(None);
    assert!(subscription.try_next().is_some());
    assert!(document.selection_common_ancestor().is_none());
}
