//! Bounded selector waits and listener cleanup in `race_first`.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "tests fail loudly on broken fixtures"
)]

use core::time::Duration;
use dom::{Document, Event, EventKind};
use dom_sync::{Signal, WaitOptions, await_all_selector, await_selector, race_first};
use tokio::task::{LocalSet, spawn_local};
use tokio::time::{Instant, sleep, timeout};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn await_selector_sees_late_elements() {
    LocalSet::new()
        .run_until(async {
            let document = Document::new();
            let body = document.body().unwrap();
            let host = document.clone();
            spawn_local(async move {
                sleep(Duration::from_millis(250)).await;
                let layouts = host.append_element(body, "div").unwrap();
                host.set_attr(layouts, "id", "layouts");
            });

            let start = Instant::now();
            let found = await_selector(&document, "#layouts", WaitOptions::default()).await;
            assert!(found.is_some());
            assert_eq!(start.elapsed(), Duration::from_millis(300));
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn await_selector_gives_up_at_the_timeout() {
    let document = Document::new();
    let start = Instant::now();
    let options = WaitOptions::with_timeout(Duration::from_millis(450));
    assert!(await_selector(&document, "#dockLeft", options).await.is_none());
    assert_eq!(start.elapsed(), Duration::from_millis(450));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn await_all_selector_requires_a_non_empty_match() {
    let document = Document::parse_html(r#"<div data-type="wnd"></div><div data-type="wnd"></div>"#)
        .unwrap();
    let windows = await_all_selector(&document, r#"[data-type="wnd"]"#, WaitOptions::default())
        .await
        .unwrap();
    assert_eq!(windows.len(), 2);
    let none = await_all_selector(&document, ".protyle", WaitOptions::with_timeout(Duration::ZERO))
        .await;
    assert!(none.is_none());
}

fn selection_race(document: &Document) -> Vec<Signal> {
    vec![
        Signal::event(document, EventKind::MouseUp),
        Signal::event(document, EventKind::KeyUp),
        Signal::timeout(Duration::from_millis(300)),
    ]
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn race_winner_is_the_first_signal_and_losers_are_unregistered() {
    LocalSet::new()
        .run_until(async {
            let document = Document::new();
            let signals = selection_race(&document);
            assert_eq!(document.listener_count(&EventKind::MouseUp), 1);
            assert_eq!(document.listener_count(&EventKind::KeyUp), 1);

            let host = document.clone();
            spawn_local(async move {
                sleep(Duration::from_millis(40)).await;
                host.dispatch(&Event::new(EventKind::KeyUp));
            });
            assert_eq!(race_first(signals).await, Some(1));
            assert_eq!(document.listener_count(&EventKind::MouseUp), 0);
            assert_eq!(document.listener_count(&EventKind::KeyUp), 0);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn repeated_races_do_not_leak_listeners() {
    let document = Document::new();
    for _ in 0..20 {
        assert_eq!(race_first(selection_race(&document)).await, Some(2));
    }
    assert_eq!(document.listener_count(&EventKind::MouseUp), 0);
    assert_eq!(document.listener_count(&EventKind::KeyUp), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn abandoning_a_race_releases_every_participant() {
    let document = Document::new();
    let abandoned = timeout(
        Duration::from_millis(100),
        race_first(selection_race(&document)),
    )
    .await;
    assert!(matches!(abandoned, Err(_)));
    assert_eq!(document.listener_count(&EventKind::MouseUp), 0);
    assert_eq!(document.listener_count(&EventKind::KeyUp), 0);
}
