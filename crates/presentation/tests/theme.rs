//! Theme transition class, change broadcast and teardown.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "tests fail loudly on broken fixtures"
)]

use core::time::Duration;
use dom::{Document, EventKind};
use presentation::modules::{Theme, ThemeTransitionModule};
use presentation::{Module, ProjectConfig};
use std::rc::Rc;
use tokio::task::LocalSet;
use tokio::time::sleep;

fn setup() -> (Document, ThemeTransitionModule) {
    let document = Document::new();
    let module = ThemeTransitionModule::new(&document, Rc::new(ProjectConfig::default()));
    (document, module)
}

async fn tick() {
    sleep(Duration::from_millis(1)).await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dark_mode_flip_publishes_change_and_transition_properties() {
    LocalSet::new()
        .run_until(async {
            let (document, mut module) = setup();
            let root = document.document_element().unwrap();
            let mut changes = document.listen(EventKind::custom("themeChange"));
            module.init().unwrap();
            assert!(document.has_class(root, "theme-transition"));
            assert_eq!(module.current_theme(), Theme::Light);

            assert_eq!(module.toggle_theme(), Theme::Dark);
            tick().await;
            let event = changes.try_next().unwrap();
            assert_eq!(event.detail["isDarkMode"], true);
            assert_eq!(
                document.style_property(root, "--theme-transition-duration").as_deref(),
                Some("300ms")
            );
            assert_eq!(
                document.style_property(root, "--theme-transition-timing").as_deref(),
                Some("var(--asri-ease-spring-2)")
            );

            document.remove_class(root, "theme--dark");
            tick().await;
            assert_eq!(changes.try_next().unwrap().detail["isDarkMode"], false);
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unrelated_class_changes_do_not_publish() {
    LocalSet::new()
        .run_until(async {
            let (document, mut module) = setup();
            let root = document.document_element().unwrap();
            let mut changes = document.listen(EventKind::custom("themeChange"));
            module.init().unwrap();

            document.add_class(root, "body--win32");
            document.set_attr(root, "lang", "en");
            tick().await;
            assert!(changes.try_next().is_none());
            assert!(document.style_property(root, "--theme-transition-duration").is_none());
        })
        .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn destroy_disconnects_and_strips_everything() {
    LocalSet::new()
        .run_until(async {
            let (document, mut module) = setup();
            let root = document.document_element().unwrap();
            let mut changes = document.listen(EventKind::custom("themeChange"));
            module.init().unwrap();
            module.toggle_theme();
            tick().await;
            assert!(changes.try_next().is_some());

            module.destroy().unwrap();
            module.destroy().unwrap();
            assert!(!document.has_class(root, "theme-transition"));
            assert!(document.attr(root, "style").is_none());
            assert_eq!(document.observer_count(), 0);

            // The theme itself belongs to the host and stays as it was.
            assert_eq!(module.toggle_theme(), Theme::Light);
            tick().await;
            assert!(changes.try_next().is_none());
            assert!(document.attr(root, "style").is_none());

            // A fresh init starts observing again.
            module.init().unwrap();
            module.toggle_theme();
            tick().await;
            assert!(changes.try_next().is_some());
        })
        .await;
}
