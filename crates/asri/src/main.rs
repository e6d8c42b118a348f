//! Loads a host page, runs the default presentation modules against it for a
//! while, then prints the resulting document tree as JSON.

use anyhow::{Context as _, Result, anyhow};
use core::time::Duration;
use dom::{Document, EventKind};
use log::{info, warn};
use presentation::modules::THEME_CHANGE_EVENT;
use presentation::{ProjectConfig, UiStatePatch, default_manager};
use std::env;
use std::fs::read_to_string;
use std::io::{Write as _, stderr, stdout};
use std::path::PathBuf;
use std::rc::Rc;
use tokio::runtime::Builder;
use tokio::task::LocalSet;
use tokio::time::sleep;

/// Default time the modules are left running before teardown.
const DEFAULT_RUN_MS: u64 = 1000;

struct Options {
    page: PathBuf,
    config: Option<PathBuf>,
    run_for: Duration,
}

fn print_usage() {
    drop(writeln!(
        stderr(),
        "Usage:\n  asri <page.html> [--config <config.json>] [--run-ms <millis>]"
    ));
}

/// # Errors
/// Returns an error when the page path is missing or a flag value is malformed.
fn parse_args() -> Result<Options> {
    let mut args = env::args().skip(1);
    let mut page = None;
    let mut config = None;
    let mut run_for = Duration::from_millis(DEFAULT_RUN_MS);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                config = Some(PathBuf::from(path));
            }
            "--run-ms" => {
                let millis = args.next().ok_or_else(|| anyhow!("--run-ms needs a value"))?;
                let millis = millis
                    .parse::<u64>()
                    .with_context(|| format!("invalid --run-ms value {millis}"))?;
                run_for = Duration::from_millis(millis);
            }
            _ if page.is_none() => page = Some(PathBuf::from(arg)),
            other => warn!("ignoring unexpected argument {other}"),
        }
    }
    let page = page.ok_or_else(|| anyhow!("missing page path"))?;
    Ok(Options {
        page,
        config,
        run_for,
    })
}

/// Drive the default modules over `document` until `run_for` elapses.
async fn run(document: &Document, config: &Rc<ProjectConfig>, run_for: Duration) -> Result<()> {
    let mut manager = default_manager(document, config);
    let report = manager.initialize_modules();
    if !report.is_clean() {
        warn!("modules failed to initialize: {:?}", report.failed);
    }
    info!("initialized modules {:?}", report.succeeded);

    let mut theme_changes = document.listen(EventKind::custom(THEME_CHANGE_EVENT));
    let deadline = sleep(run_for);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            () = &mut deadline => break,
            Some(event) = theme_changes.next() => {
                let is_dark = event.detail["isDarkMode"].as_bool().unwrap_or_default();
                manager.update_ui_state(UiStatePatch::dark_mode(is_dark));
                info!("theme changed; ui state now {:?}", manager.ui_state());
            }
        }
    }
    drop(theme_changes);

    let snapshot = document.to_json_string();
    let report = manager.destroy_modules();
    if !report.is_clean() {
        warn!("modules failed to tear down: {:?}", report.failed);
    }
    writeln!(stdout(), "{snapshot}")?;
    Ok(())
}

/// # Errors
/// Returns an error if the arguments, config or page cannot be loaded.
fn main() -> Result<()> {
    env_logger::init();
    let options = match parse_args() {
        Ok(options) => options,
        Err(err) => {
            print_usage();
            return Err(err);
        }
    };

    let config = match &options.config {
        Some(path) => ProjectConfig::from_json_file(path)?,
        None => ProjectConfig::default(),
    }
    .with_env_overrides();
    let html = read_to_string(&options.page)
        .with_context(|| format!("reading page {}", options.page.display()))?;
    let document = Document::parse_html(&html)?;

    let runtime = Builder::new_current_thread().enable_all().build()?;
    let local = LocalSet::new();
    local.block_on(&runtime, run(&document, &Rc::new(config), options.run_for))
}
