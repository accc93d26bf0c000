//! ATS Panel: Main Entry Point
//!
//! Hexagonal architecture with a single-threaded async core.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimGpio          JsonFlagStore    LogNotificationSink         │
//! │  (GpioPort)       (FlagStore)      (NotificationSink)          │
//! │  SimStatusClient  trap feed (stdin, own thread)                │
//! │  (StatusQuery)                                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   PanelOrchestrator ──▶ ActuatorRegistry (pure logic)  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  LocalExecutor: orchestrator · poll loop · button loop ·       │
//! │                 blink loops · buzzer loop                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are read as NDJSON from stdin; end of input shuts the
//! panel down.
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{info, warn};

use ats_panel::adapters::flag_store::JsonFlagStore;
use ats_panel::adapters::log_sink::LogNotificationSink;
use ats_panel::adapters::sim_gpio::SimGpio;
use ats_panel::adapters::sim_status::SimStatusClient;
use ats_panel::adapters::trap_feed::run_trap_feed;
use ats_panel::alarms::Classifier;
use ats_panel::app::service::PanelOrchestrator;
use ats_panel::config::PanelConfig;
use ats_panel::drivers::actuators::{ActuatorRegistry, PanelExecutor};
use ats_panel::drivers::button::run_button_loop;
use ats_panel::events::PANEL_EVENTS;
use ats_panel::poller::{StatusPoller, run_poll_loop};

/// Config file used when `ATS_PANEL_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "panel_config.json";

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  ATS Panel v{:<25}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config_path =
        std::env::var_os("ATS_PANEL_CONFIG").map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = PanelConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    // ── 3. Persisted flags (or an empty store) ────────────────
    let flags = match JsonFlagStore::open(&config.flags_path) {
        Ok(store) => store,
        Err(e) => {
            warn!("Flag store unusable ({}), starting with cleared flags", e);
            JsonFlagStore::empty(&config.flags_path)
        }
    };
    let restored = flags.snapshot();
    info!(
        "Flags from {}: alarm_status={}, buzzer_muted={}",
        flags.path().display(),
        restored.alarm_status,
        restored.buzzer_muted
    );

    // ── 4. Notification feed thread ───────────────────────────
    let classifier = Classifier::new(config.ups.allowed_sources.clone());
    std::thread::Builder::new()
        .name("trap-feed".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            run_trap_feed(stdin.lock(), &classifier, &PANEL_EVENTS);
        })
        .context("spawning trap feed thread")?;

    // ── 5. Executor, actuators and producers ──────────────────
    let executor: Rc<PanelExecutor<'_>> = Rc::new(PanelExecutor::new());
    let registry = ActuatorRegistry::new(executor.clone(), SimGpio::new(), &config)
        .context("initialising panel actuators")?;

    let poller = StatusPoller::new(SimStatusClient::healthy_ats(), config.device_family, config.poll_timeout());
    executor
        .spawn(run_poll_loop(poller, &PANEL_EVENTS, config.poll_interval()))
        .detach();
    executor
        .spawn(run_button_loop(registry.gpio(), &PANEL_EVENTS, &config))
        .detach();

    // ── 6. Orchestrator (single consumer) ─────────────────────
    let mut orchestrator = PanelOrchestrator::new(registry, flags, LogNotificationSink::new(), config.clone());
    futures_lite::future::block_on(executor.run(async move {
        orchestrator.start().await;
        orchestrator.run(&PANEL_EVENTS).await;
    }));

    info!("ATS Panel stopped");
    Ok(())
}
