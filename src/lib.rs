// src/lib.rs

pub mod activity;
pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod host;
pub mod logging;
pub mod player;
pub mod progress;
pub mod registry;
pub mod template;
pub mod time;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::clock::SystemClock;
use crate::config::loader::load_and_validate;
use crate::config::model::{ActivityConfig, ConfigFile, TemplateConfig};
use crate::host::{Driver, DriverEvent, MemoryProgressStore, SimulatedPlayer};
use crate::player::{PlayerActivityManager, PlayerProfile, ProgressSink};
use crate::registry::{ActivityRegistry, RegistryListener};
use crate::types::DataCmd;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the shared activity registry
/// - one player manager per `[[player]]`, backed by the in-memory host
/// - the periodic ticker and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let registry = Arc::new(ActivityRegistry::with_clock(
        cfg.engine.time_policy(),
        Arc::new(SystemClock),
    ));
    let listener: Arc<dyn RegistryListener> =
        Arc::new(|config: &ActivityConfig, cmd: DataCmd| {
            info!(activity_id = config.id, ?cmd, "registry changed");
        });
    registry.init(cfg.activity.clone(), Some(listener), None);

    let store = Arc::new(MemoryProgressStore::new());
    let now = registry.now();
    let managers: Vec<PlayerActivityManager> = cfg
        .player
        .iter()
        .map(|seed| {
            let profile = PlayerProfile::new(
                seed.area_id,
                seed.channel,
                seed.register_time.unwrap_or(now),
            );
            let sink: Arc<dyn ProgressSink> = Arc::clone(&store) as Arc<dyn ProgressSink>;
            let mut manager = PlayerActivityManager::new(
                Arc::new(SimulatedPlayer::from_seed(seed)),
                profile,
                Arc::clone(&registry),
                sink,
            );
            manager.init_data(store.load_player(seed.id));
            manager
        })
        .collect();

    let (tx, rx) = mpsc::channel::<DriverEvent>(64);

    // Periodic trigger, then a clean shutdown once all ticks are sent.
    {
        let tx = tx.clone();
        let ticks = args.ticks;
        let period =
            Duration::from_millis(args.tick_interval_ms.unwrap_or(cfg.engine.tick_interval_ms));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            for _ in 0..ticks {
                interval.tick().await;
                if tx.send(DriverEvent::Tick).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(DriverEvent::ShutdownRequested).await;
        });
    }

    // Ctrl-C → graceful shutdown.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(DriverEvent::ShutdownRequested).await;
        });
    }
    drop(tx);

    let mut driver = Driver::new(Arc::clone(&registry), managers, rx);
    driver.run().await?;

    for manager in driver.managers() {
        for view in manager.pack_all_open_activity() {
            info!(
                player_id = manager.player_id(),
                activity_id = view.activity_id,
                name = %view.name,
                state = ?view.state,
                open_day = view.open_day,
                "activity"
            );
        }
    }
    info!(records = store.len(), "progress records at exit");
    Ok(())
}

/// Simple dry-run output: print engine settings, players and activities.
fn print_dry_run(cfg: &ConfigFile) {
    println!("opactivity dry-run");
    println!(
        "  engine.timezone_offset_hours = {}",
        cfg.engine.timezone_offset_hours
    );
    println!(
        "  engine.daily_rollover_hour = {}",
        cfg.engine.daily_rollover_hour
    );
    println!("  engine.tick_interval_ms = {}", cfg.engine.tick_interval_ms);
    println!();

    println!("players ({}):", cfg.player.len());
    for player in cfg.player.iter() {
        println!(
            "  - {} (area {}, channel {})",
            player.id, player.area_id, player.channel
        );
    }
    println!();

    println!("activities ({}):", cfg.activity.len());
    for activity in cfg.activity.iter() {
        println!("  - {} {}", activity.id, activity.name);
        println!("      time_mode: {:?}", activity.time_mode);
        println!(
            "      window: {} / {} / {} / {}",
            activity.prediction_time, activity.start_time, activity.end_time, activity.close_time
        );
        if !activity.areas.is_empty() {
            println!("      areas: {:?}", activity.areas);
        }
        if !activity.channels.is_empty() {
            println!("      channels: {:?}", activity.channels);
        }
        if activity.nested {
            println!("      nested: true");
        }
        if !activity.pre_conditions.is_empty() {
            println!(
                "      pre_conditions: {} (need_all = {})",
                activity.pre_conditions.len(),
                activity.need_all_pre_conditions_finished
            );
        }
        for day in activity.days.iter() {
            let kinds: Vec<&str> = day.templates.iter().map(template_label).collect();
            println!("      day {}: {:?}", day.day, kinds);
        }
    }

    debug!("dry-run complete (no simulation)");
}

fn template_label(template: &TemplateConfig) -> &'static str {
    match template {
        TemplateConfig::Condition(_) => "condition",
        TemplateConfig::SignIn(_) => "sign_in",
        TemplateConfig::Shop(_) => "shop",
    }
}
