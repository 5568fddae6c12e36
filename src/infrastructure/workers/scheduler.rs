//! Periodic drivers for the recovery sweeps.

use crate::application::services::RecoveryService;
use crate::config::Config;
use crate::domain::entities::SweepKind;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    pub kind: SweepKind,
    pub every: Duration,
}

impl PeriodicTask {
    pub fn from_config(config: &Config) -> Vec<PeriodicTask> {
        vec![
            PeriodicTask {
                kind: SweepKind::BookedMonitor,
                every: Duration::from_secs(config.monitor_interval_secs),
            },
            PeriodicTask {
                kind: SweepKind::Healer,
                every: Duration::from_secs(config.healer_interval_secs),
            },
            PeriodicTask {
                kind: SweepKind::Reporter,
                every: Duration::from_secs(config.reporter_interval_secs),
            },
            PeriodicTask {
                kind: SweepKind::DailySummary,
                every: Duration::from_secs(config.daily_check_interval_secs),
            },
        ]
    }
}

pub struct Scheduler {
    recovery: RecoveryService,
    tasks: Vec<PeriodicTask>,
}

impl Scheduler {
    pub fn new(recovery: RecoveryService, tasks: Vec<PeriodicTask>) -> Self {
        Self { recovery, tasks }
    }

    /// One loop per task. A failed sweep is logged and retried on the next tick.
    pub fn start(self) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .filter(|task| !task.every.is_zero())
            .map(|task| {
                let recovery = self.recovery.clone();
                tokio::spawn(async move {
                    info!("Scheduling {} every {:?}", task.kind, task.every);
                    let mut ticker = interval(task.every);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    // The first tick completes immediately; skip it so a restart
                    // does not fire every sweep at once.
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        if let Err(e) = recovery.run_sweep(task.kind).await {
                            error!("Sweep {} failed: {}", task.kind, e);
                        }
                    }
                })
            })
            .collect()
    }
}
