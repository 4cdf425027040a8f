use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use crate::config::ScheduleConfig;
use crate::price_infra::orchestrator::{CycleReport, Orchestrator};
use crate::types::Group;
use crate::utils::task_supervisor::TaskSupervisor;

/// Fires the orchestrator for one group on a fixed period. Each group gets its
/// own ticker, so a cycle stuck on a fetch holds back only that group.
pub struct RefreshTicker {
    orchestrator: Arc<Orchestrator>,
    group: Group,
    interval: Duration,
}

impl RefreshTicker {
    pub fn new(orchestrator: Arc<Orchestrator>, group: Group, interval: Duration) -> Self {
        RefreshTicker {
            orchestrator,
            group,
            interval,
        }
    }

    /// Tick until shutdown. The first tick is one period out; startup runs
    /// its own warm-up pass.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                report = self.orchestrator.refresh(self.group) => {
                    tracing::debug!(
                        group = %self.group,
                        written = report.written.len(),
                        "Scheduled refresh done"
                    );
                }
            }
        }

        tracing::info!(group = %self.group, "Refresh ticker stopped");
    }
}

/// One ticker per group at its cadence class, plus the warm-up pass at startup.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    schedule: ScheduleConfig,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, schedule: ScheduleConfig) -> Self {
        Scheduler {
            orchestrator,
            schedule,
        }
    }

    /// Run every group once so the cache is warm before the first tick.
    pub async fn warm_up(&self) -> Vec<CycleReport> {
        let reports = self.orchestrator.refresh_all().await;
        let written: usize = reports.iter().map(|r| r.written.len()).sum();
        tracing::info!(written, "Warm-up refresh complete");
        reports
    }

    fn interval(&self, group: Group) -> Duration {
        match group {
            Group::Gold | Group::Silver | Group::Crypto => self.schedule.spot_interval(),
            Group::Fx => self.schedule.fx_interval(),
            Group::Metals => self.schedule.metals_interval(),
            Group::Energy => self.schedule.energy_interval(),
        }
    }

    pub fn tickers(&self) -> Vec<(String, RefreshTicker)> {
        Group::ALL
            .into_iter()
            .map(|group| {
                let ticker =
                    RefreshTicker::new(self.orchestrator.clone(), group, self.interval(group));
                (format!("refresh_{group}"), ticker)
            })
            .collect()
    }

    /// Every ticker as a supervised task, with the warm-up pass alongside.
    pub fn spawn(self, supervisor: &mut TaskSupervisor, shutdown: watch::Receiver<bool>) {
        for (name, ticker) in self.tickers() {
            supervisor.spawn(name, ticker.run(shutdown.clone()));
        }
        supervisor.spawn_oneshot("warm_up", async move {
            self.warm_up().await;
        });
    }
}
