use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::poller::{evaluate_tick, PollerState, PollerStatus, TickOutcome};
use crate::{
    battery::BatteryStatusProvider,
    clock::Clock,
    delivery::AlertDispatcher,
    reminder::{parse_config, InvalidConfiguration, ReminderConfig, ReminderInput},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ScheduledTask {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTask {
    pub fn new(task_handle: JoinHandle<()>, cancellation_token: CancellationToken) -> Self {
        Self {
            task_handle,
            cancellation_token,
        }
    }

    /// Lets an in-flight tick finish, aborts the task if it overruns `timeout`.
    pub async fn cancel(mut self, timeout: Duration) {
        self.cancellation_token.cancel();
        if time::timeout(timeout, &mut self.task_handle).await.is_err() {
            log::warn!("Poll task did not stop within {timeout:?}, aborting it");
            self.task_handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }
}

/// Everything a poll tick talks to.
pub struct PollerServices {
    pub battery: Arc<dyn BatteryStatusProvider>,
    pub clock: Arc<dyn Clock>,
    pub dispatcher: Arc<AlertDispatcher>,
}

struct ActivePoller {
    config: ReminderConfig,
    task: ScheduledTask,
    state: watch::Receiver<PollerState>,
}

/// Owns the single poll task. Rearming always cancels the previous one first.
pub struct BatteryReminderScheduler {
    services: Arc<PollerServices>,
    poll_interval: Duration,
    active: Option<ActivePoller>,
    /// Outlives individual pollers so a day never fires twice.
    last_triggered_date: Option<NaiveDate>,
}

impl BatteryReminderScheduler {
    pub fn new(services: PollerServices, poll_interval: Duration) -> Self {
        Self {
            services: Arc::new(services),
            poll_interval,
            active: None,
            last_triggered_date: None,
        }
    }

    /// Validates the input and rearms on success. On failure the running
    /// poller is left as it was.
    pub async fn capture(
        &mut self,
        input: &ReminderInput,
    ) -> Result<ReminderConfig, InvalidConfiguration> {
        let config = parse_config(input).inspect_err(|error| {
            log::info!("Rejected reminder configuration: {}", error.reason());
        })?;

        self.arm(config).await;
        Ok(config)
    }

    /// Replaces the running poller. The daily guard survives rearming and
    /// disarming so a reconfiguration never fires twice on the same day.
    pub async fn arm(&mut self, config: ReminderConfig) {
        self.disarm().await;

        let initial_state = PollerState {
            last_triggered_date: self.last_triggered_date,
            ..PollerState::armed()
        };
        let (state_tx, state_rx) = watch::channel(initial_state);
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();
        let services = Arc::clone(&self.services);
        let poll_interval = self.poll_interval;

        log::info!(
            "Arming battery reminder. [threshold = {}%, fire_at = {}, period = {:?}, interval = {:?}]",
            config.threshold.percent(),
            config.fire_at,
            config.period,
            poll_interval
        );

        let task_handle = tokio::spawn(async move {
            run_poller(config, services, poll_interval, task_cancellation_token, state_tx).await;
        });

        self.active = Some(ActivePoller {
            config,
            task: ScheduledTask::new(task_handle, cancellation_token),
            state: state_rx,
        });
    }

    /// Stops the poll task. Returns false when nothing was armed.
    pub async fn disarm(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        log::info!("Cancelling poller for reminder at {}", active.config.fire_at);
        active.task.cancel(CANCEL_TIMEOUT).await;

        // Read after the task stopped so a tick that was in flight is counted.
        if let Some(date) = active.state.borrow().last_triggered_date {
            self.last_triggered_date = Some(date);
        }
        true
    }

    pub fn config(&self) -> Option<ReminderConfig> {
        self.active.as_ref().map(|active| active.config)
    }

    pub fn state(&self) -> Option<PollerState> {
        self.active.as_ref().map(|active| *active.state.borrow())
    }

    /// True while a poll task is still ticking.
    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }
}

impl Drop for BatteryReminderScheduler {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.task.cancellation_token.cancel();
        }
    }
}

async fn run_poller(
    config: ReminderConfig,
    services: Arc<PollerServices>,
    poll_interval: Duration,
    cancellation_token: CancellationToken,
    state_tx: watch::Sender<PollerState>,
) {
    let mut interval = time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::debug!("Poller for reminder at {} was cancelled", config.fire_at);
                break;
            }
            _ = interval.tick() => {
                let state = *state_tx.borrow();
                let battery_percent = services.battery.battery_percentage().await;
                let now = services.clock.now();

                let (outcome, next_state) = evaluate_tick(&config, &state, now, battery_percent);
                state_tx.send_replace(next_state);

                match outcome {
                    TickOutcome::Fire { battery_percent } => {
                        log::info!(
                            "Battery at {}% at {}, sending alert. [threshold = {}%]",
                            battery_percent,
                            now,
                            config.threshold.percent()
                        );
                        services.dispatcher.dispatch(battery_percent).await;
                    }
                    TickOutcome::Skip(reason) => {
                        log::debug!(
                            "Skipping tick. [now = {}, battery = {:?}, reason = {:?}]",
                            now,
                            battery_percent,
                            reason
                        );
                    }
                }

                if next_state.status == PollerStatus::Dormant {
                    log::info!("One-shot reminder fired, poller is now dormant");
                    break;
                }
            }
        }
    }
}
