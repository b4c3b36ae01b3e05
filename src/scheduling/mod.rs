mod poller;
mod scheduler;

pub use poller::{evaluate_tick, PollerState, PollerStatus, SkipReason, TickOutcome};
pub use scheduler::{BatteryReminderScheduler, PollerServices, ScheduledTask, DEFAULT_POLL_INTERVAL};
