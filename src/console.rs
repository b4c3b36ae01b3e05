use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    reminder::{ReminderFiringPeriod, ReminderInput},
    scheduling::{BatteryReminderScheduler, PollerStatus},
};

pub const SUCCESS_MESSAGE: &str = "System is running successfully.";
pub const USAGE: &str = "Usage: <battery %> <HH:MM> [daily] | stop | status";
const NOT_CONFIGURED: &str = "No reminder configured.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Configure(ReminderInput),
    Stop,
    Status,
    Help,
    Empty,
}

/// Parses `<percent> <HH:MM | HH MM> [daily]`. Malformed numbers are kept as
/// text so the configuration check reports them.
pub fn parse_line(line: &str) -> ConsoleCommand {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => return ConsoleCommand::Empty,
        ["stop"] => return ConsoleCommand::Stop,
        ["status"] => return ConsoleCommand::Status,
        ["help"] => return ConsoleCommand::Help,
        _ => {}
    }

    let daily_repeat = tokens.last() == Some(&"daily");
    if daily_repeat {
        tokens.pop();
    }

    let (percent, hour, minute) = match tokens.as_slice() {
        [percent, time] => match time.split_once(':') {
            Some((hour, minute)) => (*percent, hour, minute),
            None => (*percent, *time, ""),
        },
        [percent, hour, minute] => (*percent, *hour, *minute),
        [percent] => (*percent, "", ""),
        _ => ("", "", ""),
    };

    ConsoleCommand::Configure(ReminderInput::new(percent, hour, minute, daily_repeat))
}

pub async fn handle_line(scheduler: &mut BatteryReminderScheduler, line: &str) -> Option<String> {
    match parse_line(line) {
        ConsoleCommand::Empty => None,
        ConsoleCommand::Help => Some(USAGE.to_string()),
        ConsoleCommand::Configure(input) => match scheduler.capture(&input).await {
            Ok(_) => Some(format!("Success: {SUCCESS_MESSAGE}")),
            Err(error) => Some(format!("Error: {error}")),
        },
        ConsoleCommand::Stop => {
            let reply = if scheduler.disarm().await {
                "Reminder stopped."
            } else {
                NOT_CONFIGURED
            };
            Some(reply.to_string())
        }
        ConsoleCommand::Status => Some(describe(scheduler)),
    }
}

fn describe(scheduler: &BatteryReminderScheduler) -> String {
    let (Some(config), Some(state)) = (scheduler.config(), scheduler.state()) else {
        return NOT_CONFIGURED.to_string();
    };

    let period = match config.period {
        ReminderFiringPeriod::OneOff => "once",
        ReminderFiringPeriod::Daily => "daily",
    };
    let status = match state.status {
        PollerStatus::Armed => "armed",
        PollerStatus::Dormant => "fired",
    };
    let last = state
        .last_triggered_date
        .map(|date| format!(", last fired {date}"))
        .unwrap_or_default();

    format!(
        "Battery <= {}% at {} ({period}): {status}{last}",
        config.threshold.percent(),
        config.fire_at,
    )
}

/// Feeds lines to the scheduler until the input closes.
pub async fn run<R>(scheduler: &mut BatteryReminderScheduler, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(reply) = handle_line(scheduler, &line).await {
            println!("{reply}");
        }
    }

    log::debug!("Console input closed");
    Ok(())
}
