use chrono::{NaiveDate, NaiveDateTime};

use crate::reminder::{ReminderConfig, ReminderFiringPeriod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerStatus {
    Armed,
    /// Terminal state of a one-shot reminder after it fired.
    Dormant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerState {
    pub last_triggered_date: Option<NaiveDate>,
    pub status: PollerStatus,
}

impl PollerState {
    pub fn armed() -> Self {
        Self {
            last_triggered_date: None,
            status: PollerStatus::Armed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PollerStatus::Armed
    }
}

impl Default for PollerState {
    fn default() -> Self {
        Self::armed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Dormant,
    BatteryUnavailable,
    OutsideTargetMinute,
    AboveThreshold,
    AlreadyFiredToday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Fire { battery_percent: u8 },
    Skip(SkipReason),
}

/// Decides a single poll tick. Skips always return the state untouched.
pub fn evaluate_tick(
    config: &ReminderConfig,
    state: &PollerState,
    now: NaiveDateTime,
    battery_percent: Option<u8>,
) -> (TickOutcome, PollerState) {
    let skip = |reason| (TickOutcome::Skip(reason), *state);

    if !state.is_active() {
        return skip(SkipReason::Dormant);
    }

    let Some(battery_percent) = battery_percent else {
        return skip(SkipReason::BatteryUnavailable);
    };

    if !config.fire_at.matches(&now.time()) {
        return skip(SkipReason::OutsideTargetMinute);
    }

    if !config.threshold.is_reached_by(battery_percent) {
        return skip(SkipReason::AboveThreshold);
    }

    let today = now.date();
    let next_state = match config.period {
        ReminderFiringPeriod::Daily => {
            if state.last_triggered_date == Some(today) {
                return skip(SkipReason::AlreadyFiredToday);
            }
            PollerState {
                last_triggered_date: Some(today),
                status: PollerStatus::Armed,
            }
        }
        ReminderFiringPeriod::OneOff => PollerState {
            last_triggered_date: state.last_triggered_date,
            status: PollerStatus::Dormant,
        },
    };

    (TickOutcome::Fire { battery_percent }, next_state)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeDelta, Timelike};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    use super::*;
    use crate::reminder::{parse_config, ReminderInput};

    fn config(daily: bool) -> ReminderConfig {
        parse_config(&ReminderInput::new("20", "22", "30", daily)).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        day(d).and_time(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    #[test]
    fn one_shot_fires_once_and_goes_dormant() {
        let config = config(false);
        let state = PollerState::armed();

        let (outcome, state) = evaluate_tick(&config, &state, at(1, 22, 30, 0), Some(15));
        assert_eq!(outcome, TickOutcome::Fire { battery_percent: 15 });
        assert_eq!(state.status, PollerStatus::Dormant);

        let (outcome, _) = evaluate_tick(&config, &state, at(1, 22, 30, 10), Some(15));
        assert_eq!(outcome, TickOutcome::Skip(SkipReason::Dormant));

        let (outcome, after) = evaluate_tick(&config, &state, at(2, 22, 30, 0), Some(15));
        assert_eq!(outcome, TickOutcome::Skip(SkipReason::Dormant));
        assert_eq!(after, state);
    }

    #[test]
    fn daily_fires_once_per_day() {
        let config = config(true);
        let state = PollerState::armed();

        let (outcome, state) = evaluate_tick(&config, &state, at(1, 22, 30, 0), Some(20));
        assert_eq!(outcome, TickOutcome::Fire { battery_percent: 20 });
        assert_eq!(state.last_triggered_date, Some(day(1)));
        assert!(state.is_active());

        let (outcome, state) = evaluate_tick(&config, &state, at(1, 22, 30, 50), Some(20));
        assert_eq!(outcome, TickOutcome::Skip(SkipReason::AlreadyFiredToday));

        let (outcome, state) = evaluate_tick(&config, &state, at(2, 22, 30, 5), Some(3));
        assert_eq!(outcome, TickOutcome::Fire { battery_percent: 3 });
        assert_eq!(state.last_triggered_date, Some(day(2)));
    }

    #[test]
    fn unavailable_battery_changes_nothing() {
        for daily in [false, true] {
            let config = config(daily);
            let state = PollerState {
                last_triggered_date: Some(day(1)),
                status: PollerStatus::Armed,
            };

            let (outcome, after) = evaluate_tick(&config, &state, at(2, 22, 30, 0), None);

            assert_eq!(outcome, TickOutcome::Skip(SkipReason::BatteryUnavailable));
            assert_eq!(after, state);
        }
    }

    #[test]
    fn battery_above_threshold_does_not_fire() {
        let config = config(false);
        let state = PollerState::armed();

        let (outcome, after) = evaluate_tick(&config, &state, at(1, 22, 30, 0), Some(21));

        assert_eq!(outcome, TickOutcome::Skip(SkipReason::AboveThreshold));
        assert_eq!(after, state);
    }

    #[test]
    fn neighbouring_minutes_do_not_fire() {
        let config = config(false);
        let state = PollerState::armed();

        for now in [at(1, 22, 29, 59), at(1, 22, 31, 0), at(1, 21, 30, 0), at(1, 23, 30, 0)] {
            let (outcome, _) = evaluate_tick(&config, &state, now, Some(1));
            assert_eq!(outcome, TickOutcome::Skip(SkipReason::OutsideTargetMinute), "now = {now}");
        }
    }

    proptest! {
        #[test]
        fn never_fires_outside_target_minute(
            now in arb::<NaiveDateTime>(),
            battery in 0u8..=100,
            daily in any::<bool>()
        ) {
            let config = config(daily);
            prop_assume!(!(now.hour() == 22 && now.minute() == 30));

            let (outcome, state) = evaluate_tick(&config, &PollerState::armed(), now, Some(battery));

            prop_assert_eq!(outcome, TickOutcome::Skip(SkipReason::OutsideTargetMinute));
            prop_assert_eq!(state, PollerState::armed());
        }

        #[test]
        fn daily_never_fires_twice_within_target_minute(
            date in arb::<NaiveDate>(),
            offsets in proptest::collection::vec(0i64..60, 1..20)
        ) {
            let config = config(true);
            let start = date.and_time(NaiveTime::from_hms_opt(22, 30, 0).unwrap());
            let mut state = PollerState::armed();
            let mut fired = 0;

            for offset in offsets {
                let (outcome, next) = evaluate_tick(&config, &state, start + TimeDelta::seconds(offset), Some(10));
                if matches!(outcome, TickOutcome::Fire { .. }) {
                    fired += 1;
                }
                state = next;
            }

            prop_assert_eq!(fired, 1);
        }
    }
}
