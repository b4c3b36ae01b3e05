use chrono::{Local, NaiveDateTime};

pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time in the device's local timezone.
    fn now(&self) -> NaiveDateTime;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::{Arc, Mutex};

    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use super::Clock;

    /// Manually driven clock shared between a test and the poller.
    #[derive(Clone)]
    pub struct ManualClock(Arc<Mutex<NaiveDateTime>>);

    impl ManualClock {
        pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
            Self(Arc::new(Mutex::new(date.and_time(time))))
        }

        pub fn set(&self, now: NaiveDateTime) {
            *self.0.lock().unwrap() = now;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }
}
