use std::{path::PathBuf, time::Duration};

use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File,
};
use serde::Deserialize;

use crate::reminder::ReminderInput;

const MAX_POLL_INTERVAL_SECONDS: u64 = 60;

#[derive(Deserialize, Debug)]
pub struct PollerSettings {
    pub interval_seconds: u64,
}

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    pub app_name: String,
    pub timeout_seconds: u64,
}

#[derive(Deserialize, Debug)]
pub struct SoundSettings {
    pub enabled: bool,
    pub asset: PathBuf,
    pub player: String,
}

#[derive(Deserialize, Debug)]
pub struct BatterySettings {
    pub sysfs_root: PathBuf,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub poller: PollerSettings,
    pub notification: NotificationSettings,
    pub sound: SoundSettings,
    pub battery: BatterySettings,
    /// Armed on startup when present.
    pub reminder: Option<ReminderInput>,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::builder()?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::from_config(builder.build()?)
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("poller.interval_seconds", 10)?
            .set_default("notification.app_name", "Charge Reminder")?
            .set_default("notification.timeout_seconds", 10)?
            .set_default("sound.enabled", true)?
            .set_default("sound.asset", "Alert.mp3")?
            .set_default("sound.player", "paplay")?
            .set_default("battery.sysfs_root", crate::battery::DEFAULT_SYSFS_ROOT)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.poller.interval_seconds;
        if interval == 0 || interval > MAX_POLL_INTERVAL_SECONDS {
            return Err(ConfigError::Message(format!(
                "poller.interval_seconds must be between 1 and {MAX_POLL_INTERVAL_SECONDS}, got {interval}"
            )));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poller.interval_seconds)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification.timeout_seconds)
    }
}
