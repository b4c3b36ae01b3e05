use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

pub const ALERT_TITLE: &str = "Battery Alert";
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryAlert {
    pub title: String,
    pub message: String,
    pub timeout: Duration,
}

impl BatteryAlert {
    pub fn new(battery_percent: u8, timeout: Duration) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            message: format!("Battery is {battery_percent}%\nTime to charge your phone!"),
            timeout,
        }
    }
}

#[async_trait]
pub trait AlertDeliveryChannel: Send + Sync + 'static {
    async fn send_alert(&self, alert: &BatteryAlert) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AlertSoundPlayer: Send + Sync + 'static {
    async fn play(&self, asset: &Path) -> anyhow::Result<()>;
}

pub struct DesktopNotificationChannel {
    app_name: String,
}

impl DesktopNotificationChannel {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl AlertDeliveryChannel for DesktopNotificationChannel {
    async fn send_alert(&self, alert: &BatteryAlert) -> anyhow::Result<()> {
        let app_name = self.app_name.clone();
        let alert = alert.clone();
        let timeout_ms = u32::try_from(alert.timeout.as_millis()).unwrap_or(u32::MAX);

        // Notification backends block on the session bus.
        tokio::task::spawn_blocking(move || {
            Notification::new()
                .appname(&app_name)
                .summary(&alert.title)
                .body(&alert.message)
                .timeout(Timeout::Milliseconds(timeout_ms))
                .show()
                .map(|_| ())
                .map_err(|error| anyhow::anyhow!("notification was not shown: {error}"))
        })
        .await?
    }
}

/// Plays sounds by spawning an external player such as `paplay`.
pub struct CommandSoundPlayer {
    program: String,
}

impl CommandSoundPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl AlertSoundPlayer for CommandSoundPlayer {
    async fn play(&self, asset: &Path) -> anyhow::Result<()> {
        let mut child = tokio::process::Command::new(&self.program)
            .arg(asset)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    log::warn!("Sound player {program} exited with {status}")
                }
                Err(error) => log::warn!("Sound player {program} failed: {error}"),
                _ => {}
            }
        });

        Ok(())
    }
}

pub struct AlertSound {
    pub player: Arc<dyn AlertSoundPlayer>,
    pub asset: PathBuf,
}

/// Fire-and-forget alert dispatch. Failures are logged, never returned.
pub struct AlertDispatcher {
    channel: Arc<dyn AlertDeliveryChannel>,
    sound: Option<AlertSound>,
    notification_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(channel: Arc<dyn AlertDeliveryChannel>) -> Self {
        Self {
            channel,
            sound: None,
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
        }
    }

    pub fn with_sound(mut self, sound: AlertSound) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn with_notification_timeout(mut self, timeout: Duration) -> Self {
        self.notification_timeout = timeout;
        self
    }

    pub async fn dispatch(&self, battery_percent: u8) {
        let alert = BatteryAlert::new(battery_percent, self.notification_timeout);
        if let Err(error) = self.channel.send_alert(&alert).await {
            log::warn!("Could not deliver battery alert: {error:#}");
        }

        if let Some(sound) = &self.sound {
            Self::play_sound(sound).await;
        }
    }

    async fn play_sound(sound: &AlertSound) {
        // Resolved at fire time so a missing asset never delays startup.
        match tokio::fs::try_exists(&sound.asset).await {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("Alert sound {} does not exist", sound.asset.display());
                return;
            }
            Err(error) => {
                log::warn!("Could not check alert sound {}: {error}", sound.asset.display());
                return;
            }
        }

        if let Err(error) = sound.player.play(&sound.asset).await {
            log::warn!("Could not play alert sound: {error:#}");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingChannel {
        pub alerts: Mutex<Vec<BatteryAlert>>,
        pub fail: bool,
    }

    impl RecordingChannel {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<BatteryAlert> {
            self.alerts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AlertDeliveryChannel for RecordingChannel {
        async fn send_alert(&self, alert: &BatteryAlert) -> anyhow::Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            if self.fail {
                anyhow::bail!("notification service unavailable");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingPlayer {
        pub played: Mutex<Vec<PathBuf>>,
        pub fail: bool,
    }

    #[async_trait]
    impl AlertSoundPlayer for RecordingPlayer {
        async fn play(&self, asset: &Path) -> anyhow::Result<()> {
            self.played.lock().unwrap().push(asset.to_path_buf());
            if self.fail {
                anyhow::bail!("no audio device");
            }
            Ok(())
        }
    }
}
