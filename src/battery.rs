use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/power_supply";

#[async_trait]
pub trait BatteryStatusProvider: Send + Sync + 'static {
    /// Current charge in percent, `None` when the reading is unknown.
    async fn battery_percentage(&self) -> Option<u8>;
}

/// Reads the Linux power-supply class, first `BAT*` entry wins.
pub struct SysfsBatteryProvider {
    root: PathBuf,
}

impl SysfsBatteryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn find_battery(&self) -> anyhow::Result<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut batteries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with("BAT") {
                batteries.push(entry.path());
            }
        }
        batteries.sort();

        Ok(batteries.into_iter().next())
    }

    async fn read_capacity(battery: &Path) -> anyhow::Result<u8> {
        let capacity = tokio::fs::read_to_string(battery.join("capacity")).await?;
        let percent = capacity.trim().parse::<u32>()?;

        Ok(percent.min(100) as u8)
    }
}

impl Default for SysfsBatteryProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

#[async_trait]
impl BatteryStatusProvider for SysfsBatteryProvider {
    async fn battery_percentage(&self) -> Option<u8> {
        let battery = match self.find_battery().await {
            Ok(Some(battery)) => battery,
            Ok(None) => {
                log::debug!("No battery found under {}", self.root.display());
                return None;
            }
            Err(error) => {
                log::debug!("Could not list {}: {error}", self.root.display());
                return None;
            }
        };

        match Self::read_capacity(&battery).await {
            Ok(percent) => Some(percent),
            Err(error) => {
                log::debug!(
                    "Could not read battery capacity. [battery = {}, error = {}]",
                    battery.display(),
                    error
                );
                None
            }
        }
    }
}
