use std::{sync::Arc, time::Duration};

use charge_reminder::{
    appsettings::AppSettings,
    battery::SysfsBatteryProvider,
    clock::LocalClock,
    console,
    delivery::{AlertDispatcher, AlertSound, CommandSoundPlayer, DesktopNotificationChannel},
    scheduling::{BatteryReminderScheduler, PollerServices},
};
use tokio::io::{self, BufReader};

fn create_scheduler(settings: &AppSettings) -> BatteryReminderScheduler {
    let channel = Arc::new(DesktopNotificationChannel::new(&settings.notification.app_name));
    let mut dispatcher =
        AlertDispatcher::new(channel).with_notification_timeout(settings.notification_timeout());
    if settings.sound.enabled {
        dispatcher = dispatcher.with_sound(AlertSound {
            player: Arc::new(CommandSoundPlayer::new(&settings.sound.player)),
            asset: settings.sound.asset.clone(),
        });
    }

    let services = PollerServices {
        battery: Arc::new(SysfsBatteryProvider::new(&settings.battery.sysfs_root)),
        clock: Arc::new(LocalClock),
        dispatcher: Arc::new(dispatcher),
    };

    BatteryReminderScheduler::new(services, settings.poll_interval())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(settings));

    // A pending stdin read cannot be cancelled, don't wait for it.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run(settings: AppSettings) -> anyhow::Result<()> {
    log::info!("Starting charge reminder");

    let mut scheduler = create_scheduler(&settings);
    if let Some(input) = &settings.reminder {
        if let Err(error) = scheduler.capture(input).await {
            log::error!("Reminder from settings is invalid: {}", error.reason());
        }
    }

    println!("{}", console::USAGE);
    tokio::select! {
        result = console::run(&mut scheduler, BufReader::new(io::stdin())) => {
            result?;
            log::info!("Input closed, running until interrupted");
            tokio::signal::ctrl_c().await?;
        }
        result = tokio::signal::ctrl_c() => result?,
    }

    log::info!("Shutting down");
    scheduler.disarm().await;

    Ok(())
}
