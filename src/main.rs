use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

mod advertisement;
mod ble;
mod config;
mod manager;
mod messages;
mod mqtt;
mod queue;
mod reporter;
mod scanner;
mod tracker;

/// Forwards RB50 button presses seen over BLE to MQTT.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log events instead of publishing them to MQTT
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        pretty_env_logger::init();
    }

    let args = Args::parse();
    let config = config::AppConfig::from_file(&args.config)?;
    let scan_config = config.scan();

    let adapter = ble::first_adapter().await?;
    let source = ble::BtleScanSource::start(adapter, scan_config.scan_timeout()).await?;

    if args.dry_run {
        info!("Dry run, events will only be logged");
        let consumer = manager::Manager::new(source, reporter::LogSink, &scan_config)
            .run_loop()
            .await;
        log_summary(consumer.tracker());
        return Ok(());
    }

    let mqtt_config = config
        .mqtt
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("missing [mqtt] section in {}", args.config.display()))?;
    let (mqtt_client, mut eventloop) = mqtt::MqttClient::new(mqtt_config);

    let mqtt_handle = tokio::task::spawn(async move {
        mqtt::MqttClient::event_loop(&mut eventloop).await;
    });

    let consumer = manager::Manager::new(source, mqtt_client, &scan_config)
        .run_loop()
        .await;
    log_summary(consumer.tracker());

    if let Err(err) = consumer.reporter().sink().disconnect().await {
        warn!("Error disconnecting from MQTT: {:?}", err);
    }
    mqtt_handle.abort();

    Ok(())
}

fn log_summary(tracker: &tracker::SequenceTracker) {
    let state = tracker.state();
    match state.last_accepted() {
        Some(last) if state.initialized() => info!(
            "Last accepted control byte {:02X} from {}",
            last.control_byte, last.address
        ),
        _ => info!("No readings accepted"),
    }
}
