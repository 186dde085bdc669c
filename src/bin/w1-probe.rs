//! Diagnostic tool for checking a one-wire sensor setup.
//!
//! Usage:
//!   cargo run --bin w1-probe
//!   cargo run --bin w1-probe -- --device /sys/bus/w1/devices/28-0316a2794eff/w1_slave
//!   cargo run --bin w1-probe -- --publish
//!
//! Reads the sensor once and prints the parsed value. With `--publish` the
//! reading is also sent to the broker configured in the environment.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use w1_mqtt_publisher::config::{self, Config};
use w1_mqtt_publisher::error::Result;
use w1_mqtt_publisher::mqtt::{MqttPublisher, Publish};
use w1_mqtt_publisher::{init_logger, resolve_device};

#[derive(Parser)]
#[command(name = "w1-probe")]
#[command(about = "Read a one-wire temperature sensor once")]
struct Cli {
    /// Path to a w1_slave file (skips discovery)
    #[arg(long, env = "W1_DEVICE_FILE")]
    device: Option<PathBuf>,

    /// Device discovery pattern
    #[arg(long, env = "W1_DEVICE_GLOB")]
    glob: Option<String>,

    /// Publish the reading to the configured MQTT topic
    #[arg(long)]
    publish: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    config::load_dotenv();
    init_logger();

    let cli = Cli::parse();
    match probe(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Probe failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn probe(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(device) = cli.device {
        config.sensor.device_file = Some(device);
    }
    if let Some(pattern) = cli.glob {
        config.sensor.device_glob = pattern;
    }

    let device = resolve_device(&config.sensor)?;
    info!("Reading {}", device.path().display());

    let Some(reading) = device.read().await? else {
        info!("Sensor returned no valid reading (CRC check failed or no value)");
        return Ok(());
    };
    println!("{}", reading);

    if cli.publish {
        let payload = config.mqtt.payload_format.render(&reading)?;
        info!(
            "Publishing to {} on {}:{}",
            config.mqtt.topic, config.mqtt.broker_host, config.mqtt.broker_port
        );
        MqttPublisher::new(&config.mqtt)
            .publish(&config.mqtt.topic, &payload)
            .await?;
        info!("Published {}", payload);
    }

    Ok(())
}
