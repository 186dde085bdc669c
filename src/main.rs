use log::{error, info};
use tokio::signal;
use w1_mqtt_publisher::config::{self, Config};
use w1_mqtt_publisher::mqtt::MqttPublisher;
use w1_mqtt_publisher::publisher::SensorLoop;
use w1_mqtt_publisher::{init_logger, resolve_device};

// Single-threaded: the loop is one sequential task, and .env loading below
// runs before any blocking-pool thread exists.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    config::load_dotenv();
    init_logger();
    info!("Starting w1-mqtt-publisher");

    let config = Config::from_env();
    info!("Configuration loaded:");
    info!(
        "  Broker: {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    info!("  Topic: {}", config.mqtt.topic);
    info!("  Payload format: {}", config.mqtt.payload_format);
    info!("  Poll interval: {}s", config.sensor.poll_interval_seconds);

    // Discovery happens once; without a sensor there is nothing to do
    let device = match resolve_device(&config.sensor) {
        Ok(device) => device,
        Err(e) => {
            error!("Failed to locate temperature sensor: {}", e);
            std::process::exit(1);
        }
    };

    let publisher = MqttPublisher::new(&config.mqtt);
    let sensor_loop = SensorLoop::new(device, publisher, &config);

    info!("Press Ctrl+C to exit");

    let stats = sensor_loop
        .run_until(async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => {
                    error!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await;

    info!(
        "w1-mqtt-publisher stopped: {} published, {} failed",
        stats.published, stats.failures
    );
}
