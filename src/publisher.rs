//! The sensor publishing loop.
//!
//! Every poll interval the loop reads the sensor once and, when the sensor
//! reported a valid value, publishes it. A failed iteration is logged and
//! the loop carries on with the next one.

use crate::config::Config;
use crate::error::Result;
use crate::mqtt::{PayloadFormat, Publish};
use crate::sensor::{Reading, W1Device};
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

/// Counters collected over the lifetime of a loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub published: u64,
    pub failures: u64,
}

pub struct SensorLoop<P> {
    device: W1Device,
    publisher: P,
    topic: String,
    format: PayloadFormat,
    interval: Duration,
}

impl<P: Publish> SensorLoop<P> {
    pub fn new(device: W1Device, publisher: P, config: &Config) -> Self {
        Self {
            device,
            publisher,
            topic: config.mqtt.topic.clone(),
            format: config.mqtt.payload_format,
            interval: config.sensor.poll_interval(),
        }
    }

    /// Override the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Read the sensor once and publish the value if there is one.
    pub async fn run_iteration(&self) -> Result<Option<Reading>> {
        let Some(reading) = self.device.read().await? else {
            return Ok(None);
        };

        let payload = self.format.render(&reading)?;
        self.publisher.publish(&self.topic, &payload).await?;
        Ok(Some(reading))
    }

    /// Sleep, read, publish, repeat until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> LoopStats
    where
        F: Future<Output = ()>,
    {
        let mut stats = LoopStats::default();
        tokio::pin!(shutdown);

        info!(
            "[W1] Publishing {} to '{}' every {:?}",
            self.device.path().display(),
            self.topic,
            self.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("[W1] Sensor loop stopped after {} iteration(s)", stats.iterations);
                    return stats;
                }
                outcome = self.tick() => {
                    stats.iterations += 1;
                    match outcome {
                        Ok(Some(reading)) => {
                            stats.published += 1;
                            info!("[MQTT] Published {}°C to {}", reading, self.topic);
                        }
                        Ok(None) => debug!("[W1] No valid reading this iteration"),
                        Err(e) if e.is_read_failure() => {
                            stats.failures += 1;
                            warn!("[W1] Sensor read failed: {}", e);
                        }
                        Err(e) => {
                            stats.failures += 1;
                            warn!("[MQTT] Publish failed: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn tick(&self) -> Result<Option<Reading>> {
        tokio::time::sleep(self.interval).await;
        self.run_iteration().await
    }
}
