//! One-shot MQTT publishing.

use crate::config::MqttConfig;
use crate::error::{PublisherError, Result};
use async_trait::async_trait;
use log::{debug, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;

/// Something that can deliver a payload to a topic.
#[async_trait]
pub trait Publish: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
}

/// MQTT publisher that opens a fresh connection for every message.
///
/// Each call connects, publishes, waits for the acknowledgement the QoS
/// level requires and disconnects again, so a broker outage only affects
/// the calls made while it lasts.
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    options: MqttOptions,
    qos: QoS,
    retain: bool,
    timeout: Duration,
}

impl MqttPublisher {
    /// Create a new publisher from configuration.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        // Set credentials if provided
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                options.set_credentials(username, password);
            }
            (None, None) => {}
            _ => warn!("[MQTT] Username and password must both be set, connecting anonymously"),
        }

        Self {
            options,
            qos: qos_from_level(config.qos),
            retain: config.retain,
            timeout: config.timeout(),
        }
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    async fn exchange(&self, topic: &str, payload: &str) -> Result<()> {
        let (client, mut event_loop) = AsyncClient::new(self.options.clone(), 10);
        client
            .publish(topic, self.qos, self.retain, payload.as_bytes().to_vec())
            .await?;
        drive(&client, &mut event_loop, self.qos).await
    }
}

#[async_trait]
impl Publish for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        debug!("[MQTT] Publishing to {}: {}", topic, payload);
        tokio::time::timeout(self.timeout, self.exchange(topic, payload))
            .await
            .map_err(|_| PublisherError::Timeout(self.timeout))?
    }
}

/// Poll the event loop until the queued publish is delivered and the
/// disconnect has gone out.
async fn drive(client: &AsyncClient, event_loop: &mut EventLoop, qos: QoS) -> Result<()> {
    loop {
        let delivered = match event_loop.poll().await? {
            Event::Incoming(Packet::ConnAck(ack)) => {
                debug!("[MQTT] Connected: {:?}", ack.code);
                false
            }
            Event::Outgoing(Outgoing::Publish(_)) => qos == QoS::AtMostOnce,
            Event::Incoming(Packet::PubAck(_)) => qos == QoS::AtLeastOnce,
            Event::Incoming(Packet::PubComp(_)) => qos == QoS::ExactlyOnce,
            Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
            _ => false,
        };

        if delivered {
            client.disconnect().await?;
        }
    }
}

fn qos_from_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        other => {
            warn!("[MQTT] Unsupported QoS level {}, using 0", other);
            QoS::AtMostOnce
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_qos_levels() {
        assert_eq!(qos_from_level(0), QoS::AtMostOnce);
        assert_eq!(qos_from_level(1), QoS::AtLeastOnce);
        assert_eq!(qos_from_level(2), QoS::ExactlyOnce);
        assert_eq!(qos_from_level(7), QoS::AtMostOnce);
    }

    #[test]
    fn test_publisher_options() {
        let mut config = Config::default().mqtt;
        config.broker_host = "broker.local".to_string();
        config.broker_port = 1884;
        config.username = Some("sensor".to_string());
        config.password = Some("secret".to_string());
        config.qos = 1;

        let publisher = MqttPublisher::new(&config);
        assert_eq!(
            publisher.options.broker_address(),
            ("broker.local".to_string(), 1884)
        );
        assert_eq!(publisher.qos(), QoS::AtLeastOnce);
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails() {
        // Bind then drop a listener to get a local port nobody is accepting on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut config = Config::default().mqtt;
        config.broker_host = "127.0.0.1".to_string();
        config.broker_port = port;
        config.timeout_seconds = 5;

        let publisher = MqttPublisher::new(&config);
        let err = publisher.publish("temperature/1", "21.0").await.unwrap_err();
        assert!(!err.is_read_failure());
    }
}
