use crate::mqtt::PayloadFormat;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

fn load_dotenv_from(env_path: &Path) {
    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the async runtime starts any threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            pairs.push((key, value));
        }
    }

    pairs
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub sensor: SensorConfig,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
    /// 0, 1 or 2. Anything else falls back to at-most-once.
    pub qos: u8,
    pub retain: bool,
    pub timeout_seconds: u64,
    pub payload_format: PayloadFormat,
}

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub device_glob: String,
    pub device_file_name: String,
    /// Explicit path to a `w1_slave` file; skips discovery when set.
    pub device_file: Option<PathBuf>,
    pub poll_interval_seconds: u64,
}

impl MqttConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl SensorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            mqtt: MqttConfig {
                broker_host: "192.168.1.50".to_string(),
                broker_port: 1883,
                client_id: format!("w1-mqtt-publisher-{}", &suffix[..8]),
                username: None,
                password: None,
                topic: "temperature/1".to_string(),
                qos: 0,
                retain: false,
                timeout_seconds: 10,
                payload_format: PayloadFormat::Plain,
            },
            sensor: SensorConfig {
                device_glob: "/sys/bus/w1/devices/28-*".to_string(),
                device_file_name: "w1_slave".to_string(),
                device_file: None,
                poll_interval_seconds: 20,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // MQTT configuration
        if let Some(host) = lookup("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = parse_var(&lookup, "MQTT_BROKER_PORT") {
            config.mqtt.broker_port = port;
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Some(username) = lookup("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = lookup("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Some(topic) = lookup("MQTT_TOPIC") {
            config.mqtt.topic = topic;
        }
        if let Some(qos) = parse_var(&lookup, "MQTT_QOS") {
            config.mqtt.qos = qos;
        }
        if let Some(retain) = parse_var(&lookup, "MQTT_RETAIN") {
            config.mqtt.retain = retain;
        }
        if let Some(timeout) = parse_var(&lookup, "MQTT_TIMEOUT_SECONDS") {
            config.mqtt.timeout_seconds = timeout;
        }
        if let Some(format) = parse_var(&lookup, "PAYLOAD_FORMAT") {
            config.mqtt.payload_format = format;
        }

        // Sensor configuration
        if let Some(interval) = parse_var(&lookup, "POLL_INTERVAL_SECONDS") {
            config.sensor.poll_interval_seconds = interval;
        }
        if let Some(pattern) = lookup("W1_DEVICE_GLOB") {
            config.sensor.device_glob = pattern;
        }
        if let Some(path) = lookup("W1_DEVICE_FILE") {
            config.sensor.device_file = Some(PathBuf::from(path));
        }

        config
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.mqtt.broker_host, "192.168.1.50");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.mqtt.topic, "temperature/1");
        assert_eq!(config.mqtt.qos, 0);
        assert!(!config.mqtt.retain);
        assert!(config.mqtt.username.is_none());
        assert!(config.mqtt.client_id.starts_with("w1-mqtt-publisher-"));
        assert_eq!(config.mqtt.payload_format, PayloadFormat::Plain);
        assert_eq!(config.sensor.poll_interval(), Duration::from_secs(20));
        assert_eq!(config.sensor.device_glob, "/sys/bus/w1/devices/28-*");
        assert!(config.sensor.device_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MQTT_BROKER_HOST", "broker.local"),
            ("MQTT_BROKER_PORT", "8883"),
            ("MQTT_USERNAME", "sensor"),
            ("MQTT_PASSWORD", "secret"),
            ("MQTT_TOPIC", "garage/temperature"),
            ("MQTT_QOS", "1"),
            ("MQTT_RETAIN", "true"),
            ("PAYLOAD_FORMAT", "json"),
            ("POLL_INTERVAL_SECONDS", "60"),
            ("W1_DEVICE_FILE", "/tmp/w1_slave"),
        ]));

        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("sensor"));
        assert_eq!(config.mqtt.password.as_deref(), Some("secret"));
        assert_eq!(config.mqtt.topic, "garage/temperature");
        assert_eq!(config.mqtt.qos, 1);
        assert!(config.mqtt.retain);
        assert_eq!(config.mqtt.payload_format, PayloadFormat::Json);
        assert_eq!(config.sensor.poll_interval_seconds, 60);
        assert_eq!(
            config.sensor.device_file,
            Some(PathBuf::from("/tmp/w1_slave"))
        );
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("MQTT_BROKER_PORT", "not-a-port"),
            ("POLL_INTERVAL_SECONDS", "-5"),
        ]));
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.sensor.poll_interval_seconds, 20);
    }

    #[test]
    fn test_parse_dotenv() {
        let content = "\
# broker settings
MQTT_BROKER_HOST = 10.0.0.2
MQTT_PASSWORD=\"pass with spaces\"
MQTT_TOPIC='living room/temp'

NOT A PAIR
";
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("MQTT_BROKER_HOST", "10.0.0.2"),
                ("MQTT_PASSWORD", "pass with spaces"),
                ("MQTT_TOPIC", "living room/temp"),
            ]
        );
    }
}
