//! MQTT output for sensor readings.
//!
//! This module provides the publish seam used by the sensor loop and the
//! rumqttc-backed implementation that talks to the broker.

mod client;
mod payload;

pub use client::{MqttPublisher, Publish};
pub use payload::PayloadFormat;
