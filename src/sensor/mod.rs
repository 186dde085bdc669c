//! Temperature sensors read through the Linux one-wire sysfs interface.

pub mod w1;

pub use w1::{Reading, W1Device, parse_w1_slave};
