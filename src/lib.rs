//! Bridges IOPGPS GPS trackers into Home Assistant.
//!
//! Every configured account is polled for its trackers; each tracker is published
//! through MQTT discovery as a `device_tracker` plus a battery `sensor`.

pub mod config;
pub mod error;
pub mod home_assistant;
pub mod iopgps_api;
pub mod mqtt_publisher;
pub mod poller;
pub mod processors;
pub mod tracker;
