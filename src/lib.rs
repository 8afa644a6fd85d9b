//! Smart Sensor Flow - management console for an IoT sensor SaaS
//!
//! Devices, marketplace modules, subscriptions and access control over a
//! mock backend, with multi-step wizards for sign-up, password reset and
//! module submission. Exposed as a terminal UI, a CLI and a REST API.

pub mod app;
pub mod config;
pub mod env_vars;
pub mod icons;
pub mod listing;
pub mod logging;
pub mod rest;
pub mod store;
pub mod types;
pub mod ui;
pub mod wizard;
