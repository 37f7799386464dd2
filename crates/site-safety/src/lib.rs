pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod integrations;
pub mod persistence;
pub mod telemetry;
pub mod workflows;
