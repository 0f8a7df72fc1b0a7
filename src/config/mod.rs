//! config/mod.rs
pub mod mailer_config;
