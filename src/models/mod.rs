//! Diesel row models and runtime configuration.

pub mod categorizable;
pub mod category;
pub mod config;
