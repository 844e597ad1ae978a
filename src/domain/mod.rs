//! Persistence-independent domain types.

pub mod category;
pub mod event;
pub mod owner;
pub mod reference;
pub mod types;
