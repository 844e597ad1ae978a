//! Polymorphic category associations for arbitrary domain entities.
//!
//! Owners implementing [`domain::owner::Categorizable`] are linked to
//! categories through the `categorizables` join table. The
//! [`services::reconciler::CategorySetReconciler`] attaches, syncs and
//! detaches categories from typed [`domain::reference::CategoryRef`]s,
//! publishes before/after events, flushes categories queued on unsaved owners
//! and filters owners by category membership. A Diesel/SQLite store is
//! provided by [`repository::DieselRepository`].

pub mod db;
pub mod domain;
mod error_conversions;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
