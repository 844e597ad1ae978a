use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryId, OwnerId, OwnerType};

/// How a resolved category set is applied to an owner's associations.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Add the given categories, keep everything else.
    Attach,
    /// Replace the owner's categories with exactly the given set.
    Sync,
    /// Remove the given categories; absent ones are ignored.
    Detach,
}

impl ReconcileMode {
    /// Verb used to build event names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Sync => "sync",
            Self::Detach => "detach",
        }
    }
}

impl Display for ReconcileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an event is published before or after the store mutation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Before,
    After,
}

/// Notification describing a change to an owner's category set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEvent {
    /// Full event name, e.g. `categorizable.category.attaching`.
    pub name: String,
    pub phase: EventPhase,
    pub mode: ReconcileMode,
    pub owner_type: OwnerType,
    pub owner_id: OwnerId,
    pub category_ids: BTreeSet<CategoryId>,
}

impl CategoryEvent {
    pub fn new(
        namespace: &str,
        phase: EventPhase,
        mode: ReconcileMode,
        owner_type: OwnerType,
        owner_id: OwnerId,
        category_ids: BTreeSet<CategoryId>,
    ) -> Self {
        Self {
            name: Self::event_name(namespace, phase, mode),
            phase,
            mode,
            owner_type,
            owner_id,
            category_ids,
        }
    }

    /// `<namespace>.<mode>ing` before the mutation, `<namespace>.<mode>ed` after.
    pub fn event_name(namespace: &str, phase: EventPhase, mode: ReconcileMode) -> String {
        let suffix = match phase {
            EventPhase::Before => "ing",
            EventPhase::After => "ed",
        };
        format!("{namespace}.{mode}{suffix}")
    }
}
