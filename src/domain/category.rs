use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryId, CategoryName, CategorySlug};

/// Canonical category record served by the category directory.
///
/// Equality is by identity: two records with the same id and slug describe
/// the same category even if their names or timestamps differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: CategorySlug,
    pub name: CategoryName,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Category {
    /// Build a record that has not been timestamped by the store.
    pub fn new(id: CategoryId, slug: CategorySlug, name: CategoryName) -> Self {
        Self {
            id,
            slug,
            name,
            created_at: None,
            updated_at: None,
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.slug == other.slug
    }
}

impl Eq for Category {}

/// Data required to insert a new [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub slug: CategorySlug,
    pub name: CategoryName,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
