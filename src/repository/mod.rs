use std::collections::BTreeSet;

use crate::db::{DbConnection, DbPool};
use crate::domain::category::{Category, NewCategory};
use crate::domain::owner::OwnerKey;
use crate::domain::types::{CategoryId, CategorySlug, KeyColumn, OwnerId, OwnerType};
use crate::repository::errors::RepositoryResult;

pub mod association;
pub mod category;
pub mod errors;
#[cfg(test)]
pub mod test;

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be shared freely between callers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Category key values in one column, ready to be matched by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryKeys {
    Slugs(Vec<CategorySlug>),
    Ids(Vec<CategoryId>),
}

impl CategoryKeys {
    /// Empty key list for `column`.
    pub fn empty(column: KeyColumn) -> Self {
        match column {
            KeyColumn::Slug => Self::Slugs(Vec::new()),
            KeyColumn::Id => Self::Ids(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Slugs(slugs) => slugs.len(),
            Self::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into one single-value key list per value.
    pub fn singles(&self) -> Vec<CategoryKeys> {
        match self {
            Self::Slugs(slugs) => slugs.iter().map(|s| Self::Slugs(vec![s.clone()])).collect(),
            Self::Ids(ids) => ids.iter().map(|id| Self::Ids(vec![*id])).collect(),
        }
    }

    /// True when `category` carries one of the keys.
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            Self::Slugs(slugs) => slugs.contains(&category.slug),
            Self::Ids(ids) => ids.contains(&category.id),
        }
    }
}

/// Store-level owner filter over resolved category keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerFilter {
    /// Owner has a category for every key (one existence check per key).
    WithAll(CategoryKeys),
    /// Owner has a category matching at least one key.
    WithAny(CategoryKeys),
    /// Owner has no category matching any key.
    Without(CategoryKeys),
    /// Owner has no categories at all.
    WithoutAny,
}

/// Query parameters for filtering owners of one type by category membership.
#[derive(Debug, Clone)]
pub struct OwnerListQuery {
    /// Discriminator of the owners being filtered.
    pub owner_type: OwnerType,
    /// Owners to filter; order is preserved in the result.
    pub candidates: Vec<OwnerId>,
    /// Conjunction of filters.
    pub filters: Vec<OwnerFilter>,
}

impl OwnerListQuery {
    pub fn new(owner_type: OwnerType, candidates: Vec<OwnerId>) -> Self {
        Self {
            owner_type,
            candidates,
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: OwnerFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Read-only operations of the category directory.
pub trait CategoryReader {
    /// Categories whose id is in `ids`; unknown ids are skipped.
    fn list_categories_by_ids(&self, ids: &[CategoryId]) -> RepositoryResult<Vec<Category>>;
    /// Categories whose slug is in `slugs`; unknown slugs are skipped.
    fn list_categories_by_slugs(&self, slugs: &[CategorySlug])
    -> RepositoryResult<Vec<Category>>;
    /// Retrieve a category by its identifier.
    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;
    /// Retrieve a category by its slug.
    fn get_category_by_slug(&self, slug: &CategorySlug) -> RepositoryResult<Option<Category>>;
}

/// Write operations of the category directory.
pub trait CategoryWriter {
    /// Persist a new category and return the stored record.
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category>;
}

/// Read operations on owner/category associations.
pub trait AssociationReader {
    /// Categories currently attached to `owner`, ordered by id.
    fn list_owner_categories(&self, owner: &OwnerKey) -> RepositoryResult<Vec<Category>>;
    /// Candidates of `query` that satisfy every filter.
    fn filter_owners(&self, query: &OwnerListQuery) -> RepositoryResult<Vec<OwnerId>>;
}

/// Write operations on owner/category associations.
///
/// Each method returns the number of association rows affected.
pub trait AssociationWriter {
    /// Add associations without removing existing ones.
    fn attach_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize>;
    /// Replace the owner's associations with exactly `ids`.
    fn sync_categories(&self, owner: &OwnerKey, ids: &BTreeSet<CategoryId>)
    -> RepositoryResult<usize>;
    /// Remove the given associations; missing ones are ignored.
    fn detach_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize>;
}
