use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use diesel::result::DatabaseErrorKind;
use diesel::result::Error::DatabaseError;

use crate::domain::category::{Category, NewCategory};
use crate::domain::owner::OwnerKey;
use crate::domain::types::{CategoryId, CategorySlug, OwnerId};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    AssociationReader, AssociationWriter, CategoryReader, CategoryWriter, OwnerFilter,
    OwnerListQuery,
};

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    links: BTreeMap<OwnerKey, BTreeSet<CategoryId>>,
    lookups: usize,
    fail_writes: bool,
}

/// Simple in-memory repository used for unit tests.
#[derive(Default)]
pub struct TestRepository {
    state: Mutex<State>,
}

impl TestRepository {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            state: Mutex::new(State {
                categories,
                ..State::default()
            }),
        }
    }

    /// Pre-populate associations for an owner.
    pub fn with_links(self, owner: OwnerKey, ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.lock()
            .links
            .entry(owner)
            .or_default()
            .extend(ids);
        self
    }

    /// Make every association write fail.
    pub fn failing_writes(self) -> Self {
        self.lock().fail_writes = true;
        self
    }

    /// Number of directory lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lock().lookups
    }

    /// Raw associated ids of an owner.
    pub fn linked_ids(&self, owner: &OwnerKey) -> BTreeSet<CategoryId> {
        self.lock().links.get(owner).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn guard_writes(state: &State) -> RepositoryResult<()> {
        if state.fail_writes {
            return Err(RepositoryError::Database(DatabaseError(
                DatabaseErrorKind::ReadOnlyTransaction,
                Box::new("writes disabled".to_string()),
            )));
        }
        Ok(())
    }
}

impl CategoryReader for TestRepository {
    fn list_categories_by_ids(&self, ids: &[CategoryId]) -> RepositoryResult<Vec<Category>> {
        let mut state = self.lock();
        state.lookups += 1;
        Ok(state
            .categories
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    fn list_categories_by_slugs(
        &self,
        slugs: &[CategorySlug],
    ) -> RepositoryResult<Vec<Category>> {
        let mut state = self.lock();
        state.lookups += 1;
        Ok(state
            .categories
            .iter()
            .filter(|c| slugs.contains(&c.slug))
            .cloned()
            .collect())
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        Ok(self.lock().categories.iter().find(|c| c.id == id).cloned())
    }

    fn get_category_by_slug(&self, slug: &CategorySlug) -> RepositoryResult<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|c| &c.slug == slug)
            .cloned())
    }
}

impl CategoryWriter for TestRepository {
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        let mut state = self.lock();
        let next = state.categories.iter().map(|c| c.id.get()).max().unwrap_or(0) + 1;
        let created = Category {
            id: CategoryId::new(next)?,
            slug: category.slug.clone(),
            name: category.name.clone(),
            created_at: Some(category.created_at),
            updated_at: Some(category.updated_at),
        };
        state.categories.push(created.clone());
        Ok(created)
    }
}

impl AssociationReader for TestRepository {
    fn list_owner_categories(&self, owner: &OwnerKey) -> RepositoryResult<Vec<Category>> {
        let state = self.lock();
        let Some(ids) = state.links.get(owner) else {
            return Ok(Vec::new());
        };
        Ok(state
            .categories
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    fn filter_owners(&self, query: &OwnerListQuery) -> RepositoryResult<Vec<OwnerId>> {
        let state = self.lock();
        let categories_of = |owner_id: OwnerId| -> Vec<&Category> {
            let key = OwnerKey::new(query.owner_type.clone(), owner_id);
            let ids = state.links.get(&key);
            state
                .categories
                .iter()
                .filter(|c| ids.is_some_and(|ids| ids.contains(&c.id)))
                .collect()
        };

        Ok(query
            .candidates
            .iter()
            .copied()
            .filter(|owner_id| {
                let owned = categories_of(*owner_id);
                query.filters.iter().all(|filter| match filter {
                    OwnerFilter::WithAll(keys) => keys
                        .singles()
                        .iter()
                        .all(|single| owned.iter().any(|c| single.matches(c))),
                    OwnerFilter::WithAny(keys) => owned.iter().any(|c| keys.matches(c)),
                    OwnerFilter::Without(keys) => !owned.iter().any(|c| keys.matches(c)),
                    OwnerFilter::WithoutAny => owned.is_empty(),
                })
            })
            .collect())
    }
}

impl AssociationWriter for TestRepository {
    fn attach_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize> {
        let mut state = self.lock();
        Self::guard_writes(&state)?;
        let linked = state.links.entry(owner.clone()).or_default();
        Ok(ids.iter().filter(|id| linked.insert(**id)).count())
    }

    fn sync_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize> {
        let mut state = self.lock();
        Self::guard_writes(&state)?;
        let previous = state.links.remove(owner).unwrap_or_default();
        let changed = previous.symmetric_difference(ids).count();
        if !ids.is_empty() {
            state.links.insert(owner.clone(), ids.clone());
        }
        Ok(changed)
    }

    fn detach_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize> {
        let mut state = self.lock();
        Self::guard_writes(&state)?;
        let Some(linked) = state.links.get_mut(owner) else {
            return Ok(0);
        };
        Ok(ids.iter().filter(|id| linked.remove(*id)).count())
    }
}
