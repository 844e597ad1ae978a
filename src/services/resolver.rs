use std::collections::BTreeSet;

use crate::domain::category::Category;
use crate::domain::reference::CategoryRef;
use crate::domain::types::{CategoryId, KeyColumn};
use crate::repository::{CategoryKeys, CategoryReader};

use super::CategorizableResult;

/// Turns [`CategoryRef`]s into concrete category ids or records.
///
/// Slug references cost one `slug IN (...)` lookup in the directory; ids and
/// records are used as given. Values the directory does not know are dropped
/// without error.
pub struct CategoryReferenceResolver<'a, R: ?Sized> {
    directory: &'a R,
}

impl<'a, R> CategoryReferenceResolver<'a, R>
where
    R: CategoryReader + ?Sized,
{
    pub fn new(directory: &'a R) -> Self {
        Self { directory }
    }

    /// Canonical id set of `reference`.
    pub fn resolve(&self, reference: &CategoryRef) -> CategorizableResult<BTreeSet<CategoryId>> {
        let ids = match reference {
            CategoryRef::ById(id) => BTreeSet::from([*id]),
            CategoryRef::ByIdList(ids) => ids.iter().copied().collect(),
            CategoryRef::BySlug(_) | CategoryRef::BySlugList(_) => self
                .hydrate(reference)?
                .into_iter()
                .map(|c| c.id)
                .collect(),
            CategoryRef::ByEntity(category) => BTreeSet::from([category.id]),
            CategoryRef::ByEntitySet(set) => set.iter().map(|c| c.id).collect(),
            CategoryRef::None => BTreeSet::new(),
        };
        log::debug!("Resolved {} reference value(s) to {ids:?}", reference.len());
        Ok(ids)
    }

    /// Full records of `reference`.
    ///
    /// Ids and slugs are looked up in the directory (one query), so unknown
    /// values disappear. Records are returned as given.
    pub fn resolve_keeping_original(
        &self,
        reference: &CategoryRef,
    ) -> CategorizableResult<Vec<Category>> {
        self.hydrate(reference)
    }

    /// Values of `column` for `reference`, as used by owner filters.
    ///
    /// A reference already made of `column` values is passed through without
    /// a lookup.
    pub fn resolve_column(
        &self,
        reference: &CategoryRef,
        column: KeyColumn,
    ) -> CategorizableResult<CategoryKeys> {
        let keys = match (reference, column) {
            (CategoryRef::BySlug(slug), KeyColumn::Slug) => {
                CategoryKeys::Slugs(vec![slug.clone()])
            }
            (CategoryRef::BySlugList(slugs), KeyColumn::Slug) => {
                CategoryKeys::Slugs(slugs.clone())
            }
            (CategoryRef::ById(id), KeyColumn::Id) => CategoryKeys::Ids(vec![*id]),
            (CategoryRef::ByIdList(ids), KeyColumn::Id) => CategoryKeys::Ids(ids.clone()),
            (CategoryRef::None, _) => CategoryKeys::empty(column),
            _ => {
                let categories = self.hydrate(reference)?;
                match column {
                    KeyColumn::Slug => {
                        CategoryKeys::Slugs(categories.into_iter().map(|c| c.slug).collect())
                    }
                    KeyColumn::Id => {
                        CategoryKeys::Ids(categories.into_iter().map(|c| c.id).collect())
                    }
                }
            }
        };
        Ok(keys)
    }

    fn hydrate(&self, reference: &CategoryRef) -> CategorizableResult<Vec<Category>> {
        let categories = match reference {
            CategoryRef::ById(id) => self.directory.list_categories_by_ids(&[*id])?,
            CategoryRef::ByIdList(ids) => self.directory.list_categories_by_ids(ids)?,
            CategoryRef::BySlug(slug) => self
                .directory
                .list_categories_by_slugs(std::slice::from_ref(slug))?,
            CategoryRef::BySlugList(slugs) => self.directory.list_categories_by_slugs(slugs)?,
            CategoryRef::ByEntity(category) => vec![category.clone()],
            CategoryRef::ByEntitySet(set) => set.clone(),
            CategoryRef::None => Vec::new(),
        };
        Ok(categories)
    }
}
