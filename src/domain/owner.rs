use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::category::Category;
use crate::domain::reference::CategoryRef;
use crate::domain::types::{
    CategoryId, CategoryName, KeyColumn, OwnerId, OwnerType, TypeConstraintError,
};

/// Trait for domain entities that can be associated with categories.
///
/// Implementors supply the polymorphic discriminator and primary key that
/// identify a row in the `categorizables` join table, plus a slot for
/// categories assigned before the entity has been persisted.
///
/// ```rust,ignore
/// struct Article {
///     id: Option<OwnerId>,
///     queued: Option<CategoryRef>,
/// }
///
/// impl Categorizable for Article {
///     fn categorizable_type() -> &'static str {
///         "article"
///     }
///
///     fn categorizable_id(&self) -> Option<OwnerId> {
///         self.id
///     }
///
///     fn queued_categories(&mut self) -> &mut Option<CategoryRef> {
///         &mut self.queued
///     }
/// }
/// ```
pub trait Categorizable {
    /// Stable discriminator stored in `categorizable_type`.
    fn categorizable_type() -> &'static str;

    /// Primary key of the entity, `None` while it is not persisted.
    fn categorizable_id(&self) -> Option<OwnerId>;

    /// Categories waiting for the entity to receive an identity.
    fn queued_categories(&mut self) -> &mut Option<CategoryRef>;
}

/// Identity of a persisted owner in the polymorphic join table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerKey {
    pub owner_type: OwnerType,
    pub owner_id: OwnerId,
}

impl OwnerKey {
    pub fn new(owner_type: OwnerType, owner_id: OwnerId) -> Self {
        Self {
            owner_type,
            owner_id,
        }
    }

    /// Key of `owner`, or `None` while it has no identity.
    pub fn of<O: Categorizable>(owner: &O) -> Result<Option<Self>, TypeConstraintError> {
        let Some(owner_id) = owner.categorizable_id() else {
            return Ok(None);
        };
        let owner_type = OwnerType::new(O::categorizable_type())?;
        Ok(Some(Self::new(owner_type, owner_id)))
    }
}

impl Display for OwnerKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.owner_type, self.owner_id)
    }
}

/// Snapshot of the categories currently attached to an owner.
///
/// Membership predicates are evaluated against this snapshot without going
/// back to the store, so they are only as fresh as the last load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedCategories {
    categories: Vec<Category>,
}

impl LoadedCategories {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn ids(&self) -> BTreeSet<CategoryId> {
        self.categories.iter().map(|c| c.id).collect()
    }

    pub fn slugs(&self) -> BTreeSet<&str> {
        self.categories.iter().map(|c| c.slug.as_str()).collect()
    }

    pub fn into_inner(self) -> Vec<Category> {
        self.categories
    }

    /// True when the owner has at least one of the referenced categories.
    pub fn has_any(&self, reference: &CategoryRef) -> bool {
        match reference {
            CategoryRef::BySlug(slug) => self.contains_slug(slug),
            CategoryRef::ById(id) => self.contains_id(*id),
            CategoryRef::ByEntity(category) => self.contains_slug(&category.slug),
            CategoryRef::BySlugList(slugs) => slugs.iter().any(|s| self.contains_slug(s)),
            CategoryRef::ByIdList(ids) => ids.iter().any(|id| self.contains_id(*id)),
            CategoryRef::ByEntitySet(set) => set.iter().any(|c| self.contains_slug(&c.slug)),
            CategoryRef::None => false,
        }
    }

    /// True when the owner's categories are exactly the referenced set.
    ///
    /// Single-value references degrade to a membership test, like
    /// [`Self::has_any`]. Empty references never match.
    pub fn has_all(&self, reference: &CategoryRef) -> bool {
        match reference {
            CategoryRef::BySlug(_) | CategoryRef::ById(_) | CategoryRef::ByEntity(_) => {
                self.has_any(reference)
            }
            CategoryRef::BySlugList(slugs) if !slugs.is_empty() => {
                let wanted: BTreeSet<&str> = slugs.iter().map(|s| s.as_str()).collect();
                self.slugs() == wanted
            }
            CategoryRef::ByIdList(ids) if !ids.is_empty() => {
                let wanted: BTreeSet<CategoryId> = ids.iter().copied().collect();
                self.ids() == wanted
            }
            CategoryRef::ByEntitySet(set) if !set.is_empty() => {
                let wanted: BTreeSet<&str> = set.iter().map(|c| c.slug.as_str()).collect();
                self.slugs() == wanted
            }
            _ => false,
        }
    }

    /// Category names keyed by the requested column.
    pub fn key_map(&self, key: KeyColumn) -> BTreeMap<String, CategoryName> {
        self.categories
            .iter()
            .map(|c| {
                let key = match key {
                    KeyColumn::Slug => c.slug.to_string(),
                    KeyColumn::Id => c.id.to_string(),
                };
                (key, c.name.clone())
            })
            .collect()
    }

    fn contains_slug(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug.as_str() == slug)
    }

    fn contains_id(&self, id: CategoryId) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }
}

impl From<Vec<Category>> for LoadedCategories {
    fn from(categories: Vec<Category>) -> Self {
        Self::new(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CategorySlug;

    fn category(id: i32, slug: &str) -> Category {
        Category::new(
            CategoryId::new(id).unwrap(),
            CategorySlug::new(slug).unwrap(),
            CategoryName::new(slug.to_uppercase()).unwrap(),
        )
    }

    fn loaded() -> LoadedCategories {
        LoadedCategories::new(vec![category(1, "tea"), category(2, "coffee")])
    }

    #[test]
    fn single_values_test_membership() {
        let loaded = loaded();
        let tea = CategoryRef::BySlug(CategorySlug::new("tea").unwrap());
        assert!(loaded.has_any(&tea));
        assert!(loaded.has_all(&tea));
        assert!(loaded.has_all(&CategoryRef::ById(CategoryId::new(2).unwrap())));
        assert!(!loaded.has_any(&CategoryRef::ById(CategoryId::new(9).unwrap())));
        assert!(loaded.has_any(&CategoryRef::ByEntity(category(7, "coffee"))));
    }

    #[test]
    fn lists_require_intersection_for_any() {
        let loaded = loaded();
        assert!(loaded.has_any(&CategoryRef::slugs(["juice", "coffee"]).unwrap()));
        assert!(!loaded.has_any(&CategoryRef::slugs(["juice"]).unwrap()));
        assert!(loaded.has_any(&CategoryRef::ids([5, 1]).unwrap()));
    }

    #[test]
    fn lists_require_equal_sets_for_all() {
        let loaded = loaded();
        assert!(loaded.has_all(&CategoryRef::slugs(["coffee", "tea"]).unwrap()));
        assert!(!loaded.has_all(&CategoryRef::slugs(["tea"]).unwrap()));
        assert!(!loaded.has_all(&CategoryRef::slugs(["tea", "coffee", "juice"]).unwrap()));
        assert!(loaded.has_all(&CategoryRef::ids([2, 1]).unwrap()));
        assert!(loaded.has_all(&CategoryRef::ByEntitySet(vec![
            category(1, "tea"),
            category(2, "coffee"),
        ])));
    }

    #[test]
    fn all_implies_any() {
        let loaded = loaded();
        let references = [
            CategoryRef::slugs(["tea"]).unwrap(),
            CategoryRef::slugs(["tea", "coffee"]).unwrap(),
            CategoryRef::ids([1, 3]).unwrap(),
            CategoryRef::ids([3]).unwrap(),
        ];
        for reference in references {
            if loaded.has_all(&reference) {
                assert!(loaded.has_any(&reference));
            }
        }
    }

    #[test]
    fn empty_references_never_match() {
        let loaded = loaded();
        assert!(!loaded.has_any(&CategoryRef::None));
        assert!(!loaded.has_all(&CategoryRef::None));
        assert!(!LoadedCategories::default().has_all(&CategoryRef::ByIdList(vec![])));
    }

    #[test]
    fn key_map_uses_requested_column() {
        let loaded = loaded();
        let by_slug = loaded.key_map(KeyColumn::Slug);
        assert_eq!(by_slug["tea"], "TEA");
        let by_id = loaded.key_map(KeyColumn::Id);
        assert_eq!(by_id["2"], "COFFEE");
    }
}
