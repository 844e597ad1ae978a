//! Category membership filters over collections of owners.

use crate::domain::reference::CategoryRef;
use crate::domain::types::{KeyColumn, OwnerId, OwnerType};
use crate::repository::{CategoryReader, OwnerFilter, OwnerListQuery};

use super::CategorizableResult;
use super::resolver::CategoryReferenceResolver;

/// One membership constraint expressed with category references.
///
/// `column` selects the category column matched by the store; `None` means
/// the reconciler's configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Owners having every referenced category.
    WithAll {
        categories: CategoryRef,
        column: Option<KeyColumn>,
    },
    /// Owners having at least one referenced category.
    WithAny {
        categories: CategoryRef,
        column: Option<KeyColumn>,
    },
    /// Owners having none of the referenced categories, or no categories
    /// at all when the reference is empty.
    WithoutAny {
        categories: CategoryRef,
        column: Option<KeyColumn>,
    },
}

/// Composable category filters applied to a list of candidate owners.
#[derive(Debug, Clone, Default)]
pub struct CategorizableQuery {
    /// Owners to filter, usually the rows of an outer query.
    pub candidates: Vec<OwnerId>,
    /// Conjunction of filters.
    pub filters: Vec<CategoryFilter>,
}

impl CategorizableQuery {
    pub fn new(candidates: impl IntoIterator<Item = OwnerId>) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
            filters: Vec::new(),
        }
    }

    pub fn with_all(self, categories: impl Into<CategoryRef>) -> Self {
        self.push(CategoryFilter::WithAll {
            categories: categories.into(),
            column: None,
        })
    }

    pub fn with_all_by(self, categories: impl Into<CategoryRef>, column: KeyColumn) -> Self {
        self.push(CategoryFilter::WithAll {
            categories: categories.into(),
            column: Some(column),
        })
    }

    pub fn with_any(self, categories: impl Into<CategoryRef>) -> Self {
        self.push(CategoryFilter::WithAny {
            categories: categories.into(),
            column: None,
        })
    }

    pub fn with_any_by(self, categories: impl Into<CategoryRef>, column: KeyColumn) -> Self {
        self.push(CategoryFilter::WithAny {
            categories: categories.into(),
            column: Some(column),
        })
    }

    /// Alias of [`Self::with_any`].
    pub fn with_categories(self, categories: impl Into<CategoryRef>) -> Self {
        self.with_any(categories)
    }

    pub fn without_any(self, categories: impl Into<CategoryRef>) -> Self {
        self.push(CategoryFilter::WithoutAny {
            categories: categories.into(),
            column: None,
        })
    }

    pub fn without_any_by(self, categories: impl Into<CategoryRef>, column: KeyColumn) -> Self {
        self.push(CategoryFilter::WithoutAny {
            categories: categories.into(),
            column: Some(column),
        })
    }

    /// Owners without any category.
    pub fn without_categories(self) -> Self {
        self.without_any(CategoryRef::None)
    }

    fn push(mut self, filter: CategoryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Resolve every filter to store-level keys.
    pub fn resolve<R>(
        self,
        owner_type: OwnerType,
        resolver: &CategoryReferenceResolver<'_, R>,
        default_column: KeyColumn,
    ) -> CategorizableResult<OwnerListQuery>
    where
        R: CategoryReader + ?Sized,
    {
        let mut query = OwnerListQuery::new(owner_type, self.candidates);
        for filter in self.filters {
            let resolved = match filter {
                CategoryFilter::WithAll { categories, column } => OwnerFilter::WithAll(
                    resolver.resolve_column(&categories, column.unwrap_or(default_column))?,
                ),
                CategoryFilter::WithAny { categories, column } => OwnerFilter::WithAny(
                    resolver.resolve_column(&categories, column.unwrap_or(default_column))?,
                ),
                CategoryFilter::WithoutAny { categories, .. } if categories.is_empty() => {
                    OwnerFilter::WithoutAny
                }
                CategoryFilter::WithoutAny { categories, column } => OwnerFilter::Without(
                    resolver.resolve_column(&categories, column.unwrap_or(default_column))?,
                ),
            };
            query = query.filter(resolved);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::types::{CategoryId, CategoryName, CategorySlug};
    use crate::repository::CategoryKeys;
    use crate::repository::test::TestRepository;

    fn owner_ids(values: &[i32]) -> Vec<OwnerId> {
        values.iter().map(|v| OwnerId::new(*v).unwrap()).collect()
    }

    #[test]
    fn empty_without_any_means_no_categories() {
        let repo = TestRepository::default();
        let resolver = CategoryReferenceResolver::new(&repo);

        let query = CategorizableQuery::new(owner_ids(&[1, 2]))
            .without_categories()
            .without_any(CategoryRef::ByIdList(vec![]))
            .resolve(OwnerType::new("post").unwrap(), &resolver, KeyColumn::Slug)
            .unwrap();

        assert_eq!(
            query.filters,
            vec![OwnerFilter::WithoutAny, OwnerFilter::WithoutAny]
        );
    }

    #[test]
    fn entity_references_are_resolved_to_the_requested_column() {
        let tea = Category::new(
            CategoryId::new(4).unwrap(),
            CategorySlug::new("tea").unwrap(),
            CategoryName::new("Tea").unwrap(),
        );
        let repo = TestRepository::default();
        let resolver = CategoryReferenceResolver::new(&repo);

        let query = CategorizableQuery::new(owner_ids(&[1]))
            .with_all(tea.clone())
            .with_any_by(tea, KeyColumn::Id)
            .resolve(OwnerType::new("post").unwrap(), &resolver, KeyColumn::Slug)
            .unwrap();

        assert_eq!(
            query.filters,
            vec![
                OwnerFilter::WithAll(CategoryKeys::Slugs(vec![CategorySlug::new("tea").unwrap()])),
                OwnerFilter::WithAny(CategoryKeys::Ids(vec![CategoryId::new(4).unwrap()])),
            ]
        );
        assert_eq!(repo.lookups(), 0);
    }
}
