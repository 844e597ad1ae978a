use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::domain::event::{CategoryEvent, EventPhase, ReconcileMode};
use crate::domain::owner::{Categorizable, LoadedCategories, OwnerKey};
use crate::domain::reference::CategoryRef;
use crate::domain::types::{
    CategoryId, CategoryName, ClassificationMode, KeyColumn, OwnerId, OwnerType,
};
use crate::models::config::{CategorizableConfig, DEFAULT_EVENT_NAMESPACE};
use crate::repository::{AssociationReader, AssociationWriter, CategoryReader};

use super::lifecycle::LifecycleObserver;
use super::notifications::{CategoryEventSink, NoopEventSink};
use super::resolver::CategoryReferenceResolver;
use super::scopes::CategorizableQuery;
use super::{CategorizableError, CategorizableResult};

/// Applies category references to owners and answers membership questions.
///
/// Every mutation resolves the reference to an id set, publishes
/// `<namespace>.<mode>ing`, changes the association store and publishes
/// `<namespace>.<mode>ed`. The two events and the store change do not share
/// a transaction: a failed store call leaves the `before` event published
/// and skips the `after` event.
pub struct CategorySetReconciler<R, S = NoopEventSink> {
    repo: R,
    sink: S,
    namespace: String,
    default_column: KeyColumn,
    classification: ClassificationMode,
}

impl<R> CategorySetReconciler<R, NoopEventSink> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            sink: NoopEventSink,
            namespace: DEFAULT_EVENT_NAMESPACE.to_string(),
            default_column: KeyColumn::default(),
            classification: ClassificationMode::default(),
        }
    }
}

impl<R, S> CategorySetReconciler<R, S> {
    /// Replace the event sink.
    pub fn with_sink<T>(self, sink: T) -> CategorySetReconciler<R, T> {
        CategorySetReconciler {
            repo: self.repo,
            sink,
            namespace: self.namespace,
            default_column: self.default_column,
            classification: self.classification,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Apply namespace, default key column and classification from `config`.
    pub fn with_config(mut self, config: &CategorizableConfig) -> Self {
        self.namespace = config.event_namespace.clone();
        self.default_column = config.default_key_column;
        self.classification = config.classification;
        self
    }

    /// Classify untyped input with the configured classification mode.
    pub fn classify(&self, value: &Value) -> CategorizableResult<CategoryRef> {
        Ok(CategoryRef::classify(value, self.classification)?)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<R, S> CategorySetReconciler<R, S>
where
    R: CategoryReader + AssociationReader + AssociationWriter,
    S: CategoryEventSink,
{
    pub fn resolver(&self) -> CategoryReferenceResolver<'_, R> {
        CategoryReferenceResolver::new(&self.repo)
    }

    /// Resolve `reference` and apply it to `owner` according to `mode`.
    ///
    /// Fails with [`CategorizableError::OwnerNotPersisted`] when the owner has
    /// no identity yet.
    pub fn apply<O: Categorizable>(
        &self,
        owner: &O,
        reference: &CategoryRef,
        mode: ReconcileMode,
    ) -> CategorizableResult<()> {
        let key = persisted_key(owner)?;
        let ids: BTreeSet<CategoryId> = self
            .resolver()
            .resolve_keeping_original(reference)?
            .into_iter()
            .map(|c| c.id)
            .collect();

        self.publish(EventPhase::Before, mode, &key, &ids);

        let result = match mode {
            ReconcileMode::Attach => self.repo.attach_categories(&key, &ids),
            ReconcileMode::Sync => self.repo.sync_categories(&key, &ids),
            ReconcileMode::Detach => self.repo.detach_categories(&key, &ids),
        };
        let affected = result.map_err(|e| {
            log::error!("Failed to {mode} categories for {key}: {e}");
            e
        })?;
        log::debug!("{mode} {ids:?} on {key}: {affected} row(s) affected");

        self.publish(EventPhase::After, mode, &key, &ids);
        Ok(())
    }

    /// Attach categories, keeping existing ones.
    pub fn categorize<O: Categorizable>(
        &self,
        owner: &O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<()> {
        self.apply(owner, &categories.into(), ReconcileMode::Attach)
    }

    /// Replace the owner's categories. `CategoryRef::None` clears them.
    pub fn recategorize<O: Categorizable>(
        &self,
        owner: &O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<()> {
        self.apply(owner, &categories.into(), ReconcileMode::Sync)
    }

    /// Detach categories; ones not attached are ignored.
    pub fn uncategorize<O: Categorizable>(
        &self,
        owner: &O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<()> {
        self.apply(owner, &categories.into(), ReconcileMode::Detach)
    }

    /// Assign categories the way an attribute setter would: queue them on an
    /// unpersisted owner, attach them immediately otherwise.
    pub fn assign_categories<O: Categorizable>(
        &self,
        owner: &mut O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<()> {
        let categories = categories.into();
        if owner.categorizable_id().is_none() {
            log::debug!(
                "Queueing {} category value(s) on unsaved {}",
                categories.len(),
                O::categorizable_type()
            );
            *owner.queued_categories() = Some(categories);
            return Ok(());
        }
        self.categorize(owner, categories)
    }

    /// Load the owner's current categories. Unsaved owners have none.
    pub fn categories_of<O: Categorizable>(
        &self,
        owner: &O,
    ) -> CategorizableResult<LoadedCategories> {
        let Some(key) = OwnerKey::of(owner)? else {
            return Ok(LoadedCategories::default());
        };
        Ok(self.repo.list_owner_categories(&key)?.into())
    }

    /// True when the owner has any of the referenced categories.
    pub fn has_category<O: Categorizable>(
        &self,
        owner: &O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<bool> {
        self.has_any_category(owner, categories)
    }

    /// True when the owner has any of the referenced categories.
    pub fn has_any_category<O: Categorizable>(
        &self,
        owner: &O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<bool> {
        Ok(self.categories_of(owner)?.has_any(&categories.into()))
    }

    /// True when the owner's categories are exactly the referenced ones.
    pub fn has_all_categories<O: Categorizable>(
        &self,
        owner: &O,
        categories: impl Into<CategoryRef>,
    ) -> CategorizableResult<bool> {
        Ok(self.categories_of(owner)?.has_all(&categories.into()))
    }

    /// Category names of the owner keyed by `key`.
    pub fn category_list<O: Categorizable>(
        &self,
        owner: &O,
        key: KeyColumn,
    ) -> CategorizableResult<BTreeMap<String, CategoryName>> {
        Ok(self.categories_of(owner)?.key_map(key))
    }

    /// Candidates of `query` that satisfy all of its filters.
    pub fn filter_owners<O: Categorizable>(
        &self,
        query: CategorizableQuery,
    ) -> CategorizableResult<Vec<OwnerId>> {
        let owner_type = OwnerType::new(O::categorizable_type())?;
        let query = query.resolve(owner_type, &self.resolver(), self.default_column)?;
        Ok(self.repo.filter_owners(&query)?)
    }

    fn publish(
        &self,
        phase: EventPhase,
        mode: ReconcileMode,
        key: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) {
        let event = CategoryEvent::new(
            &self.namespace,
            phase,
            mode,
            key.owner_type.clone(),
            key.owner_id,
            ids.clone(),
        );
        self.sink.publish(&event);
    }
}

impl<O, R, S> LifecycleObserver<O> for CategorySetReconciler<R, S>
where
    O: Categorizable,
    R: CategoryReader + AssociationReader + AssociationWriter,
    S: CategoryEventSink,
{
    /// Flush categories queued before the owner had an identity.
    fn created(&self, owner: &mut O) -> CategorizableResult<()> {
        let Some(queued) = owner.queued_categories().take() else {
            return Ok(());
        };
        if queued.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.categorize(owner, queued.clone()) {
            *owner.queued_categories() = Some(queued);
            return Err(e);
        }
        Ok(())
    }

    /// Remove every association of a deleted owner.
    fn deleted(&self, owner: &O) -> CategorizableResult<()> {
        self.recategorize(owner, CategoryRef::None)
    }
}

fn persisted_key<O: Categorizable>(owner: &O) -> CategorizableResult<OwnerKey> {
    OwnerKey::of(owner)?.ok_or(CategorizableError::OwnerNotPersisted {
        owner_type: O::categorizable_type(),
    })
}
