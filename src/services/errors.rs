use thiserror::Error;

use crate::domain::reference::ClassificationError;
use crate::domain::types::TypeConstraintError;
use crate::repository::errors::RepositoryError;

/// Errors returned by the resolver and reconciler.
#[derive(Debug, Error)]
pub enum CategorizableError {
    /// An immediate mutation was requested for an owner without identity.
    #[error("{owner_type} must be persisted before its categories can change")]
    OwnerNotPersisted { owner_type: &'static str },
    /// Untyped input could not be classified into a category reference.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    /// A value violated domain constraints.
    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
    /// The category directory or association store failed.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Convenient alias for results returned from service functions.
pub type CategorizableResult<T> = Result<T, CategorizableError>;
