pub use errors::{CategorizableError, CategorizableResult};

pub mod errors;
pub mod lifecycle;
pub mod notifications;
pub mod reconciler;
pub mod resolver;
pub mod scopes;
