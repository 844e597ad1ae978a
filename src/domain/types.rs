//! Strongly-typed value objects used by domain entities.
//!
//! Domain structs carry these wrappers instead of raw primitives so that
//! identifiers, slugs and discriminators are validated at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors produced when attempting to construct constrained domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// An identifier was zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositiveId(&'static str),
    /// A string was empty or whitespace-only after trimming.
    #[error("{0} cannot be empty")]
    EmptyString(&'static str),
    /// Catch-all for custom validation failures.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

fn trim_and_require_non_empty<S: Into<String>>(
    value: S,
    field: &'static str,
) -> Result<String, TypeConstraintError> {
    let trimmed = value.into().trim().to_string();
    if trimmed.is_empty() {
        Err(TypeConstraintError::EmptyString(field))
    } else {
        Ok(trimmed)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(try_from = "i32", into = "i32")]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId($field))
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<i32> for $name {
            fn eq(&self, other: &i32) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for i32 {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }
    };
}

/// Shared accessors and conversions for string-backed newtypes.
macro_rules! string_newtype_impls {
    ($name:ident) => {
        impl $name {
            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }

        impl PartialEq<$name> for &str {
            fn eq(&self, other: &$name) -> bool {
                *self == other.as_str()
            }
        }
    };
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                trim_and_require_non_empty(value, $field).map(Self)
            }
        }

        string_newtype_impls!($name);
    };
}

id_newtype!(
    CategoryId,
    "Unique identifier for a category.",
    "category_id"
);
id_newtype!(
    OwnerId,
    "Primary key of a categorizable owner within its own table.",
    "categorizable_id"
);

non_empty_string_newtype!(
    CategoryName,
    "Category display name enforcing non-empty values.",
    "category name"
);
non_empty_string_newtype!(
    OwnerType,
    "Polymorphic discriminator stored in `categorizable_type`.",
    "categorizable_type"
);
non_empty_string_newtype!(
    CategorySlug,
    "Unique key of a category; any trimmed, non-empty text.",
    "category slug"
);

/// Category column used as key when filtering owners or listing categories.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyColumn {
    #[default]
    Slug,
    Id,
}

impl KeyColumn {
    /// Column name used in persistence.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Id => "id",
        }
    }
}

impl Display for KeyColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for KeyColumn {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "slug" => Ok(Self::Slug),
            "id" => Ok(Self::Id),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "key column: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for KeyColumn {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// How untyped list input is classified into a category reference.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Every element must share the shape of the first one.
    #[default]
    Strict,
    /// The first element decides; elements of another shape are dropped.
    FirstElement,
}

impl ClassificationMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::FirstElement => "first_element",
        }
    }
}

impl Display for ClassificationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ClassificationMode {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "strict" => Ok(Self::Strict),
            "first_element" => Ok(Self::FirstElement),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "classification mode: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_category_names() {
        let value = CategoryName::new("  Green Tea  ").unwrap();
        assert_eq!(value.as_str(), "Green Tea");
    }

    #[test]
    fn rejects_non_positive_ids() {
        let err = CategoryId::new(0).unwrap_err();
        assert_eq!(err, TypeConstraintError::NonPositiveId("category_id"));
        let err = OwnerId::new(-3).unwrap_err();
        assert_eq!(err, TypeConstraintError::NonPositiveId("categorizable_id"));
    }

    #[test]
    fn slugs_are_trimmed_but_otherwise_free_form() {
        assert_eq!(CategorySlug::new(" green-tea ").unwrap(), "green-tea");
        assert_eq!(CategorySlug::new("Green Tea").unwrap(), "Green Tea");
        assert_eq!(CategorySlug::new("Green_Tea").unwrap(), "Green_Tea");
        assert_eq!(
            CategorySlug::new("   ").unwrap_err(),
            TypeConstraintError::EmptyString("category slug")
        );
    }

    #[test]
    fn ids_deserialize_through_validation() {
        let id: CategoryId = serde_json::from_str("7").unwrap();
        assert_eq!(id, 7);
        assert!(serde_json::from_str::<CategoryId>("0").is_err());
    }

    #[test]
    fn parses_key_columns() {
        assert_eq!(KeyColumn::try_from("id").unwrap(), KeyColumn::Id);
        assert_eq!(KeyColumn::default(), KeyColumn::Slug);
        assert!(KeyColumn::try_from("name").is_err());
    }

    #[test]
    fn parses_classification_modes() {
        assert_eq!(
            ClassificationMode::try_from(" first_element ").unwrap(),
            ClassificationMode::FirstElement
        );
        assert_eq!(
            ClassificationMode::try_from("strict").unwrap(),
            ClassificationMode::Strict
        );
        assert_eq!(
            ClassificationMode::try_from("lenient").unwrap_err(),
            TypeConstraintError::InvalidValue("classification mode: lenient".to_string())
        );
    }
}
