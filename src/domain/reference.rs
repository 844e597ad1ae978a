//! Typed category references.
//!
//! Every operation that accepts "some categories" takes a [`CategoryRef`].
//! Untyped input (request payloads, configuration, scripting bridges) is
//! classified once at the boundary with [`CategoryRef::classify`]; everything
//! behind it switches on the closed variant set.

use std::fmt::{Display, Formatter};

use serde_json::Value;
use thiserror::Error;

use crate::domain::category::Category;
use crate::domain::types::{CategoryId, CategorySlug, ClassificationMode, TypeConstraintError};

/// Shape of a single category value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Id,
    Slug,
    Entity,
}

impl Display for ValueShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::Id => "ids",
            Self::Slug => "slugs",
            Self::Entity => "categories",
        };
        write!(f, "{value}")
    }
}

/// Errors raised while classifying untyped input into a [`CategoryRef`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// A list mixes values of different shapes.
    #[error("category list of {expected} contains {found} at position {index}")]
    MixedList {
        index: usize,
        expected: ValueShape,
        found: String,
    },
    /// The value is neither an id, a slug, a category nor a list of those.
    #[error("unsupported category reference: {0}")]
    UnsupportedShape(&'static str),
    /// An object could not be read as a category record.
    #[error("invalid category record: {0}")]
    InvalidEntity(String),
    /// A scalar had the right shape but violated its constraints.
    #[error(transparent)]
    Constraint(#[from] TypeConstraintError),
}

/// Any accepted way of referring to zero or more categories.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryRef {
    ById(CategoryId),
    BySlug(CategorySlug),
    ByEntity(Category),
    ByIdList(Vec<CategoryId>),
    BySlugList(Vec<CategorySlug>),
    ByEntitySet(Vec<Category>),
    /// Explicit empty reference; syncing it clears all associations.
    #[default]
    None,
}

impl CategoryRef {
    /// Build a slug list reference from raw strings.
    pub fn slugs<I, S>(values: I) -> Result<Self, TypeConstraintError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slugs = values
            .into_iter()
            .map(CategorySlug::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::BySlugList(slugs))
    }

    /// Build an id list reference from raw integers.
    pub fn ids<I>(values: I) -> Result<Self, TypeConstraintError>
    where
        I: IntoIterator<Item = i32>,
    {
        let ids = values
            .into_iter()
            .map(CategoryId::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::ByIdList(ids))
    }

    /// Shape of the values carried, `None` for an empty reference.
    pub fn shape(&self) -> Option<ValueShape> {
        match self {
            Self::ById(_) => Some(ValueShape::Id),
            Self::BySlug(_) => Some(ValueShape::Slug),
            Self::ByEntity(_) => Some(ValueShape::Entity),
            Self::ByIdList(ids) if !ids.is_empty() => Some(ValueShape::Id),
            Self::BySlugList(slugs) if !slugs.is_empty() => Some(ValueShape::Slug),
            Self::ByEntitySet(set) if !set.is_empty() => Some(ValueShape::Entity),
            _ => None,
        }
    }

    /// True for [`CategoryRef::None`] and empty lists.
    pub fn is_empty(&self) -> bool {
        self.shape().is_none()
    }

    /// True when the reference is made of slugs.
    pub fn is_slug_based(&self) -> bool {
        self.shape() == Some(ValueShape::Slug)
    }

    /// True when the reference is made of ids.
    pub fn is_id_based(&self) -> bool {
        self.shape() == Some(ValueShape::Id)
    }

    /// Number of values carried by the reference.
    pub fn len(&self) -> usize {
        match self {
            Self::ById(_) | Self::BySlug(_) | Self::ByEntity(_) => 1,
            Self::ByIdList(ids) => ids.len(),
            Self::BySlugList(slugs) => slugs.len(),
            Self::ByEntitySet(set) => set.len(),
            Self::None => 0,
        }
    }

    /// Classify untyped input by its shape.
    ///
    /// A string is a slug, an integer is an id, an object is a category
    /// record and `null` or `[]` is the empty reference. Arrays take the shape
    /// of their first element; what happens to elements of another shape
    /// depends on `mode`.
    pub fn classify(value: &Value, mode: ClassificationMode) -> Result<Self, ClassificationError> {
        match value {
            Value::Null => Ok(Self::None),
            Value::Array(items) => classify_list(items, mode),
            scalar => match shape_of(scalar) {
                Some(ValueShape::Slug) => Ok(Self::BySlug(slug_from(scalar)?)),
                Some(ValueShape::Id) => Ok(Self::ById(id_from(scalar)?)),
                Some(ValueShape::Entity) => Ok(Self::ByEntity(entity_from(scalar)?)),
                None => Err(ClassificationError::UnsupportedShape(kind_of(scalar))),
            },
        }
    }
}

impl TryFrom<Value> for CategoryRef {
    type Error = ClassificationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::classify(&value, ClassificationMode::Strict)
    }
}

impl TryFrom<&Value> for CategoryRef {
    type Error = ClassificationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::classify(value, ClassificationMode::Strict)
    }
}

impl From<CategoryId> for CategoryRef {
    fn from(value: CategoryId) -> Self {
        Self::ById(value)
    }
}

impl From<CategorySlug> for CategoryRef {
    fn from(value: CategorySlug) -> Self {
        Self::BySlug(value)
    }
}

impl From<Category> for CategoryRef {
    fn from(value: Category) -> Self {
        Self::ByEntity(value)
    }
}

impl From<Vec<CategoryId>> for CategoryRef {
    fn from(value: Vec<CategoryId>) -> Self {
        Self::ByIdList(value)
    }
}

impl From<Vec<CategorySlug>> for CategoryRef {
    fn from(value: Vec<CategorySlug>) -> Self {
        Self::BySlugList(value)
    }
}

impl From<Vec<Category>> for CategoryRef {
    fn from(value: Vec<Category>) -> Self {
        Self::ByEntitySet(value)
    }
}

impl<T> From<Option<T>> for CategoryRef
where
    T: Into<CategoryRef>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

fn shape_of(value: &Value) -> Option<ValueShape> {
    match value {
        Value::String(_) => Some(ValueShape::Slug),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(ValueShape::Id),
        Value::Object(_) => Some(ValueShape::Entity),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn slug_from(value: &Value) -> Result<CategorySlug, ClassificationError> {
    let raw = value
        .as_str()
        .ok_or(ClassificationError::UnsupportedShape(kind_of(value)))?;
    Ok(CategorySlug::new(raw)?)
}

fn id_from(value: &Value) -> Result<CategoryId, ClassificationError> {
    let raw = value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| {
            TypeConstraintError::InvalidValue(format!("category id out of range: {value}"))
        })?;
    Ok(CategoryId::new(raw)?)
}

fn entity_from(value: &Value) -> Result<Category, ClassificationError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ClassificationError::InvalidEntity(e.to_string()))
}

fn classify_list(
    items: &[Value],
    mode: ClassificationMode,
) -> Result<CategoryRef, ClassificationError> {
    let Some(first) = items.first() else {
        return Ok(CategoryRef::None);
    };
    let expected = shape_of(first).ok_or(ClassificationError::UnsupportedShape(kind_of(first)))?;

    let mut matching = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if shape_of(item) == Some(expected) {
            matching.push(item);
            continue;
        }
        match mode {
            ClassificationMode::Strict => {
                return Err(ClassificationError::MixedList {
                    index,
                    expected,
                    found: kind_of(item).to_string(),
                });
            }
            ClassificationMode::FirstElement => {
                log::debug!(
                    "Dropping {} at position {index} from list of {expected}",
                    kind_of(item)
                );
            }
        }
    }

    let reference = match expected {
        ValueShape::Slug => CategoryRef::BySlugList(
            matching
                .into_iter()
                .map(slug_from)
                .collect::<Result<_, _>>()?,
        ),
        ValueShape::Id => CategoryRef::ByIdList(
            matching
                .into_iter()
                .map(id_from)
                .collect::<Result<_, _>>()?,
        ),
        ValueShape::Entity => CategoryRef::ByEntitySet(
            matching
                .into_iter()
                .map(entity_from)
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CategoryName;
    use serde_json::json;

    fn tea() -> Category {
        Category::new(
            CategoryId::new(3).unwrap(),
            CategorySlug::new("tea").unwrap(),
            CategoryName::new("Tea").unwrap(),
        )
    }

    #[test]
    fn classifies_scalars_by_shape() {
        assert_eq!(
            CategoryRef::try_from(json!("tea")).unwrap(),
            CategoryRef::BySlug(CategorySlug::new("tea").unwrap())
        );
        assert_eq!(
            CategoryRef::try_from(json!(3)).unwrap(),
            CategoryRef::ById(CategoryId::new(3).unwrap())
        );
        assert_eq!(
            CategoryRef::try_from(json!({ "id": 3, "slug": "tea", "name": "Tea" })).unwrap(),
            CategoryRef::ByEntity(tea())
        );
        assert_eq!(CategoryRef::try_from(json!(null)).unwrap(), CategoryRef::None);
    }

    #[test]
    fn classifies_lists_by_first_element() {
        assert_eq!(
            CategoryRef::try_from(json!(["tea", "coffee"])).unwrap(),
            CategoryRef::slugs(["tea", "coffee"]).unwrap()
        );
        assert_eq!(
            CategoryRef::try_from(json!([1, 2])).unwrap(),
            CategoryRef::ids([1, 2]).unwrap()
        );
        assert_eq!(CategoryRef::try_from(json!([])).unwrap(), CategoryRef::None);
    }

    #[test]
    fn any_non_empty_text_classifies_as_a_slug() {
        assert_eq!(
            CategoryRef::try_from(json!(["tea", "Green Tea"])).unwrap(),
            CategoryRef::slugs(["tea", "Green Tea"]).unwrap()
        );
        assert!(matches!(
            CategoryRef::try_from(json!(["tea", "  "])).unwrap_err(),
            ClassificationError::Constraint(TypeConstraintError::EmptyString(_))
        ));
    }

    #[test]
    fn strict_mode_rejects_mixed_lists() {
        let err = CategoryRef::try_from(json!(["tea", 2])).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::MixedList {
                index: 1,
                expected: ValueShape::Slug,
                found: "integer".into(),
            }
        );
    }

    #[test]
    fn first_element_mode_drops_foreign_values() {
        let reference =
            CategoryRef::classify(&json!([2, "tea", 5]), ClassificationMode::FirstElement)
                .unwrap();
        assert_eq!(reference, CategoryRef::ids([2, 5]).unwrap());
    }

    #[test]
    fn rejects_unsupported_shapes() {
        assert_eq!(
            CategoryRef::try_from(json!(true)).unwrap_err(),
            ClassificationError::UnsupportedShape("boolean")
        );
        assert_eq!(
            CategoryRef::try_from(json!([1.5])).unwrap_err(),
            ClassificationError::UnsupportedShape("float")
        );
        assert!(matches!(
            CategoryRef::try_from(json!(0)).unwrap_err(),
            ClassificationError::Constraint(TypeConstraintError::NonPositiveId(_))
        ));
    }

    #[test]
    fn empty_lists_have_no_shape() {
        assert!(CategoryRef::ByIdList(vec![]).is_empty());
        assert!(CategoryRef::None.is_empty());
        assert!(!CategoryRef::from(tea()).is_empty());
        assert!(CategoryRef::slugs(["tea"]).unwrap().is_slug_based());
    }
}
