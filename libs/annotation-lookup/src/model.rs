//! Value types describing declaration points and the annotations attached to them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Fully-qualified, dot-separated name identifying an annotation type.
///
/// Equality is exact name equality; two `TypeName`s denote the same type
/// if and only if their names match.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part of the name before the last `.`, or `""` for unqualified names.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// Part of the name after the last `.`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(&self.0, |(_, simple)| simple)
    }

    /// Checks that `name` is a non-empty sequence of dot-separated identifiers.
    /// An identifier starts with a Unicode letter, `_` or `$`, followed by
    /// letters, digits, `_` or `$`.
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        !name.is_empty() && name.split('.').all(is_identifier)
    }
}

pub(crate) fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A declaration point capable of carrying annotations.
///
/// Annotation types are themselves declaration points (`Element::Type`),
/// which is what makes meta-annotations possible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Type(TypeName),
    Method { owner: TypeName, name: Arc<str> },
    Field { owner: TypeName, name: Arc<str> },
}

impl Element {
    #[must_use]
    pub fn of_type(name: impl Into<TypeName>) -> Self {
        Self::Type(name.into())
    }

    #[must_use]
    pub fn method(owner: impl Into<TypeName>, name: &str) -> Self {
        Self::Method {
            owner: owner.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn field(owner: impl Into<TypeName>, name: &str) -> Self {
        Self::Field {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The type this element is, or is declared in.
    #[must_use]
    pub fn owner(&self) -> &TypeName {
        match self {
            Self::Type(ty) => ty,
            Self::Method { owner, .. } | Self::Field { owner, .. } => owner,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Method { owner, name } => write!(f, "{owner}#{name}()"),
            Self::Field { owner, name } => write!(f, "{owner}#{name}"),
        }
    }
}

/// An annotation instance attached to an [`Element`].
///
/// Instances are tracked by identity during lookups: two annotations with the
/// same type and attributes declared in different places are distinct.
#[derive(Debug, Clone)]
pub struct Annotation {
    annotation_type: TypeName,
    attributes: BTreeMap<String, Value>,
}

impl Annotation {
    #[must_use]
    pub fn new(annotation_type: impl Into<TypeName>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The declaring annotation type.
    #[must_use]
    pub fn annotation_type(&self) -> &TypeName {
        &self.annotation_type
    }

    #[must_use]
    pub fn is_of(&self, ty: &TypeName) -> bool {
        self.annotation_type == *ty
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns `true` if both references point at the same instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
