//! Policies deciding which annotation types are definitional.
//!
//! Definitional annotations describe how other annotations may be used
//! (retention, targets, documentation, inheritance) and never carry domain
//! annotations themselves. Lookups never traverse into them.

use crate::model::TypeName;

/// Namespace holding the built-in definitional annotation types.
pub const DEFAULT_DEFINITIONAL_NAMESPACE: &str = "lang.annotation";

/// Decides whether an annotation type is definitional.
pub trait ExclusionPolicy {
    fn is_definitional(&self, ty: &TypeName) -> bool;
}

impl<F> ExclusionPolicy for F
where
    F: Fn(&TypeName) -> bool,
{
    fn is_definitional(&self, ty: &TypeName) -> bool {
        self(ty)
    }
}

/// Treats every annotation type as a domain annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusion;

impl ExclusionPolicy for NoExclusion {
    fn is_definitional(&self, _ty: &TypeName) -> bool {
        false
    }
}

/// Excludes annotation types declared in any of a set of namespaces.
///
/// A type belongs to namespace `ns` when its name is `ns` itself or starts
/// with `ns.`; `lang.annotationx.Foo` is not in `lang.annotation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceExclusion {
    namespaces: Vec<String>,
}

impl NamespaceExclusion {
    /// Policy excluding nothing until namespaces are added.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            namespaces: Vec::new(),
        }
    }

    #[must_use]
    pub fn new<I, N>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut policy = Self::empty();
        for ns in namespaces {
            let ns: String = ns.into();
            policy.push(&ns);
        }
        policy
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace: String = namespace.into();
        self.push(&namespace);
        self
    }

    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn push(&mut self, namespace: &str) {
        let namespace = namespace.trim_end_matches('.').to_owned();
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
    }
}

impl Default for NamespaceExclusion {
    fn default() -> Self {
        Self::new([DEFAULT_DEFINITIONAL_NAMESPACE])
    }
}

impl ExclusionPolicy for NamespaceExclusion {
    fn is_definitional(&self, ty: &TypeName) -> bool {
        let name = ty.as_str();
        self.namespaces.iter().any(|ns| {
            name.strip_prefix(ns.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
    }
}
