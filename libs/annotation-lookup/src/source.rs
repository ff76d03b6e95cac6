//! Host metadata substrate consumed by lookups.

use std::sync::Arc;

use crate::model::{Annotation, Element, TypeName};

/// Read-only access to the annotations declared on program elements.
///
/// Implementations must return a stable declaration order for a given
/// element and must not mutate metadata while a lookup is running. Unknown
/// elements have no annotations.
pub trait MetadataSource {
    /// Annotations declared directly on `element`, in declaration order.
    fn declared_annotations(&self, element: &Element) -> &[Annotation];

    /// The annotation of type `ty` declared directly on `element`, if any.
    fn declared_annotation(&self, element: &Element, ty: &TypeName) -> Option<&Annotation> {
        self.declared_annotations(element)
            .iter()
            .find(|ann| ann.is_of(ty))
    }
}

impl<S: MetadataSource + ?Sized> MetadataSource for &S {
    fn declared_annotations(&self, element: &Element) -> &[Annotation] {
        (**self).declared_annotations(element)
    }
}

impl<S: MetadataSource + ?Sized> MetadataSource for Box<S> {
    fn declared_annotations(&self, element: &Element) -> &[Annotation] {
        (**self).declared_annotations(element)
    }
}

impl<S: MetadataSource + ?Sized> MetadataSource for Arc<S> {
    fn declared_annotations(&self, element: &Element) -> &[Annotation] {
        (**self).declared_annotations(element)
    }
}
