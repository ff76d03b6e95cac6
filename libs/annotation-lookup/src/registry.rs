//! In-memory metadata source.
//!
//! `AnnotationRegistry` stores the annotations declared on each element and
//! hands them out in declaration order. It is immutable once built, so a
//! single registry can back any number of concurrent lookups.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::model::{Annotation, Element, TypeName, is_identifier};
use crate::source::MetadataSource;

/// Errors raised while declaring annotations or loading a registry document.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("invalid type name '{name}'")]
    InvalidTypeName { name: String },
    #[error("invalid member name '{name}' on '{owner}'")]
    InvalidMemberName { owner: String, name: String },
    #[error("annotation '{annotation_type}' declared more than once on '{element}'")]
    DuplicateAnnotation {
        element: String,
        annotation_type: String,
    },
    #[error("invalid registry document: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable store of declared annotations.
#[derive(Debug, Default)]
pub struct AnnotationRegistry {
    declarations: HashMap<Element, Vec<Annotation>>,
}

impl AnnotationRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builds a registry from a deserialized document, validating every name.
    ///
    /// # Errors
    /// Returns `RegistryError` if a type or member name is malformed, or if an
    /// element declares the same annotation type twice.
    pub fn from_document(document: RegistryDocument) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        for declaration in document.elements {
            let element = declaration.element.into_element()?;
            for annotation in declaration.annotations {
                builder.declare(element.clone(), annotation.into_annotation())?;
            }
        }
        Ok(builder.build())
    }

    /// Parses a JSON registry document.
    ///
    /// ```json
    /// { "elements": [
    ///     { "element": { "kind": "type", "type": "app.UserController" },
    ///       "annotations": [ { "type": "web.RestController" } ] }
    /// ] }
    /// ```
    ///
    /// # Errors
    /// Returns `RegistryError::Parse` for malformed JSON and the errors of
    /// [`AnnotationRegistry::from_document`] for invalid declarations.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let document: RegistryDocument =
            serde_json::from_str(json).map_err(|source| RegistryError::Parse { source })?;
        Self::from_document(document)
    }

    /// Number of elements carrying at least one annotation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Elements with at least one declaration, in no particular order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.declarations.keys()
    }
}

impl MetadataSource for AnnotationRegistry {
    fn declared_annotations(&self, element: &Element) -> &[Annotation] {
        self.declarations
            .get(element)
            .map_or(&[][..], Vec::as_slice)
    }
}

/// Accumulates declarations for an [`AnnotationRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declarations: HashMap<Element, Vec<Annotation>>,
}

impl RegistryBuilder {
    /// Appends `annotation` to `element` without validation.
    #[must_use]
    pub fn annotate(mut self, element: Element, annotation: Annotation) -> Self {
        self.declarations
            .entry(element)
            .or_default()
            .push(annotation);
        self
    }

    /// Appends `annotation` to the annotation type `ty` (a meta-annotation).
    #[must_use]
    pub fn annotate_type(self, ty: impl Into<TypeName>, annotation: Annotation) -> Self {
        self.annotate(Element::Type(ty.into()), annotation)
    }

    /// Appends `annotation` to `element` after validating names and uniqueness.
    ///
    /// # Errors
    /// Returns `RegistryError` if a name is malformed or `element` already
    /// declares an annotation of the same type.
    pub fn declare(
        &mut self,
        element: Element,
        annotation: Annotation,
    ) -> Result<&mut Self, RegistryError> {
        validate_element(&element)?;
        let ty = annotation.annotation_type();
        if !TypeName::is_valid(ty.as_str()) {
            return Err(RegistryError::InvalidTypeName {
                name: ty.to_string(),
            });
        }

        let duplicate = self
            .declarations
            .get(&element)
            .is_some_and(|declared| declared.iter().any(|existing| existing.is_of(ty)));
        if duplicate {
            return Err(RegistryError::DuplicateAnnotation {
                element: element.to_string(),
                annotation_type: ty.to_string(),
            });
        }
        self.declarations
            .entry(element)
            .or_default()
            .push(annotation);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> AnnotationRegistry {
        let annotations: usize = self.declarations.values().map(Vec::len).sum();
        tracing::debug!(
            elements = self.declarations.len(),
            annotations,
            "Built annotation registry"
        );
        AnnotationRegistry {
            declarations: self.declarations,
        }
    }
}

fn validate_element(element: &Element) -> Result<(), RegistryError> {
    let owner = element.owner();
    if !TypeName::is_valid(owner.as_str()) {
        return Err(RegistryError::InvalidTypeName {
            name: owner.to_string(),
        });
    }
    match element {
        Element::Type(_) => Ok(()),
        Element::Method { name, .. } | Element::Field { name, .. } => {
            if is_identifier(name) {
                Ok(())
            } else {
                Err(RegistryError::InvalidMemberName {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }
}

/// Serialized form of a registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryDocument {
    #[serde(default)]
    pub elements: Vec<ElementDeclaration>,
}

/// Annotations declared on one element, in declaration order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementDeclaration {
    pub element: ElementRef,
    #[serde(default)]
    pub annotations: Vec<AnnotationDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ElementRef {
    Type {
        #[serde(rename = "type")]
        name: String,
    },
    Method {
        owner: String,
        name: String,
    },
    Field {
        owner: String,
        name: String,
    },
}

impl ElementRef {
    fn into_element(self) -> Result<Element, RegistryError> {
        let element = match self {
            Self::Type { name } => Element::Type(TypeName::from(name)),
            Self::Method { owner, name } => Element::method(owner, &name),
            Self::Field { owner, name } => Element::field(owner, &name),
        };
        validate_element(&element)?;
        Ok(element)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationDeclaration {
    #[serde(rename = "type")]
    pub annotation_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl AnnotationDeclaration {
    fn into_annotation(self) -> Annotation {
        self.attributes
            .into_iter()
            .fold(Annotation::new(self.annotation_type), |ann, (key, value)| {
                ann.with_attribute(key, value)
            })
    }
}
