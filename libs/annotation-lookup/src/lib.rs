//! Meta-annotation lookup over declaration metadata.
//!
//! Frameworks frequently let users compose annotations: `@GetJson` is itself
//! annotated with `@Get`, which is annotated with `@Mapping`. This crate
//! answers whether an element carries a given annotation type either directly
//! or through such chains, so composed annotations behave as if their
//! constituents were declared in place.
//!
//! - [`MetadataSource`] is the host's view of declared annotations;
//!   [`AnnotationRegistry`] is an in-memory implementation.
//! - [`ExclusionPolicy`] decides which annotation types are definitional
//!   (retention, target, documentation markers) and are never traversed.
//! - [`AnnotationLookup`] runs the searches.
//!
//! ```
//! use annotation_lookup::{Annotation, AnnotationLookup, AnnotationRegistry, Element, TypeName};
//!
//! let controller = Element::of_type("app.UserController");
//! let registry = AnnotationRegistry::builder()
//!     .annotate(controller.clone(), Annotation::new("web.RestController"))
//!     .annotate_type("web.RestController", Annotation::new("app.Component"))
//!     .build();
//!
//! let lookup = AnnotationLookup::new(&registry);
//! assert!(lookup.has_annotation(Some(&controller), Some(&TypeName::new("app.Component"))));
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod lookup;
pub mod model;
pub mod policy;
pub mod registry;
pub mod source;

pub use config::{ConfigError, LookupConfig};
pub use lookup::{AnnotationLookup, MetaPath};
pub use model::{Annotation, Element, TypeName};
pub use policy::{
    DEFAULT_DEFINITIONAL_NAMESPACE, ExclusionPolicy, NamespaceExclusion, NoExclusion,
};
pub use registry::{AnnotationRegistry, RegistryBuilder, RegistryDocument, RegistryError};
pub use source::MetadataSource;
