//! Error types for declaring and serializing resources.
//!
//! Declaration problems surface from [`Catalog::declare`](crate::Catalog::declare)
//! as a [`DeclarationError`], before any resource is serialized. Everything
//! that can go wrong while assembling a document is a [`HalError`].

use crate::descriptor::DescriptorId;
use thiserror::Error;

/// Error type returned by resolvers, helpers and post-serialize hooks.
///
/// Boxed so user code can propagate any error with `?`.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors raised while declaring a descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    /// A link or curie was declared with neither a value nor a resolver.
    #[error("{kind} '{name}' on '{descriptor}' must have a value or a resolver")]
    MissingValue {
        /// Kind of field (`link` or `curie`).
        kind: &'static str,
        /// Name of the field.
        name: String,
        /// Name of the declaring descriptor.
        descriptor: String,
    },

    /// A field was declared with an empty name.
    #[error("{kind} declared on '{descriptor}' has an empty name")]
    EmptyName {
        /// Kind of field.
        kind: &'static str,
        /// Name of the declaring descriptor.
        descriptor: String,
    },

    /// The parent descriptor is not part of this catalog.
    #[error("descriptor '{descriptor}' extends unknown parent {parent}")]
    UnknownParent {
        /// Name of the declaring descriptor.
        descriptor: String,
        /// The unknown parent id.
        parent: DescriptorId,
    },

    /// An embed is pinned to a descriptor that is not part of this catalog.
    #[error("embed '{embed}' on '{descriptor}' refers to unknown descriptor {target}")]
    UnknownDescriptor {
        /// Name of the declaring descriptor.
        descriptor: String,
        /// Name of the embed.
        embed: String,
        /// The unknown descriptor id.
        target: DescriptorId,
    },
}

/// Errors raised while serializing a resource.
#[derive(Debug, Error)]
pub enum HalError {
    /// No descriptor was given and none is registered for the model.
    #[error("no descriptor for {model}")]
    MissingDescriptor {
        /// Identity of the resource that could not be matched.
        model: String,
    },

    /// A descriptor id does not belong to the catalog in use.
    #[error("unknown descriptor {0}")]
    UnknownDescriptor(DescriptorId),

    /// Collection serialization was requested on a descriptor without collection info.
    #[error(
        "trying to serialize a collection using '{descriptor}' which has no collection info"
    )]
    MissingCollectionInfo {
        /// Name of the descriptor.
        descriptor: String,
    },

    /// A field has no value, no resolver and no matching property on the resource.
    #[error("no value for '{field}' on {resource}")]
    MissingValue {
        /// Name of the field.
        field: String,
        /// Identity of the resource.
        resource: String,
    },

    /// A resolver failed.
    #[error("resolving '{field}' on {resource} failed: {source}")]
    Resolver {
        /// Name of the field.
        field: String,
        /// Identity of the resource.
        resource: String,
        /// The resolver's error.
        #[source]
        source: BoxError,
    },

    /// A post-serialize hook failed.
    #[error("post-serialize hook of '{descriptor}' failed: {source}")]
    Hook {
        /// Name of the descriptor owning the hook.
        descriptor: String,
        /// The hook's error.
        #[source]
        source: BoxError,
    },

    /// A resolver called a helper that no descriptor in its context chain declares.
    #[error("helper '{name}' is not declared on '{descriptor}'")]
    UnknownHelper {
        /// Name of the helper.
        name: String,
        /// Name of the context descriptor.
        descriptor: String,
    },

    /// Embeds nested deeper than the configured limit.
    #[error("embed depth limit of {limit} exceeded")]
    DepthLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// JSON encoding failed.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HalError {
    /// Creates a [`MissingDescriptor`](Self::MissingDescriptor).
    pub fn missing_descriptor(model: impl Into<String>) -> Self {
        Self::MissingDescriptor {
            model: model.into(),
        }
    }

    /// Creates a [`MissingValue`](Self::MissingValue).
    pub fn missing_value(field: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::MissingValue {
            field: field.into(),
            resource: resource.into(),
        }
    }
}
