//! # Halform Internal Library
//!
//! Re-exports the core halform crates for convenience.

/// Layer 1: fields, descriptors, policies and the catalog.
pub use halform_core;

/// Layer 2: document assembly, curie consolidation and pagination.
pub use halform_serializer;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use halform_core::prelude::*;
    pub use halform_serializer::Serializer;
}
