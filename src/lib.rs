//! Declarative HAL hypermedia serialization for Rust.
//!
//! Declare once what a resource type exposes, then serialize any number of
//! resources with it:
//!
//! ```
//! use halform::prelude::*;
//! use serde_json::json;
//!
//! let mut catalog = Catalog::new();
//! let post = catalog
//!     .declare(
//!         DescriptorBuilder::new("Post")
//!             .attribute(Attribute::property("title"))
//!             .link(Link::resolved("self", |scope| {
//!                 Ok(format!("/posts/{}", scope.property("id").unwrap_or_default()))
//!             })),
//!     )
//!     .unwrap();
//!
//! let options = SerializeOptions::new().with_descriptor(post);
//! let value = Serializer::new(&catalog)
//!     .to_hal_value(&json!({ "id": 1, "title": "Hello" }), &options)
//!     .unwrap();
//!
//! assert_eq!(value["_links"]["self"]["href"], "/posts/1");
//! ```

pub use halform_internal::*;

/// The types needed to declare and serialize resources.
pub mod prelude {
    pub use halform_internal::prelude::*;
}
