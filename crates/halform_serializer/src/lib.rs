//! HAL document assembly for halform.
//!
//! Turns the declarations of a [`Catalog`](halform_core::Catalog) into HAL
//! documents:
//!
//! - [`Assembler`] builds the tree of one resource or collection, gating
//!   every field by embed depth and policy
//! - [`curies`] hoists and de-duplicates curies, renaming on collision
//! - [`pagination`] adds `page` / `per_page` and `prev` / `next` links
//! - [`Serializer`] ties the three together and encodes the result

pub mod assembler;
pub mod curies;
pub mod pagination;
pub mod serializer;

pub use assembler::{Assembler, Tree};
pub use curies::{CurieCollection, Rename, consolidate};
pub use pagination::{PageUri, paginate};
pub use serializer::Serializer;
