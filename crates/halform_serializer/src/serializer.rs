//! Public entry points.

use crate::assembler::{Assembler, Tree};
use crate::curies;
use halform_core::{
    Catalog, Descriptor, DescriptorId, HalError, Resource, ResourceCollection, SerializeOptions,
};
use serde_json::Value;

/// Serializes resources and collections declared in one catalog.
///
/// The descriptor comes from [`SerializeOptions::with_descriptor`] when set,
/// otherwise from the catalog's model registry.
///
/// # Example
///
/// ```
/// use halform_core::{Attribute, Catalog, DescriptorBuilder, Link, SerializeOptions};
/// use halform_serializer::Serializer;
/// use serde_json::json;
///
/// let mut catalog = Catalog::new();
/// let post = catalog
///     .declare(
///         DescriptorBuilder::new("Post")
///             .attribute(Attribute::property("text"))
///             .link(Link::resolved("self", |scope| {
///                 Ok(format!("/posts/{}", scope.property("id").unwrap_or_default()))
///             })),
///     )
///     .unwrap();
///
/// let json = Serializer::new(&catalog)
///     .to_hal(&json!({ "id": 5, "text": "hi" }), &SerializeOptions::new().with_descriptor(post))
///     .unwrap();
/// assert_eq!(json, r#"{"text":"hi","_links":{"self":{"href":"/posts/5"}}}"#);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'c> {
    catalog: &'c Catalog,
}

impl<'c> Serializer<'c> {
    /// Creates a serializer over `catalog`.
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Serializes a resource to HAL JSON text.
    ///
    /// # Errors
    ///
    /// See [`to_hal_value`](Self::to_hal_value).
    pub fn to_hal(
        &self,
        resource: &dyn Resource,
        options: &SerializeOptions,
    ) -> Result<String, HalError> {
        Ok(serde_json::to_string(&self.to_hal_value(resource, options)?)?)
    }

    /// Serializes a resource to a HAL document with curies consolidated.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::MissingDescriptor`] if no descriptor is given or
    /// registered, or any error raised while assembling.
    pub fn to_hal_value(
        &self,
        resource: &dyn Resource,
        options: &SerializeOptions,
    ) -> Result<Value, HalError> {
        let mut tree = self.to_hash(resource, options)?;
        curies::consolidate(&mut tree);
        Ok(Value::Object(tree))
    }

    /// Serializes a collection to HAL JSON text.
    ///
    /// # Errors
    ///
    /// See [`to_collection_value`](Self::to_collection_value).
    pub fn to_collection(
        &self,
        collection: &dyn ResourceCollection,
        options: &SerializeOptions,
    ) -> Result<String, HalError> {
        Ok(serde_json::to_string(
            &self.to_collection_value(collection, options)?,
        )?)
    }

    /// Serializes a collection to a HAL document with curies consolidated.
    ///
    /// Without a pinned descriptor, the first member's is used. Pagination
    /// follows the call options, falling back to the catalog configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::MissingDescriptor`] if no descriptor is given and
    /// none can be found (including for an empty collection),
    /// [`HalError::MissingCollectionInfo`] if the descriptor has no
    /// collection spec, or any error raised while assembling.
    pub fn to_collection_value(
        &self,
        collection: &dyn ResourceCollection,
        options: &SerializeOptions,
    ) -> Result<Value, HalError> {
        let mut tree = self.to_collection_hash(collection, options)?;
        curies::consolidate(&mut tree);
        Ok(Value::Object(tree))
    }

    /// Assembles a resource without consolidating curies.
    ///
    /// # Errors
    ///
    /// See [`to_hal_value`](Self::to_hal_value).
    pub fn to_hash(
        &self,
        resource: &dyn Resource,
        options: &SerializeOptions,
    ) -> Result<Tree, HalError> {
        let id = match options.descriptor() {
            Some(id) => id,
            None => self.lookup(resource)?,
        };
        tracing::debug!(
            descriptor = %self.name_of(id),
            resource = %resource.identity(),
            "serializing resource"
        );
        Assembler::new(self.catalog).to_hash(id, resource, options)
    }

    /// Assembles a collection without consolidating curies.
    ///
    /// # Errors
    ///
    /// See [`to_collection_value`](Self::to_collection_value).
    pub fn to_collection_hash(
        &self,
        collection: &dyn ResourceCollection,
        options: &SerializeOptions,
    ) -> Result<Tree, HalError> {
        let id = match options.descriptor() {
            Some(id) => id,
            None => {
                let first = collection
                    .members()
                    .into_iter()
                    .next()
                    .ok_or_else(|| HalError::missing_descriptor(collection.identity()))?;
                self.lookup(first.as_ref())?
            }
        };
        let paginate = options
            .paginate()
            .unwrap_or_else(|| self.catalog.config().paginate());
        tracing::debug!(
            descriptor = %self.name_of(id),
            collection = %collection.identity(),
            paginate,
            "serializing collection"
        );
        Assembler::new(self.catalog).to_collection_hash(id, collection, options, paginate)
    }

    fn lookup(&self, resource: &dyn Resource) -> Result<DescriptorId, HalError> {
        self.catalog
            .lookup(resource)
            .map(Descriptor::id)
            .ok_or_else(|| HalError::missing_descriptor(resource.identity()))
    }

    fn name_of(&self, id: DescriptorId) -> &str {
        self.catalog.get(id).map_or("?", Descriptor::name)
    }
}
