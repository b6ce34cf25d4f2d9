//! The execution context handed to resolvers, helpers and hooks.

use crate::catalog::Catalog;
use crate::descriptor::{Descriptor, DescriptorId};
use crate::error::{BoxError, HalError};
use crate::options::SerializeOptions;
use crate::resource::{Resource, ResourceCollection, Subject};
use core::any::Any;
use core::fmt;
use serde_json::Value;

/// What a resolver can see while it runs.
///
/// A scope is created per field evaluation and never outlives it, so nothing
/// a resolver observes can leak into another call.
///
/// The context is the descriptor the resolver is bound to. Named helpers are
/// looked up there, which lets a subtype override a helper used by an
/// inherited field.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    catalog: &'a Catalog,
    context: DescriptorId,
    subject: Subject<'a>,
    options: &'a SerializeOptions,
}

impl<'a> Scope<'a> {
    /// Creates a scope.
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        context: DescriptorId,
        subject: Subject<'a>,
        options: &'a SerializeOptions,
    ) -> Self {
        Self {
            catalog,
            context,
            subject,
            options,
        }
    }

    /// Returns a copy bound to `context`, or this scope if `None`.
    #[must_use]
    pub fn rebound(&self, context: Option<DescriptorId>) -> Self {
        Self {
            context: context.unwrap_or(self.context),
            ..*self
        }
    }

    /// Returns what the field is resolved against.
    #[must_use]
    pub fn subject(&self) -> Subject<'a> {
        self.subject
    }

    /// Returns the resource, unless this is a collection-level field.
    #[must_use]
    pub fn resource(&self) -> Option<&'a dyn Resource> {
        self.subject.resource()
    }

    /// Returns the resource downcast to `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no resource or it is not a `T`.
    pub fn resource_as<T: Resource>(&self) -> Result<&'a T, BoxError> {
        let resource = self
            .resource()
            .ok_or_else(|| format!("expected a {}, got a collection", type_name::<T>()))?;
        resource.downcast_ref::<T>().ok_or_else(|| {
            format!("expected a {}, got {}", type_name::<T>(), resource.identity()).into()
        })
    }

    /// Returns the collection, for collection-level fields.
    #[must_use]
    pub fn collection(&self) -> Option<&'a dyn ResourceCollection> {
        self.subject.collection()
    }

    /// Reads a property of the subject.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.subject.property(name)
    }

    /// Returns the call options.
    #[must_use]
    pub fn options(&self) -> &'a SerializeOptions {
        self.options
    }

    /// Returns the current user if it is of type `U`.
    #[must_use]
    pub fn current_user<U: Any>(&self) -> Option<&'a U> {
        self.options.current_user::<U>()
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Returns the id of the context descriptor.
    #[must_use]
    pub fn context_id(&self) -> DescriptorId {
        self.context
    }

    /// Returns the context descriptor.
    #[must_use]
    pub fn context(&self) -> Option<&'a Descriptor> {
        self.catalog.get(self.context)
    }

    /// Calls a named helper of the context descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the helper is not declared or fails.
    pub fn helper(&self, name: &str) -> Result<Value, BoxError> {
        let descriptor = self
            .context()
            .ok_or(HalError::UnknownDescriptor(self.context))?;
        let helper = descriptor
            .helper(name)
            .ok_or_else(|| HalError::UnknownHelper {
                name: name.to_owned(),
                descriptor: descriptor.name().to_owned(),
            })?;
        helper(self)
    }
}

fn type_name<T>() -> &'static str {
    core::any::type_name::<T>()
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("context", &self.context)
            .field("subject", &self.subject)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
