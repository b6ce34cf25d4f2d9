//! Lazily computed fields.
//!
//! A [`Field`] is the building block for attributes, links, curies and embeds.
//! Its value comes from exactly one [`Source`]:
//!
//! - a fixed value, returned as-is even when empty, zero or `false`
//! - a resolver closure, run against a [`Scope`]
//! - the same-named property of the resource, when neither is given
//!
//! Resolver-bearing fields carry a context: the descriptor whose helpers the
//! resolver sees. Inheriting a field rebinds that context to the inheriting
//! descriptor via [`Field::rebind`].

use crate::descriptor::DescriptorId;
use crate::error::{BoxError, HalError};
use crate::resource::{Embedded, Subject};
use crate::scope::Scope;
use core::fmt;
use serde_json::Value;
use std::sync::Arc;

/// A type-erased resolver closure.
pub type Resolver<T> = Arc<dyn Fn(&Scope<'_>) -> Result<T, BoxError> + Send + Sync>;

fn resolver<T, F>(func: F) -> Resolver<T>
where
    F: Fn(&Scope<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
{
    Arc::new(func)
}

/// A value type a [`Field`] can produce.
pub trait FieldValue: Clone + Send + Sync + 'static {
    /// Reads the fallback value from the subject, for fields without a value
    /// or resolver.
    fn from_subject(subject: Subject<'_>, name: &str) -> Option<Self>;

    /// Returns whether a fixed value counts as given.
    ///
    /// Only `None`-like values are absent: an empty string is a value.
    fn is_present(&self) -> bool {
        true
    }
}

impl FieldValue for Value {
    fn from_subject(subject: Subject<'_>, name: &str) -> Option<Self> {
        subject.property(name)
    }
}

impl FieldValue for Embedded {
    fn from_subject(subject: Subject<'_>, name: &str) -> Option<Self> {
        subject.relation(name)
    }
}

impl<T: Clone + Send + Sync + 'static> FieldValue for Option<T> {
    fn from_subject(_subject: Subject<'_>, _name: &str) -> Option<Self> {
        None
    }

    fn is_present(&self) -> bool {
        self.is_some()
    }
}

/// Where a field's value comes from.
#[derive(Clone)]
pub enum Source<T> {
    /// A fixed value.
    Fixed(T),
    /// A resolver closure.
    Resolved(Resolver<T>),
    /// The same-named property of the resource.
    Property,
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(_) => f.write_str("Fixed"),
            Self::Resolved(_) => f.write_str("Resolved"),
            Self::Property => f.write_str("Property"),
        }
    }
}

/// Shared behavior of everything a [`FieldSet`](crate::FieldSet) holds.
pub trait Declared: Clone {
    /// The field name (the rel for links).
    fn name(&self) -> &str;

    /// Rebinds the resolver context to another descriptor.
    fn rebind(&mut self, context: DescriptorId);

    /// Deepest embed level at which the field is visible, if bounded.
    fn embed_depth(&self) -> Option<usize>;

    /// Returns whether the field is visible at `depth`.
    ///
    /// Unbounded fields are visible everywhere; bounded ones while `depth <= embed_depth`.
    fn visible_at(&self, depth: usize) -> bool {
        self.embed_depth().is_none_or(|max| depth <= max)
    }
}

/// A named, lazily computed value.
///
/// # Example
///
/// ```
/// use halform_core::Attribute;
///
/// let kind = Attribute::fixed("kind", "post");
/// let title = Attribute::property("title").with_embed_depth(1);
/// let id = Attribute::resolved("id", |scope| {
///     Ok(scope.options().get("id").cloned().unwrap_or_default())
/// });
/// # let _ = (kind, title, id);
/// ```
#[derive(Clone)]
pub struct Field<T> {
    name: String,
    source: Source<T>,
    embed_depth: Option<usize>,
    context: Option<DescriptorId>,
}

impl<T: FieldValue> Field<T> {
    /// Creates a field with a fixed value.
    pub fn fixed(name: impl Into<String>, value: impl Into<T>) -> Self {
        Self::from_source(name, Source::Fixed(value.into()))
    }

    /// Creates a field computed by a resolver.
    pub fn resolved<F, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<R, BoxError> + Send + Sync + 'static,
        R: Into<T>,
    {
        Self::from_source(
            name,
            Source::Resolved(resolver(move |scope| func(scope).map(Into::into))),
        )
    }

    /// Creates a field read from the resource's same-named property.
    pub fn property(name: impl Into<String>) -> Self {
        Self::from_source(name, Source::Property)
    }

    /// Creates a field from an explicit source.
    pub fn from_source(name: impl Into<String>, source: Source<T>) -> Self {
        Self {
            name: name.into(),
            source,
            embed_depth: None,
            context: None,
        }
    }

    /// Limits the field to embed levels up to and including `depth`.
    #[must_use]
    pub fn with_embed_depth(mut self, depth: usize) -> Self {
        self.embed_depth = Some(depth);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value source.
    #[must_use]
    pub fn source(&self) -> &Source<T> {
        &self.source
    }

    /// Returns the embed depth bound, if any.
    #[must_use]
    pub fn embed_depth(&self) -> Option<usize> {
        self.embed_depth
    }

    /// Returns the descriptor the resolver is bound to.
    ///
    /// Always `None` for fields without a resolver.
    #[must_use]
    pub fn context(&self) -> Option<DescriptorId> {
        self.context
    }

    /// Rebinds the resolver context. No-op for fields without a resolver.
    pub fn rebind(&mut self, context: DescriptorId) {
        if matches!(self.source, Source::Resolved(_)) {
            self.context = Some(context);
        }
    }

    /// Returns whether the field has a usable fixed value or a resolver.
    #[must_use]
    pub fn has_value(&self) -> bool {
        match &self.source {
            Source::Fixed(value) => value.is_present(),
            Source::Resolved(_) => true,
            Source::Property => false,
        }
    }

    pub(crate) fn qualify(&mut self, prefix: &str) {
        self.name = format!("{prefix}:{}", self.name);
    }

    /// Computes the value against `scope`.
    ///
    /// Resolvers run with the scope rebound to the field's context.
    ///
    /// # Errors
    ///
    /// - [`HalError::Resolver`] if the resolver fails
    /// - [`HalError::MissingValue`] if the field falls back to a property the
    ///   subject does not have
    pub fn value(&self, scope: &Scope<'_>) -> Result<T, HalError> {
        match &self.source {
            Source::Resolved(func) => {
                let scope = scope.rebound(self.context);
                func(&scope).map_err(|source| HalError::Resolver {
                    field: self.name.clone(),
                    resource: scope.subject().identity(),
                    source,
                })
            }
            Source::Fixed(value) => Ok(value.clone()),
            Source::Property => T::from_subject(scope.subject(), &self.name)
                .ok_or_else(|| HalError::missing_value(&self.name, scope.subject().identity())),
        }
    }
}

impl<T: FieldValue> Declared for Field<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn rebind(&mut self, context: DescriptorId) {
        Self::rebind(self, context);
    }

    fn embed_depth(&self) -> Option<usize> {
        self.embed_depth
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("embed_depth", &self.embed_depth)
            .field("context", &self.context)
            .finish()
    }
}

/// A top-level attribute of a document.
pub type Attribute = Field<Value>;
