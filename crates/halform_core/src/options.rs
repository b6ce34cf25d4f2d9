//! Per-call serialization options.

use crate::descriptor::DescriptorId;
use core::any::Any;
use core::fmt;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Options for a single serialization call.
///
/// Options are never mutated while a document is assembled. Descending into
/// an embed produces a copy through [`nested`](Self::nested), so sibling
/// embeds can never observe each other's depth.
///
/// # Example
///
/// ```
/// use halform_core::SerializeOptions;
///
/// struct User { admin: bool }
///
/// let options = SerializeOptions::new()
///     .with_current_user(User { admin: true })
///     .with("locale", "sv");
///
/// assert!(options.current_user::<User>().is_some_and(|user| user.admin));
/// assert_eq!(options.get("locale").and_then(|v| v.as_str()), Some("sv"));
/// assert_eq!(options.nested().depth(), 1);
/// ```
#[derive(Clone, Default)]
pub struct SerializeOptions {
    current_user: Option<Arc<dyn Any + Send + Sync>>,
    descriptor: Option<DescriptorId>,
    paginate: Option<bool>,
    depth: usize,
    extra: Map<String, Value>,
}

impl SerializeOptions {
    /// Creates empty options at depth 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current user handed to policies and resolvers.
    #[must_use]
    pub fn with_current_user<U: Any + Send + Sync>(mut self, user: U) -> Self {
        self.current_user = Some(Arc::new(user));
        self
    }

    /// Returns the current user if it is of type `U`.
    #[must_use]
    pub fn current_user<U: Any>(&self) -> Option<&U> {
        let user: &(dyn Any + Send + Sync) = self.current_user.as_deref()?;
        user.downcast_ref::<U>()
    }

    /// Returns the current user without downcasting.
    #[must_use]
    pub fn current_user_any(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.current_user.as_deref()
    }

    /// Pins the descriptor used for the top-level resource, bypassing lookup.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: DescriptorId) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Returns the pinned descriptor, if any.
    #[must_use]
    pub fn descriptor(&self) -> Option<DescriptorId> {
        self.descriptor
    }

    /// Enables or disables pagination for this call.
    #[must_use]
    pub fn with_paginate(mut self, paginate: bool) -> Self {
        self.paginate = Some(paginate);
        self
    }

    /// Returns the per-call pagination flag, if set.
    #[must_use]
    pub fn paginate(&self) -> Option<bool> {
        self.paginate
    }

    /// Adds a caller-defined option, consumed only by resolvers and hooks.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns a caller-defined option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Current embed depth. The top-level resource is at depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns a copy one level deeper, for serializing an embedded resource.
    ///
    /// The pinned descriptor only applies to the top level and is cleared.
    #[must_use]
    pub fn nested(&self) -> Self {
        Self {
            current_user: self.current_user.clone(),
            descriptor: None,
            paginate: self.paginate,
            depth: self.depth + 1,
            extra: self.extra.clone(),
        }
    }
}

impl fmt::Debug for SerializeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeOptions")
            .field("current_user", &self.current_user.is_some())
            .field("descriptor", &self.descriptor)
            .field("paginate", &self.paginate)
            .field("depth", &self.depth)
            .field("extra", &self.extra)
            .finish()
    }
}
