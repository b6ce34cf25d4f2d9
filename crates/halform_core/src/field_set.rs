//! Ordered, name-deduplicating field collections.

use crate::descriptor::DescriptorId;
use crate::field::Declared;
use core::fmt;

/// An ordered collection of fields of one kind.
///
/// [`declare`](Self::declare) replaces any field with the same name, which is
/// how a descriptor overrides what it inherits. [`append`](Self::append)
/// keeps existing fields, so several links can share a rel.
#[derive(Clone)]
pub struct FieldSet<F> {
    fields: Vec<F>,
}

impl<F> Default for FieldSet<F> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<F: Declared> FieldSet<F> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `parent`'s fields with every resolver rebound to `context`.
    #[must_use]
    pub fn inherited_from(parent: &Self, context: DescriptorId) -> Self {
        let mut inherited = parent.clone();
        inherited.rebind_all(context);
        inherited
    }

    /// Removes any same-named field, then appends `field`.
    pub fn declare(&mut self, field: F) {
        self.fields.retain(|existing| existing.name() != field.name());
        self.fields.push(field);
    }

    /// Appends `field`, keeping same-named fields.
    pub fn append(&mut self, field: F) {
        self.fields.push(field);
    }

    /// Lays `own` over this set: every name `own` declares replaces all
    /// same-named fields here, and `own`'s fields are appended in order.
    pub fn overlay(&mut self, own: Self) {
        self.fields
            .retain(|existing| !own.fields.iter().any(|field| field.name() == existing.name()));
        self.fields.extend(own.fields);
    }

    /// Rebinds every field's resolver context.
    pub fn rebind_all(&mut self, context: DescriptorId) {
        for field in &mut self.fields {
            field.rebind(context);
        }
    }

    /// Returns the first field with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&F> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns all fields with the given name.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a F> + 'a {
        self.fields.iter().filter(move |field| field.name() == name)
    }

    /// Iterates over the fields in declaration order.
    pub fn iter(&self) -> core::slice::Iter<'_, F> {
        self.fields.iter()
    }

    /// Returns field names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(Declared::name).collect()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a, F> IntoIterator for &'a FieldSet<F> {
    type Item = &'a F;
    type IntoIter = core::slice::Iter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<F: Declared> fmt::Debug for FieldSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
