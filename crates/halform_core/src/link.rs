//! Links, curies and embeds.

use crate::descriptor::DescriptorId;
use crate::error::{BoxError, HalError};
use crate::field::{Declared, Field};
use crate::resource::Embedded;
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// LinkTarget
// ─────────────────────────────────────────────────────────────────────────────

/// Optional attributes of a HAL link object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttributes {
    /// Secondary key for links sharing a rel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// HTTP method to use when following the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Media type of the target.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// URL with deprecation information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,
    /// Profile URI of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Whether `href` is a URI template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

impl LinkAttributes {
    /// Fills every unset attribute from `defaults`.
    pub fn fill_from(&mut self, defaults: &Self) {
        fn fill<T: Clone>(slot: &mut Option<T>, default: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(default);
            }
        }
        fill(&mut self.name, &defaults.name);
        fill(&mut self.method, &defaults.method);
        fill(&mut self.media_type, &defaults.media_type);
        fill(&mut self.title, &defaults.title);
        fill(&mut self.deprecation, &defaults.deprecation);
        fill(&mut self.profile, &defaults.profile);
        fill(&mut self.templated, &defaults.templated);
    }
}

/// A resolved link: an href plus optional attributes.
///
/// Serializes with `href` first, followed by the attributes that are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    /// The target URI or URI template.
    pub href: String,
    /// Optional attributes.
    #[serde(flatten)]
    pub attributes: LinkAttributes,
}

impl LinkTarget {
    /// Creates a target with only an href.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            attributes: LinkAttributes::default(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.attributes.method = Some(method.into());
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.attributes.media_type = Some(media_type.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.attributes.title = Some(title.into());
        self
    }

    /// Sets the deprecation URL.
    #[must_use]
    pub fn deprecation(mut self, deprecation: impl Into<String>) -> Self {
        self.attributes.deprecation = Some(deprecation.into());
        self
    }

    /// Sets the profile.
    #[must_use]
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.attributes.profile = Some(profile.into());
        self
    }

    /// Marks the href as a URI template.
    #[must_use]
    pub fn templated(mut self, templated: bool) -> Self {
        self.attributes.templated = Some(templated);
        self
    }

    /// Sets the secondary name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.attributes.name = Some(name.into());
        self
    }
}

/// Conversion into an optional link target. `None` leaves the link out.
pub trait IntoLinkTarget {
    /// Performs the conversion.
    fn into_link_target(self) -> Option<LinkTarget>;
}

impl IntoLinkTarget for LinkTarget {
    fn into_link_target(self) -> Option<LinkTarget> {
        Some(self)
    }
}

impl IntoLinkTarget for String {
    fn into_link_target(self) -> Option<LinkTarget> {
        Some(LinkTarget::new(self))
    }
}

impl IntoLinkTarget for &str {
    fn into_link_target(self) -> Option<LinkTarget> {
        Some(LinkTarget::new(self))
    }
}

impl<T: IntoLinkTarget> IntoLinkTarget for Option<T> {
    fn into_link_target(self) -> Option<LinkTarget> {
        self.and_then(IntoLinkTarget::into_link_target)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Link
// ─────────────────────────────────────────────────────────────────────────────

/// A declared link. Its name is the rel, possibly curie-qualified (`doc:user`).
///
/// # Example
///
/// ```
/// use halform_core::{Link, LinkTarget};
///
/// let this = Link::fixed("self", "/posts");
/// let edit = Link::resolved("edit", |scope| {
///     let id = scope.property("id").unwrap_or_default();
///     Ok(format!("/posts/{id}/edit"))
/// })
/// .method("PUT");
/// let search = Link::fixed("search", LinkTarget::new("/posts{?q}").templated(true));
/// # let _ = (this, edit, search);
/// ```
#[derive(Debug, Clone)]
pub struct Link {
    field: Field<Option<LinkTarget>>,
    defaults: LinkAttributes,
}

impl Link {
    /// Declares a link with a fixed target.
    pub fn fixed(rel: impl Into<String>, target: impl IntoLinkTarget) -> Self {
        Self::from_field(Field::fixed(rel, target.into_link_target()))
    }

    /// Declares a link computed by a resolver.
    ///
    /// The resolver may return a bare href, a [`LinkTarget`], or `None` to
    /// leave the link out.
    pub fn resolved<F, R>(rel: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<R, BoxError> + Send + Sync + 'static,
        R: IntoLinkTarget,
    {
        Self::from_field(Field::resolved(rel, move |scope| {
            func(scope).map(IntoLinkTarget::into_link_target)
        }))
    }

    fn from_field(field: Field<Option<LinkTarget>>) -> Self {
        Self {
            field,
            defaults: LinkAttributes::default(),
        }
    }

    /// Sets the HTTP method used unless the target sets its own.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.defaults.method = Some(method.into());
        self
    }

    /// Sets the title used unless the target sets its own.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.defaults.title = Some(title.into());
        self
    }

    /// Marks the href as templated unless the target says otherwise.
    #[must_use]
    pub fn templated(mut self, templated: bool) -> Self {
        self.defaults.templated = Some(templated);
        self
    }

    /// Limits the link to embed levels up to and including `depth`.
    #[must_use]
    pub fn with_embed_depth(mut self, depth: usize) -> Self {
        self.field = self.field.with_embed_depth(depth);
        self
    }

    /// Returns the rel.
    #[must_use]
    pub fn rel(&self) -> &str {
        self.field.name()
    }

    /// Returns the declared HTTP method.
    #[must_use]
    pub fn http_method(&self) -> Option<&str> {
        self.defaults.method.as_deref()
    }

    /// Returns the underlying field.
    #[must_use]
    pub fn field(&self) -> &Field<Option<LinkTarget>> {
        &self.field
    }

    pub(crate) fn qualify(&mut self, prefix: &str) {
        self.field.qualify(prefix);
    }

    /// Resolves the target. `None` (or an empty href) means the link is left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver fails.
    pub fn resolve(&self, scope: &Scope<'_>) -> Result<Option<LinkTarget>, HalError> {
        let Some(mut target) = self.field.value(scope)? else {
            return Ok(None);
        };
        if target.href.is_empty() {
            return Ok(None);
        }
        target.attributes.fill_from(&self.defaults);
        Ok(Some(target))
    }
}

impl Declared for Link {
    fn name(&self) -> &str {
        self.field.name()
    }

    fn rebind(&mut self, context: DescriptorId) {
        self.field.rebind(context);
    }

    fn embed_depth(&self) -> Option<usize> {
        self.field.embed_depth()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Curie
// ─────────────────────────────────────────────────────────────────────────────

/// A declared curie: a namespace token and a templated href containing `{rel}`.
#[derive(Debug, Clone)]
pub struct Curie {
    field: Field<Option<String>>,
}

/// A resolved curie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurieEntry {
    /// Namespace token.
    pub name: String,
    /// Templated href.
    pub href: String,
    /// `true` for every curie; assumed when absent.
    #[serde(default = "templated_by_default")]
    pub templated: bool,
}

fn templated_by_default() -> bool {
    true
}

impl Curie {
    /// Declares a curie with a fixed href.
    pub fn fixed(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            field: Field::fixed(name, Some(href.into())),
        }
    }

    /// Declares a curie whose href is computed by a resolver.
    pub fn resolved<F, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<R, BoxError> + Send + Sync + 'static,
        R: Into<Option<String>>,
    {
        Self {
            field: Field::resolved(name, func),
        }
    }

    /// Limits the curie to embed levels up to and including `depth`.
    #[must_use]
    pub fn with_embed_depth(mut self, depth: usize) -> Self {
        self.field = self.field.with_embed_depth(depth);
        self
    }

    /// Returns the namespace token.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Returns the underlying field.
    #[must_use]
    pub fn field(&self) -> &Field<Option<String>> {
        &self.field
    }

    /// Resolves the curie. `None` means it is left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver fails.
    pub fn resolve(&self, scope: &Scope<'_>) -> Result<Option<CurieEntry>, HalError> {
        Ok(self.field.value(scope)?.map(|href| CurieEntry {
            name: self.field.name().to_owned(),
            href,
            templated: true,
        }))
    }
}

impl Declared for Curie {
    fn name(&self) -> &str {
        self.field.name()
    }

    fn rebind(&mut self, context: DescriptorId) {
        self.field.rebind(context);
    }

    fn embed_depth(&self) -> Option<usize> {
        self.field.embed_depth()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embed
// ─────────────────────────────────────────────────────────────────────────────

/// A declared embed of related resources.
///
/// The embedded resources are serialized with the pinned descriptor, or with
/// the descriptor registered for their model type.
#[derive(Debug, Clone)]
pub struct Embed {
    field: Field<Embedded>,
    descriptor: Option<DescriptorId>,
}

impl Embed {
    /// Declares an embed read from the resource's same-named relation.
    pub fn property(name: impl Into<String>) -> Self {
        Self::from_field(Field::property(name))
    }

    /// Declares an embed with a fixed value.
    pub fn fixed(name: impl Into<String>, value: impl Into<Embedded>) -> Self {
        Self::from_field(Field::fixed(name, value))
    }

    /// Declares an embed computed by a resolver.
    pub fn resolved<F, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<R, BoxError> + Send + Sync + 'static,
        R: Into<Embedded>,
    {
        Self::from_field(Field::resolved(name, func))
    }

    fn from_field(field: Field<Embedded>) -> Self {
        Self {
            field,
            descriptor: None,
        }
    }

    /// Pins the descriptor used for the embedded resources.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: DescriptorId) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Limits the embed to embed levels up to and including `depth`.
    #[must_use]
    pub fn with_embed_depth(mut self, depth: usize) -> Self {
        self.field = self.field.with_embed_depth(depth);
        self
    }

    /// Returns the embed name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Returns the pinned descriptor, if any.
    #[must_use]
    pub fn descriptor(&self) -> Option<DescriptorId> {
        self.descriptor
    }

    /// Returns the underlying field.
    #[must_use]
    pub fn field(&self) -> &Field<Embedded> {
        &self.field
    }

    pub(crate) fn qualify(&mut self, prefix: &str) {
        self.field.qualify(prefix);
    }

    /// Computes the embedded value.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver fails or the relation is missing.
    pub fn value(&self, scope: &Scope<'_>) -> Result<Embedded, HalError> {
        self.field.value(scope)
    }
}

impl Declared for Embed {
    fn name(&self) -> &str {
        self.field.name()
    }

    fn rebind(&mut self, context: DescriptorId) {
        self.field.rebind(context);
    }

    fn embed_depth(&self) -> Option<usize> {
        self.field.embed_depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_targets_serialize_href_first_and_skip_unset() {
        let target = LinkTarget::new("/posts/1").method("PUT").title("Edit");
        assert_eq!(
            serde_json::to_string(&target).unwrap(),
            r#"{"href":"/posts/1","method":"PUT","title":"Edit"}"#
        );
    }

    #[test]
    fn media_type_serializes_as_type() {
        let target = LinkTarget::new("/a").media_type("text/html").templated(true);
        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            json!({ "href": "/a", "type": "text/html", "templated": true })
        );
    }

    #[test]
    fn declared_defaults_fill_only_unset_attributes() {
        let mut attributes = LinkAttributes {
            method: Some("POST".into()),
            ..LinkAttributes::default()
        };
        let defaults = LinkAttributes {
            method: Some("PUT".into()),
            title: Some("t".into()),
            ..LinkAttributes::default()
        };
        attributes.fill_from(&defaults);
        assert_eq!(attributes.method.as_deref(), Some("POST"));
        assert_eq!(attributes.title.as_deref(), Some("t"));
    }

    #[test]
    fn link_without_target_has_no_value() {
        assert!(!Link::fixed("self", None::<&str>).field().has_value());
        assert!(Link::fixed("self", "/a").field().has_value());
        assert!(Link::resolved("self", |_| Ok(None::<String>)).field().has_value());
    }

    #[test]
    fn curie_entries_are_templated_unless_stated() {
        let entry: CurieEntry =
            serde_json::from_value(json!({ "name": "doc", "href": "/docs/{rel}" })).unwrap();
        assert!(entry.templated);

        let entry: CurieEntry =
            serde_json::from_value(json!({ "name": "doc", "href": "/d", "templated": false }))
                .unwrap();
        assert!(!entry.templated);
    }

    #[test]
    fn declared_method_is_kept() {
        let link = Link::fixed("edit", "/a").method("PUT");
        assert_eq!(link.http_method(), Some("PUT"));
        assert_eq!(link.rel(), "edit");
    }
}
