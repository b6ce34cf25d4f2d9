//! Per-call authorization of attributes, links and embeds.
//!
//! [`PolicyRules`] is the declared rule table, shared by every call.
//! [`Policy`] binds a table to one call's current user, subject and options
//! and answers whether a field may appear.
//!
//! # Lookup
//!
//! For a name such as `doc:author` the lookup tries, in order:
//!
//! 1. the exact name, `doc:author`
//! 2. the curie-stripped name, `author`
//! 3. the table's default for the category (deny unless
//!    [`allow_by_default`](PolicyRules::allow_by_default) was declared)
//!
//! An exact match always wins over a stripped match. A [`Rule::Default`]
//! entry has no opinion and lets the lookup continue. The `self` link is
//! always allowed.
//!
//! # Example
//!
//! ```
//! use halform_core::{Policy, PolicyRules, RuleKind, SerializeOptions, Subject};
//! use serde_json::json;
//!
//! struct User { admin: bool }
//!
//! let rules = PolicyRules::new()
//!     .allow_by_default(RuleKind::Attribute)
//!     .attribute_when("secret", |scope| {
//!         scope.current_user::<User>().is_some_and(|user| user.admin)
//!     })
//!     .link("edit");
//!
//! let post = json!({ "id": 1 });
//! let options = SerializeOptions::new().with_current_user(User { admin: false });
//! let policy = Policy::new(&rules, Subject::Resource(&post), &options);
//!
//! assert!(policy.attribute_allowed("title"));
//! assert!(!policy.attribute_allowed("secret"));
//! assert!(policy.link_allowed("edit"));
//! assert!(policy.link_allowed("self"));
//! assert!(!policy.embed_allowed("comments"));
//! ```

use crate::options::SerializeOptions;
use crate::resource::{Resource, ResourceCollection, Subject};
use core::any::Any;
use core::fmt;
use indexmap::IndexMap;
use std::sync::Arc;

/// A type-erased rule predicate.
pub type RuleFn = Arc<dyn Fn(&PolicyScope<'_>) -> bool + Send + Sync>;

/// The rule registered for one name.
#[derive(Clone)]
pub enum Rule {
    /// Always allowed.
    Allow,
    /// Always denied.
    Deny,
    /// No opinion; fall through to the next lookup step.
    Default,
    /// Decided per call.
    When(RuleFn),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
            Self::Default => f.write_str("Default"),
            Self::When(_) => f.write_str("When"),
        }
    }
}

/// The field category a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Attributes.
    Attribute,
    /// Links.
    Link,
    /// Embeds.
    Embed,
}

/// A rule table with a default per category.
///
/// Tables are plain values: a subtype's table starts as a copy of its
/// parent's (see [`inherit`](Self::inherit)) and can add or replace rules by
/// name without touching the parent.
#[derive(Clone)]
pub struct PolicyRules {
    attributes: IndexMap<String, Rule>,
    links: IndexMap<String, Rule>,
    embeds: IndexMap<String, Rule>,
    allow_attributes: bool,
    allow_links: bool,
    allow_embeds: bool,
    transform_rels: bool,
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self {
            attributes: IndexMap::new(),
            links: IndexMap::new(),
            embeds: IndexMap::new(),
            allow_attributes: false,
            allow_links: false,
            allow_embeds: false,
            transform_rels: true,
        }
    }
}

impl PolicyRules {
    /// Creates a table that denies everything but the `self` link.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a table from a copy of `parent`'s rules and defaults.
    #[must_use]
    pub fn inherit(parent: &Self) -> Self {
        parent.clone()
    }

    /// Allows names without a rule in `kind`.
    #[must_use]
    pub fn allow_by_default(mut self, kind: RuleKind) -> Self {
        *self.default_slot(kind) = true;
        self
    }

    /// Denies names without a rule in `kind`.
    #[must_use]
    pub fn deny_by_default(mut self, kind: RuleKind) -> Self {
        *self.default_slot(kind) = false;
        self
    }

    /// Controls whether `-` in link and embed names is read as `_`. On by default.
    #[must_use]
    pub fn transform_rels(mut self, transform: bool) -> Self {
        self.transform_rels = transform;
        self
    }

    /// Registers a rule, replacing any existing rule for the same name.
    #[must_use]
    pub fn rule(mut self, kind: RuleKind, name: impl Into<String>, rule: Rule) -> Self {
        let name = self.normalize(kind, &name.into());
        self.table_mut(kind).insert(name, rule);
        self
    }

    /// Always allows an attribute.
    #[must_use]
    pub fn attribute(self, name: impl Into<String>) -> Self {
        self.rule(RuleKind::Attribute, name, Rule::Allow)
    }

    /// Allows an attribute when `predicate` holds.
    #[must_use]
    pub fn attribute_when<F>(self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&PolicyScope<'_>) -> bool + Send + Sync + 'static,
    {
        self.rule(RuleKind::Attribute, name, Rule::When(Arc::new(predicate)))
    }

    /// Always allows a link.
    #[must_use]
    pub fn link(self, rel: impl Into<String>) -> Self {
        self.rule(RuleKind::Link, rel, Rule::Allow)
    }

    /// Allows a link when `predicate` holds.
    #[must_use]
    pub fn link_when<F>(self, rel: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&PolicyScope<'_>) -> bool + Send + Sync + 'static,
    {
        self.rule(RuleKind::Link, rel, Rule::When(Arc::new(predicate)))
    }

    /// Always allows an embed.
    #[must_use]
    pub fn embed(self, name: impl Into<String>) -> Self {
        self.rule(RuleKind::Embed, name, Rule::Allow)
    }

    /// Allows an embed when `predicate` holds.
    #[must_use]
    pub fn embed_when<F>(self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&PolicyScope<'_>) -> bool + Send + Sync + 'static,
    {
        self.rule(RuleKind::Embed, name, Rule::When(Arc::new(predicate)))
    }

    /// Returns the default for `kind`.
    #[must_use]
    pub fn default_for(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::Attribute => self.allow_attributes,
            RuleKind::Link => self.allow_links,
            RuleKind::Embed => self.allow_embeds,
        }
    }

    /// Returns the rule deciding `name`, if any step of the lookup has one.
    #[must_use]
    pub fn rule_for(&self, kind: RuleKind, name: &str) -> Option<&Rule> {
        let name = self.normalize(kind, name);
        let table = self.table(kind);
        let decisive = |key: &str| table.get(key).filter(|rule| !matches!(rule, Rule::Default));

        decisive(&name).or_else(|| {
            name.split_once(':')
                .and_then(|(_, stripped)| decisive(stripped))
        })
    }

    /// Decides whether `name` is allowed in `scope`.
    #[must_use]
    pub fn allows(&self, kind: RuleKind, name: &str, scope: &PolicyScope<'_>) -> bool {
        match self.rule_for(kind, name) {
            Some(Rule::Allow) => true,
            Some(Rule::Deny) => false,
            Some(Rule::When(predicate)) => predicate(scope),
            Some(Rule::Default) | None => self.default_for(kind),
        }
    }

    fn normalize(&self, kind: RuleKind, name: &str) -> String {
        if self.transform_rels && kind != RuleKind::Attribute {
            name.replace('-', "_")
        } else {
            name.to_owned()
        }
    }

    fn table(&self, kind: RuleKind) -> &IndexMap<String, Rule> {
        match kind {
            RuleKind::Attribute => &self.attributes,
            RuleKind::Link => &self.links,
            RuleKind::Embed => &self.embeds,
        }
    }

    fn table_mut(&mut self, kind: RuleKind) -> &mut IndexMap<String, Rule> {
        match kind {
            RuleKind::Attribute => &mut self.attributes,
            RuleKind::Link => &mut self.links,
            RuleKind::Embed => &mut self.embeds,
        }
    }

    fn default_slot(&mut self, kind: RuleKind) -> &mut bool {
        match kind {
            RuleKind::Attribute => &mut self.allow_attributes,
            RuleKind::Link => &mut self.allow_links,
            RuleKind::Embed => &mut self.allow_embeds,
        }
    }
}

impl fmt::Debug for PolicyRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRules")
            .field("attributes", &self.attributes)
            .field("links", &self.links)
            .field("embeds", &self.embeds)
            .field("allow_attributes", &self.allow_attributes)
            .field("allow_links", &self.allow_links)
            .field("allow_embeds", &self.allow_embeds)
            .field("transform_rels", &self.transform_rels)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// What a rule predicate can see.
#[derive(Debug, Clone, Copy)]
pub struct PolicyScope<'a> {
    subject: Subject<'a>,
    options: &'a SerializeOptions,
}

impl<'a> PolicyScope<'a> {
    /// Returns the current user if it is of type `U`.
    #[must_use]
    pub fn current_user<U: Any>(&self) -> Option<&'a U> {
        self.options.current_user::<U>()
    }

    /// Returns the resource being serialized, unless this is a collection.
    #[must_use]
    pub fn resource(&self) -> Option<&'a dyn Resource> {
        self.subject.resource()
    }

    /// Returns the resource downcast to `T`.
    #[must_use]
    pub fn resource_as<T: Resource>(&self) -> Option<&'a T> {
        self.resource()?.downcast_ref::<T>()
    }

    /// Returns the collection, for collection-level fields.
    #[must_use]
    pub fn collection(&self) -> Option<&'a dyn ResourceCollection> {
        self.subject.collection()
    }

    /// Returns the call options.
    #[must_use]
    pub fn options(&self) -> &'a SerializeOptions {
        self.options
    }
}

/// A rule table bound to one serialization call.
#[derive(Debug, Clone, Copy)]
pub struct Policy<'a> {
    rules: &'a PolicyRules,
    scope: PolicyScope<'a>,
}

impl<'a> Policy<'a> {
    /// Binds `rules` to the subject and options of a call.
    #[must_use]
    pub fn new(rules: &'a PolicyRules, subject: Subject<'a>, options: &'a SerializeOptions) -> Self {
        Self {
            rules,
            scope: PolicyScope { subject, options },
        }
    }

    /// Returns whether an attribute may appear.
    #[must_use]
    pub fn attribute_allowed(&self, name: &str) -> bool {
        self.rules.allows(RuleKind::Attribute, name, &self.scope)
    }

    /// Returns whether a link may appear. `self` is always allowed.
    #[must_use]
    pub fn link_allowed(&self, rel: &str) -> bool {
        rel == "self" || self.rules.allows(RuleKind::Link, rel, &self.scope)
    }

    /// Returns whether an embed may appear.
    #[must_use]
    pub fn embed_allowed(&self, name: &str) -> bool {
        self.rules.allows(RuleKind::Embed, name, &self.scope)
    }
}
