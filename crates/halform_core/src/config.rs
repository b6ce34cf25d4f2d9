//! Catalog-wide configuration.
//!
//! ```
//! use halform_core::HalConfig;
//!
//! let config = HalConfig::new()
//!     .with_base_href("https://api.example.com/")
//!     .with_max_depth(8);
//!
//! assert_eq!(config.expand_href("/posts/1"), "https://api.example.com/posts/1");
//! assert_eq!(config.expand_href("https://cdn.example.com/a"), "https://cdn.example.com/a");
//! ```

/// Default bound on embed nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Environment variable holding the base href.
pub const ENV_BASE_HREF: &str = "HALFORM_BASE_HREF";

/// Environment variable holding the default for collection pagination.
pub const ENV_PAGINATE: &str = "HALFORM_PAGINATE";

/// Environment variable holding the embed nesting bound.
pub const ENV_MAX_DEPTH: &str = "HALFORM_MAX_DEPTH";

/// Settings shared by every serialization against one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalConfig {
    base_href: Option<String>,
    paginate: bool,
    max_depth: usize,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            base_href: None,
            paginate: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl HalConfig {
    /// Creates the default configuration: no base href, no pagination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from `HALFORM_*` environment variables.
    ///
    /// Absent or unparsable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base) = lookup(ENV_BASE_HREF) {
            config = config.with_base_href(base);
        }
        if let Some(paginate) = lookup(ENV_PAGINATE).and_then(|v| parse_flag(&v)) {
            config.paginate = paginate;
        }
        if let Some(depth) = lookup(ENV_MAX_DEPTH).and_then(|v| v.trim().parse().ok()) {
            config.max_depth = depth;
        }
        config
    }

    /// Sets the prefix for root-relative hrefs. Trailing slashes are dropped.
    #[must_use]
    pub fn with_base_href(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let trimmed = base.trim_end_matches('/');
        self.base_href = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Sets whether collections are paginated when a call does not say.
    #[must_use]
    pub fn with_paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// Sets the embed nesting bound.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the base href, if one is set.
    #[must_use]
    pub fn base_href(&self) -> Option<&str> {
        self.base_href.as_deref()
    }

    /// Returns the pagination default.
    #[must_use]
    pub fn paginate(&self) -> bool {
        self.paginate
    }

    /// Returns the embed nesting bound.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Prefixes a root-relative href with the base href.
    ///
    /// Absolute URLs, relative paths and templates not starting with `/`
    /// pass through unchanged, as does everything when no base is set.
    #[must_use]
    pub fn expand_href(&self, href: &str) -> String {
        match &self.base_href {
            Some(base) if href.starts_with('/') => format!("{base}{href}"),
            _ => href.to_owned(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = HalConfig::new();
        assert_eq!(config.base_href(), None);
        assert!(!config.paginate());
        assert_eq!(config.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn base_href_drops_trailing_slashes() {
        let config = HalConfig::new().with_base_href("http://localhost:3000///");
        assert_eq!(config.base_href(), Some("http://localhost:3000"));
        assert_eq!(config.expand_href("/items"), "http://localhost:3000/items");
    }

    #[test]
    fn empty_base_passes_everything_through() {
        let config = HalConfig::new().with_base_href("/");
        assert_eq!(config.base_href(), None);
        assert_eq!(config.expand_href("/items"), "/items");
    }

    #[test]
    fn only_root_relative_hrefs_are_expanded() {
        let config = HalConfig::new().with_base_href("https://api.test");
        assert_eq!(config.expand_href("http://other.test/x"), "http://other.test/x");
        assert_eq!(config.expand_href("items/1"), "items/1");
        assert_eq!(config.expand_href("/docs/{rel}"), "https://api.test/docs/{rel}");
    }

    #[test]
    fn reads_variables() {
        let config = HalConfig::from_lookup(lookup(&[
            (ENV_BASE_HREF, "https://api.test/"),
            (ENV_PAGINATE, "true"),
            (ENV_MAX_DEPTH, "4"),
        ]));
        assert_eq!(config.base_href(), Some("https://api.test"));
        assert!(config.paginate());
        assert_eq!(config.max_depth(), 4);
    }

    #[test]
    fn invalid_variables_keep_defaults() {
        let config = HalConfig::from_lookup(lookup(&[
            (ENV_PAGINATE, "sometimes"),
            (ENV_MAX_DEPTH, "deep"),
        ]));
        assert_eq!(config, HalConfig::default());
    }
}
