//! Pagination links for collections.
//!
//! [`paginate`] rewrites a collection's `self` href to carry `page` and
//! `per_page` query parameters and adds `prev` / `next` links built the same
//! way. Links the collection already declares are never replaced.

use halform_core::Pageable;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

/// An href split into path, query parameters and fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUri {
    path: String,
    query: IndexMap<String, Option<String>>,
    fragment: Option<String>,
}

impl PageUri {
    /// Splits `href` at `?` and `#`. Parameters keep their order.
    #[must_use]
    pub fn parse(href: &str) -> Self {
        let (rest, fragment) = match href.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_owned())),
            None => (href, None),
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_owned(), Some(value.to_owned())),
                None => (pair.to_owned(), None),
            })
            .collect();
        Self {
            path: path.to_owned(),
            query,
            fragment,
        }
    }

    /// Returns a copy with `page` and, when known, `per_page` set.
    ///
    /// Existing parameters with those names are replaced in place.
    #[must_use]
    pub fn with_page(&self, page: u64, per_page: Option<u64>) -> Self {
        let mut uri = self.clone();
        uri.query.insert("page".to_owned(), Some(page.to_string()));
        if let Some(per_page) = per_page {
            uri.query.insert("per_page".to_owned(), Some(per_page.to_string()));
        }
        uri
    }

    /// Returns the value of a query parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key)?.as_deref()
    }
}

impl core::fmt::Display for PageUri {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            f.write_str(if i == 0 { "?" } else { "&" })?;
            f.write_str(key)?;
            if let Some(value) = value {
                write!(f, "={value}")?;
            }
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Adds pagination to a collection tree.
///
/// Does nothing unless the tree has a `_links.self.href` and the pager
/// reports a current page. Returns whether the tree was changed.
pub fn paginate(tree: &mut Map<String, Value>, pager: &dyn Pageable) -> bool {
    let Some(current) = pager.current_page() else {
        return false;
    };
    let Some(Value::Object(links)) = tree.get_mut("_links") else {
        return false;
    };
    let Some(self_href) = links
        .get("self")
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
    else {
        return false;
    };

    let uri = PageUri::parse(self_href);
    let per_page = pager.page_size();
    let href_for = |page: u64| uri.with_page(page, per_page).to_string();

    if let Some(Value::Object(self_link)) = links.get_mut("self") {
        self_link.insert("href".to_owned(), Value::String(href_for(current)));
    }
    if let Some(prev) = pager.prev_page()
        && !links.contains_key("prev")
    {
        links.insert("prev".to_owned(), json!({ "href": href_for(prev) }));
    }
    if let Some(next) = pager.next_page()
        && !links.contains_key("next")
    {
        links.insert("next".to_owned(), json!({ "href": href_for(next) }));
    }

    tracing::trace!(current, prev = ?pager.prev_page(), next = ?pager.next_page(), "paginated collection");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pager {
        current: Option<u64>,
        prev: Option<u64>,
        next: Option<u64>,
        size: Option<u64>,
    }

    impl Pageable for Pager {
        fn current_page(&self) -> Option<u64> {
            self.current
        }
        fn prev_page(&self) -> Option<u64> {
            self.prev
        }
        fn next_page(&self) -> Option<u64> {
            self.next
        }
        fn page_size(&self) -> Option<u64> {
            self.size
        }
    }

    fn tree(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn parse_keeps_order_and_fragment() {
        let uri = PageUri::parse("/items?sort=name&flag&page=1#top");
        assert_eq!(uri.param("sort"), Some("name"));
        assert_eq!(uri.param("flag"), None);
        assert_eq!(
            uri.with_page(2, Some(10)).to_string(),
            "/items?sort=name&flag&page=2&per_page=10#top"
        );
    }

    #[test]
    fn bare_paths_gain_a_query() {
        assert_eq!(PageUri::parse("/items").with_page(1, None).to_string(), "/items?page=1");
    }

    #[test]
    fn adds_prev_and_next() {
        let mut tree = tree(json!({ "_links": { "self": { "href": "/items?page=1" } } }));
        let pager = Pager {
            current: Some(2),
            prev: Some(1),
            next: Some(3),
            size: Some(3),
        };

        assert!(paginate(&mut tree, &pager));
        assert_eq!(
            Value::Object(tree),
            json!({
                "_links": {
                    "self": { "href": "/items?page=2&per_page=3" },
                    "prev": { "href": "/items?page=1&per_page=3" },
                    "next": { "href": "/items?page=3&per_page=3" }
                }
            })
        );
    }

    #[test]
    fn declared_links_win() {
        let mut tree = tree(json!({
            "_links": {
                "self": { "href": "/items" },
                "next": { "href": "/custom-next" }
            }
        }));
        let pager = Pager {
            current: Some(1),
            prev: None,
            next: Some(2),
            size: None,
        };

        assert!(paginate(&mut tree, &pager));
        assert_eq!(tree["_links"]["self"]["href"], "/items?page=1");
        assert_eq!(tree["_links"]["next"]["href"], "/custom-next");
        assert!(tree["_links"].get("prev").is_none());
    }

    #[test]
    fn needs_a_self_link_and_a_current_page() {
        let pager = Pager {
            current: Some(1),
            prev: None,
            next: Some(2),
            size: None,
        };
        let mut no_self = tree(json!({ "_links": { "up": { "href": "/" } } }));
        assert!(!paginate(&mut no_self, &pager));
        assert!(no_self["_links"].get("next").is_none());

        let unpaged = Pager {
            current: None,
            prev: None,
            next: Some(2),
            size: None,
        };
        let mut with_self = tree(json!({ "_links": { "self": { "href": "/items" } } }));
        assert!(!paginate(&mut with_self, &unpaged));
        assert_eq!(with_self["_links"]["self"]["href"], "/items");
    }
}
