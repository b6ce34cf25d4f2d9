//! Pagination capability.
//!
//! A collection opts into pagination by returning a [`Pageable`] from
//! [`ResourceCollection::pageable`]. [`Page`] is a ready-made paged
//! collection for callers that do not have their own.

use crate::resource::{Resource, ResourceCollection};
use std::sync::Arc;

/// Page metadata a collection can expose.
pub trait Pageable {
    /// The current page number. `None` disables pagination.
    fn current_page(&self) -> Option<u64>;

    /// The previous page number, if there is one.
    fn prev_page(&self) -> Option<u64> {
        None
    }

    /// The next page number, if there is one.
    fn next_page(&self) -> Option<u64> {
        None
    }

    /// The number of members per page.
    fn page_size(&self) -> Option<u64> {
        None
    }
}

/// One page of a larger sequence of resources.
///
/// # Example
///
/// ```
/// use halform_core::{Page, Pageable};
/// use std::sync::Arc;
///
/// let members = vec![Arc::new(serde_json::json!({ "id": 4 }))];
/// let page = Page::new(members, 2, 3).with_total(7);
///
/// assert_eq!(page.prev_page(), Some(1));
/// assert_eq!(page.next_page(), Some(3));
/// ```
#[derive(Clone)]
pub struct Page {
    members: Vec<Arc<dyn Resource>>,
    current_page: u64,
    page_size: u64,
    total: Option<u64>,
}

impl Page {
    /// Creates a page from its members, 1-based page number and page size.
    pub fn new<R: Resource>(
        members: impl IntoIterator<Item = Arc<R>>,
        current_page: u64,
        page_size: u64,
    ) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|member| member as Arc<dyn Resource>)
                .collect(),
            current_page,
            page_size,
            total: None,
        }
    }

    /// Sets the total number of resources across all pages.
    ///
    /// Without a total there is no next page.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

impl Pageable for Page {
    fn current_page(&self) -> Option<u64> {
        Some(self.current_page)
    }

    fn prev_page(&self) -> Option<u64> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    fn next_page(&self) -> Option<u64> {
        let total = self.total?;
        (self.current_page.saturating_mul(self.page_size) < total).then(|| self.current_page + 1)
    }

    fn page_size(&self) -> Option<u64> {
        Some(self.page_size)
    }
}

impl ResourceCollection for Page {
    fn members(&self) -> Vec<Arc<dyn Resource>> {
        self.members.clone()
    }

    fn pageable(&self) -> Option<&dyn Pageable> {
        Some(self)
    }

    fn identity(&self) -> String {
        format!("page {} of size {}", self.current_page, self.page_size)
    }
}
