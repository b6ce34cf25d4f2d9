//! Collection serialization and pagination.


use halform_core::{
    Attribute, Catalog, CollectionSpec, DescriptorBuilder, HalConfig, HalError, Link, Page,
    Pageable, Resource, ResourceCollection, SerializeOptions,
};
use halform_serializer::Serializer;
use serde_json::{Value, json};
use std::sync::Arc;
use test_utils::{Post, blog, blog_catalog};

fn posts(ids: std::ops::RangeInclusive<u64>) -> Vec<Arc<Post>> {
    ids.map(|id| Arc::new(Post::new(id, &format!("post {id}"))))
        .collect()
}

/// A collection with a total and hand-picked page numbers.
struct Listing {
    items: Vec<Arc<dyn Resource>>,
    total: u64,
    current: Option<u64>,
    next: Option<u64>,
}

impl Listing {
    fn new(count: u64) -> Self {
        Self {
            items: (1..=count)
                .map(|id| Arc::new(json!({ "id": id })) as Arc<dyn Resource>)
                .collect(),
            total: 40,
            current: None,
            next: None,
        }
    }
}

impl ResourceCollection for Listing {
    fn members(&self) -> Vec<Arc<dyn Resource>> {
        self.items.clone()
    }

    fn property(&self, name: &str) -> Option<Value> {
        (name == "total").then(|| self.total.into())
    }

    fn pageable(&self) -> Option<&dyn Pageable> {
        Some(self)
    }
}

impl Pageable for Listing {
    fn current_page(&self) -> Option<u64> {
        self.current
    }

    fn next_page(&self) -> Option<u64> {
        self.next
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shape
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn members_are_embedded_under_the_collection_name() {
    let (catalog, _) = blog();
    let members: Vec<Arc<dyn Resource>> = posts(1..=2)
        .into_iter()
        .map(|post| post as Arc<dyn Resource>)
        .collect();

    let value = Serializer::new(&catalog)
        .to_collection_value(&members, &SerializeOptions::new())
        .unwrap();

    assert_eq!(
        value,
        json!({
            "_links": {
                "self": { "href": "/posts" },
                "curies": [{ "name": "doc", "href": "/docs/{rel}", "templated": true }]
            },
            "_embedded": {
                "posts": [
                    {
                        "text": "post 1",
                        "_links": { "self": { "href": "/posts/1" } },
                        "_embedded": { "comments": [] }
                    },
                    {
                        "text": "post 2",
                        "_links": { "self": { "href": "/posts/2" } },
                        "_embedded": { "comments": [] }
                    }
                ]
            }
        })
    );
}

#[test]
fn collection_fields_resolve_against_the_collection() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Entry")
                .attribute(Attribute::property("id"))
                .collection(
                    CollectionSpec::new("entries")
                        .attribute(Attribute::property("total"))
                        .attribute(Attribute::resolved("count", |scope| {
                            let count = scope.collection().map_or(0, |c| c.members().len());
                            Ok(count)
                        }))
                        .link(Link::fixed("self", "/entries")),
                ),
        )
        .unwrap();

    let value = Serializer::new(&catalog)
        .to_collection_value(&Listing::new(2), &SerializeOptions::new().with_descriptor(id))
        .unwrap();

    assert_eq!(
        value,
        json!({
            "total": 40,
            "count": 2,
            "_links": { "self": { "href": "/entries" } },
            "_embedded": { "entries": [{ "id": 1 }, { "id": 2 }] }
        })
    );
}

#[test]
fn subtypes_inherit_the_collection_spec() {
    let (mut catalog, ids) = blog();
    let featured = catalog
        .declare(
            DescriptorBuilder::new("FeaturedPost")
                .extends(ids.post)
                .attribute(Attribute::fixed("featured", true)),
        )
        .unwrap();

    let members: Vec<Arc<dyn Resource>> = vec![Arc::new(Post::new(3, "pinned"))];
    let value = Serializer::new(&catalog)
        .to_collection_value(&members, &SerializeOptions::new().with_descriptor(featured))
        .unwrap();

    assert_eq!(value["_links"]["self"]["href"], "/posts");
    assert_eq!(value["_embedded"]["posts"][0]["featured"], true);
    assert_eq!(value["_embedded"]["posts"][0]["text"], "pinned");
}

#[test]
fn empty_collections_need_a_pinned_descriptor() {
    let (catalog, ids) = blog();
    let empty: Vec<Arc<dyn Resource>> = Vec::new();
    let serializer = Serializer::new(&catalog);

    let err = serializer
        .to_collection(&empty, &SerializeOptions::new())
        .unwrap_err();
    assert!(matches!(err, HalError::MissingDescriptor { ref model } if model == "collection of 0"));

    let value = serializer
        .to_collection_value(&empty, &SerializeOptions::new().with_descriptor(ids.post))
        .unwrap();
    assert_eq!(value["_embedded"], json!({ "posts": [] }));
}

#[test]
fn descriptors_without_a_collection_spec_are_rejected() {
    let (catalog, ids) = blog();
    let members: Vec<Arc<dyn Resource>> = Vec::new();
    let err = Serializer::new(&catalog)
        .to_collection(&members, &SerializeOptions::new().with_descriptor(ids.comment))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "trying to serialize a collection using 'Comment' which has no collection info"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn pages_get_self_prev_and_next_links() {
    let (catalog, _) = blog();
    let page = Page::new(posts(4..=6), 2, 3).with_total(9);

    let value = Serializer::new(&catalog)
        .to_collection_value(&page, &SerializeOptions::new().with_paginate(true))
        .unwrap();

    let links = value["_links"].as_object().unwrap();
    let keys: Vec<_> = links.keys().map(String::as_str).collect();
    assert_eq!(keys, ["self", "prev", "next", "curies"]);
    assert_eq!(links["self"]["href"], "/posts?page=2&per_page=3");
    assert_eq!(links["prev"]["href"], "/posts?page=1&per_page=3");
    assert_eq!(links["next"]["href"], "/posts?page=3&per_page=3");
    assert_eq!(value["_embedded"]["posts"].as_array().unwrap().len(), 3);
}

#[test]
fn pagination_keeps_existing_query_parameters() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Item").collection(
                CollectionSpec::new("items").link(Link::fixed("self", "/items?sort=name&page=1")),
            ),
        )
        .unwrap();
    let listing = Listing {
        current: Some(2),
        next: Some(3),
        ..Listing::new(3)
    };

    let value = Serializer::new(&catalog)
        .to_collection_value(
            &listing,
            &SerializeOptions::new().with_descriptor(id).with_paginate(true),
        )
        .unwrap();

    assert_eq!(
        value["_links"],
        json!({
            "self": { "href": "/items?sort=name&page=2" },
            "next": { "href": "/items?sort=name&page=3" }
        })
    );
}

#[test]
fn declared_pagination_links_are_not_replaced() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Item").collection(
                CollectionSpec::new("items")
                    .link(Link::fixed("self", "/items"))
                    .link(Link::fixed("next", "/items/after/3")),
            ),
        )
        .unwrap();
    let listing = Listing {
        current: Some(1),
        next: Some(2),
        ..Listing::new(1)
    };

    let value = Serializer::new(&catalog)
        .to_collection_value(
            &listing,
            &SerializeOptions::new().with_descriptor(id).with_paginate(true),
        )
        .unwrap();

    assert_eq!(value["_links"]["self"]["href"], "/items?page=1");
    assert_eq!(value["_links"]["next"]["href"], "/items/after/3");
}

#[test]
fn pagination_needs_a_current_page() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Item")
                .collection(CollectionSpec::new("items").link(Link::fixed("self", "/items"))),
        )
        .unwrap();

    let value = Serializer::new(&catalog)
        .to_collection_value(
            &Listing::new(1),
            &SerializeOptions::new().with_descriptor(id).with_paginate(true),
        )
        .unwrap();
    assert_eq!(value["_links"], json!({ "self": { "href": "/items" } }));
}

#[test]
fn configured_default_applies_unless_the_call_overrides_it() {
    let mut catalog = Catalog::new().with_config(HalConfig::new().with_paginate(true));
    blog_catalog(&mut catalog);
    let page = Page::new(posts(1..=2), 1, 2).with_total(2);
    let serializer = Serializer::new(&catalog);

    let value = serializer
        .to_collection_value(&page, &SerializeOptions::new())
        .unwrap();
    assert_eq!(value["_links"]["self"]["href"], "/posts?page=1&per_page=2");
    assert!(value["_links"].get("next").is_none());

    let value = serializer
        .to_collection_value(&page, &SerializeOptions::new().with_paginate(false))
        .unwrap();
    assert_eq!(value["_links"]["self"]["href"], "/posts");
}

#[test]
fn pagination_is_off_by_default() {
    let (catalog, _) = blog();
    let page = Page::new(posts(1..=1), 3, 1).with_total(10);

    let value = Serializer::new(&catalog)
        .to_collection_value(&page, &SerializeOptions::new())
        .unwrap();
    assert_eq!(value["_links"]["self"]["href"], "/posts");
    assert!(value["_links"].get("prev").is_none());
}
