//! End-to-end serialization of single resources.
//!
//! Covers the document shape (attributes, `_links`, `_embedded`), value
//! resolution, depth gating, descriptor lookup and error reporting.


use halform_core::{
    Attribute, Catalog, Curie, DescriptorBuilder, Embed, HalError, Link, LinkTarget, Resource,
    SerializeOptions,
};
use halform_serializer::Serializer;
use serde_json::{Value, json};
use test_utils::{Post, User, blog};

// ─────────────────────────────────────────────────────────────────────────────
// Document shape
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn post_with_comments() {
    let (catalog, _) = blog();
    let post = Post::new(5, "hi")
        .with_comment(1, "first")
        .with_comment(2, "second");

    let json = Serializer::new(&catalog)
        .to_hal(&post, &SerializeOptions::new())
        .unwrap();

    assert_eq!(
        json,
        concat!(
            r#"{"text":"hi","_links":{"self":{"href":"/posts/5"}},"#,
            r#""_embedded":{"comments":["#,
            r#"{"body":"first","_links":{"self":{"href":"/comments/1"}}},"#,
            r#"{"body":"second","_links":{"self":{"href":"/comments/2"}}}"#,
            r#"]}}"#
        )
    );
}

#[test]
fn serializing_twice_is_byte_identical() {
    let (catalog, _) = blog();
    let post = Post::new(9, "again").with_comment(3, "c");
    let serializer = Serializer::new(&catalog);
    let options = SerializeOptions::new().with("locale", "en");

    let first = serializer.to_hal(&post, &options).unwrap();
    let second = serializer.to_hal(&post, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn fixed_values_are_kept_even_when_falsy() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Falsy")
                .attribute(Attribute::fixed("empty", ""))
                .attribute(Attribute::fixed("zero", 0))
                .attribute(Attribute::fixed("no", false))
                .attribute(Attribute::fixed("nothing", Value::Null)),
        )
        .unwrap();

    let value = Serializer::new(&catalog)
        .to_hal_value(&json!({}), &SerializeOptions::new().with_descriptor(id))
        .unwrap();
    assert_eq!(value, json!({ "empty": "", "zero": 0, "no": false, "nothing": null }));
}

#[test]
fn structured_links_render_only_set_attributes() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Item")
                .link(Link::resolved("edit", |_| {
                    Ok(LinkTarget::new("/items/1").method("PUT").title("Edit item"))
                }))
                .link(Link::fixed("search", "/items{?q}").templated(true))
                .link(Link::fixed("delete", "/items/1").method("DELETE")),
        )
        .unwrap();

    let json = Serializer::new(&catalog)
        .to_hal(&json!({}), &SerializeOptions::new().with_descriptor(id))
        .unwrap();
    assert_eq!(
        json,
        concat!(
            r#"{"_links":{"#,
            r#""edit":{"href":"/items/1","method":"PUT","title":"Edit item"},"#,
            r#""search":{"href":"/items{?q}","templated":true},"#,
            r#""delete":{"href":"/items/1","method":"DELETE"}"#,
            r#"}}"#
        )
    );
}

#[test]
fn namespaced_links_use_the_curie_prefix() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(
            DescriptorBuilder::new("Article")
                .link(Link::fixed("self", "/articles/1"))
                .namespace("doc", |ns| ns.link(Link::fixed("author", "/users/1")))
                .curie(Curie::fixed("doc", "/docs/{rel}")),
        )
        .unwrap();

    let value = Serializer::new(&catalog)
        .to_hal_value(&json!({}), &SerializeOptions::new().with_descriptor(id))
        .unwrap();
    assert_eq!(
        value,
        json!({
            "_links": {
                "self": { "href": "/articles/1" },
                "doc:author": { "href": "/users/1" },
                "curies": [{ "name": "doc", "href": "/docs/{rel}", "templated": true }]
            }
        })
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Embeds and depth
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn embedded_resources_resolve_their_descriptor_from_the_registry() {
    let (mut catalog, ids) = blog();
    let with_author = catalog
        .declare(
            DescriptorBuilder::new("PostWithAuthor")
                .extends(ids.post)
                .embed(Embed::property("author")),
        )
        .unwrap();
    let serializer = Serializer::new(&catalog);
    let options = SerializeOptions::new().with_descriptor(with_author);

    let post = Post::new(1, "hello").with_author(User::new(7, "ann"));
    let value = serializer.to_hal_value(&post, &options).unwrap();
    assert_eq!(
        value["_embedded"]["author"],
        json!({ "name": "ann", "_links": { "self": { "href": "/users/7" } } })
    );
    assert_eq!(value["_embedded"]["comments"], json!([]));

    let anonymous = serializer
        .to_hal_value(&Post::new(2, "anon"), &options)
        .unwrap();
    assert!(anonymous["_embedded"].get("author").is_none());
}

#[test]
fn embed_depth_limits_visibility_to_nesting_level() {
    let mut catalog = Catalog::new();
    let node = catalog
        .declare(
            DescriptorBuilder::new("Node")
                .attribute(Attribute::property("name"))
                .attribute(Attribute::property("summary").with_embed_depth(1))
                .embed(Embed::property("child")),
        )
        .unwrap();
    catalog.register_model::<Value>(node).unwrap();

    let tree = json!({
        "name": "root",
        "summary": "r",
        "child": {
            "name": "child",
            "summary": "c",
            "child": { "name": "grandchild", "summary": "g", "child": null }
        }
    });

    let value = Serializer::new(&catalog)
        .to_hal_value(&tree, &SerializeOptions::new())
        .unwrap();
    assert_eq!(
        value,
        json!({
            "name": "root",
            "summary": "r",
            "_embedded": {
                "child": {
                    "name": "child",
                    "summary": "c",
                    "_embedded": { "child": { "name": "grandchild" } }
                }
            }
        })
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

struct Unregistered;
impl Resource for Unregistered {}

#[test]
fn unknown_models_have_no_descriptor() {
    let (catalog, _) = blog();
    let err = Serializer::new(&catalog)
        .to_hal(&Unregistered, &SerializeOptions::new())
        .unwrap_err();
    assert!(matches!(err, HalError::MissingDescriptor { ref model } if model.ends_with("Unregistered")));
}

#[test]
fn missing_properties_are_errors_not_nulls() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(DescriptorBuilder::new("Post").attribute(Attribute::property("title")))
        .unwrap();
    catalog.register_model::<Post>(id).unwrap();

    let err = Serializer::new(&catalog)
        .to_hal(&Post::new(1, "x"), &SerializeOptions::new())
        .unwrap_err();
    match err {
        HalError::MissingValue { field, resource } => {
            assert_eq!(field, "title");
            assert_eq!(resource, "post 1");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn resolver_failures_carry_field_and_resource() {
    let mut catalog = Catalog::new();
    let id = catalog
        .declare(DescriptorBuilder::new("Broken").link(Link::resolved("self", |_| {
            Err::<String, _>("database unavailable".into())
        })))
        .unwrap();

    let err = Serializer::new(&catalog)
        .to_hal(&json!({ "id": 3 }), &SerializeOptions::new().with_descriptor(id))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "resolving 'self' on json record 3 failed: database unavailable"
    );
    assert!(core::error::Error::source(&err).is_some());
}
