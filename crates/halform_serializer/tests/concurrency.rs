//! Concurrent serialization against one shared catalog.
//!
//! A declared catalog is read-only: many threads may serialize with it at
//! once, each with its own options, without seeing each other's state.


use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use halform_core::{Attribute, Catalog, DescriptorBuilder, Link, PolicyRules, RuleKind, SerializeOptions};
use halform_serializer::Serializer;
use serde_json::json;
use test_utils::{Post, User, blog_catalog};

const THREADS: usize = 8;
const ROUNDS: usize = 50;

fn shared_catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    let ids = blog_catalog(&mut catalog);
    catalog
        .declare(
            DescriptorBuilder::new("AuditedPost")
                .extends(ids.post)
                .attribute(Attribute::resolved("viewer", |scope| {
                    Ok(scope.current_user::<User>().map(|user| user.name.clone()))
                }))
                .attribute(Attribute::fixed("audit", "internal"))
                .link(Link::resolved("locale", |scope| {
                    let locale = scope.options().get("locale").and_then(|v| v.as_str());
                    Ok(locale.map(|locale| format!("/posts?locale={locale}")))
                }))
                .policy(
                    PolicyRules::new()
                        .allow_by_default(RuleKind::Attribute)
                        .allow_by_default(RuleKind::Link)
                        .allow_by_default(RuleKind::Embed)
                        .attribute_when("audit", |scope| {
                            scope.current_user::<User>().is_some_and(|user| user.admin)
                        }),
                ),
        )
        .unwrap();
    Arc::new(catalog)
}

/// Each thread serializes as its own user and locale, many times over.
#[test]
fn concurrent_calls_do_not_share_options() {
    let catalog = shared_catalog();
    let audited = catalog.find("AuditedPost").unwrap().id();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let name = format!("user{i}");
                let user = if i % 2 == 0 {
                    User::admin(i as u64, &name)
                } else {
                    User::new(i as u64, &name)
                };
                let options = SerializeOptions::new()
                    .with_current_user(user)
                    .with("locale", format!("l{i}"))
                    .with_descriptor(audited);
                let post = Post::new(i as u64, "shared").with_comment(1, "c");
                let serializer = Serializer::new(&catalog);

                barrier.wait();
                for _ in 0..ROUNDS {
                    let value = serializer.to_hal_value(&post, &options).unwrap();
                    assert_eq!(value["viewer"], name.as_str());
                    assert_eq!(value.get("audit").is_some(), i % 2 == 0);
                    assert_eq!(
                        value["_links"]["locale"]["href"],
                        format!("/posts?locale=l{i}").as_str()
                    );
                    assert_eq!(value["_links"]["self"]["href"], format!("/posts/{i}").as_str());
                    assert_eq!(
                        value["_embedded"]["comments"][0]["_links"]["self"]["href"],
                        "/comments/1"
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("serializer thread panicked");
    }
}

/// Threads racing on the same resource produce identical documents.
#[test]
fn concurrent_output_matches_sequential_output() {
    let catalog = shared_catalog();
    let post = Arc::new(Post::new(7, "same").with_comment(1, "a").with_comment(2, "b"));
    let expected = Serializer::new(&catalog)
        .to_hal(post.as_ref(), &SerializeOptions::new())
        .unwrap();
    let expected = Arc::new(expected);
    let matches = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let post = Arc::clone(&post);
            let expected = Arc::clone(&expected);
            let matches = Arc::clone(&matches);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ROUNDS {
                    let json = Serializer::new(&catalog)
                        .to_hal(post.as_ref(), &SerializeOptions::new())
                        .unwrap();
                    if json == *expected {
                        matches.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("serializer thread panicked");
    }
    assert_eq!(matches.load(Ordering::Relaxed), THREADS * ROUNDS);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&expected).unwrap()["text"],
        json!("same")
    );
}
