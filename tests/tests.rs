//! Run with `cargo test --all-features`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use memoattr::{AttrCell, AttrError, Scope, Value, attributes};
use serial_test::serial;

macro_rules! test {
    (miss: $call:expr, $result:expr) => {{
        assert_eq!($call.unwrap(), $result);
        assert!(!memoattr::testing::last_was_hit());
    }};
    (hit: $call:expr, $result:expr) => {{
        assert_eq!($call.unwrap(), $result);
        assert!(memoattr::testing::last_was_hit());
    }};
}

/// Test all three attribute kinds through the macro surface.
#[test]
fn test_kinds() {
    let config = Config { attrs: AttrCell::new(), environment: "prod" };

    test!(miss: config.schema_version(), Value::from(3));
    test!(hit: config.schema_version(), Value::from(3));

    test!(miss: config.banner(), Value::from("[prod]"));
    test!(hit: config.banner(), Value::from("[prod]"));
    assert_eq!(BANNER_CALLS.load(Ordering::SeqCst), 1);

    let us = Value::seq(["1.1.1.1", "8.8.8.8"]);
    let eu = Value::seq(["2.2.2.2"]);
    test!(miss: config.region_servers(Value::from("us")), us.clone());
    test!(hit: config.region_servers(Value::from("us")), us.clone());
    assert_eq!(REGION_CALLS.load(Ordering::SeqCst), 1);

    test!(miss: config.region_servers(Value::from("eu")), eu.clone());
    test!(hit: config.region_servers(Value::from("eu")), eu);
    assert_eq!(REGION_CALLS.load(Ordering::SeqCst), 2);

    // The type scope keeps its own memoization table.
    test!(miss: Config::type_region_servers(Value::from("us")), us);
    assert_eq!(REGION_CALLS.load(Ordering::SeqCst), 3);
}

/// Counts invocations of `Config::banner`.
static BANNER_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Counts invocations of `Config::region_servers`.
static REGION_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Config {
    attrs: AttrCell,
    environment: &'static str,
}

#[attributes]
impl Config {
    /// The fixed schema version.
    fn schema_version() -> Value {
        Value::from(3)
    }

    /// A banner derived from the owning instance.
    fn banner(owner: Scope<Self>) -> Value {
        BANNER_CALLS.fetch_add(1, Ordering::SeqCst);
        match owner.instance() {
            Some(config) => Value::from(format!("[{}]", config.environment)),
            None => Value::from("[shared]"),
        }
    }

    /// Name servers for a region, memoized per region.
    fn region_servers(owner: Scope<Self>, region: Value) -> Value {
        let _ = owner;
        REGION_CALLS.fetch_add(1, Ordering::SeqCst);
        match region {
            Value::Str(region) if region == "us" => {
                Value::seq(["1.1.1.1", "8.8.8.8"])
            }
            Value::Str(region) if region == "eu" => Value::seq(["2.2.2.2"]),
            _ => Value::Null,
        }
    }
}

/// Test that concurrent callers on one owner compute exactly once and all
/// receive the same snapshot.
#[test]
fn test_concurrent_access_computes_once() {
    let owner = Expensive { attrs: AttrCell::new() };

    let results: Vec<_> = thread::scope(|s| {
        (0..8)
            .map(|_| s.spawn(|| owner.weights().unwrap()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(EXPENSIVE_CALLS.load(Ordering::SeqCst), 1);
    let first = &results[0];
    assert!(results.iter().all(|result| result.ptr_eq(first)));
}

/// Counts invocations of `Expensive::weights`.
static EXPENSIVE_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Expensive {
    attrs: AttrCell,
}

#[attributes]
impl Expensive {
    /// A slow computation that must run at most once per owner.
    fn weights(owner: Scope<Self>) -> Value {
        let _ = owner;
        EXPENSIVE_CALLS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Value::seq([1, 2, 3])
    }
}

/// Test that distinct instances, and the type itself, cache independently.
#[test]
fn test_owner_isolation() {
    let first = Node { attrs: AttrCell::new(), id: 1 };
    let second = Node { attrs: AttrCell::new(), id: 2 };

    test!(miss: first.label(), Value::from("node-1"));
    test!(miss: second.label(), Value::from("node-2"));
    test!(hit: first.label(), Value::from("node-1"));
    test!(miss: Node::type_label(), Value::from("node-type"));
    test!(hit: second.label(), Value::from("node-2"));
    test!(hit: Node::type_label(), Value::from("node-type"));
    assert_eq!(NODE_CALLS.load(Ordering::SeqCst), 3);
}

/// Counts invocations of `Node::label`.
static NODE_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Node {
    attrs: AttrCell,
    id: i64,
}

#[attributes]
impl Node {
    /// A label derived from the owner, cached per owner.
    fn label(owner: Scope<Self>) -> Value {
        NODE_CALLS.fetch_add(1, Ordering::SeqCst);
        match owner.instance() {
            Some(node) => Value::from(format!("node-{}", node.id)),
            None => Value::from("node-type"),
        }
    }
}

/// Test that a static attribute returns the identical snapshot every call.
#[test]
#[serial]
fn test_static_stability() {
    let owner = Versioned { attrs: AttrCell::new() };

    let first = owner.revision().unwrap();
    let second = owner.revision().unwrap();
    assert!(first.ptr_eq(&second));
    assert!(memoattr::testing::last_was_hit());

    // The type scope froze its own snapshot of the same declared value.
    let shared = Versioned::type_revision().unwrap();
    assert_eq!(shared, first);
    assert!(!shared.ptr_eq(&first));
}

/// Test that the type-scope cache is shared across call sites.
#[test]
#[serial]
fn test_type_scope_is_shared() {
    let first = Versioned::type_revision().unwrap();
    let second = Versioned::type_revision().unwrap();
    assert!(first.ptr_eq(&second));
    assert!(memoattr::testing::last_was_hit());
}

struct Versioned {
    attrs: AttrCell,
}

#[attributes]
impl Versioned {
    /// The fixed protocol revision.
    fn revision() -> Value {
        Value::map([("major", 2), ("minor", 1)])
    }
}

/// Test that a generator failure propagates and is not cached.
#[test]
fn test_failure_is_not_cached() {
    let owner = Flaky { attrs: AttrCell::new() };

    let err = owner.token().unwrap_err();
    assert!(matches!(err, AttrError::Generator(_)));

    test!(miss: owner.token(), Value::from("granted"));
    test!(hit: owner.token(), Value::from("granted"));
    assert_eq!(FLAKY_CALLS.load(Ordering::SeqCst), 2);
}

/// Counts invocations of `Flaky::token`.
static FLAKY_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Flaky {
    attrs: AttrCell,
}

#[attributes]
impl Flaky {
    /// Fails on the first attempt, succeeds afterwards.
    fn token(owner: Scope<Self>) -> Result<Value, AttrError> {
        let _ = owner;
        if FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(AttrError::generator("upstream unavailable"))
        } else {
            Ok(Value::from("granted"))
        }
    }
}

/// Test that returned values are frozen all the way down.
#[test]
fn test_deeply_frozen_result() {
    let owner = Catalog { attrs: AttrCell::new() };

    let regions = owner.regions().unwrap();
    let map = regions.as_map().unwrap();
    assert_eq!(map.len(), 2);

    let us = map.get(&Value::from("us")).unwrap();
    let servers = us.as_seq().unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].as_str(), Some("1.1.1.1"));
    assert_eq!(servers[1].as_str(), Some("8.8.8.8"));

    // Nested snapshots are shared, not copied, on later accesses.
    let again = owner.regions().unwrap();
    assert!(again.ptr_eq(&regions));
}

struct Catalog {
    attrs: AttrCell,
}

#[attributes]
impl Catalog {
    /// Region metadata with nested sequences.
    fn regions(owner: Scope<Self>) -> Value {
        let _ = owner;
        Value::map([
            ("us", Value::seq(["1.1.1.1", "8.8.8.8"])),
            ("eu", Value::seq(["2.2.2.2"])),
        ])
    }
}

/// Test the `cell = ..` override for the state field.
#[test]
fn test_custom_cell_field() {
    memoattr::testing::reset();
    let styled = Styled { state: AttrCell::new(), theme: "dark" };

    test!(miss: styled.palette(Value::from(1)), Value::from("dark-1"));
    test!(hit: styled.palette(Value::from(1)), Value::from("dark-1"));
    test!(miss: styled.palette(Value::from(2)), Value::from("dark-2"));

    assert_eq!(memoattr::testing::hits(), 1);
    assert_eq!(memoattr::testing::misses(), 2);
}

struct Styled {
    state: AttrCell,
    theme: &'static str,
}

#[attributes(cell = state)]
impl Styled {
    /// The palette for a brightness level.
    fn palette(owner: Scope<Self>, level: Value) -> Value {
        let theme = owner.instance().map_or("default", |styled| styled.theme);
        match level {
            Value::Int(level) => Value::from(format!("{theme}-{level}")),
            _ => Value::Null,
        }
    }
}
