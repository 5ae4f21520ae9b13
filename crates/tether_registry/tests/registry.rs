//! End-to-end lifecycle tests for `tether_registry`.
//!
//! Most tests drive a registry built by `test_utils::tallied_registry`, whose
//! opener and closer count their invocations and can be switched to fail.


use core::error::Error as _;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_registry::callback::BoxError;
use tether_registry::context::Context;
use tether_registry::error::{ErrorKind, RegistryError};
use tether_registry::registry::{DEFAULT_GROUP_NAME, Registry, single_group_with_closer};
use test_utils::{ctx, tallied_registry};

#[test]
fn add_group_then_lookup() {
    let (registry, _tally) = tallied_registry();

    assert!(!registry.add_group("g"));
    assert!(registry.add_group("g"));
    assert!(registry.group("g").is_ok());

    let err = registry.group("missing").unwrap_err();
    assert!(matches!(err, RegistryError::GroupNotFound { ref group } if group == "missing"));
}

#[test]
fn lazy_open_happens_once() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("db");
    let db = registry.must_group("db");

    db.register(&ctx, "orders", "postgres://orders".into()).unwrap();
    assert_eq!(tally.opens(), 0);

    let first = db.get(&ctx, "orders").unwrap();
    let second = db.get(&ctx, "orders").unwrap();

    assert_eq!(first, second);
    assert_eq!(first.dsn, "postgres://orders");
    assert_eq!(tally.opens(), 1);
}

#[test]
fn second_register_is_ignored() {
    let (registry, _tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("db");
    let db = registry.must_group("db");

    assert!(db.register(&ctx, "orders", "first".into()).unwrap());
    assert!(!db.register(&ctx, "orders", "second".into()).unwrap());

    assert_eq!(db.config(&ctx, "orders").unwrap(), "first");
    assert_eq!(db.get(&ctx, "orders").unwrap().dsn, "first");
}

#[test]
fn failed_open_is_retried_by_next_get() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("db");
    let db = registry.must_group("db");
    db.register(&ctx, "x", "dsn".into()).unwrap();

    tally.set_fail_open(true);
    let err = db.get(&ctx, "x").unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(err.kind(), ErrorKind::Open);
    assert!(!db.is_ready("x"));

    assert!(db.get(&ctx, "x").is_err());
    assert_eq!(tally.opens(), 2);

    tally.set_fail_open(false);
    let conn = db.get(&ctx, "x").unwrap();
    assert_eq!(conn.serial, 2);
    assert!(db.is_ready("x"));
    assert_eq!(tally.opens(), 3);
}

#[test]
fn ping_is_independent_of_readiness() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("db");
    let db = registry.must_group("db");
    db.register(&ctx, "r", "dsn".into()).unwrap();

    db.ping(&ctx, "r").unwrap();
    db.ping(&ctx, "r").unwrap();
    assert_eq!(tally.opens(), 2);
    assert!(!db.is_ready("r"));

    let conn = db.get(&ctx, "r").unwrap();
    assert_eq!(tally.opens(), 3);
    assert!(db.is_ready("r"));

    assert_eq!(db.get(&ctx, "r").unwrap(), conn);
    assert_eq!(tally.opens(), 3);

    tally.set_fail_open(true);
    let err = db.ping(&ctx, "r").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PingResourceFailed);
    assert_eq!(err.source().unwrap().to_string(), "boom");

    // The cached connection survives a failed tally.
    assert_eq!(db.get(&ctx, "r").unwrap(), conn);
    assert_eq!(tally.closes(), 0);
}

#[test]
fn unregister_closes_only_opened_resources() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("db");
    let db = registry.must_group("db");
    db.register(&ctx, "opened", "a".into()).unwrap();
    db.register(&ctx, "declared", "b".into()).unwrap();
    db.get(&ctx, "opened").unwrap();

    db.unregister(&ctx, "declared").unwrap();
    assert_eq!(tally.closes(), 0);

    db.unregister(&ctx, "opened").unwrap();
    assert_eq!(tally.closes(), 1);
    assert_eq!(tally.closed_dsns(), vec!["a".to_string()]);

    let err = db.unregister(&ctx, "opened").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}

#[test]
fn group_close_leaves_siblings_untouched() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("primary");
    registry.add_group("replica");
    let primary = registry.must_group("primary");
    let replica = registry.must_group("replica");

    for name in ["a", "b", "c"] {
        primary.register(&ctx, name, format!("primary/{name}")).unwrap();
        primary.get(&ctx, name).unwrap();
    }
    replica.register(&ctx, "a", "replica/a".into()).unwrap();
    let replica_conn = replica.get(&ctx, "a").unwrap();

    let errors = primary.close(&ctx);

    assert!(errors.is_empty());
    assert_eq!(registry.list_group_names(), vec!["replica".to_string()]);
    assert_eq!(
        tally.closed_dsns(),
        vec!["primary/a", "primary/b", "primary/c"]
    );
    assert_eq!(replica.get(&ctx, "a").unwrap(), replica_conn);

    // Closing again is a no-op.
    assert!(primary.close(&ctx).is_empty());
    assert_eq!(tally.closes(), 3);
}

#[test]
fn close_failures_are_reported_per_resource() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("g");
    let g = registry.must_group("g");
    for name in ["a", "b"] {
        g.register(&ctx, name, name.into()).unwrap();
        g.get(&ctx, name).unwrap();
    }
    g.register(&ctx, "never-opened", "c".into()).unwrap();

    tally.set_fail_close(true);
    let errors = g.close(&ctx);

    assert_eq!(errors.len(), 2);
    for err in &errors {
        assert_eq!(err.kind(), ErrorKind::CloseResourceFailed);
        assert_eq!(err.group(), Some("g"));
        assert_eq!(err.source().unwrap().to_string(), "close failed");
    }
    assert_eq!(tally.closes(), 2);
    assert!(!registry.contains_group("g"));
}

#[test]
fn registry_close_resets_to_empty() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    for group in ["a", "b"] {
        registry.add_group(group);
        let handle = registry.must_group(group);
        handle.register(&ctx, "opened", format!("{group}/opened")).unwrap();
        handle.register(&ctx, "declared", format!("{group}/declared")).unwrap();
        handle.get(&ctx, "opened").unwrap();
    }

    let errors = registry.close(&ctx);

    assert!(errors.is_empty());
    assert!(registry.is_empty());
    assert_eq!(tally.closed_dsns(), vec!["a/opened", "b/opened"]);

    assert!(registry.close(&ctx).is_empty());
    assert_eq!(tally.closes(), 2);
}

#[test]
fn registry_close_continues_past_failures() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    for group in ["a", "b", "c"] {
        registry.add_group(group);
        let handle = registry.must_group(group);
        handle.register(&ctx, "r", group.into()).unwrap();
        handle.get(&ctx, "r").unwrap();
    }

    tally.set_fail_close(true);
    let errors = registry.close(&ctx);

    assert_eq!(errors.len(), 3);
    let mut groups: Vec<_> = errors.iter().filter_map(RegistryError::group).collect();
    groups.sort_unstable();
    assert_eq!(groups, vec!["a", "b", "c"]);
    assert!(registry.is_empty());
}

#[test]
fn stale_handle_after_registry_close() {
    let (registry, _tally) = tallied_registry();
    let ctx = ctx();
    registry.add_group("g");
    let g = registry.must_group("g");
    g.register(&ctx, "r", "dsn".into()).unwrap();

    registry.close(&ctx);

    assert_eq!(g.get(&ctx, "r").unwrap_err().kind(), ErrorKind::GroupNotFound);
    assert!(g.list().is_empty());

    // Registering through the stale handle brings the group back.
    assert!(g.register(&ctx, "r", "dsn".into()).unwrap());
    assert_eq!(registry.list_group_names(), vec!["g".to_string()]);
}

#[test]
fn single_group_shares_lifecycle() {
    let (registry, tally) = tallied_registry();
    let ctx = ctx();
    let group = registry.into_default_group();

    group.register(&ctx, "r", "dsn".into()).unwrap();
    group.get(&ctx, "r").unwrap();

    assert!(group.close(&ctx).is_empty());
    assert_eq!(tally.closes(), 1);
}

#[test]
fn single_group_with_closer_closes_opened_resources() {
    let closed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&closed);
    let group = single_group_with_closer(
        |_: &Context, dsn: &String| Ok::<_, BoxError>(dsn.to_uppercase()),
        move |_: &Context, value: String| {
            sink.lock().push(value);
            Ok::<(), BoxError>(())
        },
    );
    let ctx = ctx();

    assert_eq!(group.name(), DEFAULT_GROUP_NAME);
    group.register(&ctx, "a", "db://a".into()).unwrap();
    group.register(&ctx, "b", "db://b".into()).unwrap();
    group.get(&ctx, "a").unwrap();

    group.unregister(&ctx, "a").unwrap();
    assert!(group.close(&ctx).is_empty());
    assert_eq!(*closed.lock(), vec!["DB://A".to_string()]);
}

#[test]
fn callbacks_receive_context() {
    let registry = Registry::<u32, u32>::new(|ctx: &Context, cfg: &u32| -> Result<u32, BoxError> {
        ctx.check()?;
        Ok(*cfg)
    });
    registry.add_group("g");
    let g = registry.must_group("g");
    let ctx = ctx();
    g.register(&ctx, "r", 7).unwrap();

    let cancelled = ctx.clone();
    cancelled.cancel();
    let err = g.get(&cancelled, "r").unwrap_err();
    assert_eq!(err.to_string(), "context cancelled");
    assert!(!g.is_ready("r"));
}
