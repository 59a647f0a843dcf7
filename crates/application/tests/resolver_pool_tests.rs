use hostq_application::{Extras, ResolverPool};
use hostq_domain::{LookupAnswer, PoolConfig};
use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

mod helpers;
use helpers::MockResolver;

fn test_config(workers: usize) -> PoolConfig {
    PoolConfig {
        workers,
        cache_ttl_secs: 60,
        ttl_floor_secs: 1,
        ttl_ceiling_secs: 86_400,
        prune_tick_ms: 25,
        queue_poll_ms: 25,
    }
}

fn pool_with(resolver: MockResolver, workers: usize) -> (ResolverPool, Arc<MockResolver>) {
    let resolver = Arc::new(resolver);
    let pool = ResolverPool::new(resolver.clone(), &test_config(workers));
    (pool, resolver)
}

type Received = Arc<Mutex<Vec<Option<LookupAnswer>>>>;

fn recorder() -> (Received, impl Fn() -> Box<dyn FnOnce(Option<LookupAnswer>, Extras) + Send>) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let handle = received.clone();
    let make = move || {
        let sink = handle.clone();
        let callback: Box<dyn FnOnce(Option<LookupAnswer>, Extras) + Send> =
            Box::new(move |answer, _extras| sink.lock().push(answer));
        callback
    };
    (received, make)
}

/// Pump `run(false)` until `expected` callbacks fired or the deadline hits.
fn drain_until(pool: &ResolverPool, received: &Received, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while received.lock().len() < expected && Instant::now() < deadline {
        pool.run(false).expect("run should not fail");
        sleep(Duration::from_millis(10));
    }
}

fn address(addr: &str) -> Option<LookupAnswer> {
    Some(LookupAnswer::Address(addr.parse::<IpAddr>().unwrap()))
}

#[test]
fn test_forward_lookup_delivers_exactly_once() {
    let (pool, _resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        3,
    );
    pool.configure(Some(3), Some(Duration::from_secs(60)))
        .expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());

    pool.stop(true);
    pool.run(false).expect("drain should not fail");

    let received = received.lock();
    assert_eq!(
        received.as_slice(),
        &[address("203.0.113.5")],
        "Callback should fire exactly once with the resolved address"
    );
}

#[test]
fn test_extras_are_handed_back_untouched() {
    let (pool, _resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let mut extras = Extras::new();
    extras.insert("request-id".to_string(), serde_json::json!(7));

    pool.lookup_host("example.test", extras, move |_answer, extras| {
        *sink.lock() = Some(extras);
    });

    pool.stop(true);
    pool.run(false).expect("drain should not fail");

    let extras = seen.lock().take().expect("callback should have fired");
    assert_eq!(extras.get("request-id"), Some(&serde_json::json!(7)));
}

#[test]
fn test_duplicate_lookup_served_from_cache() {
    let (pool, resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    pool.lookup_host("example.test", Extras::new(), make());

    pool.stop(true);
    pool.run(false).expect("drain should not fail");

    assert_eq!(
        resolver.call_count(),
        1,
        "Second lookup should be served from the cache"
    );
    let received = received.lock();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], address("203.0.113.5"));
    assert_eq!(received[1], address("203.0.113.5"));
}

#[test]
fn test_failed_lookup_delivers_absence_and_pool_survives() {
    let (pool, _resolver) = pool_with(
        MockResolver::new()
            .with_failure("bad.test")
            .with_host("good.test", "203.0.113.7"),
        2,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("bad.test", Extras::new(), make());
    drain_until(&pool, &received, 1);
    assert_eq!(received.lock().as_slice(), &[None]);

    // The pool must still service lookups after a failure.
    pool.lookup_host("good.test", Extras::new(), make());
    drain_until(&pool, &received, 2);
    assert_eq!(received.lock()[1], address("203.0.113.7"));

    pool.stop(false);
}

#[test]
fn test_resolver_panic_still_publishes_result() {
    let (pool, _resolver) = pool_with(
        MockResolver::new()
            .with_panic("boom.test")
            .with_host("good.test", "203.0.113.7"),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("boom.test", Extras::new(), make());
    drain_until(&pool, &received, 1);
    assert_eq!(
        received.lock().as_slice(),
        &[None],
        "A panicking resolver still yields an absence result"
    );

    // The single worker survived the panic.
    pool.lookup_host("good.test", Extras::new(), make());
    drain_until(&pool, &received, 2);
    assert_eq!(received.lock()[1], address("203.0.113.7"));

    pool.stop(false);
}

#[test]
fn test_dispatch_after_stop_never_fires_callback() {
    let (pool, resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        2,
    );
    pool.configure(None, None).expect("configure should succeed");
    pool.stop(false);

    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    sleep(Duration::from_millis(100));
    pool.run(false).expect("run should not fail");

    assert!(received.lock().is_empty(), "Dispatch after stop is a no-op");
    assert_eq!(resolver.call_count(), 0);
    assert_eq!(pool.worker_count(), 0);
}

#[test]
fn test_configure_is_idempotent() {
    let (pool, resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        3,
    );
    pool.configure(Some(3), Some(Duration::from_secs(60)))
        .expect("configure should succeed");
    assert_eq!(pool.worker_count(), 3);

    // Warm the cache, then reconfigure with identical parameters.
    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    drain_until(&pool, &received, 1);

    pool.configure(Some(3), Some(Duration::from_secs(60)))
        .expect("reconfigure should succeed");
    assert_eq!(pool.worker_count(), 3, "Worker count must not change");

    // Same cache instance: the warmed entry still answers without another
    // resolver invocation.
    pool.lookup_host("example.test", Extras::new(), make());
    drain_until(&pool, &received, 2);
    assert_eq!(resolver.call_count(), 1, "Cache must survive reconfiguration");

    pool.stop(false);
}

#[test]
fn test_shrink_retires_surplus_workers() {
    let (pool, _resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        4,
    );
    pool.configure(None, None).expect("configure should succeed");
    assert_eq!(pool.worker_count(), 4);

    pool.configure(Some(2), None).expect("shrink should succeed");
    assert_eq!(pool.worker_count(), 2);

    // The remaining workers still serve lookups.
    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    drain_until(&pool, &received, 1);
    assert_eq!(received.lock().as_slice(), &[address("203.0.113.5")]);

    pool.stop(false);
}

#[test]
fn test_grow_spawns_missing_workers() {
    let (pool, _resolver) = pool_with(MockResolver::new(), 1);
    pool.configure(None, None).expect("configure should succeed");
    assert_eq!(pool.worker_count(), 1);

    pool.configure(Some(3), None).expect("grow should succeed");
    assert_eq!(pool.worker_count(), 3);

    pool.stop(false);
}

#[test]
fn test_stop_with_drain_completes_all_queued_work() {
    let (pool, resolver) = pool_with(
        MockResolver::new()
            .with_host("a.test", "203.0.113.1")
            .with_host("b.test", "203.0.113.2")
            .with_host("c.test", "203.0.113.3")
            .with_delay(Duration::from_millis(30)),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("a.test", Extras::new(), make());
    pool.lookup_host("b.test", Extras::new(), make());
    pool.lookup_host("c.test", Extras::new(), make());

    pool.stop(true);
    pool.run(false).expect("drain should not fail");

    let received = received.lock();
    assert_eq!(received.len(), 3, "Every queued request completes on drain");
    assert_eq!(resolver.call_count(), 3);
}

#[test]
fn test_stop_without_drain_discards_queued_work() {
    let (pool, _resolver) = pool_with(
        MockResolver::new()
            .with_host("a.test", "203.0.113.1")
            .with_host("b.test", "203.0.113.2")
            .with_host("c.test", "203.0.113.3")
            .with_delay(Duration::from_millis(300)),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("a.test", Extras::new(), make());
    pool.lookup_host("b.test", Extras::new(), make());
    pool.lookup_host("c.test", Extras::new(), make());

    // Let the single worker pick up the first request, then stop abruptly.
    sleep(Duration::from_millis(100));
    pool.stop(false);
    pool.run(false).expect("run should not fail");

    let received = received.lock();
    assert_eq!(
        received.len(),
        1,
        "Only the in-flight request completes without drain"
    );
}

#[test]
fn test_results_delivered_in_completion_order() {
    let (pool, _resolver) = pool_with(
        MockResolver::new()
            .with_host("a.test", "203.0.113.1")
            .with_host("b.test", "203.0.113.2")
            .with_host("c.test", "203.0.113.3"),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("a.test", Extras::new(), make());
    pool.lookup_host("b.test", Extras::new(), make());
    pool.lookup_host("c.test", Extras::new(), make());

    pool.stop(true);
    pool.run(false).expect("drain should not fail");

    let received = received.lock();
    assert_eq!(
        received.as_slice(),
        &[
            address("203.0.113.1"),
            address("203.0.113.2"),
            address("203.0.113.3"),
        ],
        "A single worker completes its requests in submission order"
    );
}

#[test]
fn test_configure_rebuilds_pool_after_stop() {
    let (pool, _resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        2,
    );
    pool.configure(None, None).expect("configure should succeed");
    pool.stop(false);
    assert_eq!(pool.worker_count(), 0);

    pool.configure(None, None).expect("rebuild should succeed");
    assert_eq!(pool.worker_count(), 2);

    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    pool.stop(true);
    pool.run(false).expect("drain should not fail");
    assert_eq!(received.lock().as_slice(), &[address("203.0.113.5")]);
}

#[test]
fn test_run_starts_idle_pool_on_request() {
    let (pool, _resolver) = pool_with(MockResolver::new(), 2);
    assert_eq!(pool.worker_count(), 0);

    pool.run(true).expect("run should start the pool");
    assert_eq!(pool.worker_count(), 2);

    pool.stop(false);
}

#[test]
fn test_background_pruner_evicts_stale_entries() {
    let (pool, _resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        1,
    );
    // Floor of one second is the shortest TTL the pool config allows.
    pool.configure(None, Some(Duration::from_secs(1)))
        .expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    drain_until(&pool, &received, 1);
    assert_eq!(pool.cache_stats().map(|s| s.entries), Some(1));

    // No reads from here on; only the pruner can evict.
    sleep(Duration::from_millis(1600));
    assert_eq!(
        pool.cache_stats().map(|s| s.entries),
        Some(0),
        "Pruner should evict the stale entry without any read traffic"
    );

    pool.stop(false);
}

#[test]
fn test_clear_cache_forces_fresh_resolution() {
    let (pool, resolver) = pool_with(
        MockResolver::new().with_host("example.test", "203.0.113.5"),
        1,
    );
    pool.configure(None, None).expect("configure should succeed");

    let (received, make) = recorder();
    pool.lookup_host("example.test", Extras::new(), make());
    drain_until(&pool, &received, 1);
    pool.clear_cache();

    pool.lookup_host("example.test", Extras::new(), make());
    drain_until(&pool, &received, 2);
    assert_eq!(resolver.call_count(), 2, "Cleared cache cannot serve hits");

    pool.stop(false);
}
