//! CacheManager behaviour across both tiers.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{FailingTier, HangingTier, eventually};
use proptest::prelude::*;
use tiercache_core::{CacheEntry, Clock, ManualClock};
use tiercache_durable::{DurableError, DurableRecord, DurableTier, MemoryDurableTier};
use tiercache_server::cache::{CacheConfig, CacheManager, SetOptions};

fn config() -> CacheConfig {
    CacheConfig {
        durable_timeout: Duration::from_millis(50),
        ..Default::default()
    }
}

fn layered(
    durable: Arc<MemoryDurableTier>,
    clock: Arc<ManualClock>,
) -> CacheManager<String> {
    CacheManager::with_durable(config(), durable).with_clock(clock)
}

fn ttl(secs: u64) -> SetOptions {
    SetOptions::new().ttl(Duration::from_secs(secs))
}

// === Read-after-write ===

#[tokio::test]
async fn get_observes_preceding_set() {
    let cache = CacheManager::new(config());

    cache.set("k", "v1".to_string(), SetOptions::new()).unwrap();
    assert_eq!(cache.get("k").await.as_deref(), Some("v1"));

    cache.set("k", "v2".to_string(), SetOptions::new()).unwrap();
    assert_eq!(cache.get("k").await.as_deref(), Some("v2"));
}

#[test]
fn set_works_without_a_runtime() {
    let durable = Arc::new(MemoryDurableTier::new());
    let cache: CacheManager<u32> = CacheManager::with_durable(config(), durable.clone());

    cache.set("k", 1, SetOptions::new()).unwrap();

    assert_eq!(cache.len(), 1);
    assert!(durable.is_empty());
}

#[tokio::test]
async fn set_rejects_invalid_input() {
    let cache: CacheManager<u32> = CacheManager::new(config());

    assert!(cache.set("", 1, SetOptions::new()).is_err());
    assert!(cache.set("k", 1, SetOptions::new().tag("")).is_err());
    assert!(cache.set("k", 1, SetOptions::new().ttl(Duration::ZERO)).is_err());

    let too_long = cache.config().max_ttl + Duration::from_secs(1);
    let err = cache
        .set("k", 1, SetOptions::new().ttl(too_long))
        .unwrap_err();
    assert_eq!(err.field(), "ttl");

    assert!(cache.is_empty());
}

// === Expiry ===

#[tokio::test]
async fn entry_expires_after_ttl() {
    let clock = Arc::new(ManualClock::default());
    let cache = CacheManager::new(config()).with_clock(clock.clone());

    cache.set("k", "v".to_string(), ttl(10)).unwrap();

    clock.advance(Duration::from_secs(10));
    assert!(cache.get("k").await.is_some(), "live at exactly created_at + ttl");

    clock.advance(Duration::from_millis(1));
    assert!(cache.get("k").await.is_none());
    assert!(cache.is_empty(), "expired entry removed on read");
}

#[tokio::test]
async fn default_ttl_applies_when_unspecified() {
    let clock = Arc::new(ManualClock::default());
    let cache = CacheManager::new(config()).with_clock(clock.clone());

    cache.set("k", "v".to_string(), SetOptions::new()).unwrap();

    clock.advance(cache.config().default_ttl);
    assert!(cache.get("k").await.is_some());
    clock.advance(Duration::from_secs(1));
    assert!(cache.get("k").await.is_none());
}

// === Tag invalidation ===

#[tokio::test]
async fn invalidation_removes_every_tagged_entry() {
    let cache = CacheManager::new(config());

    cache.set("a", 1u32, SetOptions::new().tag("x")).unwrap();
    cache.set("b", 2u32, SetOptions::new().tags(["x", "y"])).unwrap();
    cache.set("c", 3u32, SetOptions::new().tag("y")).unwrap();

    let result = cache.invalidate_by_tags(["x"]).await;

    assert_eq!(result.count, 2);
    assert_eq!(result.tags, vec!["x".to_string()]);
    assert!(cache.get("a").await.is_none());
    assert!(cache.get("b").await.is_none());
    assert_eq!(cache.get("c").await, Some(3));
    assert!(cache.is_index_consistent());

    let again = cache.invalidate_by_tags(["y"]).await;
    assert_eq!(again.count, 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn invalidation_with_unknown_or_no_tags_is_a_no_op() {
    let cache = CacheManager::new(config());
    cache.set("a", 1u32, SetOptions::new().tag("x")).unwrap();

    assert_eq!(cache.invalidate_by_tags(["nope"]).await.count, 0);
    assert_eq!(cache.invalidate_by_tags(Vec::<String>::new()).await.count, 0);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn invalidated_durable_record_is_not_promoted() {
    let clock = Arc::new(ManualClock::default());
    let durable = Arc::new(MemoryDurableTier::new());
    let cache = layered(durable.clone(), clock.clone());

    // Present only in the durable tier, so invalidation cannot find it in memory.
    let entry = CacheEntry::new("stale".to_string(), clock.now(), Duration::from_secs(60), ["g"]);
    durable
        .set(&DurableRecord::from_entry("k", &entry).unwrap())
        .await
        .unwrap();

    let result = cache.invalidate_by_tags(["g"]).await;
    assert_eq!(result.count, 0);
    assert!(cache.get("k").await.is_none());

    clock.advance(Duration::from_secs(1));
    cache
        .set("k", "fresh".to_string(), SetOptions::new().tag("g"))
        .unwrap();
    assert_eq!(cache.get("k").await.as_deref(), Some("fresh"));
}

// === Durable tier ===

#[tokio::test]
async fn set_writes_through_to_durable_tier() {
    let clock = Arc::new(ManualClock::default());
    let durable = Arc::new(MemoryDurableTier::new());
    let cache = layered(durable.clone(), clock);

    cache
        .set("k", "v".to_string(), SetOptions::new().tag("t"))
        .unwrap();

    eventually(|| durable.contains_key("k")).await;
    let record = durable.peek("k").unwrap();
    assert_eq!(record.cache_value, "v");
    assert_eq!(record.tags, vec!["t".to_string()]);
}

#[tokio::test]
async fn durable_hit_is_promoted_with_original_creation_time() {
    let clock = Arc::new(ManualClock::default());
    let durable = Arc::new(MemoryDurableTier::new());

    let writer = layered(durable.clone(), clock.clone());
    writer.set("k", "v".to_string(), ttl(10)).unwrap();
    eventually(|| durable.contains_key("k")).await;

    // A second process: empty memory, same durable store.
    let reader = layered(durable.clone(), clock.clone());

    clock.advance(Duration::from_secs(6));
    assert_eq!(reader.get("k").await.as_deref(), Some("v"));
    assert_eq!(reader.get_stats().durable_hits, 1);
    assert_eq!(reader.len(), 1);

    assert_eq!(reader.get("k").await.as_deref(), Some("v"));
    assert_eq!(reader.get_stats().memory_hits, 1);

    // Lifetime counts from the original write, not the promotion.
    clock.advance(Duration::from_secs(5));
    assert!(reader.get("k").await.is_none());
}

#[tokio::test]
async fn expired_durable_record_is_a_miss() {
    let clock = Arc::new(ManualClock::default());
    let durable = Arc::new(MemoryDurableTier::new());

    let writer = layered(durable.clone(), clock.clone());
    writer.set("k", "v".to_string(), ttl(1)).unwrap();
    eventually(|| durable.contains_key("k")).await;

    let reader = layered(durable, clock.clone());
    clock.advance(Duration::from_secs(2));

    assert!(reader.get("k").await.is_none());
    assert_eq!(reader.get_stats().misses, 1);
    assert!(reader.is_empty());
}

#[tokio::test]
async fn delete_and_clear_reach_durable_tier() {
    let clock = Arc::new(ManualClock::default());
    let durable = Arc::new(MemoryDurableTier::new());
    let cache = layered(durable.clone(), clock);

    cache.set("a", "1".to_string(), SetOptions::new()).unwrap();
    cache.set("b", "2".to_string(), SetOptions::new()).unwrap();
    eventually(|| durable.len() == 2).await;

    assert!(cache.delete("a").await);
    assert!(!durable.contains_key("a"));
    assert!(!cache.delete("a").await);

    cache.clear().await;
    assert!(cache.is_empty());
    assert!(durable.is_empty());
}

#[tokio::test]
async fn durable_values_decode_into_the_cache_value_type() {
    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Meal {
        name: String,
        servings: u8,
    }

    let clock = Arc::new(ManualClock::default());
    let durable = Arc::new(MemoryDurableTier::new());
    let meal = Meal {
        name: "chili".to_string(),
        servings: 4,
    };

    let writer: CacheManager<Meal> =
        CacheManager::with_durable(config(), durable.clone()).with_clock(clock.clone());
    writer.set("meal", meal.clone(), SetOptions::new()).unwrap();
    eventually(|| durable.contains_key("meal")).await;

    let reader: CacheManager<Meal> =
        CacheManager::with_durable(config(), durable.clone()).with_clock(clock.clone());
    assert_eq!(reader.get("meal").await, Some(meal));

    // A record of the wrong shape is a miss, not an error.
    let wrong: CacheManager<Vec<u32>> =
        CacheManager::with_durable(config(), durable).with_clock(clock);
    assert!(wrong.get("meal").await.is_none());
}

// === Fault tolerance ===

#[tokio::test]
async fn failing_durable_tier_degrades_to_memory_only() {
    let cache: CacheManager<String> = CacheManager::with_durable(config(), Arc::new(FailingTier));

    assert!(cache.get("missing").await.is_none());

    cache.set("k", "v".to_string(), SetOptions::new().tag("t")).unwrap();
    assert_eq!(cache.get("k").await.as_deref(), Some("v"));

    assert_eq!(cache.invalidate_by_tags(["t"]).await.count, 1);
    assert!(!cache.delete("k").await);
    cache.clear().await;
    assert!(cache.check_durable().await.unwrap().is_err());

    let stats = cache.get_stats();
    assert_eq!(stats.memory_hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn hanging_durable_tier_is_bounded_by_timeout() {
    let cache: CacheManager<String> = CacheManager::with_durable(config(), Arc::new(HangingTier));

    let started = std::time::Instant::now();
    assert!(cache.get("k").await.is_none());
    assert!(!cache.delete("k").await);
    cache.clear().await;
    assert!(matches!(
        cache.check_durable().await,
        Some(Err(DurableError::Timeout { .. }))
    ));
    assert!(started.elapsed() < Duration::from_secs(2));

    cache.set("k", "v".to_string(), SetOptions::new()).unwrap();
    assert_eq!(cache.get("k").await.as_deref(), Some("v"));
}

#[tokio::test]
async fn invalidation_with_hanging_durable_tier_costs_one_timeout() {
    let cache: CacheManager<String> = CacheManager::with_durable(config(), Arc::new(HangingTier));
    for i in 0..20 {
        cache
            .set(format!("k{}", i), "v".to_string(), SetOptions::new().tag("g"))
            .unwrap();
    }
    cache.set("untagged", "v".to_string(), SetOptions::new()).unwrap();

    let started = std::time::Instant::now();
    let result = cache.invalidate_by_tags(["g"]).await;

    assert_eq!(result.count, 20);
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(cache.len(), 1);
    assert!(cache.is_index_consistent());
}

#[tokio::test]
async fn tagged_entries_disappear_before_durable_deletes_finish() {
    let cache: Arc<CacheManager<String>> = Arc::new(CacheManager::with_durable(
        CacheConfig {
            durable_timeout: Duration::from_secs(5),
            ..Default::default()
        },
        Arc::new(HangingTier),
    ));
    for i in 0..10 {
        cache
            .set(format!("k{}", i), "v".to_string(), SetOptions::new().tag("g"))
            .unwrap();
    }

    let invalidating = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.invalidate_by_tags(["g"]).await }
    });
    eventually(|| cache.is_empty()).await;

    assert!(!invalidating.is_finished());
    invalidating.abort();
}

// === Capacity ===

#[tokio::test]
async fn capacity_evicts_oldest_entries() {
    let clock = Arc::new(ManualClock::default());
    let cache = CacheManager::new(CacheConfig {
        max_entries: 5,
        ..config()
    })
    .with_clock(clock.clone());

    for i in 0..5u32 {
        cache.set(format!("k{}", i), i, SetOptions::new()).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.len(), i as usize + 1);
    }
    for i in 5..8u32 {
        cache.set(format!("k{}", i), i, SetOptions::new()).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.len(), 5);
    }

    assert!(cache.get("k2").await.is_none());
    assert_eq!(cache.get("k3").await, Some(3));
    assert_eq!(cache.get("k7").await, Some(7));
    assert!(cache.is_index_consistent());
}

#[tokio::test]
async fn writes_between_high_water_and_capacity_skip_maintenance() {
    let clock = Arc::new(ManualClock::default());
    let cache = CacheManager::new(CacheConfig {
        max_entries: 10,
        ..config()
    })
    .with_clock(clock.clone());
    assert_eq!(cache.config().high_water_mark(), 8);

    for i in 0..8u32 {
        cache.set(format!("k{}", i), i, ttl(3600)).unwrap();
        clock.advance(Duration::from_secs(1));
    }
    assert_eq!(cache.len(), 8);

    // Crosses the mark; nothing has expired yet.
    cache.set("short", 100, ttl(1)).unwrap();
    assert_eq!(cache.len(), 9);

    clock.advance(Duration::from_secs(5));

    // Above the mark and within capacity: the expired entry stays put.
    cache.set("k8", 8, ttl(3600)).unwrap();
    assert_eq!(cache.len(), 10);

    // Overflow sweeps "short" then evicts down to one above the mark.
    cache.set("k9", 9, ttl(3600)).unwrap();
    assert_eq!(cache.len(), 9);
    assert!(cache.get("short").await.is_none());
    assert!(cache.get("k0").await.is_none());
    assert_eq!(cache.get("k1").await, Some(1));
    assert_eq!(cache.get("k9").await, Some(9));

    cache.set("k10", 10, ttl(3600)).unwrap();
    assert_eq!(cache.len(), 10);
    assert!(cache.is_index_consistent());
}

#[tokio::test]
async fn expired_entries_go_before_live_ones() {
    let clock = Arc::new(ManualClock::default());
    let cache = CacheManager::new(CacheConfig {
        max_entries: 4,
        ..config()
    })
    .with_clock(clock.clone());

    cache.set("old-but-long", 0u32, ttl(3600)).unwrap();
    clock.advance(Duration::from_secs(1));
    for i in 1..=3u32 {
        cache.set(format!("short{}", i), i, ttl(1)).unwrap();
    }
    clock.advance(Duration::from_secs(5));

    cache.set("new", 9, SetOptions::new()).unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("old-but-long").await, Some(0));
    assert_eq!(cache.get("new").await, Some(9));
}

// === Concurrency ===

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sets_on_distinct_keys_all_land() {
    let cache: Arc<CacheManager<usize>> = Arc::new(CacheManager::new(config()));

    let tasks: Vec<_> = (0..200)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .set(format!("key-{}", i), i, SetOptions::new().tag(format!("g{}", i % 7)))
                    .unwrap();
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(cache.len(), 200);
    for i in 0..200 {
        assert_eq!(cache.get(&format!("key-{}", i)).await, Some(i));
    }
    assert!(cache.is_index_consistent());
}

// === Randomized ===

#[derive(Debug, Clone)]
enum Op {
    Set(u8, Vec<u8>),
    Delete(u8),
    Invalidate(u8),
    Advance(u8),
    Maintain,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..16, prop::collection::vec(0u8..4, 0..3)).prop_map(|(k, t)| Op::Set(k, t)),
        1 => (0u8..16).prop_map(Op::Delete),
        1 => (0u8..4).prop_map(Op::Invalidate),
        1 => (0u8..5).prop_map(Op::Advance),
        1 => Just(Op::Maintain),
    ]
}

proptest! {
    #[test]
    fn index_stays_consistent_through_manager(ops in prop::collection::vec(op(), 1..60)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let clock = Arc::new(ManualClock::default());
            let cache = CacheManager::new(CacheConfig { max_entries: 8, ..config() })
                .with_clock(clock.clone());

            for op in ops {
                match op {
                    Op::Set(k, tags) => {
                        let options = ttl(3)
                            .tags(tags.iter().map(|t| format!("t{}", t)));
                        cache.set(format!("k{}", k), k, options).unwrap();
                    },
                    Op::Delete(k) => {
                        cache.delete(&format!("k{}", k)).await;
                    },
                    Op::Invalidate(t) => {
                        let tag = format!("t{}", t);
                        cache.invalidate_by_tags([tag.as_str()]).await;
                    },
                    Op::Advance(secs) => clock.advance(Duration::from_secs(secs.into())),
                    Op::Maintain => {
                        cache.run_maintenance();
                    },
                }
                prop_assert!(cache.is_index_consistent());
                prop_assert!(cache.len() <= 8);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
