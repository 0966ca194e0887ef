//! End-to-end semantics shared by every policy, plus the per-policy
//! eviction-order scenarios.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cachekit::{Cache, CacheBuilder, CacheError, EvictionPolicy};

const POLICIES: [EvictionPolicy; 4] = [
    EvictionPolicy::Fifo,
    EvictionPolicy::Lru,
    EvictionPolicy::Clock,
    EvictionPolicy::S3Fifo,
];

#[test]
fn lru_keeps_recently_used_entry() {
    let mut cache = Cache::new(EvictionPolicy::Lru, 3).unwrap();
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);
    cache.get(&"a");
    cache.put("d", 4);

    assert!(cache.contains(&"a"));
    assert!(!cache.contains(&"b"));
    assert!(cache.contains(&"c"));
    assert!(cache.contains(&"d"));
    assert_eq!(cache.counters().n_evict, 1);
}

#[test]
fn fifo_ignores_accesses() {
    let mut cache = Cache::new(EvictionPolicy::Fifo, 3).unwrap();
    cache.put("a", 1);
    cache.put("b", 2);
    cache.get(&"a");
    cache.put("c", 3);
    cache.put("d", 4);

    // the get did not protect "a": insertion order rules
    assert!(!cache.contains(&"a"));
    assert!(cache.contains(&"b"));
    assert!(cache.contains(&"c"));
    assert!(cache.contains(&"d"));
}

#[test]
fn clock_sweep_clears_visited_bits_and_evicts() {
    let mut cache = Cache::new(EvictionPolicy::Clock, 2).unwrap();
    cache.put("a", 1);
    cache.put("b", 2);
    cache.get(&"a");
    cache.get(&"b");
    cache.put("c", 3);

    // both bits were set, so the hand swept the full ring, cleared
    // them, and claimed the slot it started from (holding "a")
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains(&"a"));
    assert!(cache.contains(&"b"));
    assert!(cache.contains(&"c"));
}

#[test]
fn s3fifo_ghost_readmission_goes_to_main() {
    // capacity 10 with the default 0.1 ratio: small=1, main=9
    let mut cache = Cache::new(EvictionPolicy::S3Fifo, 10).unwrap();
    cache.put(0u64, 0u64); // the future ghost
    for key in 1..=9 {
        cache.put(key, key);
    }
    cache.put(10, 10); // pushes the cache over capacity

    // key 0 was expelled from small with freq 0 and became a ghost
    assert!(!cache.contains(&0));
    assert_eq!(cache.len(), 10);

    // re-inserting the remembered key admits it directly to main:
    // a single follow-up insert no longer displaces it
    cache.put(0, 100);
    cache.put(11, 11);
    assert!(cache.contains(&0));
    assert_eq!(cache.get(&0), Some(&100));
}

#[test]
fn ttl_expiry_is_lazy_and_silent() {
    for policy in POLICIES {
        let evictions = Arc::new(Mutex::new(0u32));
        let count = Arc::clone(&evictions);
        let mut cache = CacheBuilder::<&str, u32>::new(4)
            .policy(policy)
            .eviction_callback(move |_, _| *count.lock().unwrap() += 1)
            .build()
            .unwrap();

        cache.put_with_ttl("k", 1, Some(Duration::from_millis(80)));
        assert_eq!(cache.get(&"k"), Some(&1), "{policy}");

        thread::sleep(Duration::from_millis(200));
        assert_eq!(cache.get(&"k"), None, "{policy}");
        assert!(!cache.contains(&"k"), "{policy}");
        // an expired entry did not leave by eviction
        assert_eq!(*evictions.lock().unwrap(), 0, "{policy}");
        assert_eq!(cache.counters().n_evict, 0, "{policy}");
    }
}

#[test]
fn entries_without_ttl_never_expire() {
    let mut cache = Cache::new(EvictionPolicy::Lru, 4).unwrap();
    cache.put("k", 1);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(cache.get(&"k"), Some(&1));
}

#[test]
fn default_ttl_applies_to_plain_put() {
    let mut cache = CacheBuilder::<&str, u32>::new(4)
        .default_ttl(Duration::from_millis(80))
        .build()
        .unwrap();
    cache.put("short", 1);
    cache.put_with_ttl("long", 2, Some(Duration::from_secs(60)));
    thread::sleep(Duration::from_millis(200));
    assert_eq!(cache.get(&"short"), None);
    assert_eq!(cache.get(&"long"), Some(&2));
}

#[test]
fn callback_sees_every_eviction_exactly_once() {
    for policy in POLICIES {
        let capacity = 8u64;
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&evicted);
        let mut cache = CacheBuilder::new(capacity as usize)
            .policy(policy)
            .eviction_callback(move |key: &u64, value: &u64| {
                log.lock().unwrap().push((*key, *value));
            })
            .build()
            .unwrap();

        for key in 0..capacity {
            cache.put(key, key * 10);
        }
        for key in capacity..2 * capacity {
            cache.put(key, key * 10);
        }

        let evicted = evicted.lock().unwrap();
        assert_eq!(evicted.len() as u64, capacity, "{policy}");
        assert_eq!(evicted.len() as u64, cache.counters().n_evict, "{policy}");
        // each victim left with the value it was stored under, and
        // nothing was reported twice
        let mut seen: Vec<u64> = evicted.iter().map(|&(key, _)| key).collect();
        for &(key, value) in evicted.iter() {
            assert_eq!(value, key * 10, "{policy}");
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len() as u64, capacity, "{policy}");
    }
}

#[test]
fn fifo_callback_order_follows_insertion_order() {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&evicted);
    let mut cache = CacheBuilder::new(3)
        .policy(EvictionPolicy::Fifo)
        .eviction_callback(move |key: &u32, _: &u32| log.lock().unwrap().push(*key))
        .build()
        .unwrap();

    for key in 0..6u32 {
        cache.put(key, key);
    }
    assert_eq!(*evicted.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn forced_evict_returns_victim_and_fires_callback() {
    for policy in POLICIES {
        let evictions = Arc::new(Mutex::new(0u32));
        let count = Arc::clone(&evictions);
        let mut cache = CacheBuilder::<u32, u32>::new(4)
            .policy(policy)
            .eviction_callback(move |_, _| *count.lock().unwrap() += 1)
            .build()
            .unwrap();

        assert_eq!(cache.evict(), None, "{policy}");

        cache.put(1, 1);
        cache.put(2, 2);
        let key = cache.evict().unwrap();
        assert!(!cache.contains(&key), "{policy}");
        assert_eq!(cache.len(), 1, "{policy}");
        assert_eq!(*evictions.lock().unwrap(), 1, "{policy}");
        assert_eq!(cache.counters().n_evict, 1, "{policy}");
    }
}

#[test]
fn capacity_is_never_exceeded_under_churn() {
    for policy in POLICIES {
        let mut cache = Cache::new(policy, 16).unwrap();
        for i in 0..1000u64 {
            cache.put(i % 60, i);
            if i % 3 == 0 {
                cache.get(&(i % 17));
            }
            if i % 11 == 0 {
                cache.delete(&(i % 5));
            }
            assert!(cache.len() <= 16, "{policy}: {}", cache.len());
        }
    }
}

#[test]
fn contains_implies_get_returns_last_value() {
    for policy in POLICIES {
        let mut cache = Cache::new(policy, 8).unwrap();
        for i in 0..50u64 {
            cache.put(i % 12, i);
            let key = i % 12;
            if cache.contains(&key) {
                assert_eq!(cache.get(&key), Some(&i), "{policy}");
            }
        }
    }
}

#[test]
fn counters_are_monotone() {
    for policy in POLICIES {
        let mut cache = Cache::new(policy, 4).unwrap();
        let mut previous = cache.counters();
        for i in 0..200u64 {
            match i % 4 {
                0 | 1 => cache.put(i % 13, i),
                2 => {
                    cache.get(&(i % 13));
                }
                _ => {
                    cache.delete(&(i % 7));
                }
            }
            let current = cache.counters();
            assert!(current.n_get >= previous.n_get, "{policy}");
            assert!(current.n_hit >= previous.n_hit, "{policy}");
            assert!(current.n_put >= previous.n_put, "{policy}");
            assert!(current.n_delete >= previous.n_delete, "{policy}");
            assert!(current.n_evict >= previous.n_evict, "{policy}");
            assert!(current.n_hit <= current.n_get, "{policy}");
            previous = current;
        }
    }
}

#[test]
fn repeated_put_is_idempotent_for_len() {
    for policy in POLICIES {
        let mut cache = Cache::new(policy, 4).unwrap();
        cache.put("k", 1);
        cache.put("k", 1);
        assert_eq!(cache.len(), 1, "{policy}");
        assert_eq!(cache.get(&"k"), Some(&1), "{policy}");
    }
}

#[test]
fn unknown_policy_name_errors() {
    let err = "ARC".parse::<EvictionPolicy>().unwrap_err();
    assert_eq!(err, CacheError::InvalidPolicy("ARC".to_string()));
}

#[test]
fn zero_capacity_errors() {
    assert_eq!(
        Cache::<u32, u32>::new(EvictionPolicy::Lru, 0).unwrap_err(),
        CacheError::InvalidCapacity(0)
    );
}
