// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behavioral guarantees that must hold for every eviction engine behind the
// EvictionPolicy contract. These span the policy modules and belong here
// rather than in any single source file.

use peercache::policy::{ArcCache, LfuCache, LruCache, PolicyKind};
use peercache::traits::EvictionPolicy;

fn engines(capacity: usize) -> Vec<Box<dyn EvictionPolicy<String, u64> + Send + Sync>> {
    vec![
        PolicyKind::Lru.build(capacity, None),
        PolicyKind::Lfu.build(capacity, None),
        PolicyKind::Arc.build(capacity, None),
    ]
}

// ==============================================
// Capacity Bound
// ==============================================

mod capacity_bound {
    use super::*;

    #[test]
    fn len_never_exceeds_capacity_under_churn() {
        for mut engine in engines(8) {
            for i in 0..500u64 {
                engine.add(format!("k{}", i % 20), i);
                if i % 3 == 0 {
                    engine.get(&format!("k{}", i % 7));
                }
                assert!(
                    engine.len() <= 8,
                    "len {} exceeds capacity 8",
                    engine.len()
                );
            }
        }
    }

    #[test]
    fn capacity_zero_is_unbounded() {
        for mut engine in engines(0) {
            for i in 0..500u64 {
                engine.add(format!("k{i}"), i);
            }
            assert_eq!(
                engine.len(),
                500,
                "capacity 0 must disable eviction entirely"
            );
        }
    }

    #[test]
    fn update_in_place_does_not_grow_len() {
        for mut engine in engines(4) {
            engine.add("k".into(), 1);
            engine.add("k".into(), 2);
            engine.add("k".into(), 3);

            assert_eq!(engine.len(), 1);
            assert_eq!(engine.peek(&"k".into()), Some(&3));
        }
    }
}

// ==============================================
// Read Semantics
// ==============================================

mod read_semantics {
    use super::*;

    #[test]
    fn peek_does_not_change_eviction_outcome_for_lru() {
        let mut cache: LruCache<&str, u32> = LruCache::new(2, None);
        cache.add("a", 1);
        cache.add("b", 2);
        cache.peek(&"a"); // no promotion
        cache.add("c", 3);

        assert!(!cache.contains(&"a"), "peek must not rescue the LRU entry");
        assert!(cache.contains(&"b"));
    }

    #[test]
    fn peek_does_not_bump_lfu_frequency() {
        let mut cache: LfuCache<&str, u32> = LfuCache::new(4, None);
        cache.add("a", 1);
        cache.peek(&"a");
        cache.peek(&"a");

        assert_eq!(cache.frequency(&"a"), Some(0));
        cache.get(&"a");
        assert_eq!(cache.frequency(&"a"), Some(1));
    }

    #[test]
    fn peek_does_not_promote_arc_t1_entry() {
        let mut cache: ArcCache<&str, u32> = ArcCache::new(4, None);
        cache.add("a", 1);
        cache.peek(&"a");

        assert_eq!(cache.t1_len(), 1, "peek must leave the entry in T1");
        assert_eq!(cache.t2_len(), 0);
    }

    #[test]
    fn get_miss_returns_none_everywhere() {
        for mut engine in engines(4) {
            assert_eq!(engine.get(&"missing".into()), None);
            assert_eq!(engine.peek(&"missing".into()), None);
            assert!(!engine.contains(&"missing".into()));
        }
    }
}

// ==============================================
// Eviction Victim Selection
// ==============================================

mod victim_selection {
    use super::*;

    #[test]
    fn lru_evicts_least_recently_touched() {
        let mut cache: LruCache<&str, u32> = LruCache::new(3, None);
        cache.add("a", 1);
        cache.add("b", 2);
        cache.add("c", 3);
        cache.get(&"a");
        cache.get(&"b");

        cache.add("d", 4);
        assert!(!cache.contains(&"c"), "c was the coldest entry");
    }

    #[test]
    fn lfu_evicts_from_minimum_frequency_bucket() {
        let mut cache: LfuCache<&str, u32> = LfuCache::new(3, None);
        cache.add("hot", 1);
        cache.add("warm", 2);
        cache.add("cold", 3);
        for _ in 0..5 {
            cache.get(&"hot");
        }
        cache.get(&"warm");

        cache.add("new", 4);
        assert!(!cache.contains(&"cold"), "cold had the lowest frequency");
        assert!(cache.contains(&"hot"));
        assert!(cache.contains(&"warm"));
    }

    #[test]
    fn lfu_breaks_frequency_ties_by_recency() {
        let mut cache: LfuCache<&str, u32> = LfuCache::new(2, None);
        cache.add("first", 1);
        cache.add("second", 2); // both at frequency 0

        cache.add("third", 3);
        assert!(
            !cache.contains(&"first"),
            "the older of the tied entries is the victim"
        );
        assert!(cache.contains(&"second"));
    }

    #[test]
    fn arc_keeps_reused_entries_over_scanned_ones() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(4, None);
        // Two hot keys promoted to T2.
        cache.add(1, 1);
        cache.add(2, 2);
        cache.get(&1);
        cache.get(&2);

        // A scan of cold keys churns through T1.
        for i in 100..120 {
            cache.add(i, i);
        }

        assert!(cache.contains(&1), "hot key lost to a sequential scan");
        assert!(cache.contains(&2), "hot key lost to a sequential scan");
    }

    #[test]
    fn arc_partition_target_stays_in_range() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(16, None);
        for i in 0..2000u32 {
            cache.add(i % 37, i);
            if i % 2 == 0 {
                cache.get(&(i % 11));
            }
            assert!(cache.p_value() <= 16);
            assert!(cache.len() <= 16);
        }
        cache.debug_validate_invariants();
    }
}

// ==============================================
// Eviction Callback
// ==============================================

mod eviction_callback {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn every_policy_reports_evictions() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Arc] {
            let evicted = Arc::new(AtomicUsize::new(0));
            let sink = Arc::clone(&evicted);
            let mut engine = kind.build::<String, u64>(
                4,
                Some(Box::new(move |_k, _v| {
                    sink.fetch_add(1, Ordering::SeqCst);
                })),
            );

            for i in 0..10u64 {
                engine.add(format!("k{i}"), i);
            }
            assert_eq!(
                evicted.load(Ordering::SeqCst),
                6,
                "{kind}: 10 inserts at capacity 4 must evict 6"
            );
        }
    }

    #[test]
    fn remove_does_not_fire_callback() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Arc] {
            let evicted = Arc::new(AtomicUsize::new(0));
            let sink = Arc::clone(&evicted);
            let mut engine = kind.build::<String, u64>(
                4,
                Some(Box::new(move |_k, _v| {
                    sink.fetch_add(1, Ordering::SeqCst);
                })),
            );

            engine.add("k".into(), 1);
            engine.remove(&"k".into());
            assert_eq!(evicted.load(Ordering::SeqCst), 0, "{kind}");
        }
    }
}
