//! Property tests for target scoring and the exclusion list

use bot_directive::core::types::EntityId;
use bot_directive::targeting::scoring::priority;
use bot_directive::targeting::ExclusionList;
use proptest::prelude::*;

proptest! {
    #[test]
    fn priority_stays_within_bounds(
        value in -100.0f32..10_000.0,
        distance in 0.0f32..500.0,
        floor in 0.1f32..5.0,
        ceiling in 1.0f32..5_000.0,
    ) {
        let p = priority(value, distance, floor, ceiling);
        prop_assert!(p >= 0.0);
        prop_assert!(p <= ceiling);
    }

    #[test]
    fn nearer_is_never_worse(
        value in 0.1f32..10_000.0,
        near in 0.0f32..200.0,
        extra in 0.0f32..200.0,
    ) {
        let close = priority(value, near, 1.0, 1_000.0);
        let far = priority(value, near + extra, 1.0, 1_000.0);
        prop_assert!(close >= far);
    }

    #[test]
    fn richer_is_never_worse(
        value in 0.1f32..5_000.0,
        bonus in 0.0f32..5_000.0,
        distance in 0.0f32..200.0,
    ) {
        let base = priority(value, distance, 1.0, 1_000.0);
        let richer = priority(value + bonus, distance, 1.0, 1_000.0);
        prop_assert!(richer >= base);
    }

    #[test]
    fn exclusion_list_respects_bound_and_keeps_newest(
        capacity in 1usize..32,
        picks in prop::collection::vec(0usize..64, 1..300),
    ) {
        let pool: Vec<EntityId> = (0..64).map(|_| EntityId::new()).collect();
        let mut list = ExclusionList::new(capacity);
        for (tick, &pick) in picks.iter().enumerate() {
            list.insert(pool[pick], tick as f32);
            prop_assert!(list.len() <= capacity);
            prop_assert!(list.contains(pool[pick]));
        }
        let entries = list.entries();
        prop_assert_eq!(entries.len(), list.len());
        prop_assert!(entries.windows(2).all(|w| w[0].inserted_at <= w[1].inserted_at));
    }
}
