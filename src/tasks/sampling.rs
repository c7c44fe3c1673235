//! Value-weighted selection of items to take from a corpse or container

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::core::types::ItemInfo;

/// Pick a random number of items, favouring high value per space, that fit in `free_space`.
///
/// Uses weighted sampling without replacement: each candidate gets the key
/// `u^(1/w)` with `u` uniform in (0, 1] and `w` its value density, compared in
/// log space as `ln(u) / w`. Candidates are taken in key order, skipping any
/// that no longer fit, until the drawn count is reached.
pub fn pick_items<R: Rng + ?Sized>(items: &[ItemInfo], free_space: f32, rng: &mut R) -> Vec<ItemInfo> {
    let mut keyed: Vec<(f32, ItemInfo)> = items
        .iter()
        .filter(|item| item.value > 0.0 && item.size > 0.0 && item.size <= free_space)
        .map(|item| {
            let u = 1.0 - rng.gen::<f32>();
            let weight = item.density().max(f32::EPSILON);
            (u.ln() / weight, *item)
        })
        .collect();
    if keyed.is_empty() {
        return Vec::new();
    }

    keyed.sort_by_key(|(key, _)| Reverse(OrderedFloat(*key)));
    let wanted = rng.gen_range(1..=keyed.len());

    let mut remaining = free_space;
    let mut picks = Vec::with_capacity(wanted);
    for (_, item) in keyed {
        if picks.len() == wanted {
            break;
        }
        if item.size <= remaining {
            remaining -= item.size;
            picks.push(item);
        }
    }
    picks
}
