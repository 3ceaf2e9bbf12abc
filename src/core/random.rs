//! Weighted Random Selection
//!
//! Selection primitives shared by every generator flow:
//! - Weighted draws proportional to per-item weight
//! - Uniform single/multi picks without replacement
//! - Inclusive integer ranges and probability checks
//!
//! A total weight of zero degrades to a uniform draw over the raw list
//! rather than failing, so a catalog where every option was down-weighted
//! to zero still produces output. Empty inputs return `None`/empty and the
//! caller substitutes a literal fallback.

use rand::prelude::*;

/// Pick one item with probability proportional to `weight(item)`.
///
/// Returns `None` only for an empty slice. When all weights are zero the
/// draw falls back to a uniform choice.
pub fn weighted_pick_by<T, F>(items: &[T], weight: F) -> Option<&T>
where
    F: Fn(&T) -> u32,
{
    if items.is_empty() {
        return None;
    }

    let total: u64 = items.iter().map(|i| weight(i) as u64).sum();
    if total == 0 {
        return pick_one(items);
    }

    let mut rng = thread_rng();
    let roll = rng.gen_range(1..=total);
    let mut cumulative = 0u64;
    for item in items {
        cumulative += weight(item) as u64;
        if cumulative >= roll {
            return Some(item);
        }
    }

    // Unreachable while roll <= total; keeps the walk total-independent.
    items.last()
}

/// Pick one item from `(value, weight)` pairs.
pub fn weighted_pick<T>(items: &[(T, u32)]) -> Option<&T> {
    weighted_pick_by(items, |(_, w)| *w).map(|(v, _)| v)
}

/// Draw up to `count` items weighted without replacement.
///
/// Returns fewer than `count` when the list is shorter. Indices are drawn
/// one at a time so earlier picks cannot repeat.
pub fn weighted_pick_many_by<T, F>(items: &[T], count: usize, weight: F) -> Vec<&T>
where
    F: Fn(&T) -> u32,
{
    let mut remaining: Vec<&T> = items.iter().collect();
    let mut picked = Vec::with_capacity(count.min(remaining.len()));

    while picked.len() < count && !remaining.is_empty() {
        let chosen = match weighted_pick_by(&remaining, |i| weight(i)) {
            Some(item) => *item,
            None => break,
        };
        let idx = remaining
            .iter()
            .position(|i| std::ptr::eq(*i, chosen))
            .unwrap_or(0);
        picked.push(remaining.swap_remove(idx));
    }

    picked
}

/// Uniform single choice.
pub fn pick_one<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut thread_rng())
}

/// Uniform `count` choices without replacement (shuffle-take-n).
///
/// Returns fewer than `count` when the list is shorter.
pub fn pick_many<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    let mut shuffled: Vec<T> = items.to_vec();
    shuffled.shuffle(&mut thread_rng());
    shuffled.truncate(count);
    shuffled
}

/// Random integer in `[min, max]` inclusive.
pub fn random_int(min: i64, max: i64) -> i64 {
    if min >= max {
        return min;
    }
    thread_rng().gen_range(min..=max)
}

/// True with probability `probability` (clamped to `[0, 1]`).
pub fn chance(probability: f64) -> bool {
    thread_rng().gen_bool(probability.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn weighted_pick_empty_returns_none() {
        let items: Vec<(&str, u32)> = vec![];
        assert!(weighted_pick(&items).is_none());
    }

    #[test]
    fn weighted_pick_zero_total_falls_back_to_uniform() {
        let items = vec![("a", 0u32), ("b", 0), ("c", 0)];
        for _ in 0..100 {
            assert!(weighted_pick(&items).is_some());
        }
    }

    #[test]
    fn weighted_pick_only_nonzero_weight_wins() {
        let items = vec![("a", 1u32), ("b", 0), ("c", 0), ("d", 0)];
        for _ in 0..1000 {
            assert_eq!(weighted_pick(&items), Some(&"a"));
        }
    }

    #[test]
    fn weighted_pick_equal_weights_are_roughly_fair() {
        let items = vec![("a", 1u32), ("b", 1), ("c", 1), ("d", 1)];
        let mut counts: HashMap<&str, u32> = HashMap::new();
        let draws = 10_000;
        for _ in 0..draws {
            *counts.entry(weighted_pick(&items).unwrap()).or_insert(0) += 1;
        }
        // Each should land near 25%; 5 standard deviations of slack.
        for (_, count) in counts {
            let freq = count as f64 / draws as f64;
            assert!((freq - 0.25).abs() < 0.03, "frequency {freq} outside bounds");
        }
    }

    #[test]
    fn weighted_pick_many_respects_list_size() {
        let items = vec![("a", 2u32), ("b", 1)];
        let picked = weighted_pick_many_by(&items, 5, |(_, w)| *w);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn weighted_pick_many_has_no_duplicates() {
        let items: Vec<(String, u32)> = (0..10).map(|i| (format!("v{i}"), 1)).collect();
        for _ in 0..50 {
            let picked = weighted_pick_many_by(&items, 3, |(_, w)| *w);
            assert_eq!(picked.len(), 3);
            let mut names: Vec<&str> = picked.iter().map(|(v, _)| v.as_str()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), 3);
        }
    }

    #[test]
    fn pick_many_shorter_list_returns_all() {
        let items = vec![1, 2, 3];
        let picked = pick_many(&items, 10);
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn pick_many_without_replacement() {
        let items: Vec<i32> = (0..20).collect();
        let mut picked = pick_many(&items, 5);
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn random_int_inclusive_bounds() {
        for _ in 0..1000 {
            let v = random_int(1, 3);
            assert!((1..=3).contains(&v));
        }
        assert_eq!(random_int(5, 5), 5);
        assert_eq!(random_int(7, 2), 7);
    }

    #[test]
    fn chance_extremes() {
        assert!(!chance(0.0));
        assert!(chance(1.0));
    }
}
