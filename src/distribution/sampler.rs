//! Inverse-transform sampling
//!
//! A uniform draw `u` in `[0, 1]` maps to the first table entry whose
//! cumulative probability is `>= u`. A draw landing exactly on a boundary
//! belongs to that boundary's bucket, never the next one.
//!
//! # Example
//!
//! ```
//! use cdfgen::distribution::{CdfTable, sampler::Sampler};
//!
//! let table = CdfTable::from_pairs(&[(1, 0.5), (2, 0.75), (3, 1.0)]);
//! assert_eq!(Sampler::draw(&table, 0.5), Some(1));
//! assert_eq!(Sampler::draw(&table, 0.6), Some(2));
//!
//! let mut sampler = Sampler::with_seed(7);
//! let value = sampler.sample(&table).unwrap();
//! assert!((1..=3).contains(&value));
//! ```

use super::CdfTable;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform source plus inverse-transform lookup
///
/// Each worker owns its own sampler; samplers are never shared.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: Xoshiro256PlusPlus,
}

impl Sampler {
    /// Create a sampler with a random seed
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Create a sampler with a specific seed
    ///
    /// Useful for reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Next uniform draw from the closed interval `[0, 1]`
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        self.rng.gen_range(0.0..=1.0)
    }

    /// Draw a uniform value and map it through `table`
    ///
    /// Returns `None` for an invalid table.
    pub fn sample(&mut self, table: &CdfTable) -> Option<i64> {
        if !table.is_valid() {
            return None;
        }
        let u = self.next_uniform();
        // Rounding can leave the final boundary a hair under 1
        Self::draw(table, u).or_else(|| table.entries().last().map(|e| e.value))
    }

    /// Map a uniform draw to its bucket's value
    ///
    /// Boundaries are non-decreasing, so the first entry with
    /// `cumulative >= u` is found by partitioning on `cumulative < u`.
    /// Returns `None` when no boundary covers `u` (invalid table, or `u`
    /// outside `[0, 1]`).
    pub fn draw(table: &CdfTable, u: f64) -> Option<i64> {
        let entries = table.entries();
        let idx = entries.partition_point(|e| e.cumulative < u);
        entries.get(idx).map(|e| e.value)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DEFAULT_CDF;

    #[test]
    fn test_draw_interior_points() {
        let table = CdfTable::default_table();
        assert_eq!(Sampler::draw(&table, 0.0), Some(1));
        assert_eq!(Sampler::draw(&table, 0.3), Some(1));
        assert_eq!(Sampler::draw(&table, 0.6), Some(2));
        assert_eq!(Sampler::draw(&table, 0.8), Some(3));
        assert_eq!(Sampler::draw(&table, 0.93), Some(4));
        assert_eq!(Sampler::draw(&table, 0.99), Some(5));
    }

    #[test]
    fn test_draw_on_boundary_stays_in_bucket() {
        let table = CdfTable::default_table();
        for (value, boundary) in DEFAULT_CDF {
            assert_eq!(Sampler::draw(&table, boundary), Some(value));
        }
    }

    #[test]
    fn test_draw_just_above_boundary_moves_on() {
        let table = CdfTable::default_table();
        assert_eq!(Sampler::draw(&table, 0.5 + f64::EPSILON), Some(2));
    }

    #[test]
    fn test_draw_zero_width_bucket_is_skipped() {
        let table = CdfTable::from_pairs(&[(1, 0.5), (2, 0.5), (3, 1.0)]);
        assert_eq!(Sampler::draw(&table, 0.5), Some(1));
        assert_eq!(Sampler::draw(&table, 0.51), Some(3));
    }

    #[test]
    fn test_draw_invalid_table() {
        let table = CdfTable::from_pairs(&[(1, 0.4)]);
        assert_eq!(Sampler::draw(&table, 0.1), None);

        let mut sampler = Sampler::with_seed(1);
        assert_eq!(sampler.sample(&table), None);
    }

    #[test]
    fn test_draw_out_of_range() {
        let table = CdfTable::default_table();
        assert_eq!(Sampler::draw(&table, 1.5), None);
    }

    #[test]
    fn test_draw_matches_bucket_bounds() {
        // The returned bucket's lower boundary is strictly below u and its
        // upper boundary is at or above u.
        let table = CdfTable::default_table();
        let bounds: Vec<f64> = table.entries().iter().map(|e| e.cumulative).collect();
        let mut sampler = Sampler::with_seed(99);

        for _ in 0..1000 {
            let u = sampler.next_uniform();
            let value = Sampler::draw(&table, u).unwrap();
            let idx = table.values().position(|v| v == value).unwrap();
            assert!(u <= bounds[idx]);
            if idx > 0 {
                assert!(u > bounds[idx - 1]);
            }
        }
    }

    #[test]
    fn test_seeded_samplers_agree() {
        let table = CdfTable::default_table();
        let mut a = Sampler::with_seed(12345);
        let mut b = Sampler::with_seed(12345);
        for _ in 0..50 {
            assert_eq!(a.sample(&table), b.sample(&table));
        }
    }

    #[test]
    fn test_sample_frequencies_follow_table() {
        let table = CdfTable::default_table();
        let mut sampler = Sampler::with_seed(42);
        let mut ones = 0u32;
        for _ in 0..10_000 {
            if sampler.sample(&table) == Some(1) {
                ones += 1;
            }
        }
        // P(1) = 0.5, allow generous slack
        assert!(ones > 4500 && ones < 5500, "ones = {}", ones);
    }
}
