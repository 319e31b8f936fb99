// crates/datamart-core/src/runtime/sampler.rs
// ============================================================================
// Module: Candidate Sampler
// Description: Uniform random subset selection over page candidates.
// Purpose: Reduce a candidate page to a sample without reordering survivors.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Sampling shuffles a permutation of candidate positions and removes the
//! first `candidates - sample` of them. Surviving candidates keep their
//! original relative order, and every subset of the requested size is equally
//! likely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::seq::SliceRandom;

// ============================================================================
// SECTION: Sampling
// ============================================================================

/// Reduces `candidates` to `sample_size` uniformly chosen entries.
///
/// Candidates are returned unchanged when no sample size is given or when
/// the sample size is not smaller than the candidate count.
pub fn sample_groups<T, R>(candidates: Vec<T>, sample_size: Option<usize>, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let count = candidates.len();
    let Some(sample) = sample_size.filter(|sample| *sample < count) else {
        return candidates;
    };
    let mut order: Vec<usize> = (0 .. count).collect();
    order.shuffle(rng);
    let mut slots: Vec<Option<T>> = candidates.into_iter().map(Some).collect();
    for position in order.iter().take(count - sample) {
        if let Some(slot) = slots.get_mut(*position) {
            *slot = None;
        }
    }
    slots.into_iter().flatten().collect()
}
