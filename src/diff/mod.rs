/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The differencing algorithms of Ajtai, Burns, Fagin, Long &
//! Stockmeyer, “Compactly Encoding Unstructured Inputs with Differential
//! Compression”, JACM 49(3), 2002.
//!
//! All three share the same contract: given a reference and a version,
//! they return an ordered list of [commands](crate::cmds::Command) whose
//! [application](crate::apply::apply_commands) to the reference yields
//! the version exactly. They differ in the time/space/quality trade-off:
//! [greedy](diff_greedy) is optimal but quadratic, [one-pass](diff_one_pass)
//! is linear with constant-size state, and [correcting](diff_correcting)
//! is near-optimal in linear expected time with memory bounded by
//! checkpointing, independently of the reference size.

mod correcting;
mod greedy;
mod lookback;
mod one_pass;

pub use correcting::diff_correcting;
pub use greedy::diff_greedy;
pub use one_pass::diff_one_pass;

use crate::cmds::Command;
use crate::error::{DeltaError, Result};
use crate::utils::next_prime;
use log::debug;

/// Default seed (fingerprint window) length.
pub const DEFAULT_SEED_LEN: usize = 16;
/// Default floor for the auto-sized fingerprint tables.
pub const DEFAULT_TABLE_SIZE: usize = 65_521;
/// Default hard cap on auto-sized fingerprint tables (largest prime
/// below 2²¹).
pub const DEFAULT_MAX_TABLE: usize = 2_097_143;
/// Default capacity of the correction lookback buffer.
pub const DEFAULT_LOOKBACK: usize = 256;

/// The available differencing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Algorithm {
    /// Optimal under the simple cost measure; O(|R|·|V|) worst case.
    Greedy,
    /// Single concurrent scan; O(|R| + |V|) time, O(q) space.
    #[cfg_attr(feature = "cli", value(name = "onepass"))]
    OnePass,
    /// Correcting 1.5-pass with checkpointed fingerprints.
    Correcting,
}

/// Tuning parameters shared by the differencers.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Seed length `p`: the number of bytes covered by one fingerprint.
    /// Must be at least 1.
    pub seed_len: usize,
    /// Floor for the auto-sized hash tables of one-pass and correcting.
    pub table_size: usize,
    /// Hard cap on auto-sized tables; larger requests are clamped.
    pub max_table: usize,
    /// Capacity of the correction lookback buffer. Must be at least 1.
    pub lookback: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            seed_len: DEFAULT_SEED_LEN,
            table_size: DEFAULT_TABLE_SIZE,
            max_table: DEFAULT_MAX_TABLE,
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

impl DiffOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.seed_len < 1 {
            return Err(DeltaError::BadParameter(
                "seed length must be at least 1".into(),
            ));
        }
        if self.lookback < 1 {
            return Err(DeltaError::BadParameter(
                "lookback capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Runs the selected differencing algorithm.
pub fn diff(
    algorithm: Algorithm,
    reference: &[u8],
    version: &[u8],
    opts: &DiffOptions,
) -> Result<Vec<Command>> {
    match algorithm {
        Algorithm::Greedy => diff_greedy(reference, version, opts),
        Algorithm::OnePass => diff_one_pass(reference, version, opts),
        Algorithm::Correcting => diff_correcting(reference, version, opts),
    }
}

/// The number of length-`seed_len` windows of a string of length `len`.
pub(crate) fn num_seeds(len: usize, seed_len: usize) -> usize {
    (len + 1).saturating_sub(seed_len)
}

/// Sizes a table to the smallest prime at least `want`, clamped to
/// `max_table`.
pub(crate) fn table_capacity(want: usize, max_table: usize) -> usize {
    let capacity = next_prime(want as u64) as usize;
    if capacity > max_table {
        debug!(
            "clamping table capacity {} to the {} cap",
            capacity, max_table
        );
        max_table
    } else {
        capacity
    }
}

/// Length of the longest common prefix of `a[a_from..]` and
/// `b[b_from..]`.
pub(crate) fn common_prefix(a: &[u8], a_from: usize, b: &[u8], b_from: usize) -> usize {
    a[a_from..]
        .iter()
        .zip(&b[b_from..])
        .take_while(|(x, y)| x == y)
        .count()
}

/// Moves `window` to `cursor`, rolling for a single forward step and
/// rebuilding otherwise (one-pass cursors can also jump backward, to
/// the end of a match found behind the scan).
pub(crate) fn reposition(window: &mut crate::hash::RollingHash<'_>, cursor: usize) {
    if window.start() + 1 == cursor {
        window.roll();
    } else if window.start() != cursor {
        window.rebuild(cursor);
    }
}
