/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use log::debug;

use super::lookback::LookbackBuffer;
use super::{common_prefix, num_seeds, DiffOptions};
use crate::cmds::Command;
use crate::error::Result;
use crate::hash::RollingHash;
use crate::utils::next_prime;

/// Checkpoint-filtered fingerprint table (Ajtai et al., Section 8).
///
/// Only fingerprints whose residue class modulo the spacing `m` equals
/// the checkpoint class `k` are stored or looked up, so the expected
/// occupancy is about half the capacity however large the reference is.
/// The class is biased toward a fingerprint drawn from the middle of the
/// version, which raises the fraction of useful hits.
#[derive(Debug)]
struct CheckpointTable {
    /// First-found `(fingerprint, offset)` pairs; never flushed.
    slots: Vec<Option<(u64, usize)>>,
    /// The fingerprint universe |F|.
    universe: u64,
    /// The checkpoint spacing m = ⌈|F| / |C|⌉.
    spacing: u64,
    /// The checkpoint class k.
    class: u64,
}

impl CheckpointTable {
    fn new(num_ref_seeds: usize, version: &[u8], opts: &DiffOptions) -> Self {
        let seed_len = opts.seed_len;
        let capacity = next_prime(
            opts.max_table
                .min(opts.table_size.max(2 * num_ref_seeds / seed_len)) as u64,
        ) as usize;
        let universe = if num_ref_seeds > 0 {
            next_prime(2 * num_ref_seeds as u64)
        } else {
            1
        };
        let spacing = universe.div_ceil(capacity as u64);
        let class = if version.len() >= seed_len {
            let mid = (version.len() / 2).min(version.len() - seed_len);
            RollingHash::new(version, mid, seed_len).fingerprint() % universe % spacing
        } else {
            0
        };
        debug!(
            "checkpoint table: |C| = {}, |F| = {}, m = {}, k = {}",
            capacity, universe, spacing, class
        );
        CheckpointTable {
            slots: vec![None; capacity],
            universe,
            spacing,
            class,
        }
    }

    /// Returns the slot index of `fingerprint` if it passes the
    /// checkpoint test and lands inside the table (the division can
    /// overshoot the capacity by rounding).
    fn slot(&self, fingerprint: u64) -> Option<usize> {
        let reduced = fingerprint % self.universe;
        if reduced % self.spacing != self.class {
            return None;
        }
        let index = (reduced / self.spacing) as usize;
        (index < self.slots.len()).then_some(index)
    }

    fn insert(&mut self, fingerprint: u64, offset: usize) {
        if let Some(index) = self.slot(fingerprint) {
            // first-found wins
            if self.slots[index].is_none() {
                self.slots[index] = Some((fingerprint, offset));
            }
        }
    }

    fn lookup(&self, fingerprint: u64) -> Option<usize> {
        match self.slots[self.slot(fingerprint)?] {
            Some((stored, offset)) if stored == fingerprint => Some(offset),
            _ => None,
        }
    }
}

/// Output side of the correcting differencer.
///
/// Commands pass through a [`LookbackBuffer`] and become permanent only
/// on eviction or at the final flush, so a match extending backward can
/// still rewrite the most recent decisions.
#[derive(Debug)]
struct CorrectingEncoder<'a> {
    version: &'a [u8],
    /// First unencoded version offset.
    v_start: usize,
    buffer: LookbackBuffer,
    out: Vec<Command>,
}

impl<'a> CorrectingEncoder<'a> {
    fn new(version: &'a [u8], lookback: usize) -> Self {
        CorrectingEncoder {
            version,
            v_start: 0,
            buffer: LookbackBuffer::new(lookback),
            out: Vec::new(),
        }
    }

    /// Encodes a verified match of `[v_match, v_match + length)` against
    /// reference offset `r_match`, correcting the buffered tail when the
    /// match has extended backward into already-encoded bytes.
    fn push_match(&mut self, v_match: usize, r_match: usize, length: usize) {
        let match_end = v_match + length;
        if self.v_start <= v_match {
            // the match lies entirely in the unencoded suffix
            if self.v_start < v_match {
                let data = self.version[self.v_start..v_match].to_vec();
                self.buffer
                    .push(self.v_start, v_match, Command::Add(data), &mut self.out);
            }
            self.buffer.push(
                v_match,
                match_end,
                Command::Copy {
                    offset: r_match,
                    length,
                },
                &mut self.out,
            );
            self.v_start = match_end;
            return;
        }
        // reclaim as much of the buffered tail as can be rewritten
        let mut effective_start = self.v_start;
        for entry in self.buffer.iter_mut_newest_first() {
            if entry.dummy {
                continue;
            }
            if entry.v_start >= v_match {
                // wholly inside the match: absorb
                debug_assert!(entry.v_end <= match_end);
                entry.dummy = true;
                effective_start = effective_start.min(entry.v_start);
            } else if entry.v_end > v_match {
                // straddles the match start: a literal can be trimmed,
                // but a copy's reference bytes cannot be rewritten
                if let Command::Add(data) = &mut entry.cmd {
                    data.truncate(v_match - entry.v_start);
                    entry.v_end = v_match;
                    effective_start = effective_start.min(v_match);
                }
                break;
            } else {
                break;
            }
        }
        if match_end > effective_start {
            self.buffer.push(
                effective_start,
                match_end,
                Command::Copy {
                    offset: r_match + (effective_start - v_match),
                    length: match_end - effective_start,
                },
                &mut self.out,
            );
            self.v_start = match_end;
        }
    }

    /// Flushes the buffer and encodes any remaining suffix literally.
    fn finish(mut self) -> Vec<Command> {
        self.buffer.flush(&mut self.out);
        if self.v_start < self.version.len() {
            self.out
                .push(Command::Add(self.version[self.v_start..].to_vec()));
        }
        self.out
    }
}

/// Correcting 1.5-pass differencing (Ajtai et al., Figure 8).
///
/// The first pass indexes the reference under the checkpoint filter; the
/// second scans the version, extends every verified hit both forward and
/// backward, and encodes through the lookback buffer. Backward extension
/// is what recovers match starts that fell between checkpoints, so the
/// seed granularity does not translate into copy-length loss. Linear
/// expected time, memory bounded by the table capacity.
pub fn diff_correcting(
    reference: &[u8],
    version: &[u8],
    opts: &DiffOptions,
) -> Result<Vec<Command>> {
    opts.validate()?;
    let seed_len = opts.seed_len;
    if version.is_empty() {
        return Ok(Vec::new());
    }

    let mut table = CheckpointTable::new(num_seeds(reference.len(), seed_len), version, opts);

    // Pass 1: index the reference.
    if reference.len() >= seed_len {
        let mut window = RollingHash::new(reference, 0, seed_len);
        loop {
            table.insert(window.fingerprint(), window.start());
            if window.start() + seed_len == reference.len() {
                break;
            }
            window.roll();
        }
    }

    // Pass 2: scan the version.
    let mut encoder = CorrectingEncoder::new(version, opts.lookback);
    if version.len() >= seed_len {
        let mut window = RollingHash::new(version, 0, seed_len);
        let mut v_cursor = 0;
        while v_cursor + seed_len <= version.len() {
            super::reposition(&mut window, v_cursor);
            let mut advance = 1;
            if let Some(offset) = table.lookup(window.fingerprint()) {
                if reference[offset..offset + seed_len] == version[v_cursor..v_cursor + seed_len] {
                    let forward =
                        common_prefix(reference, offset + seed_len, version, v_cursor + seed_len);
                    let backward = common_suffix(reference, offset, version, v_cursor);
                    let v_match = v_cursor - backward;
                    let r_match = offset - backward;
                    let length = backward + seed_len + forward;
                    encoder.push_match(v_match, r_match, length);
                    advance = v_match + length - v_cursor;
                }
            }
            v_cursor += advance;
        }
    }
    let cmds = encoder.finish();
    debug!(
        "correcting: {} commands for {} reference / {} version bytes",
        cmds.len(),
        reference.len(),
        version.len()
    );
    Ok(cmds)
}

/// Length of the longest common suffix of `a[..a_to]` and `b[..b_to]`.
fn common_suffix(a: &[u8], a_to: usize, b: &[u8], b_to: usize) -> usize {
    a[..a_to]
        .iter()
        .rev()
        .zip(b[..b_to].iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::apply::apply_commands;

    fn options(seed_len: usize) -> DiffOptions {
        DiffOptions {
            seed_len,
            ..DiffOptions::default()
        }
    }

    #[test]
    fn test_common_suffix() {
        assert_eq!(common_suffix(b"xxab", 4, b"yyab", 4), 2);
        assert_eq!(common_suffix(b"ab", 2, b"ab", 2), 2);
        assert_eq!(common_suffix(b"ab", 0, b"ab", 2), 0);
    }

    #[test]
    fn test_backward_extension_recovers_prefix() {
        // the version duplicates a reference block with new framing; a
        // hit anywhere inside the block must stretch to its start
        let block: Vec<u8> = (0..200u8).collect();
        let mut reference = b"____".to_vec();
        reference.extend_from_slice(&block);
        reference.extend_from_slice(b"____");
        let mut version = b"**".to_vec();
        version.extend_from_slice(&block);
        version.extend_from_slice(b"**");
        let cmds = diff_correcting(&reference, &version, &options(4)).unwrap();
        assert_eq!(apply_commands(&reference, &cmds).unwrap(), version);
        // the whole block travels as a single copy
        assert!(cmds.iter().any(|cmd| matches!(
            cmd,
            Command::Copy { offset: 4, length: 200 }
        )));
    }

    #[test]
    fn test_late_match_after_literal_prefix() {
        let reference = b"0123456789abcdefghijklmnopqrstuv".to_vec();
        let mut version = b"XYZ".to_vec();
        version.extend_from_slice(&reference);
        let cmds = diff_correcting(&reference, &version, &options(8)).unwrap();
        assert_eq!(apply_commands(&reference, &cmds).unwrap(), version);
    }

    #[test]
    fn test_correction_stops_at_buffered_copy() {
        let version = b"aabbccddee";
        let mut encoder = CorrectingEncoder::new(version, 16);
        encoder.push_match(0, 10, 4);
        // backward extension into the previous copy: its reference
        // bytes cannot be rewritten, so only the new part is encoded
        encoder.push_match(2, 20, 6);
        let cmds = encoder.finish();
        assert_eq!(
            cmds,
            vec![
                Command::Copy {
                    offset: 10,
                    length: 4
                },
                Command::Copy {
                    offset: 22,
                    length: 4
                },
                Command::Add(b"ee".to_vec()),
            ]
        );
    }

    #[test]
    fn test_correction_absorbs_copy_and_trims_literal() {
        let version = b"aabbccddee";
        let mut encoder = CorrectingEncoder::new(version, 16);
        // literal gap [0, 2), copy [2, 5)
        encoder.push_match(2, 50, 3);
        // the new match [1, 9) absorbs the copy whole and trims the
        // literal down to [0, 1)
        encoder.push_match(1, 30, 8);
        let cmds = encoder.finish();
        assert_eq!(
            cmds,
            vec![
                Command::Add(b"a".to_vec()),
                Command::Copy {
                    offset: 30,
                    length: 8
                },
                Command::Add(b"e".to_vec()),
            ]
        );
    }
}
