/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use log::debug;

use super::{common_prefix, num_seeds, reposition, table_capacity, DiffOptions};
use crate::cmds::Command;
use crate::error::Result;
use crate::hash::RollingHash;

/// A single-slot hash table entry. A tag of zero marks a slot that was
/// never written; lookups additionally require the stored tag to equal
/// the current one, which logically empties the whole table without
/// touching it when the tag is bumped after a committed match.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    fingerprint: u64,
    offset: usize,
    tag: u64,
}

#[derive(Debug)]
struct SeedTable {
    slots: Vec<Slot>,
}

impl SeedTable {
    fn new(capacity: usize) -> Self {
        SeedTable {
            slots: vec![Slot::default(); capacity],
        }
    }

    #[inline(always)]
    fn index(&self, fingerprint: u64) -> usize {
        (fingerprint % self.slots.len() as u64) as usize
    }

    /// Inserts unless the slot is already live in the current epoch
    /// (retain-existing: the first offset per fingerprint wins).
    fn insert(&mut self, fingerprint: u64, offset: usize, tag: u64) {
        let idx = self.index(fingerprint);
        let slot = &mut self.slots[idx];
        if slot.tag != tag {
            *slot = Slot {
                fingerprint,
                offset,
                tag,
            };
        }
    }

    /// Returns the stored offset if the slot is live in the current
    /// epoch and holds exactly this fingerprint.
    fn lookup(&self, fingerprint: u64, tag: u64) -> Option<usize> {
        let slot = &self.slots[self.index(fingerprint)];
        (slot.tag == tag && slot.fingerprint == fingerprint).then_some(slot.offset)
    }
}

/// One-pass differencing (Ajtai et al., Figure 3).
///
/// Scans the reference and the version concurrently, each feeding its
/// own single-slot table; a hit of one string's fingerprint in the other
/// string's table, verified bytewise and extended forward, becomes a
/// copy, after which both tables are logically flushed and both cursors
/// jump past the match. O(|R| + |V|) time, O(q) space. The price is
/// that matches appearing in different relative orders in the two
/// strings (transpositions) cannot both be found.
pub fn diff_one_pass(reference: &[u8], version: &[u8], opts: &DiffOptions) -> Result<Vec<Command>> {
    opts.validate()?;
    let seed_len = opts.seed_len;
    let mut cmds = Vec::new();
    if version.is_empty() {
        return Ok(cmds);
    }

    // roughly one slot per seed_len-byte chunk of the reference
    let capacity = table_capacity(
        opts.table_size.max(num_seeds(reference.len(), seed_len) / seed_len),
        opts.max_table,
    );
    let mut ref_table = SeedTable::new(capacity);
    let mut ver_table = SeedTable::new(capacity);
    let mut tag = 1;

    let mut r_cursor = 0;
    let mut v_cursor = 0;
    let mut v_start = 0; // first unencoded version offset
    let mut r_window =
        (reference.len() >= seed_len).then(|| RollingHash::new(reference, 0, seed_len));
    let mut v_window = (version.len() >= seed_len).then(|| RollingHash::new(version, 0, seed_len));

    loop {
        let r_fits = r_cursor + seed_len <= reference.len();
        let v_fits = v_cursor + seed_len <= version.len();
        if !r_fits && !v_fits {
            break;
        }

        let r_fingerprint = r_fits.then(|| {
            let window = r_window.as_mut().unwrap();
            reposition(window, r_cursor);
            window.fingerprint()
        });
        let v_fingerprint = v_fits.then(|| {
            let window = v_window.as_mut().unwrap();
            reposition(window, v_cursor);
            window.fingerprint()
        });

        if let Some(fingerprint) = r_fingerprint {
            ref_table.insert(fingerprint, r_cursor, tag);
        }
        if let Some(fingerprint) = v_fingerprint {
            ver_table.insert(fingerprint, v_cursor, tag);
        }

        // prefer a hit of the reference seed among the version seeds
        // met so far, then the symmetric lookup
        let mut matched = None;
        if let Some(fingerprint) = r_fingerprint {
            if let Some(v_offset) = ver_table.lookup(fingerprint, tag) {
                if version[v_offset..v_offset + seed_len]
                    == reference[r_cursor..r_cursor + seed_len]
                {
                    matched = Some((v_offset, r_cursor));
                }
            }
        }
        if matched.is_none() {
            if let Some(fingerprint) = v_fingerprint {
                if let Some(r_offset) = ref_table.lookup(fingerprint, tag) {
                    if reference[r_offset..r_offset + seed_len]
                        == version[v_cursor..v_cursor + seed_len]
                    {
                        matched = Some((v_cursor, r_offset));
                    }
                }
            }
        }

        match matched {
            Some((v_match, r_match)) => {
                // forward extension only
                let length = seed_len
                    + common_prefix(reference, r_match + seed_len, version, v_match + seed_len);
                if v_start < v_match {
                    cmds.push(Command::Add(version[v_start..v_match].to_vec()));
                }
                cmds.push(Command::Copy {
                    offset: r_match,
                    length,
                });
                v_start = v_match + length;
                v_cursor = v_match + length;
                r_cursor = r_match + length;
                // next-match flush: logically empty both tables
                tag += 1;
            }
            None => {
                r_cursor += 1;
                v_cursor += 1;
            }
        }
    }
    if v_start < version.len() {
        cmds.push(Command::Add(version[v_start..].to_vec()));
    }
    debug!(
        "one-pass: {} commands, table capacity {}",
        cmds.len(),
        capacity
    );
    Ok(cmds)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::apply::apply_commands;

    #[test]
    fn test_aligned_match() {
        let reference = b"common prefix, then junk";
        let version = b"common prefix, and more!";
        let opts = DiffOptions {
            seed_len: 4,
            ..DiffOptions::default()
        };
        let cmds = diff_one_pass(reference, version, &opts).unwrap();
        assert_eq!(apply_commands(reference, &cmds).unwrap(), version);
        assert!(matches!(
            cmds[0],
            Command::Copy {
                offset: 0,
                length: 15,
            }
        ));
    }

    #[test]
    fn test_transposition_still_correct() {
        // one-pass misses transposed blocks but must stay correct
        let reference = b"AAAAAAAAAAAABBBBBBBBBBBB".to_vec();
        let version = b"BBBBBBBBBBBBAAAAAAAAAAAA".to_vec();
        let opts = DiffOptions {
            seed_len: 4,
            ..DiffOptions::default()
        };
        let cmds = diff_one_pass(&reference, &version, &opts).unwrap();
        assert_eq!(apply_commands(&reference, &cmds).unwrap(), version);
    }
}
