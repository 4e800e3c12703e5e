/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::HashMap;

use log::debug;

use super::{common_prefix, DiffOptions};
use crate::cmds::Command;
use crate::error::Result;
use crate::hash::RollingHash;

/// Greedy differencing (Ajtai et al., Figure 2).
///
/// Builds a chained index mapping every reference fingerprint to the list
/// of all offsets where it occurs, then scans the version taking at every
/// position the longest verified match, breaking ties in favor of the
/// earliest reference offset. Optimal under the simple cost measure;
/// O(|R|·|V|) time in the worst case, O(|R|) space.
pub fn diff_greedy(reference: &[u8], version: &[u8], opts: &DiffOptions) -> Result<Vec<Command>> {
    opts.validate()?;
    let seed_len = opts.seed_len;
    let mut cmds = Vec::new();
    if version.is_empty() {
        return Ok(cmds);
    }

    // Chains keep discovery order, so the first hit of a given length is
    // also the earliest reference offset.
    let mut index: HashMap<u64, Vec<usize>> = HashMap::new();
    if reference.len() >= seed_len {
        let mut window = RollingHash::new(reference, 0, seed_len);
        loop {
            index.entry(window.fingerprint()).or_default().push(window.start());
            if window.start() + seed_len == reference.len() {
                break;
            }
            window.roll();
        }
    }

    let mut v_start = 0; // first unencoded version offset
    let mut v_cursor = 0;
    if version.len() >= seed_len {
        let mut window = RollingHash::new(version, 0, seed_len);
        while v_cursor + seed_len <= version.len() {
            super::reposition(&mut window, v_cursor);
            let mut best_length = 0;
            let mut best_offset = 0;
            if let Some(chain) = index.get(&window.fingerprint()) {
                for &offset in chain {
                    // to beat the current best the candidate must agree
                    // one byte past it; checking that first skips most
                    // of the chain for one comparison
                    if best_length > 0 {
                        match (
                            reference.get(offset + best_length),
                            version.get(v_cursor + best_length),
                        ) {
                            (Some(r), Some(v)) if r == v => {}
                            _ => continue,
                        }
                    }
                    // the fingerprint is an index, not proof
                    if reference[offset..offset + seed_len]
                        != version[v_cursor..v_cursor + seed_len]
                    {
                        continue;
                    }
                    let length = seed_len
                        + common_prefix(reference, offset + seed_len, version, v_cursor + seed_len);
                    if length > best_length {
                        best_length = length;
                        best_offset = offset;
                    }
                }
            }
            if best_length >= seed_len {
                if v_start < v_cursor {
                    cmds.push(Command::Add(version[v_start..v_cursor].to_vec()));
                }
                cmds.push(Command::Copy {
                    offset: best_offset,
                    length: best_length,
                });
                v_cursor += best_length;
                v_start = v_cursor;
            } else {
                v_cursor += 1;
            }
        }
    }
    if v_start < version.len() {
        cmds.push(Command::Add(version[v_start..].to_vec()));
    }
    debug!(
        "greedy: {} commands for {} reference / {} version bytes",
        cmds.len(),
        reference.len(),
        version.len()
    );
    Ok(cmds)
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
    fn test_earliest_offset_wins() {
        // "ab" occurs at offsets 0 and 4 with the same extension
        let reference = b"abxyab";
        let version = b"ab";
        let cmds = diff_greedy(reference, version, &options(2)).unwrap();
        assert_eq!(
            cmds,
            vec![Command::Copy {
                offset: 0,
                length: 2
            }]
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let reference = b"abcXXXabcdef";
        let version = b"abcdef";
        let cmds = diff_greedy(reference, version, &options(3)).unwrap();
        assert_eq!(
            cmds,
            vec![Command::Copy {
                offset: 6,
                length: 6
            }]
        );
    }

    #[test]
    fn test_short_version_is_a_single_add() {
        let cmds = diff_greedy(b"whatever", b"ab", &options(4)).unwrap();
        assert_eq!(cmds, vec![Command::Add(b"ab".to_vec())]);
        assert_eq!(apply_commands(b"whatever", &cmds).unwrap(), b"ab");
    }
}
