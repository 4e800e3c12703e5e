/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The correcting differencer must stay round-trip correct under any
//! table size: checkpointing trades hits for memory, never
//! correctness.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use webdelta::prelude::*;

fn correcting(reference: &[u8], version: &[u8], seed_len: usize, table_size: usize) -> Vec<Command> {
    diff_correcting(
        reference,
        version,
        &DiffOptions {
            seed_len,
            table_size,
            ..DiffOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn test_tiny_table() {
    let reference = b"ABCDEFGHIJKLMNOP".repeat(20); // 320 bytes
    let mut version = reference[..160].to_vec();
    version.extend_from_slice(b"XXXXYYYY");
    version.extend_from_slice(&reference[160..]);
    let cmds = correcting(&reference, &version, 16, 7);
    assert_eq!(apply_commands(&reference, &cmds).unwrap(), version);
}

#[test]
fn test_table_size_sweep() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(42);
    let reference: Vec<u8> = (0..2000).map(|_| rng.random()).collect();
    let mut version = reference[..500].to_vec();
    version.extend((0..50).map(|_| rng.random::<u8>()));
    version.extend_from_slice(&reference[500..]);
    for table_size in [7, 31, 101, 1009, 65521] {
        let cmds = correcting(&reference, &version, 16, table_size);
        assert_eq!(
            apply_commands(&reference, &cmds)?,
            version,
            "failed with table size {}",
            table_size
        );
    }
    Ok(())
}

#[test]
fn test_small_input_is_unfiltered() {
    // when |F| <= |C| the spacing is 1 and every seed is a checkpoint
    let reference = b"hello world, this is a test string!";
    let version = b"hello world, this is a new string!";
    let cmds = correcting(reference, version, 4, 65521);
    assert_eq!(apply_commands(reference, &cmds).unwrap(), version);
}

#[test]
fn test_long_matches_survive_tiny_tables() {
    // 10 KB with a 100-byte insertion in the middle
    let reference: Vec<u8> = (0..=255u8).cycle().take(10240).collect();
    let mut version = reference[..5000].to_vec();
    version.extend_from_slice(&[b'X'; 100]);
    version.extend_from_slice(&reference[5000..]);
    let cmds = correcting(&reference, &version, 16, 31);
    assert_eq!(apply_commands(&reference, &cmds).unwrap(), version);
}
