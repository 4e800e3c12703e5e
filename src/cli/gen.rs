/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::info;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const COMMAND_NAME: &str = "gen";

#[derive(Args, Debug)]
#[command(
    about = "Generates a reference/version pair with controlled block transpositions.",
    long_about = "Generates a reference/version pair with controlled block transpositions.\n\n\
        Block sizes vary uniformly in [mean/2, 3·mean/2] to avoid alignment \
        artifacts. The version permutes approximately the requested \
        percentage of blocks; transposed equal-sized blocks are what forces \
        the in-place planner to break cycles."
)]
struct CliArgs {
    /// Number of blocks.
    num_blocks: usize,
    /// Mean block size in bytes.
    mean_block_size: usize,
    /// Degree of permutation, 0-100 (percent of blocks displaced).
    perm_pct: f64,

    /// Reference output file.
    #[arg(long = "ref", default_value = "ref.bin")]
    reference: PathBuf,

    /// Version output file.
    #[arg(long = "ver", default_value = "ver.bin")]
    version: PathBuf,

    /// Seed for the pseudorandom number generator.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    super::init_logger(false)?;
    ensure!(
        (0.0..=100.0).contains(&args.perm_pct),
        "perm_pct must be between 0 and 100"
    );

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let blocks: Vec<Vec<u8>> = (0..args.num_blocks)
        .map(|_| {
            let size = rng.random_range(
                1.max(args.mean_block_size / 2)..=1.max(args.mean_block_size * 3 / 2),
            );
            (0..size).map(|_| rng.random()).collect()
        })
        .collect();

    // select k positions and shuffle their contents; a few may land back
    // on their original index, so the displaced count can be below k
    let mut perm: Vec<usize> = (0..args.num_blocks).collect();
    let k = (args.num_blocks as f64 * args.perm_pct / 100.0).round() as usize;
    if k >= 2 {
        let chosen = rand::seq::index::sample(&mut rng, args.num_blocks, k).into_vec();
        let mut values: Vec<usize> = chosen.iter().map(|&i| perm[i]).collect();
        values.shuffle(&mut rng);
        for (&i, &value) in chosen.iter().zip(values.iter()) {
            perm[i] = value;
        }
    }

    let reference: Vec<u8> = blocks.concat();
    let version: Vec<u8> = perm.iter().flat_map(|&i| blocks[i].clone()).collect();
    super::write_file(&args.reference, &reference)?;
    super::write_file(&args.version, &version)?;

    let displaced = perm.iter().enumerate().filter(|&(i, &v)| i != v).count();
    info!("blocks:    {}", args.num_blocks);
    info!("mean size: {} bytes", args.mean_block_size);
    info!(
        "perm:      {:.0}% ({}/{} blocks displaced)",
        args.perm_pct, displaced, args.num_blocks
    );
    info!(
        "ref:       {} ({} bytes)",
        args.reference.display(),
        reference.len()
    );
    info!(
        "ver:       {} ({} bytes)",
        args.version.display(),
        version.len()
    );
    Ok(())
}
