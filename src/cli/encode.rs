/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::info;

use super::DiffArgs;
use webdelta::cmds::place;
use webdelta::container::encode_delta;
use webdelta::diff::{diff, Algorithm, DiffOptions};
use webdelta::hash::crc64;
use webdelta::inplace::{make_inplace, CyclePolicy};

pub const COMMAND_NAME: &str = "encode";

#[derive(Args, Debug)]
#[command(about = "Computes a delta between two files.", long_about = None)]
struct CliArgs {
    /// The differencing algorithm.
    #[arg(value_enum)]
    algorithm: Algorithm,
    /// The reference file.
    reference: PathBuf,
    /// The version file.
    version: PathBuf,
    /// The delta output file.
    delta: PathBuf,

    #[clap(flatten)]
    diff: DiffArgs,

    /// Emit an in-place delta instead of a standard one.
    #[arg(long)]
    inplace: bool,

    /// Cycle-breaking policy used with --inplace.
    #[arg(long, value_enum, default_value_t = CyclePolicy::LocalMin)]
    policy: CyclePolicy,

    /// Log per-phase details.
    #[arg(long)]
    verbose: bool,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    super::init_logger(args.verbose)?;

    let reference = super::read_file(&args.reference)?;
    let version = super::read_file(&args.version)?;
    let opts = DiffOptions::from(&args.diff);

    let start = Instant::now();
    let cmds = diff(args.algorithm, &reference, &version, &opts)?;
    let placed = if args.inplace {
        make_inplace(&reference, &cmds, args.policy)?
    } else {
        place(cmds)
    };
    let delta = encode_delta(
        &placed,
        args.inplace,
        version.len(),
        crc64(&reference),
        crc64(&version),
    )?;
    super::write_file(&args.delta, &delta)?;

    info!(
        "{} bytes -> {} delta bytes ({:.1}%) in {:.2?}",
        version.len(),
        delta.len(),
        if version.is_empty() {
            0.0
        } else {
            100.0 * delta.len() as f64 / version.len() as f64
        },
        start.elapsed()
    );
    Ok(())
}
