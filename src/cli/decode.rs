/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::{info, warn};

use webdelta::apply::{apply_placed, apply_placed_inplace};
use webdelta::container::decode_delta;
use webdelta::error::DeltaError;
use webdelta::hash::crc64;

pub const COMMAND_NAME: &str = "decode";

#[derive(Args, Debug)]
#[command(about = "Applies a delta to a reference file.", long_about = None)]
struct CliArgs {
    /// The reference file.
    reference: PathBuf,
    /// The delta file.
    delta: PathBuf,
    /// The reconstructed output file.
    output: PathBuf,

    /// Downgrade integrity-hash mismatches to warnings.
    #[arg(long)]
    ignore_hash: bool,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

fn check_hash(which: &'static str, expected: u64, computed: u64, ignore: bool) -> Result<()> {
    if expected == computed {
        return Ok(());
    }
    let error = DeltaError::HashMismatch {
        which,
        expected,
        computed,
    };
    if ignore {
        warn!("{}", error);
        Ok(())
    } else {
        Err(error.into())
    }
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    super::init_logger(false)?;

    let reference = super::read_file(&args.reference)?;
    let bytes = super::read_file(&args.delta)?;
    let delta = decode_delta(&bytes)?;

    check_hash(
        "source",
        delta.src_hash,
        crc64(&reference),
        args.ignore_hash,
    )?;
    let version_size = delta.version_size as usize;
    let output = if delta.in_place {
        apply_placed_inplace(&reference, &delta.commands, version_size)?
    } else {
        apply_placed(&reference, &delta.commands, version_size)?
    };
    check_hash(
        "destination",
        delta.dst_hash,
        crc64(&output),
        args.ignore_hash,
    )?;

    super::write_file(&args.output, &output)?;
    info!(
        "reconstructed {} bytes from {} commands{}",
        output.len(),
        delta.commands.len(),
        if delta.in_place { " (in place)" } else { "" }
    );
    Ok(())
}
