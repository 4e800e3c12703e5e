/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::info;

use webdelta::cmds::unplace;
use webdelta::container::{decode_delta, encode_delta};
use webdelta::error::DeltaError;
use webdelta::hash::crc64;
use webdelta::inplace::{make_inplace, CyclePolicy};

pub const COMMAND_NAME: &str = "inplace";

#[derive(Args, Debug)]
#[command(
    about = "Converts a standard delta into an equivalent in-place one.",
    long_about = None
)]
struct CliArgs {
    /// The reference file.
    reference: PathBuf,
    /// The standard delta to convert.
    delta_in: PathBuf,
    /// The in-place delta output file.
    delta_out: PathBuf,

    /// Cycle-breaking policy.
    #[arg(long, value_enum, default_value_t = CyclePolicy::LocalMin)]
    policy: CyclePolicy,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    super::init_logger(false)?;

    let reference = super::read_file(&args.reference)?;
    let bytes = super::read_file(&args.delta_in)?;
    let delta = decode_delta(&bytes)?;
    if delta.in_place {
        bail!("{} is already an in-place delta", args.delta_in.display());
    }
    let computed = crc64(&reference);
    if computed != delta.src_hash {
        return Err(DeltaError::HashMismatch {
            which: "source",
            expected: delta.src_hash,
            computed,
        }
        .into());
    }

    let cmds = unplace(delta.commands);
    let placed = make_inplace(&reference, &cmds, args.policy)?;
    let out = encode_delta(
        &placed,
        true,
        delta.version_size as usize,
        delta.src_hash,
        delta.dst_hash,
    )?;
    super::write_file(&args.delta_out, &out)?;

    info!(
        "converted {} command(s) into an in-place plan of {} ({} -> {} bytes)",
        cmds.len(),
        placed.len(),
        bytes.len(),
        out.len()
    );
    Ok(())
}
