/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};

use webdelta::cmds::PlacedCommand;
use webdelta::container::{decode_delta, HEADER_SIZE};

pub const COMMAND_NAME: &str = "info";

#[derive(Args, Debug)]
#[command(about = "Prints the header and a summary of a delta file.", long_about = None)]
struct CliArgs {
    /// The delta file.
    delta: PathBuf,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    super::init_logger(false)?;

    let bytes = super::read_file(&args.delta)?;
    let delta = decode_delta(&bytes)?;

    let mut copies = 0;
    let mut adds = 0;
    let mut copied_bytes = 0;
    let mut added_bytes = 0;
    for cmd in &delta.commands {
        match cmd {
            PlacedCommand::Copy { len, .. } => {
                copies += 1;
                copied_bytes += len;
            }
            PlacedCommand::Add { data, .. } => {
                adds += 1;
                added_bytes += data.len();
            }
        }
    }

    println!("format:        DLT v3");
    println!("in-place:      {}", delta.in_place);
    println!("version size:  {} bytes", delta.version_size);
    println!("source hash:   {:016x}", delta.src_hash);
    println!("dest hash:     {:016x}", delta.dst_hash);
    println!("commands:      {} ({} copies, {} adds)", copies + adds, copies, adds);
    println!("copied bytes:  {}", copied_bytes);
    println!("added bytes:   {}", added_bytes);
    println!(
        "delta size:    {} bytes ({} header + {} commands)",
        bytes.len(),
        HEADER_SIZE,
        bytes.len() - HEADER_SIZE
    );
    Ok(())
}
