/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command line interface structs and functions, organized by
//! subcommands.

pub mod decode;
pub mod encode;
pub mod gen;
pub mod info;
pub mod inplace;

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use webdelta::diff::{DiffOptions, DEFAULT_MAX_TABLE, DEFAULT_SEED_LEN, DEFAULT_TABLE_SIZE};

/// Initializes the logger; `RUST_LOG` overrides the computed filter.
pub fn init_logger(verbose: bool) -> Result<()> {
    env_logger::builder()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .try_init()?;
    Ok(())
}

/// Reads a whole file, naming it on failure.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Could not read {}", path.display()))
}

/// Writes a whole file, naming it on failure.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Could not write {}", path.display()))
}

/// Shared tuning arguments for the differencers.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Seed (fingerprint window) length in bytes.
    #[arg(long, default_value_t = DEFAULT_SEED_LEN)]
    pub seed_len: usize,

    /// Floor for the auto-sized fingerprint tables.
    #[arg(long, default_value_t = DEFAULT_TABLE_SIZE)]
    pub table_size: usize,

    /// Hard cap on auto-sized fingerprint tables.
    #[arg(long, default_value_t = DEFAULT_MAX_TABLE)]
    pub max_table: usize,
}

impl From<&DiffArgs> for DiffOptions {
    fn from(args: &DiffArgs) -> Self {
        DiffOptions {
            seed_len: args.seed_len,
            table_size: args.table_size,
            max_table: args.max_table,
            ..DiffOptions::default()
        }
    }
}
