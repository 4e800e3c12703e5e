/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Application of command streams to a reference, reconstructing the
//! version. Every offset is validated: a command reaching outside its
//! buffer means the delta is corrupt (or the planner has a bug), and
//! application aborts without a partial result.

use crate::cmds::{Command, PlacedCommand};
use crate::error::{DeltaError, Result};

/// Applies a logical command stream to `reference`, appending each
/// command's output in order.
pub fn apply_commands(reference: &[u8], cmds: &[Command]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(cmds.iter().map(Command::output_len).sum());
    for cmd in cmds {
        match cmd {
            Command::Copy { offset, length } => {
                out.extend_from_slice(read(reference, *offset, *length, "reference")?);
            }
            Command::Add(data) => out.extend_from_slice(data),
        }
    }
    Ok(out)
}

/// Applies a standard placed stream into a fresh buffer of
/// `version_size` bytes.
pub fn apply_placed(
    reference: &[u8],
    commands: &[PlacedCommand],
    version_size: usize,
) -> Result<Vec<u8>> {
    let mut buf = vec![0; version_size];
    for cmd in commands {
        match cmd {
            PlacedCommand::Copy { src, dst, len } => {
                let source = read(reference, *src, *len, "reference")?;
                write_range(&mut buf, *dst, *len)?.copy_from_slice(source);
            }
            PlacedCommand::Add { dst, data } => {
                write_range(&mut buf, *dst, data.len())?.copy_from_slice(data);
            }
        }
    }
    Ok(buf)
}

/// Applies an in-place stream by mutating a single buffer preloaded with
/// `reference` and grown to `max(|reference|, version_size)`; returns
/// the first `version_size` bytes.
///
/// Copies read from the buffer itself, so earlier commands can feed
/// later ones; overlap within one copy behaves as if the whole source
/// range were captured before any destination byte is written.
pub fn apply_placed_inplace(
    reference: &[u8],
    commands: &[PlacedCommand],
    version_size: usize,
) -> Result<Vec<u8>> {
    let mut buf = reference.to_vec();
    buf.resize(reference.len().max(version_size), 0);
    for cmd in commands {
        match cmd {
            PlacedCommand::Copy { src, dst, len } => {
                end_of(buf.len(), *src, *len, "buffer")?;
                end_of(buf.len(), *dst, *len, "buffer")?;
                buf.copy_within(*src..*src + *len, *dst);
            }
            PlacedCommand::Add { dst, data } => {
                write_range(&mut buf, *dst, data.len())?.copy_from_slice(data);
            }
        }
    }
    buf.truncate(version_size);
    Ok(buf)
}

fn end_of(len: usize, start: usize, count: usize, what: &str) -> Result<usize> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(end),
        _ => Err(DeltaError::InternalConsistency(format!(
            "range [{}, {} + {}) outside the {}-byte {}",
            start, start, count, len, what
        ))),
    }
}

fn read<'a>(data: &'a [u8], start: usize, count: usize, what: &str) -> Result<&'a [u8]> {
    let end = end_of(data.len(), start, count, what)?;
    Ok(&data[start..end])
}

fn write_range(buf: &mut [u8], start: usize, count: usize) -> Result<&mut [u8]> {
    let end = end_of(buf.len(), start, count, "output")?;
    Ok(&mut buf[start..end])
}
