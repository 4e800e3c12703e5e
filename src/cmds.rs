/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Delta commands, in logical and placed form.
//!
//! A logical [`Command`] carries no destination: applying a list of them
//! appends to the output in order. A [`PlacedCommand`] is annotated with
//! its absolute destination offset, which permits out-of-order execution;
//! in-place deltas depend on that. [`place`] and [`unplace`] convert
//! between the two forms and are inverse bijections on well-formed
//! streams.

/// A logical delta command; its destination is implicit from order.
///
/// Invariants: `offset + length` never exceeds the reference length,
/// `length > 0`, and add data is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append `length` bytes of the reference starting at `offset`.
    Copy { offset: usize, length: usize },
    /// Append the literal bytes.
    Add(Vec<u8>),
}

impl Command {
    /// The number of output bytes this command produces.
    pub fn output_len(&self) -> usize {
        match self {
            Command::Copy { length, .. } => *length,
            Command::Add(data) => data.len(),
        }
    }
}

/// A command annotated with its absolute destination offset.
///
/// In a well-formed placed stream for a version of size N the destination
/// intervals are pairwise disjoint and cover `[0, N)` exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacedCommand {
    /// Copy `len` bytes from `src` in the read space to `dst` in the
    /// output. For standard deltas the read space is the reference; for
    /// in-place deltas it is the shared buffer itself.
    Copy { src: usize, dst: usize, len: usize },
    /// Write the literal bytes at `dst`.
    Add { dst: usize, data: Vec<u8> },
}

impl PlacedCommand {
    /// The destination offset of this command.
    pub fn dst(&self) -> usize {
        match self {
            PlacedCommand::Copy { dst, .. } => *dst,
            PlacedCommand::Add { dst, .. } => *dst,
        }
    }

    /// The number of output bytes this command writes.
    pub fn output_len(&self) -> usize {
        match self {
            PlacedCommand::Copy { len, .. } => *len,
            PlacedCommand::Add { data, .. } => data.len(),
        }
    }
}

/// Assigns destinations sequentially from offset zero.
pub fn place(cmds: Vec<Command>) -> Vec<PlacedCommand> {
    let mut dst = 0;
    cmds.into_iter()
        .map(|cmd| {
            let placed = match cmd {
                Command::Copy { offset, length } => PlacedCommand::Copy {
                    src: offset,
                    dst,
                    len: length,
                },
                Command::Add(data) => PlacedCommand::Add { dst, data },
            };
            dst += placed.output_len();
            placed
        })
        .collect()
}

/// Sorts a placed stream by destination and strips the destinations,
/// recovering the logical order.
pub fn unplace(mut placed: Vec<PlacedCommand>) -> Vec<Command> {
    placed.sort_by_key(|cmd| cmd.dst());
    placed
        .into_iter()
        .map(|cmd| match cmd {
            PlacedCommand::Copy { src, len, .. } => Command::Copy {
                offset: src,
                length: len,
            },
            PlacedCommand::Add { data, .. } => Command::Add(data),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_place_assigns_sequential_destinations() {
        let placed = place(vec![
            Command::Copy {
                offset: 10,
                length: 5,
            },
            Command::Add(b"xyz".to_vec()),
            Command::Copy {
                offset: 0,
                length: 7,
            },
        ]);
        assert_eq!(
            placed,
            vec![
                PlacedCommand::Copy {
                    src: 10,
                    dst: 0,
                    len: 5
                },
                PlacedCommand::Add {
                    dst: 5,
                    data: b"xyz".to_vec()
                },
                PlacedCommand::Copy {
                    src: 0,
                    dst: 8,
                    len: 7
                },
            ]
        );
    }

    #[test]
    fn test_unplace_inverts_place() {
        let cmds = vec![
            Command::Add(b"head".to_vec()),
            Command::Copy {
                offset: 3,
                length: 9,
            },
            Command::Add(b"tail".to_vec()),
        ];
        let mut placed = place(cmds.clone());
        // unplace sorts by destination, so a shuffled stream also works
        placed.reverse();
        assert_eq!(unplace(placed), cmds);
    }
}
