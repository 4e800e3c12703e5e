/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::VecDeque;

use crate::cmds::Command;

/// An entry of the correction buffer: a command plus the version
/// interval it encodes. Entries are deleted logically via `dummy`, since
/// correction walks the newest entries while the FIFO evicts the oldest.
#[derive(Debug)]
pub(crate) struct LookbackEntry {
    pub(crate) v_start: usize,
    pub(crate) v_end: usize,
    pub(crate) cmd: Command,
    pub(crate) dummy: bool,
}

/// A bounded FIFO of the most recently emitted commands.
///
/// The buffer is what lets the correcting encoder revise its latest
/// decisions when a new match extends backward into already-encoded
/// bytes: commands become permanent only once they are evicted or
/// flushed.
#[derive(Debug)]
pub(crate) struct LookbackBuffer {
    entries: VecDeque<LookbackEntry>,
    capacity: usize,
}

impl LookbackBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity >= 1);
        LookbackBuffer {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, spilling the oldest into `out` when full.
    /// Dummy entries evaporate on eviction.
    pub(crate) fn push(&mut self, v_start: usize, v_end: usize, cmd: Command, out: &mut Vec<Command>) {
        if self.entries.len() == self.capacity {
            if let Some(oldest) = self.entries.pop_front() {
                if !oldest.dummy {
                    out.push(oldest.cmd);
                }
            }
        }
        self.entries.push_back(LookbackEntry {
            v_start,
            v_end,
            cmd,
            dummy: false,
        });
    }

    /// Walks the entries newest first, for tail correction.
    pub(crate) fn iter_mut_newest_first(
        &mut self,
    ) -> impl Iterator<Item = &mut LookbackEntry> + '_ {
        self.entries.iter_mut().rev()
    }

    /// Drains every live entry, in order, into `out`.
    pub(crate) fn flush(&mut self, out: &mut Vec<Command>) {
        for entry in self.entries.drain(..) {
            if !entry.dummy {
                out.push(entry.cmd);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn add(byte: u8) -> Command {
        Command::Add(vec![byte])
    }

    #[test]
    fn test_eviction_preserves_order() {
        let mut buffer = LookbackBuffer::new(2);
        let mut out = Vec::new();
        buffer.push(0, 1, add(b'a'), &mut out);
        buffer.push(1, 2, add(b'b'), &mut out);
        assert!(out.is_empty());
        buffer.push(2, 3, add(b'c'), &mut out);
        assert_eq!(out, vec![add(b'a')]);
        buffer.flush(&mut out);
        assert_eq!(out, vec![add(b'a'), add(b'b'), add(b'c')]);
    }

    #[test]
    fn test_dummies_evaporate() {
        let mut buffer = LookbackBuffer::new(2);
        let mut out = Vec::new();
        buffer.push(0, 1, add(b'a'), &mut out);
        buffer.push(1, 2, add(b'b'), &mut out);
        for entry in buffer.iter_mut_newest_first() {
            if entry.v_start == 0 {
                entry.dummy = true;
            }
        }
        // eviction of the dummy produces no output
        buffer.push(2, 3, add(b'c'), &mut out);
        assert!(out.is_empty());
        buffer.flush(&mut out);
        assert_eq!(out, vec![add(b'b'), add(b'c')]);
    }
}
