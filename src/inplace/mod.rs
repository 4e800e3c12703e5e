/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Conversion of standard deltas into in-place executable ones.
//!
//! An in-place delta is applied by mutating a single buffer that
//! initially holds the reference, so a copy may destroy bytes another
//! copy still has to read. The planner serializes the copies by
//! topologically sorting the Copy-Read / Write-Intersect digraph; when
//! the order is blocked by a cycle, one copy of the cycle is demoted to
//! a literal add whose bytes are captured from the reference at plan
//! time, which removes all of its arcs. Adds never read, so they are
//! all emitted after the copies.

mod cycle;
mod graph;
mod sccs;

use std::cmp::Reverse;

use dary_heap::QuaternaryHeap;
use log::debug;

use crate::cmds::{Command, PlacedCommand};
use crate::error::{DeltaError, Result};
use cycle::CycleFinder;
use graph::CrwiGraph;
use sccs::tarjan;

/// Victim-selection policy used when a CRWI cycle must be broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CyclePolicy {
    /// Demote the shortest copy on a cycle of the first non-trivial
    /// component that still has live vertices. Minimizes the bytes
    /// turned into literals.
    #[default]
    #[cfg_attr(feature = "cli", value(name = "localmin"))]
    LocalMin,
    /// Demote the first remaining copy, regardless of cycles.
    Constant,
}

/// A copy annotated with its destination, in logical stream order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CopyInfo {
    pub(crate) src: usize,
    pub(crate) dst: usize,
    pub(crate) len: usize,
}

/// Converts a logical command stream into a placed stream that can be
/// executed in a single buffer initially holding `reference`, growing it
/// to the version size if needed.
///
/// The schedule is deterministic: Kahn's algorithm picks the shortest
/// ready copy first (ties by copy index), and victims are chosen by the
/// stated policy with the same tie-break.
pub fn make_inplace(
    reference: &[u8],
    cmds: &[Command],
    policy: CyclePolicy,
) -> Result<Vec<PlacedCommand>> {
    // Step 1: annotate destinations.
    let mut copies = Vec::new();
    let mut adds: Vec<(usize, Vec<u8>)> = Vec::new();
    let mut dst = 0;
    for cmd in cmds {
        match cmd {
            Command::Copy { offset, length } => {
                if offset + length > reference.len() {
                    return Err(DeltaError::InternalConsistency(format!(
                        "copy of [{}, {}) outside the {}-byte reference",
                        offset,
                        offset + length,
                        reference.len()
                    )));
                }
                copies.push(CopyInfo {
                    src: *offset,
                    dst,
                    len: *length,
                });
                dst += length;
            }
            Command::Add(data) => {
                adds.push((dst, data.clone()));
                dst += data.len();
            }
        }
    }
    let num_copies = copies.len();

    // Step 2: build the CRWI graph.
    let graph = CrwiGraph::new(&copies);

    // Step 3: component structure for scoped cycle breaking.
    let sccs = tarjan(&graph);
    let mut component_size = vec![0; sccs.num_components()];
    for node in 0..num_copies {
        component_size[sccs.component(node)] += 1;
    }
    let mut members = vec![Vec::new(); sccs.num_components()];
    for node in 0..num_copies {
        if component_size[sccs.component(node)] > 1 {
            members[sccs.component(node)].push(node);
        }
    }

    // Kahn's algorithm over a min-heap keyed on (length, index).
    let mut in_degree = graph.in_degrees();
    let mut live = vec![true; num_copies];
    let mut queue = QuaternaryHeap::with_capacity(num_copies);
    for node in 0..num_copies {
        if in_degree[node] == 0 {
            queue.push(Reverse((copies[node].len, node)));
        }
    }
    let mut order = Vec::with_capacity(num_copies);
    let mut finder = CycleFinder::new(num_copies);
    // components known to have no cycle left among live vertices; they
    // stay that way, since vertices are only ever removed
    let mut dried_up = vec![false; sccs.num_components()];
    let mut first_live = 0;
    let mut candidate_scan = 0;
    let mut done = 0;
    let mut demoted = 0;
    let mut demoted_bytes = 0;

    while done < num_copies {
        if let Some(Reverse((_, node))) = queue.pop() {
            live[node] = false;
            done += 1;
            order.push(node);
            for &succ in graph.successors(node) {
                if live[succ] {
                    in_degree[succ] -= 1;
                    if in_degree[succ] == 0 {
                        queue.push(Reverse((copies[succ].len, succ)));
                    }
                }
            }
            continue;
        }
        // Kahn stalled: every remaining copy is blocked. Choose a
        // victim and demote it to a literal add.
        let victim = match policy {
            CyclePolicy::Constant => {
                while !live[first_live] {
                    first_live += 1;
                }
                first_live
            }
            CyclePolicy::LocalMin => loop {
                while candidate_scan < num_copies
                    && !(live[candidate_scan]
                        && component_size[sccs.component(candidate_scan)] > 1
                        && !dried_up[sccs.component(candidate_scan)])
                {
                    candidate_scan += 1;
                }
                if candidate_scan == num_copies {
                    // every component is dry, yet copies remain blocked
                    // by arcs between components: fall back to the first
                    // remaining copy
                    while !live[first_live] {
                        first_live += 1;
                    }
                    break first_live;
                }
                let component = sccs.component(candidate_scan);
                match finder.find(&graph, &sccs, &members[component], component, &live) {
                    Some(cycle) => {
                        break cycle
                            .into_iter()
                            .map(|node| (copies[node].len, node))
                            .min()
                            .map(|(_, node)| node)
                            .unwrap();
                    }
                    None => dried_up[component] = true,
                }
            },
        };
        live[victim] = false;
        done += 1;
        let info = copies[victim];
        adds.push((info.dst, reference[info.src..info.src + info.len].to_vec()));
        demoted += 1;
        demoted_bytes += info.len;
        finder.on_removed(victim);
        for &succ in graph.successors(victim) {
            if live[succ] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    queue.push(Reverse((copies[succ].len, succ)));
                }
            }
        }
    }
    debug!(
        "in-place plan: {} copies, {} adds, {} arcs, {} demoted ({} bytes)",
        order.len(),
        adds.len() - demoted,
        graph.num_arcs(),
        demoted,
        demoted_bytes
    );

    // Step 4: scheduled copies first, then every add. Adds write
    // without reading, so they cannot conflict with any copy's source.
    let mut placed = Vec::with_capacity(order.len() + adds.len());
    for node in order {
        let info = copies[node];
        placed.push(PlacedCommand::Copy {
            src: info.src,
            dst: info.dst,
            len: info.len,
        });
    }
    for (dst, data) in adds {
        placed.push(PlacedCommand::Add { dst, data });
    }
    Ok(placed)
}
