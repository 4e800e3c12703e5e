/*
 * SPDX-FileCopyrightText: 2024 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::graph::CrwiGraph;

/// Strongly connected components of a CRWI graph.
///
/// Stores the component index of every vertex; components are numbered
/// from 0 to [`num_components`](Sccs::num_components). Only non-trivial
/// components (size > 1) can hold cycles, so the planner ignores the
/// rest.
#[derive(Debug)]
pub(crate) struct Sccs {
    num_components: usize,
    components: Vec<usize>,
}

impl Sccs {
    /// Returns the number of strongly connected components.
    pub(crate) fn num_components(&self) -> usize {
        self.num_components
    }

    /// Returns the component of `node`.
    pub(crate) fn component(&self, node: usize) -> usize {
        self.components[node]
    }
}

/// Tarjan's algorithm, iterative: an explicit DFS stack holding
/// `(vertex, next arc position)` pairs, so arbitrarily deep graphs never
/// overflow the call stack.
pub(crate) fn tarjan(graph: &CrwiGraph) -> Sccs {
    const UNVISITED: usize = usize::MAX;
    let num_nodes = graph.num_nodes();
    let mut index = vec![UNVISITED; num_nodes];
    let mut low_link = vec![0; num_nodes];
    let mut on_stack = vec![false; num_nodes];
    let mut components = vec![UNVISITED; num_nodes];
    let mut component_stack = Vec::new();
    let mut dfs: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0;
    let mut num_components = 0;

    for root in 0..num_nodes {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next_index;
        low_link[root] = next_index;
        next_index += 1;
        component_stack.push(root);
        on_stack[root] = true;
        dfs.push((root, 0));

        while let Some((node, arc)) = dfs.last_mut() {
            let node = *node;
            if let Some(&succ) = graph.successors(node).get(*arc) {
                *arc += 1;
                if index[succ] == UNVISITED {
                    index[succ] = next_index;
                    low_link[succ] = next_index;
                    next_index += 1;
                    component_stack.push(succ);
                    on_stack[succ] = true;
                    dfs.push((succ, 0));
                } else if on_stack[succ] && index[succ] < low_link[node] {
                    low_link[node] = index[succ];
                }
            } else {
                dfs.pop();
                if let Some(&(parent, _)) = dfs.last() {
                    if low_link[node] < low_link[parent] {
                        low_link[parent] = low_link[node];
                    }
                }
                if low_link[node] == index[node] {
                    // node is the root of a component
                    while let Some(member) = component_stack.pop() {
                        on_stack[member] = false;
                        components[member] = num_components;
                        if member == node {
                            break;
                        }
                    }
                    num_components += 1;
                }
            }
        }
    }
    Sccs {
        num_components,
        components,
    }
}
