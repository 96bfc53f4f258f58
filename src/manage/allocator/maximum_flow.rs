// Copyright (C) 2025 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Dinic maximum-flow solver used by the allocator.
//!
//! Nodes are plain indices; the allocator maps storage endpoints to indices
//! before building the graph. Every forward edge is stored next to its
//! residual edge in one arena, so the residual of edge `i` is `i ^ 1`.

use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
struct Edge {
    from: usize,
    to: usize,
    capacity: i32,
    flow: i32,
}

impl Edge {
    fn remaining_capacity(&self) -> i32 {
        self.capacity - self.flow
    }
}

/// Maximum-flow solver over a fixed node set with one virtual source and
/// one virtual sink.
pub(crate) struct MaximumFlowSolver {
    source: usize,
    sink: usize,
    edges: Vec<Edge>,
    graph: Vec<Vec<usize>>,
    level: Vec<i32>,
    solved: bool,
    maximum_flow: i32,
}

impl MaximumFlowSolver {
    /// Creates a solver for `nodes` nodes, flowing from `source` to `sink`.
    pub(crate) fn new(nodes: usize, source: usize, sink: usize) -> Self {
        Self {
            source,
            sink,
            edges: Vec::new(),
            graph: vec![Vec::new(); nodes],
            level: vec![-1; nodes],
            solved: false,
            maximum_flow: 0,
        }
    }

    /// Adds a forward edge with the given capacity and its residual edge.
    /// Edges without positive capacity cannot carry flow and are skipped.
    pub(crate) fn add_edge(&mut self, from: usize, to: usize, capacity: i32) {
        if capacity <= 0 {
            return;
        }
        let forward = self.edges.len();
        self.edges.push(Edge {
            from,
            to,
            capacity,
            flow: 0,
        });
        self.edges.push(Edge {
            from: to,
            to: from,
            capacity: 0,
            flow: 0,
        });
        self.graph[from].push(forward);
        self.graph[to].push(forward + 1);
    }

    /// Runs the solver and returns the flow on every forward edge, keyed by
    /// its (from, to) node indices.
    pub(crate) fn compute_maximum_flow(&mut self) -> HashMap<(usize, usize), i32> {
        self.run();
        let mut flow_map = HashMap::new();
        for edge in self.edges.iter().step_by(2) {
            flow_map.insert((edge.from, edge.to), edge.flow);
        }
        flow_map
    }

    /// Runs the solver and returns the total flow value.
    #[allow(dead_code)]
    pub(crate) fn get_maximum_flow(&mut self) -> i32 {
        self.run();
        self.maximum_flow
    }

    fn run(&mut self) {
        if self.solved {
            return;
        }
        while self.bfs() {
            let mut next = vec![0usize; self.graph.len()];
            loop {
                let flow = self.dfs(self.source, i32::MAX, &mut next);
                if flow == 0 {
                    break;
                }
                self.maximum_flow += flow;
            }
        }
        self.solved = true;
    }

    /// Builds the level graph; returns whether the sink is still reachable.
    fn bfs(&mut self) -> bool {
        self.level.iter_mut().for_each(|l| *l = -1);
        let mut queue = VecDeque::new();
        queue.push_back(self.source);
        self.level[self.source] = 0;
        while let Some(node) = queue.pop_front() {
            for i in 0..self.graph[node].len() {
                let edge = &self.edges[self.graph[node][i]];
                if edge.remaining_capacity() > 0 && self.level[edge.to] == -1 {
                    self.level[edge.to] = self.level[node] + 1;
                    queue.push_back(edge.to);
                }
            }
        }
        self.level[self.sink] != -1
    }

    /// Pushes one augmenting path along the level graph, advancing the
    /// per-node edge cursor past saturated edges.
    fn dfs(&mut self, node: usize, flow: i32, next: &mut Vec<usize>) -> i32 {
        if node == self.sink {
            return flow;
        }
        while next[node] < self.graph[node].len() {
            let edge_id = self.graph[node][next[node]];
            let (to, remaining) = {
                let edge = &self.edges[edge_id];
                (edge.to, edge.remaining_capacity())
            };
            if remaining > 0 && self.level[to] == self.level[node] + 1 {
                let bottleneck = self.dfs(to, flow.min(remaining), next);
                if bottleneck > 0 {
                    self.edges[edge_id].flow += bottleneck;
                    self.edges[edge_id ^ 1].flow -= bottleneck;
                    return bottleneck;
                }
            }
            next[node] += 1;
        }
        // blocking flow found
        0
    }
}
