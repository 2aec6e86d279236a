/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure graph helpers: topological order and reachability over edge lists.
//!
//! These are free functions rather than methods so they can be used and
//! tested independently of the `TaskBody` wrapper.  They operate on the raw
//! [`TaskEdge`] list and treat node ids as opaque strings — ids that appear
//! only in edges are handled gracefully by building the vertex set from both
//! endpoints.

use std::collections::{HashMap, HashSet, VecDeque};

use super::TaskEdge;

/// Kahn topological sort over `nodes` and `edges`.
///
/// Returns the node ids in a valid topological order, or `None` when the
/// edge relation contains a cycle.  Ties (nodes that become ready together)
/// resolve in the order the nodes were supplied, so the result is
/// deterministic for a given input.
pub fn topological_order(nodes: &[&str], edges: &[TaskEdge]) -> Option<Vec<String>> {
    let mut indegree: HashMap<&str, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for e in edges {
        // Edges over unknown nodes still participate; the validator reports
        // them separately as dangling endpoints.
        indegree.entry(e.source.as_str()).or_insert(0);
        *indegree.entry(e.target.as_str()).or_insert(0) += 1;
        successors
            .entry(e.source.as_str())
            .or_default()
            .push(e.target.as_str());
    }

    // Seed the ready queue in supplied-node order for determinism.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ready: VecDeque<&str> = VecDeque::new();
    for &n in nodes {
        if seen.insert(n) && indegree[n] == 0 {
            ready.push_back(n);
        }
    }
    for e in edges {
        for n in [e.source.as_str(), e.target.as_str()] {
            if seen.insert(n) && indegree[n] == 0 {
                ready.push_back(n);
            }
        }
    }

    let total = indegree.len();
    let mut order = Vec::with_capacity(total);
    while let Some(n) = ready.pop_front() {
        order.push(n.to_string());
        if let Some(succs) = successors.get(n) {
            for &s in succs {
                // Every successor was registered in `indegree` above
                if let Some(d) = indegree.get_mut(s) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push_back(s);
                    }
                }
            }
        }
    }

    if order.len() == total {
        Some(order)
    } else {
        None // at least one cycle kept some node's indegree above zero
    }
}

/// Returns `true` if the edge relation contains a directed cycle.
pub fn has_cycle(nodes: &[&str], edges: &[TaskEdge]) -> bool {
    topological_order(nodes, edges).is_none()
}

/// Returns `true` if `to` is reachable from `from` over one or more edges.
///
/// `reachable(e, x, x)` is `false` unless `x` lies on a cycle — precedence
/// is irreflexive on a DAG.
pub fn reachable(edges: &[TaskEdge], from: &str, to: &str) -> bool {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for e in edges {
        successors
            .entry(e.source.as_str())
            .or_default()
            .push(e.target.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![from];
    while let Some(n) = stack.pop() {
        if let Some(succs) = successors.get(n) {
            for &s in succs {
                if s == to {
                    return true;
                }
                if visited.insert(s) {
                    stack.push(s);
                }
            }
        }
    }
    false
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> TaskEdge {
        TaskEdge {
            id: format!("{source}->{target}"),
            source: source.into(),
            target: target.into(),
        }
    }

    // ── topological_order ─────────────────────────────────────────────────────

    #[test]
    fn chain_orders_front_to_back() {
        let edges = vec![edge("a", "b"), edge("b", "c")];
        let order = topological_order(&["a", "b", "c"], &edges).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_has_valid_order() {
        let edges = vec![
            edge("a", "b"),
            edge("a", "c"),
            edge("b", "d"),
            edge("c", "d"),
        ];
        let order = topological_order(&["a", "b", "c", "d"], &edges).unwrap();
        assert_eq!(order.first().unwrap(), "a");
        assert_eq!(order.last().unwrap(), "d");
    }

    #[test]
    fn no_edges_preserves_node_order() {
        let order = topological_order(&["z", "a", "m"], &[]).unwrap();
        assert_eq!(order, vec!["z", "a", "m"]);
    }

    #[test]
    fn empty_graph_is_empty_order() {
        assert_eq!(topological_order(&[], &[]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn two_node_cycle_is_detected() {
        let edges = vec![edge("a", "b"), edge("b", "a")];
        assert!(topological_order(&["a", "b"], &edges).is_none());
        assert!(has_cycle(&["a", "b"], &edges));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let edges = vec![edge("a", "a")];
        assert!(has_cycle(&["a"], &edges));
    }

    #[test]
    fn cycle_in_one_component_fails_whole_graph() {
        let edges = vec![edge("a", "b"), edge("c", "d"), edge("d", "c")];
        assert!(has_cycle(&["a", "b", "c", "d"], &edges));
    }

    #[test]
    fn nodes_known_only_from_edges_are_included() {
        // "b" is not in the node list but appears as an endpoint
        let edges = vec![edge("a", "b")];
        let order = topological_order(&["a"], &edges).unwrap();
        assert_eq!(order, vec!["a", "b"]);
    }

    // ── reachable ─────────────────────────────────────────────────────────────

    #[test]
    fn reachable_follows_transitive_edges() {
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "d")];
        assert!(reachable(&edges, "a", "d"));
        assert!(reachable(&edges, "b", "d"));
        assert!(!reachable(&edges, "d", "a"));
    }

    #[test]
    fn reachable_is_irreflexive_on_a_dag() {
        let edges = vec![edge("a", "b")];
        assert!(!reachable(&edges, "a", "a"));
    }

    #[test]
    fn reachable_unknown_ids_is_false() {
        let edges = vec![edge("a", "b")];
        assert!(!reachable(&edges, "x", "y"));
        assert!(!reachable(&edges, "a", "y"));
    }
}
