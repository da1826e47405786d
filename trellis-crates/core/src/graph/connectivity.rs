use super::StaticGraph;

/// The connected components of a graph, together with the nodes and edges which separate its
/// mandatory nodes.
///
/// Articulation points and bridges are only reported when they separate two mandatory nodes: a
/// node `p` is an articulation point if removing it disconnects a mandatory node from another
/// mandatory node, and an edge is a bridge under the same condition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connectivity {
    /// The nodes of every component, in the order in which they were discovered.
    pub components: Vec<Vec<usize>>,
    /// Indexed by node; `None` for inactive nodes.
    pub component_of: Vec<Option<usize>>,
    pub articulation_points: Vec<usize>,
    /// Tree edges `(parent, child)` of the depth-first search.
    pub bridges: Vec<(usize, usize)>,
}

impl Connectivity {
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn is_articulation_point(&self, node: usize) -> bool {
        self.articulation_points.contains(&node)
    }
}

/// Computes the components, articulation points and bridges of `graph` in a single depth-first
/// search, ignoring the direction of its arcs.
///
/// Every node is numbered in discovery order. In post-order, each node `v` gets the size `ND(v)`
/// of its subtree and the lowest (`L`) and highest (`H`) number reachable from the subtree through
/// a single edge other than the one to the parent of `v`.
pub fn find_connectivity(graph: &StaticGraph, is_mandatory: impl Fn(usize) -> bool) -> Connectivity {
    let num_nodes = graph.num_nodes();
    let neighbours = graph.undirected_neighbours();

    let mut number = vec![usize::MAX; num_nodes];
    let mut parent = vec![usize::MAX; num_nodes];
    let mut num_descendants = vec![1_usize; num_nodes];
    let mut low = vec![0_usize; num_nodes];
    let mut high = vec![0_usize; num_nodes];
    let mut mandatory_in_subtree = vec![0_usize; num_nodes];

    let mut result = Connectivity {
        component_of: vec![None; num_nodes],
        ..Default::default()
    };

    let mut next_number = 0;
    let mut stack: Vec<(usize, usize)> = vec![];

    for start in graph.active_nodes() {
        if number[start] != usize::MAX {
            continue;
        }

        let component_index = result.components.len();
        let mut component = vec![];

        number[start] = next_number;
        next_number += 1;
        component.push(start);
        result.component_of[start] = Some(component_index);
        stack.push((start, 0));

        while let Some((node, next_neighbour)) = stack.last_mut() {
            let node = *node;
            if let Some(&neighbour) = neighbours[node].get(*next_neighbour) {
                *next_neighbour += 1;
                if number[neighbour] == usize::MAX {
                    number[neighbour] = next_number;
                    next_number += 1;
                    parent[neighbour] = node;
                    component.push(neighbour);
                    result.component_of[neighbour] = Some(component_index);
                    stack.push((neighbour, 0));
                }
                continue;
            }

            let _ = stack.pop();

            // Post-order: every child of the node has been completed.
            low[node] = number[node];
            high[node] = number[node];
            mandatory_in_subtree[node] = usize::from(is_mandatory(node));
            for &neighbour in &neighbours[node] {
                if parent[neighbour] == node {
                    num_descendants[node] += num_descendants[neighbour];
                    mandatory_in_subtree[node] += mandatory_in_subtree[neighbour];
                    low[node] = low[node].min(low[neighbour]);
                    high[node] = high[node].max(high[neighbour]);
                } else if neighbour != parent[node] {
                    low[node] = low[node].min(number[neighbour]);
                    high[node] = high[node].max(number[neighbour]);
                }
            }
        }

        let mandatory_in_component = mandatory_in_subtree[start];
        for &node in &component {
            let mut is_articulation_point = false;
            for &child in &neighbours[node] {
                if parent[child] != node {
                    continue;
                }

                let mandatory_below = mandatory_in_subtree[child];
                if mandatory_below == 0 {
                    continue;
                }
                let mandatory_elsewhere = mandatory_in_component - mandatory_below;

                if low[child] >= number[node]
                    && mandatory_elsewhere > usize::from(is_mandatory(node))
                {
                    is_articulation_point = true;
                }

                if low[child] >= number[child]
                    && high[child] < number[child] + num_descendants[child]
                    && mandatory_elsewhere > 0
                {
                    result.bridges.push((node, child));
                }
            }
            if is_articulation_point {
                result.articulation_points.push(node);
            }
        }

        result.components.push(component);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undirected(num_nodes: usize, edges: &[(usize, usize)]) -> StaticGraph {
        let mut graph = StaticGraph::new(num_nodes);
        for &(from, to) in edges {
            graph.add_arc(from, to);
            graph.add_arc(to, from);
        }
        graph
    }

    #[test]
    fn every_inner_node_of_a_path_separates_it() {
        let graph = undirected(4, &[(0, 1), (1, 2), (2, 3)]);

        let connectivity = find_connectivity(&graph, |_| true);

        assert_eq!(1, connectivity.num_components());
        assert_eq!(vec![1, 2], connectivity.articulation_points);
        assert_eq!(vec![(0, 1), (1, 2), (2, 3)], connectivity.bridges);
    }

    #[test]
    fn a_cycle_has_neither_articulation_points_nor_bridges() {
        let graph = undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);

        let connectivity = find_connectivity(&graph, |_| true);

        assert!(connectivity.articulation_points.is_empty());
        assert!(connectivity.bridges.is_empty());
    }

    #[test]
    fn only_separators_of_mandatory_nodes_are_reported() {
        // 0 - 1 - 2 - 3 where only 0 and 1 are mandatory.
        let graph = undirected(4, &[(0, 1), (1, 2), (2, 3)]);

        let connectivity = find_connectivity(&graph, |node| node <= 1);

        assert!(connectivity.articulation_points.is_empty());
        assert_eq!(vec![(0, 1)], connectivity.bridges);
    }

    #[test]
    fn the_direction_of_arcs_is_ignored() {
        let mut graph = StaticGraph::new(3);
        graph.add_arc(0, 1);
        graph.add_arc(2, 1);

        let connectivity = find_connectivity(&graph, |_| true);

        assert_eq!(1, connectivity.num_components());
        assert_eq!(vec![1], connectivity.articulation_points);
    }

    #[test]
    fn inactive_nodes_belong_to_no_component() {
        let mut graph = undirected(4, &[(0, 1), (2, 3)]);
        graph.set_active(3, false);

        let connectivity = find_connectivity(&graph, |_| false);

        assert_eq!(vec![vec![0, 1], vec![2]], connectivity.components);
        assert_eq!(None, connectivity.component_of[3]);
    }
}
