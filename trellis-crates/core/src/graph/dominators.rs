use super::StaticGraph;
use crate::options::DominatorAlgorithm;

/// The dominator tree of a flow graph.
///
/// A node `y` dominates `x` if every path from the root to `x` passes through `y`. The tree is
/// numbered in pre- and post-order, so dominance queries take constant time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DominatorTree {
    root: usize,
    immediate_dominators: Vec<Option<usize>>,
    pre_order: Vec<usize>,
    post_order: Vec<usize>,
}

impl DominatorTree {
    pub fn root(&self) -> usize {
        self.root
    }

    /// The closest strict dominator of `node`; `None` for the root.
    pub fn immediate_dominator(&self, node: usize) -> Option<usize> {
        self.immediate_dominators[node]
    }

    /// Whether `dominator` strictly dominates `node`.
    pub fn is_dominated_by(&self, node: usize, dominator: usize) -> bool {
        node != dominator
            && self.pre_order[dominator] != usize::MAX
            && self.pre_order[node] != usize::MAX
            && self.pre_order[dominator] < self.pre_order[node]
            && self.post_order[node] < self.post_order[dominator]
    }
}

/// Computes the dominator tree of `graph` from `root` with the algorithm of Lengauer and Tarjan.
///
/// Returns `None` if some active node cannot be reached from the root.
pub fn find_dominators(
    graph: &StaticGraph,
    root: usize,
    algorithm: DominatorAlgorithm,
) -> Option<DominatorTree> {
    let mut finder = DominatorFinder::new(graph.num_nodes());
    finder.number_from(graph, root);

    if graph
        .active_nodes()
        .any(|node| finder.number[node] == 0)
    {
        return None;
    }

    finder.compute_semi_dominators(graph, algorithm);
    Some(finder.into_tree(root))
}

/// The working memory of the algorithm. Apart from `number`, every array is indexed by the
/// depth-first number of a node; number 0 is the sentinel and the root has number 1.
struct DominatorFinder {
    /// The number of each node, 0 if it was not reached.
    number: Vec<usize>,
    vertex: Vec<usize>,
    parent: Vec<usize>,
    semi: Vec<usize>,
    label: Vec<usize>,
    ancestor: Vec<usize>,
    idom: Vec<usize>,
    bucket: Vec<Vec<usize>>,
    size: Vec<usize>,
    child: Vec<usize>,
    num_reached: usize,
}

impl DominatorFinder {
    fn new(num_nodes: usize) -> Self {
        let capacity = num_nodes + 1;
        DominatorFinder {
            number: vec![0; num_nodes],
            vertex: vec![0; capacity],
            parent: vec![0; capacity],
            semi: (0..capacity).collect(),
            label: (0..capacity).collect(),
            ancestor: vec![0; capacity],
            idom: vec![0; capacity],
            bucket: vec![vec![]; capacity],
            size: std::iter::once(0).chain(std::iter::repeat(1)).take(capacity).collect(),
            child: vec![0; capacity],
            num_reached: 0,
        }
    }

    fn number_from(&mut self, graph: &StaticGraph, root: usize) {
        if !graph.is_active(root) {
            return;
        }

        self.visit(root, 0);
        let mut stack = vec![(root, 0)];
        while let Some((node, next_successor)) = stack.last_mut() {
            let node = *node;
            let Some(&successor) = graph.successors(node).get(*next_successor) else {
                let _ = stack.pop();
                continue;
            };
            *next_successor += 1;

            if graph.is_active(successor) && self.number[successor] == 0 {
                self.visit(successor, self.number[node]);
                stack.push((successor, 0));
            }
        }
    }

    fn visit(&mut self, node: usize, parent_number: usize) {
        self.num_reached += 1;
        let number = self.num_reached;
        self.number[node] = number;
        self.vertex[number] = node;
        self.parent[number] = parent_number;
    }

    fn compute_semi_dominators(&mut self, graph: &StaticGraph, algorithm: DominatorAlgorithm) {
        for w in (2..=self.num_reached).rev() {
            for &predecessor in graph.predecessors(self.vertex[w]) {
                let v = self.number[predecessor];
                if v == 0 || !graph.is_active(predecessor) {
                    continue;
                }
                let u = self.eval(v, algorithm);
                if self.semi[u] < self.semi[w] {
                    self.semi[w] = self.semi[u];
                }
            }

            self.bucket[self.semi[w]].push(w);
            let parent = self.parent[w];
            self.link(parent, w, algorithm);

            for v in std::mem::take(&mut self.bucket[parent]) {
                let u = self.eval(v, algorithm);
                self.idom[v] = if self.semi[u] < self.semi[v] { u } else { parent };
            }
        }

        for w in 2..=self.num_reached {
            if self.idom[w] != self.semi[w] {
                self.idom[w] = self.idom[self.idom[w]];
            }
        }
        self.idom[1] = 0;
    }

    fn eval(&mut self, v: usize, algorithm: DominatorAlgorithm) -> usize {
        if self.ancestor[v] == 0 {
            return match algorithm {
                DominatorAlgorithm::Simple => v,
                DominatorAlgorithm::Balanced => self.label[v],
            };
        }

        self.compress(v);
        match algorithm {
            DominatorAlgorithm::Simple => self.label[v],
            DominatorAlgorithm::Balanced => {
                let ancestor_label = self.label[self.ancestor[v]];
                if self.semi[ancestor_label] >= self.semi[self.label[v]] {
                    self.label[v]
                } else {
                    ancestor_label
                }
            }
        }
    }

    /// Path compression, from the node closest to the root of the forest down to `v`.
    fn compress(&mut self, v: usize) {
        let mut path = vec![];
        let mut node = v;
        while self.ancestor[self.ancestor[node]] != 0 {
            path.push(node);
            node = self.ancestor[node];
        }

        for &node in path.iter().rev() {
            let ancestor = self.ancestor[node];
            if self.semi[self.label[ancestor]] < self.semi[self.label[node]] {
                self.label[node] = self.label[ancestor];
            }
            self.ancestor[node] = self.ancestor[ancestor];
        }
    }

    fn link(&mut self, v: usize, w: usize, algorithm: DominatorAlgorithm) {
        if algorithm == DominatorAlgorithm::Simple {
            self.ancestor[w] = v;
            return;
        }

        let mut s = w;
        while self.semi[self.label[w]] < self.semi[self.label[self.child[s]]] {
            let child = self.child[s];
            if self.size[s] + self.size[self.child[child]] >= 2 * self.size[child] {
                self.ancestor[child] = s;
                self.child[s] = self.child[child];
            } else {
                self.size[child] = self.size[s];
                self.ancestor[s] = child;
                s = child;
            }
        }

        self.label[s] = self.label[w];
        self.size[v] += self.size[w];
        if self.size[v] < 2 * self.size[w] {
            std::mem::swap(&mut s, &mut self.child[v]);
        }
        while s != 0 {
            self.ancestor[s] = v;
            s = self.child[s];
        }
    }

    fn into_tree(self, root: usize) -> DominatorTree {
        let num_nodes = self.number.len();
        let mut immediate_dominators = vec![None; num_nodes];
        let mut children = vec![vec![]; num_nodes];
        for w in 2..=self.num_reached {
            let node = self.vertex[w];
            let dominator = self.vertex[self.idom[w]];
            immediate_dominators[node] = Some(dominator);
            children[dominator].push(node);
        }

        let mut pre_order = vec![usize::MAX; num_nodes];
        let mut post_order = vec![usize::MAX; num_nodes];
        let mut next_pre = 0;
        let mut next_post = 0;
        let mut stack = vec![(root, 0)];
        pre_order[root] = next_pre;
        next_pre += 1;
        while let Some((node, next_child)) = stack.last_mut() {
            let node = *node;
            if let Some(&child) = children[node].get(*next_child) {
                *next_child += 1;
                pre_order[child] = next_pre;
                next_pre += 1;
                stack.push((child, 0));
            } else {
                post_order[node] = next_post;
                next_post += 1;
                let _ = stack.pop();
            }
        }

        DominatorTree {
            root,
            immediate_dominators,
            pre_order,
            post_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::Rng;
    use rand::SeedableRng;

    use super::*;

    const ALGORITHMS: [DominatorAlgorithm; 2] = [DominatorAlgorithm::Simple, DominatorAlgorithm::Balanced];

    fn graph(num_nodes: usize, arcs: &[(usize, usize)]) -> StaticGraph {
        let mut graph = StaticGraph::new(num_nodes);
        for &(from, to) in arcs {
            graph.add_arc(from, to);
        }
        graph
    }

    #[test]
    fn every_node_on_a_path_dominates_the_rest_of_it() {
        // root -> a -> b -> sink
        let graph = graph(4, &[(0, 1), (1, 2), (2, 3)]);

        for algorithm in ALGORITHMS {
            let tree = find_dominators(&graph, 0, algorithm).expect("all nodes are reachable");

            assert!(tree.is_dominated_by(2, 1));
            assert!(tree.is_dominated_by(1, 0));
            assert!(tree.is_dominated_by(3, 0));
            assert!(!tree.is_dominated_by(1, 2));
            assert!(!tree.is_dominated_by(1, 1));
            assert_eq!(Some(2), tree.immediate_dominator(3));
            assert_eq!(None, tree.immediate_dominator(0));
        }
    }

    #[test]
    fn a_shortcut_bypasses_the_inner_node() {
        let graph = graph(4, &[(0, 1), (1, 2), (2, 3), (0, 2)]);

        for algorithm in ALGORITHMS {
            let tree = find_dominators(&graph, 0, algorithm).expect("all nodes are reachable");

            assert!(!tree.is_dominated_by(2, 1));
            assert_eq!(Some(0), tree.immediate_dominator(2));
            assert!(tree.is_dominated_by(3, 2));
        }
    }

    #[test]
    fn an_unreachable_active_node_is_a_failure() {
        let mut graph = graph(3, &[(0, 1)]);
        assert!(find_dominators(&graph, 0, DominatorAlgorithm::Balanced).is_none());

        graph.set_active(2, false);
        assert!(find_dominators(&graph, 0, DominatorAlgorithm::Balanced).is_some());
    }

    /// Whether every path from `root` to `node` passes `dominator`, by removing `dominator` and
    /// searching for `node`.
    fn dominates_by_search(graph: &StaticGraph, root: usize, node: usize, dominator: usize) -> bool {
        if node == dominator || dominator == root {
            return node != dominator;
        }
        let mut visited = vec![false; graph.num_nodes()];
        visited[dominator] = true;
        let mut stack = vec![root];
        visited[root] = true;
        while let Some(current) = stack.pop() {
            for &successor in graph.successors(current) {
                if !visited[successor] {
                    visited[successor] = true;
                    stack.push(successor);
                }
            }
        }
        !visited[node]
    }

    #[test]
    fn both_variants_agree_with_exhaustive_search() {
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            let num_nodes = rng.gen_range(2..12);
            let mut graph = StaticGraph::new(num_nodes);
            // A spanning chain keeps every node reachable.
            for node in 1..num_nodes {
                graph.add_arc(rng.gen_range(0..node), node);
            }
            for _ in 0..rng.gen_range(0..2 * num_nodes) {
                graph.add_arc(rng.gen_range(0..num_nodes), rng.gen_range(0..num_nodes));
            }

            for algorithm in ALGORITHMS {
                let tree = find_dominators(&graph, 0, algorithm).expect("all nodes are reachable");
                for node in 0..num_nodes {
                    for dominator in 0..num_nodes {
                        assert_eq!(
                            dominates_by_search(&graph, 0, node, dominator),
                            tree.is_dominated_by(node, dominator),
                            "{node} dominated by {dominator} ({algorithm:?})"
                        );
                    }
                }
            }
        }
    }
}
