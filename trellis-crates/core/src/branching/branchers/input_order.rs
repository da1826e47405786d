use crate::branching::Brancher;
use crate::branching::Branching;
use crate::engine::variables::DomainId;
use crate::engine::variables::GraphId;
use crate::engine::Assignments;
use crate::statistics::StatisticLogger;

/// Branches on the variables in the order they were given.
///
/// Integer variables are assigned their smallest value. Once they are all fixed, the undecided
/// nodes and then the undecided arcs of the graphs are enforced.
#[derive(Clone, Debug, Default)]
pub struct InputOrderBrancher {
    variables: Vec<DomainId>,
    graphs: Vec<GraphId>,
    num_decisions: u64,
}

impl InputOrderBrancher {
    pub fn new(variables: impl IntoIterator<Item = DomainId>, graphs: impl IntoIterator<Item = GraphId>) -> Self {
        InputOrderBrancher {
            variables: variables.into_iter().collect(),
            graphs: graphs.into_iter().collect(),
            num_decisions: 0,
        }
    }

    /// Branches on every variable of `assignments`.
    pub fn for_all(assignments: &Assignments) -> Self {
        InputOrderBrancher::new(assignments.domains(), assignments.graphs())
    }

    fn next_graph_decision(&self, assignments: &Assignments) -> Option<Branching> {
        for &graph in &self.graphs {
            let domain = assignments.graph(graph);

            if let Some(node) = domain
                .envelope_nodes()
                .find(|&node| !domain.kernel_contains_node(node))
            {
                return Some(Branching::Node { graph, node });
            }

            if let Some((from, to)) = domain
                .envelope_arcs()
                .find(|&(from, to)| !domain.kernel_contains_arc(from, to))
            {
                return Some(Branching::Arc { graph, from, to });
            }
        }

        None
    }
}

impl Brancher for InputOrderBrancher {
    fn next_decision(&mut self, assignments: &Assignments) -> Option<Branching> {
        let branching = self
            .variables
            .iter()
            .find(|&&variable| !assignments.is_fixed(variable))
            .map(|&variable| Branching::Assign {
                variable: variable.into(),
                value: assignments.lower_bound(variable),
            })
            .or_else(|| self.next_graph_decision(assignments))?;

        self.num_decisions += 1;
        Some(branching)
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        statistic_logger
            .attach_to_prefix("decisions")
            .log_statistic(self.num_decisions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Cause;
    use crate::engine::GraphKind;

    #[test]
    fn integers_come_before_graphs() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(3, 5, true);
        let graph = assignments.new_graph_domain(2, GraphKind::Directed, [(0, 1)]);
        let mut brancher = InputOrderBrancher::for_all(&assignments);

        assert_eq!(
            Some(Branching::Assign {
                variable: x.into(),
                value: 3
            }),
            brancher.next_decision(&assignments)
        );

        let _ = assignments
            .instantiate_to(x, 4, Cause::Decision)
            .expect("value is in the domain");
        assert_eq!(
            Some(Branching::Node { graph, node: 0 }),
            brancher.next_decision(&assignments)
        );

        let _ = assignments
            .enforce_node(graph, 0, Cause::Decision)
            .expect("node is in the envelope");
        let _ = assignments
            .enforce_node(graph, 1, Cause::Decision)
            .expect("node is in the envelope");
        assert_eq!(
            Some(Branching::Arc { graph, from: 0, to: 1 }),
            brancher.next_decision(&assignments)
        );

        let _ = assignments
            .remove_arc(graph, 0, 1, Cause::Decision)
            .expect("arc is optional");
        assert_eq!(None, brancher.next_decision(&assignments));
    }
}
