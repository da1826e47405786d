#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024
use trellis_core::branching::branchers::InputOrderBrancher;
use trellis_core::engine::variables::DomainId;
use trellis_core::engine::GraphKind;
use trellis_core::propagators::ArborescenceArgs;
use trellis_core::propagators::CircuitConf;
use trellis_core::propagators::CircuitDominatorArgs;
use trellis_core::propagators::TableArgs;
use trellis_core::propagators::TimesArgs;
use trellis_core::propagators::TreeOrientation;
use trellis_core::search::DepthFirstSearch;
use trellis_core::search::SearchOutcome;
use trellis_core::search::Solution;
use trellis_core::termination::DecisionBudget;
use trellis_core::termination::Indefinite;
use trellis_core::State;

fn solve(state: &mut State) -> SearchOutcome {
    let _ = env_logger::builder().is_test(true).try_init();

    let brancher = InputOrderBrancher::for_all(state.assignments());
    let mut search = DepthFirstSearch::new(brancher, Indefinite);
    let outcome = search.solve(state).expect("no fatal error");
    search.log_statistics(state);
    outcome
}

fn expect_solution(outcome: SearchOutcome) -> Solution {
    match outcome {
        SearchOutcome::Satisfiable(solution) => solution,
        other => panic!("expected a solution, got {other:?}"),
    }
}

fn times(state: &mut State, a: DomainId, b: DomainId, c: DomainId) {
    let _ = state
        .add_propagator(TimesArgs {
            a: a.into(),
            b: b.into(),
            c: c.into(),
        })
        .expect("no fatal error");
}

#[test]
fn product_and_table_agree_on_a_single_solution() {
    let mut state = State::default();
    let x = state.new_interval_variable(1, 4);
    let y = state.new_interval_variable(1, 4);
    let z = state.new_interval_variable(6, 6);
    times(&mut state, x, y, z);
    let _ = state
        .add_propagator(TableArgs {
            variables: vec![x.into(), y.into()].into_boxed_slice(),
            tuples: [[1, 1], [2, 3], [4, 4]]
                .into_iter()
                .map(|tuple: [i32; 2]| Box::from(tuple))
                .collect(),
        })
        .expect("no fatal error");

    let solution = expect_solution(solve(&mut state));

    assert_eq!(2, solution.value(x));
    assert_eq!(3, solution.value(y));
    assert_eq!(6, solution.value(z));
}

#[test]
fn a_prime_product_of_larger_factors_is_unsatisfiable() {
    let mut state = State::default();
    let x = state.new_interval_variable(2, 5);
    let y = state.new_interval_variable(2, 5);
    let z = state.new_interval_variable(7, 7);
    times(&mut state, x, y, z);

    assert!(matches!(solve(&mut state), SearchOutcome::Unsatisfiable));
}

#[test]
fn the_search_leaves_the_state_at_its_root() {
    let mut state = State::default();
    let x = state.new_interval_variable(-4, 4);
    let y = state.new_interval_variable(-4, 4);
    let z = state.new_interval_variable(5, 9);
    times(&mut state, x, y, z);

    let solution = expect_solution(solve(&mut state));

    assert_eq!(solution.value(z), solution.value(x) * solution.value(y));
    assert_eq!(0, state.world_index());
    assert!(!state.assignments().is_fixed(x));
    assert!(state.statistics().num_decisions > 0);
}

#[test]
fn an_exhausted_budget_gives_an_unknown_outcome() {
    let mut state = State::default();
    let x = state.new_interval_variable(0, 10);
    let y = state.new_interval_variable(0, 10);
    let _ = state.new_interval_variable(0, 10);

    let brancher = InputOrderBrancher::new([x, y], []);
    let mut search = DepthFirstSearch::new(brancher, DecisionBudget::new(1));
    let outcome = search.solve(&mut state).expect("no fatal error");

    assert!(matches!(outcome, SearchOutcome::Unknown));
    assert_eq!(0, state.world_index());
}

#[test]
fn the_arborescence_found_by_search_is_a_tree() {
    let mut state = State::default();
    let arcs = [(0, 1), (0, 2), (1, 2), (2, 3), (1, 3), (3, 1)];
    let graph = state.new_graph_variable(4, GraphKind::Directed, arcs);
    let _ = state
        .add_propagator(ArborescenceArgs {
            graph,
            root: 0,
            orientation: TreeOrientation::Arborescence,
        })
        .expect("no fatal error");

    let solution = expect_solution(solve(&mut state));

    assert_eq!(&[0, 1, 2, 3], solution.nodes(graph));
    assert_eq!(3, solution.arcs(graph).len());
    for node in 1..4 {
        let num_incoming = solution.arcs(graph).iter().filter(|&&(_, to)| to == node).count();
        assert_eq!(1, num_incoming, "node {node} has {num_incoming} parents");
    }

    // Walking up from every node ends in the root.
    for start in 1..4 {
        let mut node = start;
        for _ in 0..4 {
            if node == 0 {
                break;
            }
            node = solution
                .arcs(graph)
                .iter()
                .find(|&&(_, to)| to == node)
                .map(|&(from, _)| from)
                .expect("every node but the root has a parent");
        }
        assert_eq!(0, node);
    }
}

#[test]
fn every_circuit_configuration_finds_a_hamiltonian_circuit() {
    for conf in [CircuitConf::First, CircuitConf::Random, CircuitConf::All] {
        for orientation in [TreeOrientation::Arborescence, TreeOrientation::AntiArborescence] {
            let mut state = State::default();
            let successors = (0..5)
                .map(|_| state.new_interval_variable(1, 5))
                .collect::<Vec<_>>();
            let _ = state
                .add_propagator(CircuitDominatorArgs {
                    successors: successors.iter().map(|&successor| successor.into()).collect(),
                    offset: 1,
                    conf,
                    orientation,
                })
                .expect("no fatal error");

            let solution = expect_solution(solve(&mut state));

            let mut visited = vec![false; 5];
            let mut node = 0;
            for _ in 0..5 {
                assert!(!visited[node], "{conf:?} {orientation:?} revisits node {node}");
                visited[node] = true;
                node = (solution.value(successors[node]) - 1) as usize;
            }
            assert_eq!(0, node);
        }
    }
}
