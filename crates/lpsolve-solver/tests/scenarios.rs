use lpsolve_solver::{
    ConstraintOp, KnapsackItem, KnapsackProblem, LinearProgram, Method, NodeOrder, SearchStatus, SignRestriction,
    SolveError, Solver, SolverOptions,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn wyndor() -> LinearProgram {
    LinearProgram::maximize(vec![3.0, 5.0])
        .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
        .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
        .subject_to(vec![3.0, 2.0], ConstraintOp::Le, 18.0)
}

/// Feasible, bounded programs covering every relation and both senses.
fn bounded_programs() -> Vec<LinearProgram> {
    vec![
        wyndor(),
        LinearProgram::minimize(vec![2.0, 3.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0),
        LinearProgram::minimize(vec![1.0, 2.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Eq, 3.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 2.0),
        LinearProgram::maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, -1.0], ConstraintOp::Eq, 1.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0),
    ]
}

#[test]
fn test_wyndor_glass_optimum() {
    init_logging();
    let solver = Solver::new();

    for method in [Method::Primal, Method::Dual, Method::Revised] {
        let report = solver.solve(&wyndor(), method).unwrap();
        let solution = report.solution().unwrap();
        assert_close(solution.objective_value, 36.0);
        assert_close(solution.values[0], 2.0);
        assert_close(solution.values[1], 6.0);
    }
}

#[test]
fn test_classic_knapsack() {
    init_logging();
    let problem = KnapsackProblem::new(
        vec![
            KnapsackItem::new(1, 60.0, 10.0),
            KnapsackItem::new(2, 100.0, 20.0),
            KnapsackItem::new(3, 120.0, 30.0),
        ],
        50.0,
    )
    .unwrap();

    let outcome = Solver::new().knapsack(&problem).unwrap();
    assert_eq!(outcome.status, SearchStatus::Optimal);
    assert_close(outcome.best_value, 220.0);
    assert_eq!(outcome.selection.get(&1), Some(&0));
    assert_eq!(outcome.selection.get(&2), Some(&1));
    assert_eq!(outcome.selection.get(&3), Some(&1));
}

#[test]
fn test_dual_start_without_entering_column_is_infeasible() {
    init_logging();
    let program = LinearProgram::minimize(vec![1.0, 1.0]).subject_to(vec![1.0, 1.0], ConstraintOp::Le, -2.0);

    assert_eq!(Solver::new().dual(&program), Err(SolveError::Infeasible));
}

#[test]
fn test_primal_and_dual_agree() {
    init_logging();
    let solver = Solver::new();
    for program in bounded_programs() {
        let primal = solver.primal(&program).unwrap();
        let dual = solver.dual(&program).unwrap();
        assert_close(primal.solution.objective_value, dual.solution.objective_value);
    }
}

#[test]
fn test_revised_agrees_with_tableau_engines() {
    let solver = Solver::new();
    for program in bounded_programs() {
        let primal = solver.primal(&program).unwrap();
        let revised = solver.revised(&program).unwrap();
        assert_close(revised.solution.objective_value, primal.solution.objective_value);
    }
}

#[test]
fn test_negated_minimization_mirrors_maximization() {
    let solver = Solver::new();
    let max = wyndor();
    let min = LinearProgram {
        sense: lpsolve_solver::Sense::Minimize,
        objective: max.objective.iter().map(|c| -c).collect(),
        ..max.clone()
    };

    for method in [Method::Primal, Method::Dual] {
        let a = solver.solve(&max, method).unwrap();
        let b = solver.solve(&min, method).unwrap();
        let (a, b) = (a.solution().unwrap(), b.solution().unwrap());
        assert_close(a.objective_value, -b.objective_value);
        assert_eq!(a.values, b.values);
    }
}

#[test]
fn test_strong_duality_holds_at_optimum() {
    let solver = Solver::new();
    for program in bounded_programs() {
        for method in [Method::Primal, Method::Dual] {
            let report = solver.solve(&program, method).unwrap();
            let tableau = report.final_tableau().unwrap();
            let sensitivity = solver.sensitivity(&program, tableau).unwrap();
            assert!(
                sensitivity.strong_duality_holds(1e-6),
                "gap {} for {method}",
                sensitivity.duality_gap
            );
            assert_close(
                sensitivity.objective_value,
                report.solution().unwrap().objective_value,
            );
        }
    }
}

#[test]
fn test_branch_and_bound_candidates_are_feasible_integers() {
    init_logging();
    let program = LinearProgram::maximize(vec![5.0, 8.0])
        .subject_to(vec![1.0, 1.0], ConstraintOp::Le, 6.0)
        .subject_to(vec![5.0, 9.0], ConstraintOp::Le, 45.0)
        .with_restrictions(vec![SignRestriction::Integer, SignRestriction::Integer]);

    for order in [NodeOrder::DepthFirst, NodeOrder::BestFirst] {
        let solver = Solver::new().with_options(SolverOptions::new().with_node_order(order));
        let outcome = solver.branch_and_bound(&program).unwrap();
        assert_eq!(outcome.status, SearchStatus::Optimal);
        assert_close(outcome.solution.as_ref().unwrap().objective_value, 40.0);

        let mut seen = 0;
        for node in outcome.candidates() {
            seen += 1;
            assert!(program.violations(&node.values, 1e-6).is_empty());
            assert!(
                node.values
                    .iter()
                    .all(|&v| solver.options().is_integral(v))
            );
        }
        assert!(seen > 0);
    }
}

#[test]
fn test_cutting_plane_ends_on_integral_tableau() {
    init_logging();
    let programs = [
        LinearProgram::maximize(vec![8.0, 5.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Le, 6.0)
            .subject_to(vec![9.0, 5.0], ConstraintOp::Le, 45.0)
            .with_restrictions(vec![SignRestriction::Integer, SignRestriction::Integer]),
        wyndor(),
    ];

    for program in programs {
        let outcome = Solver::new().cutting_plane(&program).unwrap();
        assert!(outcome.tableau.has_integral_rhs(1e-6));
        assert!(program.violations(&outcome.solution.values, 1e-6).is_empty());
    }
}

#[test]
fn test_identical_columns_give_consistent_solutions() {
    let programs = [
        LinearProgram::maximize(vec![1.0, 1.0]).subject_to(vec![1.0, 1.0], ConstraintOp::Le, 4.0),
        LinearProgram::maximize(vec![3.0, 3.0, 1.0]).subject_to(vec![2.0, 2.0, 1.0], ConstraintOp::Le, 3.0),
    ];
    let solver = Solver::new();

    for program in programs {
        for method in [Method::Primal, Method::Dual, Method::CuttingPlane, Method::BranchAndBound] {
            let report = solver.solve(&program, method).unwrap();
            let solution = report.solution().unwrap();
            assert!(
                program.violations(&solution.values, 1e-6).is_empty(),
                "{method}: {:?} breaks a constraint",
                solution.values
            );
            assert_close(program.objective_value(&solution.values), solution.objective_value);
        }
    }
}
