use log::{debug, info, warn};

use crate::canonical::CanonicalForm;
use crate::error::{SolveError, SolveResult};
use crate::linalg::{self, Matrix};
use crate::options::SolverOptions;
use crate::problem::LinearProgram;
use crate::solution::{IterationLog, Solution};
use crate::tableau::{ColumnKind, Convention, Tableau};

/// Snapshot of one revised simplex iteration: the pricing state at the
/// start of the iteration and the pivot it chose.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RevisedIteration {
    /// 1-based, counted across both phases
    pub number: usize,
    /// 1 while driving artificials out, 2 afterwards
    pub phase: u8,
    pub basis: Vec<String>,
    /// x_B = B⁻¹ b
    pub basic_values: Vec<f64>,
    pub basis_inverse: Matrix,
    /// Dual value per constraint row, in maximization space
    pub shadow_prices: Vec<f64>,
    /// r_j = c_j − y·a_j per column, in the minimization form being priced
    pub reduced_costs: Vec<f64>,
    /// Phase 1: artificial mass; phase 2: maximization-space objective
    pub objective: f64,
    pub entering: Option<String>,
    pub leaving: Option<String>,
    pub ratio: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RevisedOutcome {
    /// Column names the reduced costs refer to
    pub columns: Vec<String>,
    pub iterations: IterationLog<RevisedIteration>,
    pub solution: Solution,
}

/// Revised simplex with an explicit basis inverse updated by eta matrices.
#[derive(Debug, Clone, Default)]
pub struct RevisedSimplex {
    options: SolverOptions,
}

struct State<'a> {
    tableau: &'a Tableau,
    basis: Vec<usize>,
    inverse: Matrix,
    iterations: IterationLog<RevisedIteration>,
    count: usize,
}

impl RevisedSimplex {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn solve(&self, program: &LinearProgram) -> SolveResult<RevisedOutcome> {
        let tableau = CanonicalForm::build(program, Convention::Primal)?;
        let basis = self.initial_basis(&tableau)?;
        let mut state = State {
            tableau: &tableau,
            inverse: linalg::identity(basis.len()),
            basis,
            iterations: IterationLog::new(),
            count: 0,
        };

        if tableau.has_artificial() {
            let costs: Vec<f64> = tableau
                .columns()
                .iter()
                .map(|c| if c.kind == ColumnKind::Artificial { 1.0 } else { 0.0 })
                .collect();
            self.run_phase(&mut state, &costs, 1)?;

            let b = constraint_rhs(&tableau);
            let x_b = linalg::mat_vec(&state.inverse, &b);
            let residual: f64 = state
                .basis
                .iter()
                .zip(&x_b)
                .filter(|&(&j, _)| !tableau.is_eligible(j))
                .map(|(_, v)| v)
                .sum();
            if residual > self.options.feasibility_tolerance {
                info!("revised simplex: artificial mass {residual} after phase 1, infeasible");
                return Err(SolveError::Infeasible);
            }
            self.drive_out_artificials(&mut state);
        }

        let costs = tableau.objective_row().to_vec();
        self.run_phase(&mut state, &costs, 2)?;

        let solution = self.solution(program, &state);
        info!(
            "revised simplex: optimal z = {} after {} iterations",
            solution.objective_value, state.count
        );
        Ok(RevisedOutcome {
            columns: tableau.columns().iter().map(|c| c.name.clone()).collect(),
            iterations: state.iterations,
            solution,
        })
    }

    /// Per row, a unit column of the canonical form, preferring auxiliary
    /// columns, so that B = I.
    fn initial_basis(&self, tableau: &Tableau) -> SolveResult<Vec<usize>> {
        let tol = self.options.tolerance;
        let mut basis = Vec::with_capacity(tableau.num_constraints());
        for row in 1..tableau.num_rows() {
            let unit = |j: &usize| tableau.unit_row(*j, tol) == Some(row);
            let auxiliary = (0..tableau.num_columns())
                .filter(|j| !matches!(tableau.column(*j).kind, ColumnKind::Decision { .. }))
                .find(unit);
            let col = auxiliary
                .or_else(|| (0..tableau.num_columns()).find(unit))
                .ok_or_else(|| SolveError::malformed(format!("row {row} has no starting basic column")))?;
            basis.push(col);
        }
        Ok(basis)
    }

    fn run_phase(&self, state: &mut State<'_>, costs: &[f64], phase: u8) -> SolveResult<()> {
        let tol = self.options.tolerance;
        let tableau = state.tableau;
        let b = constraint_rhs(tableau);
        let m = state.basis.len();

        loop {
            let x_b = linalg::mat_vec(&state.inverse, &b);
            let c_b: Vec<f64> = state.basis.iter().map(|&j| costs[j]).collect();
            let y = linalg::vec_mat(&c_b, &state.inverse);

            let reduced_costs: Vec<f64> = (0..tableau.num_columns())
                .map(|j| {
                    if state.basis.contains(&j) {
                        0.0
                    } else {
                        costs[j] - linalg::dot(&y, &constraint_column(tableau, j))
                    }
                })
                .collect();
            let cost = linalg::dot(&c_b, &x_b);

            let mut snapshot = RevisedIteration {
                number: state.count + 1,
                phase,
                basis: state.basis.iter().map(|&j| tableau.column(j).name.clone()).collect(),
                basic_values: x_b.clone(),
                basis_inverse: state.inverse.clone(),
                shadow_prices: y.iter().map(|v| -v).collect(),
                reduced_costs: reduced_costs.clone(),
                objective: if phase == 1 { cost } else { -cost },
                entering: None,
                leaving: None,
                ratio: None,
            };

            let mut entering: Option<usize> = None;
            for (j, &r) in reduced_costs.iter().enumerate() {
                if !tableau.is_eligible(j) || r >= -tol {
                    continue;
                }
                if entering.is_none_or(|e| r < reduced_costs[e]) {
                    entering = Some(j);
                }
            }
            let Some(entering) = entering else {
                debug!("revised phase {phase}: optimal at iteration {}", snapshot.number);
                state.iterations.push(snapshot);
                return Ok(());
            };

            if state.count == self.options.revised_iteration_limit {
                warn!("revised simplex: iteration cap of {} reached", state.count);
                return Err(SolveError::CyclingLimitExceeded { iterations: state.count });
            }

            let direction = linalg::mat_vec(&state.inverse, &constraint_column(tableau, entering));
            let mut leaving: Option<(usize, f64)> = None;
            for i in 0..m {
                if direction[i] <= tol {
                    continue;
                }
                let ratio = x_b[i] / direction[i];
                if leaving.is_none_or(|(_, min)| ratio < min - tol) {
                    leaving = Some((i, ratio));
                }
            }
            let Some((position, ratio)) = leaving else {
                debug!("revised phase {phase}: {} is unbounded", tableau.column(entering).name);
                return Err(SolveError::Unbounded);
            };

            snapshot.entering = Some(tableau.column(entering).name.clone());
            snapshot.leaving = Some(tableau.column(state.basis[position]).name.clone());
            snapshot.ratio = Some(ratio);
            debug!(
                "revised iteration {}: {} enters, {} leaves, ratio {ratio}",
                snapshot.number,
                tableau.column(entering).name,
                tableau.column(state.basis[position]).name
            );
            state.iterations.push(snapshot);

            state.inverse = linalg::mat_mul(&linalg::eta(&direction, position), &state.inverse);
            state.basis[position] = entering;
            state.count += 1;
        }
    }

    /// Replaces zero-level artificials in the basis where some
    /// non-artificial column has a nonzero entry in their position.
    fn drive_out_artificials(&self, state: &mut State<'_>) {
        let tol = self.options.tolerance;
        let tableau = state.tableau;
        for position in 0..state.basis.len() {
            if tableau.is_eligible(state.basis[position]) {
                continue;
            }
            for j in 0..tableau.num_columns() {
                if !tableau.is_eligible(j) || state.basis.contains(&j) {
                    continue;
                }
                let direction = linalg::mat_vec(&state.inverse, &constraint_column(tableau, j));
                if direction[position].abs() > tol {
                    state.inverse = linalg::mat_mul(&linalg::eta(&direction, position), &state.inverse);
                    state.basis[position] = j;
                    break;
                }
            }
        }
    }

    fn solution(&self, program: &LinearProgram, state: &State<'_>) -> Solution {
        let tableau = state.tableau;
        let x_b = linalg::mat_vec(&state.inverse, &constraint_rhs(tableau));
        let mut values = vec![0.0; program.num_variables()];
        let mut z = 0.0;
        for (&j, &v) in state.basis.iter().zip(&x_b) {
            z -= tableau.objective_row()[j] * v;
            if let ColumnKind::Decision { variable, negated } = tableau.column(j).kind {
                values[variable] += if negated { -v } else { v };
            }
        }
        Solution {
            values,
            objective_value: program.from_max_space(z),
        }
    }
}

fn constraint_rhs(tableau: &Tableau) -> Vec<f64> {
    (1..tableau.num_rows()).map(|i| tableau.rhs(i)).collect()
}

fn constraint_column(tableau: &Tableau, col: usize) -> Vec<f64> {
    (1..tableau.num_rows()).map(|i| tableau.value(i, col)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;

    fn wyndor() -> LinearProgram {
        LinearProgram::maximize(vec![3.0, 5.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .subject_to(vec![3.0, 2.0], ConstraintOp::Le, 18.0)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_wyndor_iterations() {
        let outcome = RevisedSimplex::default().solve(&wyndor()).unwrap();

        assert_close(outcome.solution.objective_value, 36.0);
        assert_close(outcome.solution.values[0], 2.0);
        assert_close(outcome.solution.values[1], 6.0);

        let first = outcome.iterations.first().unwrap();
        assert_eq!(first.basis, vec!["s1", "s2", "s3"]);
        assert_eq!(first.entering.as_deref(), Some("x2"));
        assert_eq!(first.leaving.as_deref(), Some("s2"));
        assert_close(first.ratio.unwrap(), 6.0);

        let last = outcome.iterations.last().unwrap();
        assert_eq!(outcome.iterations.len(), 3);
        assert_eq!(last.entering, None);
        assert_close(last.shadow_prices[1], 1.5);
        assert_close(last.shadow_prices[2], 1.0);
        assert_close(last.objective, 36.0);
        assert!(last.reduced_costs.iter().all(|&r| r >= -1e-9));
    }

    #[test]
    fn test_two_phase_minimization() {
        let program = LinearProgram::minimize(vec![2.0, 3.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let outcome = RevisedSimplex::default().solve(&program).unwrap();
        assert_close(outcome.solution.objective_value, 9.0);
        assert_eq!(outcome.iterations.first().unwrap().phase, 1);
        assert_eq!(outcome.iterations.last().unwrap().phase, 2);
    }

    #[test]
    fn test_unbounded() {
        let program = LinearProgram::maximize(vec![1.0, 1.0]).subject_to(vec![1.0, -1.0], ConstraintOp::Le, 2.0);
        assert_eq!(RevisedSimplex::default().solve(&program), Err(SolveError::Unbounded));
    }

    #[test]
    fn test_iteration_cap() {
        let solver = RevisedSimplex::new(SolverOptions::new().with_revised_iteration_limit(1));
        assert_eq!(
            solver.solve(&wyndor()),
            Err(SolveError::CyclingLimitExceeded { iterations: 1 })
        );
    }

    #[test]
    fn test_infeasible() {
        let program = LinearProgram::maximize(vec![1.0])
            .subject_to(vec![1.0], ConstraintOp::Le, 1.0)
            .subject_to(vec![1.0], ConstraintOp::Ge, 3.0);
        assert_eq!(RevisedSimplex::default().solve(&program), Err(SolveError::Infeasible));
    }
}
