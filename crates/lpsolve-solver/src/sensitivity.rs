use log::debug;

use crate::canonical::{CanonicalForm, RowOrigin};
use crate::error::{SolveError, SolveResult};
use crate::linalg::{self, Matrix};
use crate::options::SolverOptions;
use crate::problem::LinearProgram;
use crate::tableau::{ColumnKind, Tableau};

/// Shadow price (dual value) of a constraint row
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPrice {
    /// Row name, after its first auxiliary column (`s1`, `e2`, `u3`)
    pub constraint: String,
    /// Change of the objective per unit increase of the row's RHS
    pub value: f64,
    /// Human-readable interpretation
    pub interpretation: String,
}

/// Reduced cost of a tableau column
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedCost {
    pub variable: String,
    /// Value in the optimal basic solution
    pub value: f64,
    /// `c_j − y·a_j` in the program's sense
    pub reduced_cost: f64,
    pub is_basic: bool,
}

/// Interval of changes keeping the current basis feasible (RHS) or
/// optimal (objective coefficient). Open ends are infinite.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRange {
    pub name: String,
    pub current: f64,
    pub lower_delta: f64,
    pub upper_delta: f64,
}

impl SensitivityRange {
    pub fn lower_bound(&self) -> f64 {
        self.current + self.lower_delta
    }

    pub fn upper_bound(&self) -> f64 {
        self.current + self.upper_delta
    }
}

/// Post-optimal analysis of a final tableau
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityReport {
    /// Basic column per constraint row
    pub basis: Vec<String>,
    /// x_B = B⁻¹ b
    pub basic_values: Vec<f64>,
    pub basis_inverse: Matrix,
    pub shadow_prices: Vec<ShadowPrice>,
    pub reduced_costs: Vec<ReducedCost>,
    pub rhs_ranges: Vec<SensitivityRange>,
    pub objective_ranges: Vec<SensitivityRange>,
    /// Rows with a nonzero shadow price
    pub binding_constraints: Vec<String>,
    /// z* in the program's sense
    pub objective_value: f64,
    /// bᵗy in the program's sense
    pub dual_objective_value: f64,
    pub duality_gap: f64,
}

impl SensitivityReport {
    pub fn strong_duality_holds(&self, tolerance: f64) -> bool {
        self.duality_gap < tolerance
    }
}

/// Duality and ranging information for an optimal tableau of a program.
///
/// The constraint matrix, right-hand sides and costs are taken from the
/// program's canonical form; the final tableau only decides the basis.
#[derive(Debug, Clone, Default)]
pub struct SensitivityAnalyzer {
    options: SolverOptions,
}

impl SensitivityAnalyzer {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn analyze(&self, program: &LinearProgram, tableau: &Tableau) -> SolveResult<SensitivityReport> {
        let tol = self.options.tolerance;
        let (original, origins) = CanonicalForm::build_with_origins(program, tableau.convention())?;
        if tableau.columns().iter().any(|c| c.kind == ColumnKind::Cut) {
            return Err(SolveError::malformed(
                "tableaux carrying cut columns cannot be ranged against the original model",
            ));
        }
        if original.columns() != tableau.columns() || original.num_rows() != tableau.num_rows() {
            return Err(SolveError::malformed(
                "tableau does not match the canonical form of the program",
            ));
        }

        let m = original.num_constraints();
        let n = original.num_columns();
        let basis = (1..tableau.num_rows())
            .map(|row| {
                tableau
                    .basic_column(row, tol)
                    .ok_or_else(|| SolveError::malformed(format!("row {row} has no basic column")))
            })
            .collect::<SolveResult<Vec<usize>>>()?;

        let column = |j: usize| -> Vec<f64> { (1..=m).map(|i| original.value(i, j)).collect() };
        let b: Vec<f64> = (1..=m).map(|i| original.rhs(i)).collect();
        let costs = self.costs(program, &original);

        let basis_matrix: Matrix = (0..m)
            .map(|i| basis.iter().map(|&j| original.value(i + 1, j)).collect())
            .collect();
        let inverse = linalg::invert(&basis_matrix, tol).ok_or(SolveError::SingularBasis)?;

        let c_b: Vec<f64> = basis.iter().map(|&j| costs[j]).collect();
        let y = linalg::vec_mat(&c_b, &inverse);
        let x_b = linalg::mat_vec(&inverse, &b);
        let reduced: Vec<f64> = (0..n).map(|j| costs[j] - linalg::dot(&y, &column(j))).collect();

        let z = linalg::dot(&c_b, &x_b);
        let bty = linalg::dot(&b, &y);
        debug!("sensitivity: basis {basis:?}, z = {z}, bᵗy = {bty}");

        let shadow_prices = origins
            .iter()
            .zip(&y)
            .map(|(origin, &yi)| self.shadow_price(program, origin, yi))
            .collect::<Vec<_>>();
        let binding_constraints = shadow_prices
            .iter()
            .filter(|sp| sp.value.abs() > tol)
            .map(|sp| sp.constraint.clone())
            .collect();

        let reduced_costs = (0..n)
            .map(|j| {
                let position = basis.iter().position(|&k| k == j);
                ReducedCost {
                    variable: original.column(j).name.clone(),
                    value: position.map_or(0.0, |i| x_b[i]),
                    reduced_cost: if position.is_some() {
                        0.0
                    } else {
                        program.from_max_space(reduced[j])
                    },
                    is_basic: position.is_some(),
                }
            })
            .collect();

        let rhs_ranges = origins
            .iter()
            .enumerate()
            .map(|(k, origin)| self.rhs_range(origin, b[k], &inverse, &x_b, k))
            .collect();

        let objective_ranges = basis
            .iter()
            .enumerate()
            .filter(|&(_, &p)| original.is_eligible(p))
            .map(|(i, &p)| {
                let (lower, upper) = self.cost_range(&original, &basis, &inverse, &reduced, i, &column);
                let range = SensitivityRange {
                    name: original.column(p).name.clone(),
                    current: costs[p],
                    lower_delta: lower,
                    upper_delta: upper,
                };
                in_program_sense(program, range)
            })
            .collect();

        let objective_value = program.from_max_space(z);
        let dual_objective_value = program.from_max_space(bty);
        Ok(SensitivityReport {
            basis: basis.iter().map(|&j| original.column(j).name.clone()).collect(),
            basic_values: x_b,
            basis_inverse: inverse,
            shadow_prices,
            reduced_costs,
            rhs_ranges,
            objective_ranges,
            binding_constraints,
            objective_value,
            dual_objective_value,
            duality_gap: (objective_value - dual_objective_value).abs(),
        })
    }

    /// Maximization-space cost per canonical column.
    fn costs(&self, program: &LinearProgram, canonical: &Tableau) -> Vec<f64> {
        let objective = program.max_objective();
        canonical
            .columns()
            .iter()
            .map(|c| match c.kind {
                ColumnKind::Decision { variable, negated: false } => objective[variable],
                ColumnKind::Decision { variable, negated: true } => -objective[variable],
                _ => 0.0,
            })
            .collect()
    }

    fn shadow_price(&self, program: &LinearProgram, origin: &RowOrigin, y: f64) -> ShadowPrice {
        let value = program.from_max_space(origin.sign * y);
        let interpretation = if value.abs() < self.options.tolerance {
            "Non-binding constraint".to_string()
        } else if value > 0.0 {
            format!("Increasing RHS by 1 unit would increase the objective by {value:.4}")
        } else {
            format!("Increasing RHS by 1 unit would decrease the objective by {:.4}", -value)
        };
        ShadowPrice {
            constraint: origin.name.clone(),
            value,
            interpretation,
        }
    }

    /// Δb_k keeping x_B = B⁻¹(b + Δb e_k) non-negative, expressed on the
    /// model row.
    fn rhs_range(&self, origin: &RowOrigin, b_k: f64, inverse: &Matrix, x_b: &[f64], k: usize) -> SensitivityRange {
        let tol = self.options.tolerance;
        let mut lower = f64::NEG_INFINITY;
        let mut upper = f64::INFINITY;
        for (row, &x) in inverse.iter().zip(x_b) {
            let entry = row[k];
            if entry > tol {
                lower = lower.max(-x / entry);
            } else if entry < -tol {
                upper = upper.min(-x / entry);
            }
        }
        if origin.sign < 0.0 {
            (lower, upper) = (-upper, -lower);
        }
        SensitivityRange {
            name: origin.name.clone(),
            current: origin.sign * b_k,
            lower_delta: lower,
            upper_delta: upper,
        }
    }

    /// Δc of the column basic at `position` keeping every eligible
    /// non-basic reduced cost non-positive.
    fn cost_range(
        &self,
        canonical: &Tableau,
        basis: &[usize],
        inverse: &Matrix,
        reduced: &[f64],
        position: usize,
        column: &impl Fn(usize) -> Vec<f64>,
    ) -> (f64, f64) {
        let tol = self.options.tolerance;
        let mut lower = f64::NEG_INFINITY;
        let mut upper = f64::INFINITY;
        for j in 0..canonical.num_columns() {
            if basis.contains(&j) || !canonical.is_eligible(j) {
                continue;
            }
            let d = linalg::dot(&inverse[position], &column(j));
            if d > tol {
                lower = lower.max(reduced[j] / d);
            } else if d < -tol {
                upper = upper.min(reduced[j] / d);
            }
        }
        (lower, upper)
    }
}

/// Converts a maximization-space cost range into the program's sense.
fn in_program_sense(program: &LinearProgram, range: SensitivityRange) -> SensitivityRange {
    if program.is_maximization() {
        return range;
    }
    SensitivityRange {
        current: -range.current,
        lower_delta: -range.upper_delta,
        upper_delta: -range.lower_delta,
        ..range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual::DualSimplex;
    use crate::primal::PrimalSimplex;
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

    fn range<'a>(ranges: &'a [SensitivityRange], name: &str) -> &'a SensitivityRange {
        ranges.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_wyndor_report() {
        let program = wyndor();
        let run = PrimalSimplex::default().solve(&program).unwrap();
        let report = SensitivityAnalyzer::default().analyze(&program, run.final_tableau()).unwrap();

        assert_eq!(report.basis, vec!["s1", "x2", "x1"]);
        let prices: Vec<f64> = report.shadow_prices.iter().map(|s| s.value).collect();
        assert_close(prices[0], 0.0);
        assert_close(prices[1], 1.5);
        assert_close(prices[2], 1.0);
        assert_eq!(report.binding_constraints, vec!["s2", "s3"]);

        assert_close(report.objective_value, 36.0);
        assert_close(report.dual_objective_value, 36.0);
        assert!(report.strong_duality_holds(1e-6));

        let b1 = range(&report.rhs_ranges, "s1");
        assert_close(b1.lower_delta, -2.0);
        assert!(b1.upper_delta.is_infinite());
        let b2 = range(&report.rhs_ranges, "s2");
        assert_close(b2.lower_delta, -6.0);
        assert_close(b2.upper_delta, 6.0);
        assert_close(b2.upper_bound(), 18.0);
        let b3 = range(&report.rhs_ranges, "s3");
        assert_close(b3.lower_delta, -6.0);
        assert_close(b3.upper_delta, 6.0);

        let c1 = range(&report.objective_ranges, "x1");
        assert_close(c1.current, 3.0);
        assert_close(c1.lower_delta, -3.0);
        assert_close(c1.upper_delta, 4.5);
        let c2 = range(&report.objective_ranges, "x2");
        assert_close(c2.lower_delta, -3.0);
        assert!(c2.upper_delta.is_infinite());
    }

    #[test]
    fn test_reduced_costs_of_nonbasic_slacks() {
        let program = wyndor();
        let run = PrimalSimplex::default().solve(&program).unwrap();
        let report = SensitivityAnalyzer::default().analyze(&program, run.final_tableau()).unwrap();

        let s2 = report.reduced_costs.iter().find(|r| r.variable == "s2").unwrap();
        assert!(!s2.is_basic);
        assert_close(s2.reduced_cost, -1.5);
        let x1 = report.reduced_costs.iter().find(|r| r.variable == "x1").unwrap();
        assert!(x1.is_basic);
        assert_close(x1.value, 2.0);
    }

    #[test]
    fn test_minimization_from_dual_tableau() {
        let program = LinearProgram::minimize(vec![2.0, 3.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        let run = DualSimplex::default().solve(&program).unwrap();
        let report = SensitivityAnalyzer::default().analyze(&program, run.final_tableau()).unwrap();

        assert_close(report.objective_value, 9.0);
        assert!(report.strong_duality_holds(1e-6));
        // one more unit of demand costs one more unit of x2
        let demand = report.shadow_prices.iter().find(|s| s.constraint == "e1").unwrap();
        assert_close(demand.value, 3.0);
        let capacity = report.shadow_prices.iter().find(|s| s.constraint == "s2").unwrap();
        assert_close(capacity.value, -1.0);
    }

    #[test]
    fn test_rejects_foreign_tableau() {
        let run = PrimalSimplex::default().solve(&wyndor()).unwrap();
        let other = LinearProgram::maximize(vec![1.0, 1.0]).subject_to(vec![1.0, 1.0], ConstraintOp::Le, 1.0);
        assert!(matches!(
            SensitivityAnalyzer::default().analyze(&other, run.final_tableau()),
            Err(SolveError::MalformedInput(_))
        ));
    }
}
