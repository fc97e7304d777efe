use std::fmt;
use std::str::FromStr;

use crate::error::{SolveError, SolveResult};
use crate::solution::ConstraintViolation;

/// Represents a linear or integer programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    /// Whether to maximize or minimize
    pub sense: Sense,
    /// Objective coefficients; index i belongs to variable x(i+1)
    pub objective: Vec<f64>,
    /// Constraints
    pub constraints: Vec<Constraint>,
    /// Sign restriction for each variable
    pub restrictions: Vec<SignRestriction>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignRestriction {
    /// `+`
    #[default]
    NonNegative,
    /// `-`
    NonPositive,
    /// `urs`
    Unrestricted,
    /// `int`
    Integer,
    /// `bin`
    Binary,
}

impl ConstraintOp {
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        };
        f.write_str(text)
    }
}

impl FromStr for ConstraintOp {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<=" => Ok(ConstraintOp::Le),
            ">=" => Ok(ConstraintOp::Ge),
            "=" => Ok(ConstraintOp::Eq),
            other => Err(SolveError::malformed(format!(
                "invalid relation '{other}', expected <=, >= or ="
            ))),
        }
    }
}

impl SignRestriction {
    pub fn is_integer(self) -> bool {
        matches!(self, SignRestriction::Integer | SignRestriction::Binary)
    }
}

impl fmt::Display for SignRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignRestriction::NonNegative => "+",
            SignRestriction::NonPositive => "-",
            SignRestriction::Unrestricted => "urs",
            SignRestriction::Integer => "int",
            SignRestriction::Binary => "bin",
        };
        f.write_str(text)
    }
}

impl FromStr for SignRestriction {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(SignRestriction::NonNegative),
            "-" => Ok(SignRestriction::NonPositive),
            "urs" => Ok(SignRestriction::Unrestricted),
            "int" => Ok(SignRestriction::Integer),
            "bin" => Ok(SignRestriction::Binary),
            other => Err(SolveError::malformed(format!(
                "invalid sign restriction '{other}', expected +, -, urs, int or bin"
            ))),
        }
    }
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        Self { coefficients, op, rhs }
    }

    /// Single-variable bound `x(index+1) op rhs` over `n_vars` variables.
    pub fn bound(n_vars: usize, index: usize, op: ConstraintOp, rhs: f64) -> Self {
        let mut coefficients = vec![0.0; n_vars];
        coefficients[index] = 1.0;
        Self { coefficients, op, rhs }
    }

    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(a, x)| a * x)
            .sum()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (j, &coef) in self.coefficients.iter().enumerate() {
            if coef == 0.0 {
                continue;
            }
            if first {
                write!(f, "{coef}x{}", j + 1)?;
                first = false;
            } else if coef < 0.0 {
                write!(f, " - {}x{}", -coef, j + 1)?;
            } else {
                write!(f, " + {coef}x{}", j + 1)?;
            }
        }
        if first {
            f.write_str("0")?;
        }
        write!(f, " {} {}", self.op, self.rhs)
    }
}

impl LinearProgram {
    /// A program over `objective.len()` non-negative variables without constraints.
    pub fn new(sense: Sense, objective: Vec<f64>) -> Self {
        let n = objective.len();
        Self {
            sense,
            objective,
            constraints: Vec::new(),
            restrictions: vec![SignRestriction::NonNegative; n],
        }
    }

    pub fn maximize(objective: Vec<f64>) -> Self {
        Self::new(Sense::Maximize, objective)
    }

    pub fn minimize(objective: Vec<f64>) -> Self {
        Self::new(Sense::Minimize, objective)
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint::new(coefficients, op, rhs));
    }

    /// Builder form of [`LinearProgram::add_constraint`].
    pub fn subject_to(mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        self.add_constraint(coefficients, op, rhs);
        self
    }

    pub fn with_restrictions(mut self, restrictions: Vec<SignRestriction>) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Clone of this program with one more constraint appended.
    pub fn with_constraint(&self, constraint: Constraint) -> Self {
        let mut extended = self.clone();
        extended.constraints.push(constraint);
        extended
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_maximization(&self) -> bool {
        self.sense == Sense::Maximize
    }

    pub fn variable_name(index: usize) -> String {
        format!("x{}", index + 1)
    }

    pub fn restriction(&self, index: usize) -> SignRestriction {
        self.restrictions.get(index).copied().unwrap_or_default()
    }

    /// Objective coefficients of the equivalent maximization.
    pub fn max_objective(&self) -> Vec<f64> {
        match self.sense {
            Sense::Maximize => self.objective.clone(),
            Sense::Minimize => self.objective.iter().map(|c| -c).collect(),
        }
    }

    /// Converts a maximization-space objective value back into this program's sense.
    pub fn from_max_space(&self, value: f64) -> f64 {
        match self.sense {
            Sense::Maximize => value,
            Sense::Minimize => -value,
        }
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, x)| c * x).sum()
    }

    /// Variables subject to integrality; all of them when none is marked.
    pub fn integer_variables(&self) -> Vec<usize> {
        let marked: Vec<usize> = (0..self.num_variables())
            .filter(|&i| self.restriction(i).is_integer())
            .collect();
        if marked.is_empty() {
            (0..self.num_variables()).collect()
        } else {
            marked
        }
    }

    pub fn validate(&self) -> SolveResult<()> {
        let n = self.num_variables();
        if n == 0 {
            return Err(SolveError::malformed("objective has no coefficients"));
        }
        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::malformed("objective coefficients must be finite"));
        }
        if self.restrictions.len() != n {
            return Err(SolveError::malformed(format!(
                "expected {n} sign restrictions, found {}",
                self.restrictions.len()
            )));
        }
        for (j, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(SolveError::malformed(format!(
                    "constraint {} has {} coefficients, expected {n}",
                    j + 1,
                    c.coefficients.len()
                )));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(SolveError::malformed(format!(
                    "constraint {} contains a non-finite number",
                    j + 1
                )));
            }
        }
        Ok(())
    }

    /// Find which constraints and sign restrictions are violated by `values`
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for (j, c) in self.constraints.iter().enumerate() {
            let name = format!("c{}", j + 1);
            let lhs = c.lhs(values);

            let (is_violated, violation_amount, description) = match c.op {
                ConstraintOp::Le => {
                    let amt = lhs - c.rhs;
                    (
                        amt > tolerance,
                        amt,
                        format!("{name} exceeds maximum of {:.2} by {:.2}", c.rhs, amt),
                    )
                }
                ConstraintOp::Ge => {
                    let amt = c.rhs - lhs;
                    (
                        amt > tolerance,
                        amt,
                        format!("{name} is below minimum of {:.2} by {:.2}", c.rhs, amt),
                    )
                }
                ConstraintOp::Eq => {
                    let diff = (lhs - c.rhs).abs();
                    (
                        diff > tolerance,
                        diff,
                        format!("{name} requires exactly {:.2} but got {:.2}", c.rhs, lhs),
                    )
                }
            };

            if is_violated {
                violations.push(ConstraintViolation {
                    constraint: name,
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        for (i, &x) in values.iter().enumerate().take(self.num_variables()) {
            let name = Self::variable_name(i);
            let (required, amount) = match self.restriction(i) {
                SignRestriction::NonPositive => (0.0, x),
                SignRestriction::Unrestricted => continue,
                SignRestriction::Binary if x > 1.0 => (1.0, x - 1.0),
                _ => (0.0, -x),
            };
            if amount > tolerance {
                violations.push(ConstraintViolation {
                    constraint: name.clone(),
                    required,
                    actual: x,
                    violation_amount: amount,
                    description: format!(
                        "{name} = {x:.2} breaks its '{}' restriction",
                        self.restriction(i)
                    ),
                });
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| {
            b.violation_amount
                .partial_cmp(&a.violation_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violations_sorted_worst_first() {
        let program = LinearProgram::maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Ge, 3.0)
            .subject_to(vec![0.0, 1.0], ConstraintOp::Eq, 2.0);

        let violations = program.violations(&[1.5, 5.0], 1e-9);
        let names: Vec<_> = violations.iter().map(|v| v.constraint.as_str()).collect();
        assert_eq!(names, vec!["c3", "c1", "c2"]);
        assert!((violations[0].violation_amount - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_violations_respect_sign_restrictions() {
        let program = LinearProgram::maximize(vec![1.0, 1.0, 1.0]).with_restrictions(vec![
            SignRestriction::NonPositive,
            SignRestriction::Unrestricted,
            SignRestriction::Binary,
        ]);

        assert!(program.violations(&[-2.0, -7.0, 1.0], 1e-9).is_empty());
        let violations = program.violations(&[0.5, -7.0, 2.0], 1e-9);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_integer_variables_default_to_all() {
        let program = LinearProgram::maximize(vec![1.0, 2.0, 3.0]);
        assert_eq!(program.integer_variables(), vec![0, 1, 2]);

        let program = program.with_restrictions(vec![
            SignRestriction::NonNegative,
            SignRestriction::Integer,
            SignRestriction::Binary,
        ]);
        assert_eq!(program.integer_variables(), vec![1, 2]);
    }

    #[test]
    fn test_validate_rejects_ragged_constraints() {
        let program = LinearProgram::maximize(vec![1.0, 2.0]).subject_to(vec![1.0], ConstraintOp::Le, 1.0);
        assert!(matches!(program.validate(), Err(SolveError::MalformedInput(_))));
    }

    #[test]
    fn test_constraint_display() {
        let c = Constraint::new(vec![3.0, -2.0, 0.0], ConstraintOp::Ge, 4.0);
        assert_eq!(c.to_string(), "3x1 - 2x2 >= 4");
    }
}
