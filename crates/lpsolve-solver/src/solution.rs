use crate::error::{SolveError, SolveResult};
use crate::problem::LinearProgram;
use crate::tableau::Tableau;

/// A primal solution in the program's own variables and sense
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Value of each decision variable x1..xn
    pub values: Vec<f64>,
    /// Objective value in the program's sense
    pub objective_value: f64,
}

/// Outcome of a primal or dual simplex run: every tableau from the
/// starting one to the optimum, and the solution read off the last.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexRun {
    pub iterations: IterationLog<Tableau>,
    pub tableau: Tableau,
    pub solution: Solution,
}

impl SimplexRun {
    pub(crate) fn new(
        program: &LinearProgram,
        iterations: IterationLog<Tableau>,
        tolerance: f64,
    ) -> SolveResult<Self> {
        let tableau = iterations
            .last()
            .cloned()
            .ok_or_else(|| SolveError::malformed("empty iteration log"))?;
        let solution = Solution {
            values: tableau.decision_values(program.num_variables(), tolerance),
            objective_value: program.from_max_space(tableau.objective_value()),
        };
        Ok(Self {
            iterations,
            tableau,
            solution,
        })
    }

    pub fn final_tableau(&self) -> &Tableau {
        &self.tableau
    }
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

/// Append-only record of solver snapshots, oldest first.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationLog<T> {
    entries: Vec<T>,
}

impl<T> Default for IterationLog<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> IterationLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Appends every entry of `other` except its first, which repeats
    /// the snapshot this log already ends with.
    pub fn append_skipping_first(&mut self, other: IterationLog<T>) {
        self.entries.extend(other.entries.into_iter().skip(1));
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<'a, T> IntoIterator for &'a IterationLog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_skipping_first_drops_duplicate_start() {
        let mut log = IterationLog::new();
        log.push(1);
        log.push(2);

        let mut resumed = IterationLog::new();
        resumed.push(2);
        resumed.push(3);
        resumed.push(4);

        log.append_skipping_first(resumed);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(log.last(), Some(&4));
    }
}
