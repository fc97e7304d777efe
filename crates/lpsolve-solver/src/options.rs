/// Order in which pending branch-and-bound nodes are expanded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeOrder {
    /// Last created node first; the `x <= floor` child precedes its sibling.
    #[default]
    DepthFirst,
    /// Node whose parent relaxation bound is highest first.
    BestFirst,
}

/// Tolerances and budgets shared by all engines.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Tolerance for pivot, sign and unit-column comparisons
    pub tolerance: f64,
    /// Tolerance for integrality and fractional-part tests
    pub integrality_tolerance: f64,
    /// Largest artificial mass accepted at the end of phase 1
    pub feasibility_tolerance: f64,
    /// Pivot budget for a single primal or dual run
    pub max_iterations: usize,
    /// Iteration cap of the revised simplex
    pub revised_iteration_limit: usize,
    /// Consecutive degenerate pivots tolerated before Bland's rule takes over
    pub degenerate_pivot_limit: usize,
    /// Branch-and-bound node budget
    pub max_nodes: usize,
    /// Gomory cut budget
    pub max_cuts: usize,
    pub node_order: NodeOrder,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            integrality_tolerance: 1e-6,
            feasibility_tolerance: 1e-7,
            max_iterations: 10_000,
            revised_iteration_limit: 100,
            degenerate_pivot_limit: 50,
            max_nodes: 10_000,
            max_cuts: 100,
            node_order: NodeOrder::DepthFirst,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.feasibility_tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_revised_iteration_limit(mut self, max: usize) -> Self {
        self.revised_iteration_limit = max;
        self
    }

    pub fn with_degenerate_pivot_limit(mut self, max: usize) -> Self {
        self.degenerate_pivot_limit = max;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_max_cuts(mut self, max: usize) -> Self {
        self.max_cuts = max;
        self
    }

    pub fn with_node_order(mut self, order: NodeOrder) -> Self {
        self.node_order = order;
        self
    }

    /// Whether `value` lies within the integrality tolerance of an integer.
    pub fn is_integral(&self, value: f64) -> bool {
        (value - value.round()).abs() <= self.integrality_tolerance
    }

    /// Fractional part of `value`, snapped to zero when within the
    /// integrality tolerance of an integer.
    pub fn fractional_part(&self, value: f64) -> f64 {
        let frac = value - value.floor();
        if frac < self.integrality_tolerance || frac > 1.0 - self.integrality_tolerance {
            0.0
        } else {
            frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let options = SolverOptions::new()
            .with_max_nodes(12)
            .with_max_cuts(3)
            .with_node_order(NodeOrder::BestFirst);

        assert_eq!(options.max_nodes, 12);
        assert_eq!(options.max_cuts, 3);
        assert_eq!(options.node_order, NodeOrder::BestFirst);
        assert_eq!(options.revised_iteration_limit, 100);
    }

    #[test]
    fn test_fractional_part_snaps_near_integers() {
        let options = SolverOptions::default();
        assert_eq!(options.fractional_part(2.9999999999), 0.0);
        assert_eq!(options.fractional_part(-3.0000000001), 0.0);
        assert!((options.fractional_part(3.75) - 0.75).abs() < 1e-12);
        assert!((options.fractional_part(-0.25) - 0.75).abs() < 1e-12);
    }
}
