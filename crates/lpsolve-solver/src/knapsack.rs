use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::branch_bound::{NodeStatus, SearchStatus};
use crate::error::{SolveError, SolveResult};
use crate::options::SolverOptions;
use crate::problem::{ConstraintOp, LinearProgram, SignRestriction};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnapsackItem {
    /// 1-based item number, as in `x{index}`
    pub index: usize,
    pub value: f64,
    pub weight: f64,
}

impl KnapsackItem {
    pub fn new(index: usize, value: f64, weight: f64) -> Self {
        Self { index, value, weight }
    }

    pub fn ratio(&self) -> f64 {
        self.value / self.weight
    }
}

/// 0/1 knapsack instance: pick items maximizing value within `capacity`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackProblem {
    pub items: Vec<KnapsackItem>,
    pub capacity: f64,
}

impl KnapsackProblem {
    pub fn new(items: Vec<KnapsackItem>, capacity: f64) -> SolveResult<Self> {
        let problem = Self { items, capacity };
        problem.validate()?;
        Ok(problem)
    }

    pub fn validate(&self) -> SolveResult<()> {
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(SolveError::malformed(format!(
                "capacity must be a non-negative number, got {}",
                self.capacity
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for item in &self.items {
            if !(item.weight > 0.0 && item.weight.is_finite()) || !(item.value >= 0.0 && item.value.is_finite()) {
                return Err(SolveError::malformed(format!(
                    "item {} needs a non-negative finite value and a positive weight",
                    item.index
                )));
            }
            if !seen.insert(item.index) {
                return Err(SolveError::malformed(format!("item {} is listed twice", item.index)));
            }
        }
        Ok(())
    }

    /// Reads a maximization with a single `<=` constraint over binary
    /// variables as a knapsack.
    pub fn from_program(program: &LinearProgram) -> SolveResult<Self> {
        program.validate()?;
        if !program.is_maximization() {
            return Err(SolveError::malformed("a knapsack model must be a maximization"));
        }
        let [constraint] = program.constraints.as_slice() else {
            return Err(SolveError::malformed(format!(
                "a knapsack model has exactly one constraint, found {}",
                program.num_constraints()
            )));
        };
        if constraint.op != ConstraintOp::Le {
            return Err(SolveError::malformed("the knapsack constraint must be <="));
        }
        if program.restrictions.iter().any(|r| *r != SignRestriction::Binary) {
            return Err(SolveError::malformed("every knapsack variable must be bin"));
        }

        let items = program
            .objective
            .iter()
            .zip(&constraint.coefficients)
            .enumerate()
            .map(|(i, (&value, &weight))| KnapsackItem::new(i + 1, value, weight))
            .collect();
        Self::new(items, constraint.rhs)
    }

    fn item(&self, index: usize) -> Option<&KnapsackItem> {
        self.items.iter().find(|item| item.index == index)
    }
}

/// One node of the knapsack search, as logged.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackNode {
    /// Hierarchical id: `0`, `0.1` (item fixed to 0), `0.2` (fixed to 1)
    pub id: String,
    pub parent: Option<String>,
    pub depth: usize,
    /// Item index → 0 or 1
    pub fixed: BTreeMap<usize, u8>,
    pub current_value: f64,
    pub remaining_capacity: f64,
    /// `None` when the fixed items already overflow the capacity
    pub upper_bound: Option<f64>,
    pub fractional_item: Option<usize>,
    pub status: NodeStatus,
    /// Incumbent value once this node was processed
    pub best_value: f64,
}

impl KnapsackNode {
    /// `x1=0, x3=1` style summary of the fixed items
    pub fn fixed_summary(&self) -> String {
        self.fixed
            .iter()
            .map(|(index, v)| format!("x{index}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackOutcome {
    pub status: SearchStatus,
    pub best_value: f64,
    /// Item index → 0 or 1 for every item
    pub selection: BTreeMap<usize, u8>,
    pub nodes: Vec<KnapsackNode>,
}

struct Pending {
    id: String,
    parent: Option<String>,
    depth: usize,
    fixed: BTreeMap<usize, u8>,
    current_value: f64,
}

/// Depth-first branch and bound with the greedy fractional relaxation.
#[derive(Debug, Clone, Default)]
pub struct KnapsackBranchAndBound {
    options: SolverOptions,
}

impl KnapsackBranchAndBound {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn solve(&self, problem: &KnapsackProblem) -> SolveResult<KnapsackOutcome> {
        problem.validate()?;
        let mut order = problem.items.clone();
        // stable, so equal ratios keep input order
        order.sort_by(|a, b| b.ratio().total_cmp(&a.ratio()));

        let mut best_value = 0.0;
        let mut selection: BTreeMap<usize, u8> = problem.items.iter().map(|item| (item.index, 0)).collect();
        let mut nodes = Vec::new();
        let mut status = SearchStatus::Optimal;

        let mut stack = vec![Pending {
            id: "0".to_string(),
            parent: None,
            depth: 0,
            fixed: BTreeMap::new(),
            current_value: 0.0,
        }];

        while let Some(pending) = stack.pop() {
            if nodes.len() == self.options.max_nodes {
                warn!("knapsack: node budget of {} exhausted", self.options.max_nodes);
                status = SearchStatus::NodeLimit;
                break;
            }

            let used: f64 = pending
                .fixed
                .iter()
                .filter(|&(_, &v)| v == 1)
                .filter_map(|(&index, _)| problem.item(index))
                .map(|item| item.weight)
                .sum();
            let remaining = problem.capacity - used;
            let mut node = KnapsackNode {
                id: pending.id,
                parent: pending.parent,
                depth: pending.depth,
                fixed: pending.fixed,
                current_value: pending.current_value,
                remaining_capacity: remaining,
                upper_bound: None,
                fractional_item: None,
                status: NodeStatus::Infeasible,
                best_value,
            };

            if remaining < 0.0 {
                debug!("knapsack node {}: over capacity by {}", node.id, -remaining);
                nodes.push(node);
                continue;
            }

            // Greedy relaxation over the free items
            let mut relaxed = 0.0;
            let mut capacity_left = remaining;
            let mut taken = Vec::new();
            let mut fractional = None;
            for item in order.iter().filter(|item| !node.fixed.contains_key(&item.index)) {
                if item.weight <= capacity_left {
                    relaxed += item.value;
                    capacity_left -= item.weight;
                    taken.push(item.index);
                } else if capacity_left > 0.0 {
                    relaxed += item.value * capacity_left / item.weight;
                    fractional = Some(*item);
                    break;
                }
            }
            let bound = node.current_value + relaxed;
            node.upper_bound = Some(bound);
            node.fractional_item = fractional.map(|item| item.index);
            debug!(
                "knapsack node {}: [{}] bound {bound}, remaining {remaining}",
                node.id,
                node.fixed_summary()
            );

            if bound <= best_value {
                node.status = NodeStatus::Pruned;
                nodes.push(node);
                continue;
            }

            match fractional {
                None => {
                    node.status = NodeStatus::Candidate;
                    best_value = bound;
                    for (index, v) in selection.iter_mut() {
                        *v = match node.fixed.get(index) {
                            Some(&fixed) => fixed,
                            None if taken.contains(index) => 1,
                            None => 0,
                        };
                    }
                    node.best_value = best_value;
                    info!("knapsack node {}: new best {best_value}", node.id);
                }
                Some(item) => {
                    node.status = NodeStatus::Branched;
                    if item.weight <= remaining {
                        let mut fixed = node.fixed.clone();
                        fixed.insert(item.index, 1);
                        stack.push(Pending {
                            id: format!("{}.2", node.id),
                            parent: Some(node.id.clone()),
                            depth: node.depth + 1,
                            fixed,
                            current_value: node.current_value + item.value,
                        });
                    } else {
                        debug!(
                            "knapsack node {}: x{} = 1 cannot fit ({} > {remaining})",
                            node.id, item.index, item.weight
                        );
                    }
                    let mut fixed = node.fixed.clone();
                    fixed.insert(item.index, 0);
                    stack.push(Pending {
                        id: format!("{}.1", node.id),
                        parent: Some(node.id.clone()),
                        depth: node.depth + 1,
                        fixed,
                        current_value: node.current_value,
                    });
                }
            }
            nodes.push(node);
        }

        Ok(KnapsackOutcome {
            status,
            best_value,
            selection,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> KnapsackProblem {
        KnapsackProblem::new(
            vec![
                KnapsackItem::new(1, 60.0, 10.0),
                KnapsackItem::new(2, 100.0, 20.0),
                KnapsackItem::new(3, 120.0, 30.0),
            ],
            50.0,
        )
        .unwrap()
    }

    #[test]
    fn test_classic_instance() {
        let outcome = KnapsackBranchAndBound::default().solve(&classic()).unwrap();
        assert_eq!(outcome.status, SearchStatus::Optimal);
        assert_eq!(outcome.best_value, 220.0);
        assert_eq!(outcome.selection, BTreeMap::from([(1, 0), (2, 1), (3, 1)]));

        let ids: Vec<_> = outcome.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "0.1", "0.2", "0.2.1", "0.2.2"]);
        assert_eq!(outcome.nodes[0].upper_bound, Some(240.0));
        assert_eq!(outcome.nodes[0].fractional_item, Some(3));
        assert_eq!(outcome.nodes[1].status, NodeStatus::Candidate);
        assert_eq!(outcome.nodes[1].best_value, 160.0);
        assert_eq!(outcome.nodes[4].fixed_summary(), "x2=1, x3=1");
    }

    #[test]
    fn test_item_that_cannot_fit_is_only_fixed_to_zero() {
        let problem = KnapsackProblem::new(
            vec![KnapsackItem::new(1, 10.0, 6.0), KnapsackItem::new(2, 9.0, 6.0)],
            10.0,
        )
        .unwrap();
        let outcome = KnapsackBranchAndBound::default().solve(&problem).unwrap();
        assert_eq!(outcome.best_value, 10.0);

        let ids: Vec<_> = outcome.nodes.iter().map(|n| n.id.as_str()).collect();
        // under x2 = 1, item 1 no longer fits whole
        assert_eq!(ids, vec!["0", "0.1", "0.2", "0.2.1"]);
        assert_eq!(outcome.nodes[3].status, NodeStatus::Pruned);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let items = vec![KnapsackItem::new(1, 5.0, 0.0)];
        assert!(matches!(
            KnapsackProblem::new(items, 10.0),
            Err(SolveError::MalformedInput(_))
        ));
        assert!(KnapsackProblem::new(vec![], -1.0).is_err());
    }

    #[test]
    fn test_rejects_negative_values() {
        let items = vec![KnapsackItem::new(1, -5.0, 1.0), KnapsackItem::new(2, 3.0, 5.0)];
        assert!(matches!(
            KnapsackProblem::new(items, 6.0),
            Err(SolveError::MalformedInput(_))
        ));

        let program = LinearProgram::maximize(vec![-5.0, 3.0])
            .subject_to(vec![1.0, 5.0], ConstraintOp::Le, 6.0)
            .with_restrictions(vec![SignRestriction::Binary; 2]);
        assert!(KnapsackProblem::from_program(&program).is_err());
    }

    #[test]
    fn test_from_program() {
        let program = LinearProgram::maximize(vec![60.0, 100.0, 120.0])
            .subject_to(vec![10.0, 20.0, 30.0], ConstraintOp::Le, 50.0)
            .with_restrictions(vec![SignRestriction::Binary; 3]);
        assert_eq!(KnapsackProblem::from_program(&program).unwrap(), classic());

        let two_rows = program.clone().subject_to(vec![1.0, 1.0, 1.0], ConstraintOp::Le, 2.0);
        assert!(KnapsackProblem::from_program(&two_rows).is_err());
    }

    #[test]
    fn test_node_budget() {
        let solver = KnapsackBranchAndBound::new(SolverOptions::new().with_max_nodes(2));
        let outcome = solver.solve(&classic()).unwrap();
        assert_eq!(outcome.status, SearchStatus::NodeLimit);
        assert_eq!(outcome.nodes.len(), 2);
        assert_eq!(outcome.best_value, 160.0);
    }
}
