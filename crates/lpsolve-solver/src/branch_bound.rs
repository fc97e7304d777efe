use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, info, warn};

use crate::dual::DualSimplex;
use crate::error::{SolveError, SolveResult};
use crate::options::{NodeOrder, SolverOptions};
use crate::problem::{Constraint, ConstraintOp, LinearProgram};
use crate::solution::{IterationLog, Solution};
use crate::tableau::Tableau;

/// How a node left the search
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Relaxation infeasible or unbounded
    Infeasible,
    /// Relaxation bound no better than the incumbent
    Pruned,
    /// Integral relaxation optimum
    Candidate,
    /// Split on a fractional variable
    Branched,
}

/// One solved subproblem of the general integer search.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub id: usize,
    pub parent: Option<usize>,
    pub depth: usize,
    /// Bound added on top of the parent's subproblem; `None` at the root
    pub constraint: Option<Constraint>,
    /// Relaxation objective in the program's sense
    pub bound: Option<f64>,
    pub values: Vec<f64>,
    pub status: NodeStatus,
    pub iterations: IterationLog<Tableau>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Optimal,
    Infeasible,
    /// Node budget ran out; the incumbent, if any, is the best found so far
    NodeLimit,
}

/// Incumbent and node log threaded through a search.
#[derive(Debug, Clone, Default)]
struct SearchContext {
    /// Incumbent objective in maximization space
    incumbent_value: Option<f64>,
    incumbent: Option<Vec<f64>>,
    nodes: Vec<BranchNode>,
}

impl SearchContext {
    /// Whether a relaxation worth `bound` (maximization space) cannot beat
    /// the incumbent.
    fn dominated(&self, bound: f64, tolerance: f64) -> bool {
        self.incumbent_value.is_some_and(|best| bound <= best + tolerance)
    }

    fn offer(&mut self, value: f64, values: &[f64]) -> bool {
        if self.incumbent_value.is_some_and(|best| value <= best) {
            return false;
        }
        self.incumbent_value = Some(value);
        self.incumbent = Some(values.to_vec());
        true
    }

    fn record(&mut self, node: BranchNode) {
        self.nodes.push(node);
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BranchAndBoundOutcome {
    pub status: SearchStatus,
    pub solution: Option<Solution>,
    pub nodes: Vec<BranchNode>,
}

impl BranchAndBoundOutcome {
    pub fn candidates(&self) -> impl Iterator<Item = &BranchNode> {
        self.nodes.iter().filter(|n| n.status == NodeStatus::Candidate)
    }
}

struct Pending {
    parent: Option<usize>,
    depth: usize,
    program: LinearProgram,
    constraint: Option<Constraint>,
    /// Parent relaxation objective, maximization space
    parent_bound: f64,
    seq: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    /// Higher parent bound first, then creation order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.parent_bound
            .total_cmp(&other.parent_bound)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

enum WorkList {
    Stack(Vec<Pending>),
    Heap(BinaryHeap<Pending>),
}

impl WorkList {
    fn new(order: NodeOrder) -> Self {
        match order {
            NodeOrder::DepthFirst => WorkList::Stack(Vec::new()),
            NodeOrder::BestFirst => WorkList::Heap(BinaryHeap::new()),
        }
    }

    fn pop(&mut self) -> Option<Pending> {
        match self {
            WorkList::Stack(stack) => stack.pop(),
            WorkList::Heap(heap) => heap.pop(),
        }
    }

    fn push(&mut self, pending: Pending) {
        match self {
            WorkList::Stack(stack) => stack.push(pending),
            WorkList::Heap(heap) => heap.push(pending),
        }
    }

    /// Queues both children so that `down` is expanded before `up`.
    fn push_children(&mut self, down: Pending, up: Pending) {
        match self {
            WorkList::Stack(stack) => {
                stack.push(up);
                stack.push(down);
            }
            WorkList::Heap(heap) => {
                heap.push(down);
                heap.push(up);
            }
        }
    }
}

/// Branch and bound over dual simplex relaxations for integer programs.
///
/// Variables marked `int` or `bin` must be integral; a program with no
/// marked variable is treated as pure integer.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    options: SolverOptions,
}

impl BranchAndBound {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn solve(&self, program: &LinearProgram) -> SolveResult<BranchAndBoundOutcome> {
        program.validate()?;
        let dual = DualSimplex::new(self.options);
        let integer = program.integer_variables();
        let n_vars = program.num_variables();
        let tol = self.options.integrality_tolerance;

        let mut ctx = SearchContext::default();
        let mut work = WorkList::new(self.options.node_order);
        let mut seq = 0;
        work.push(Pending {
            parent: None,
            depth: 0,
            program: program.clone(),
            constraint: None,
            parent_bound: f64::INFINITY,
            seq,
        });

        let mut status = None;
        while let Some(pending) = work.pop() {
            if ctx.nodes.len() == self.options.max_nodes {
                warn!("branch and bound: node budget of {} exhausted", self.options.max_nodes);
                status = Some(SearchStatus::NodeLimit);
                break;
            }
            let id = ctx.nodes.len();

            let run = match dual.solve(&pending.program) {
                Ok(run) => run,
                Err(SolveError::Unbounded) if pending.parent.is_none() => {
                    return Err(SolveError::Unbounded);
                }
                Err(e) if e.is_fathomable() => {
                    debug!("node {id}: relaxation {e}");
                    ctx.record(BranchNode {
                        id,
                        parent: pending.parent,
                        depth: pending.depth,
                        constraint: pending.constraint,
                        bound: None,
                        values: Vec::new(),
                        status: NodeStatus::Infeasible,
                        iterations: IterationLog::new(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let z = run.tableau.objective_value();
            let values = run.solution.values;
            let mut node = BranchNode {
                id,
                parent: pending.parent,
                depth: pending.depth,
                constraint: pending.constraint,
                bound: Some(run.solution.objective_value),
                values: values.clone(),
                status: NodeStatus::Pruned,
                iterations: run.iterations,
            };

            if ctx.dominated(z, tol) {
                debug!("node {id}: bound {} pruned", run.solution.objective_value);
                ctx.record(node);
                continue;
            }

            match self.branching_variable(&values, &integer) {
                None => {
                    node.status = self.settle_candidate(program, &mut ctx, id, z, &values);
                }
                Some(i) => {
                    let v = values[i];
                    debug!("node {id}: branching on x{} = {v}", i + 1);
                    let down = Constraint::bound(n_vars, i, ConstraintOp::Le, v.floor());
                    let up = Constraint::bound(n_vars, i, ConstraintOp::Ge, v.ceil());
                    let child = |constraint: Constraint, seq: usize| Pending {
                        parent: Some(id),
                        depth: pending.depth + 1,
                        program: pending.program.with_constraint(constraint.clone()),
                        constraint: Some(constraint),
                        parent_bound: z,
                        seq,
                    };
                    let down = child(down, seq + 1);
                    let up = child(up, seq + 2);
                    seq += 2;
                    work.push_children(down, up);
                    node.status = NodeStatus::Branched;
                }
            }
            ctx.record(node);
        }

        let status = status.unwrap_or(if ctx.incumbent.is_some() {
            SearchStatus::Optimal
        } else {
            SearchStatus::Infeasible
        });
        let solution = match (ctx.incumbent_value, ctx.incumbent.take()) {
            (Some(z), Some(values)) => Some(Solution {
                values,
                objective_value: program.from_max_space(z),
            }),
            _ => None,
        };
        info!(
            "branch and bound: {status:?} after {} nodes, objective {:?}",
            ctx.nodes.len(),
            solution.as_ref().map(|s| s.objective_value)
        );

        Ok(BranchAndBoundOutcome {
            status,
            solution,
            nodes: ctx.nodes,
        })
    }

    /// Offers an integral relaxation as incumbent. A point that breaks an
    /// original constraint is fathomed as infeasible instead.
    fn settle_candidate(
        &self,
        program: &LinearProgram,
        ctx: &mut SearchContext,
        id: usize,
        z: f64,
        values: &[f64],
    ) -> NodeStatus {
        let violations = program.violations(values, self.options.integrality_tolerance);
        if !violations.is_empty() {
            for violation in &violations {
                warn!("node {id}: integral point rejected, {}", violation.description);
            }
            return NodeStatus::Infeasible;
        }
        if ctx.offer(z, values) {
            info!("node {id}: new incumbent {}", program.from_max_space(z));
        }
        NodeStatus::Candidate
    }

    /// Fractional integer variable whose fractional part is closest to 0.5,
    /// lowest index on ties.
    fn branching_variable(&self, values: &[f64], integer: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &i in integer {
            let frac = self.options.fractional_part(values[i]);
            if frac == 0.0 {
                continue;
            }
            let distance = (frac - 0.5).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best.map(|(i, _)| i)
    }
}
