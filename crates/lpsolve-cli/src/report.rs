use std::fmt::{self, Write};

use lpsolve_solver::{
    BranchAndBoundOutcome, CuttingPlaneOutcome, IterationLog, KnapsackOutcome, LinearProgram, RevisedOutcome,
    SearchStatus, SensitivityRange, SensitivityReport, Solution, SolveReport, Tableau,
};

pub fn render_solve(
    program: &LinearProgram,
    report: &SolveReport,
    sensitivity: Option<&SensitivityReport>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    match report {
        SolveReport::Simplex(run) => render_tableaux(&mut out, &run.iterations)?,
        SolveReport::Revised(outcome) => render_revised(&mut out, outcome)?,
        SolveReport::BranchAndBound(outcome) => render_branch_and_bound(&mut out, outcome)?,
        SolveReport::CuttingPlane(outcome) => render_cutting_plane(&mut out, outcome)?,
    }

    let node_limit = matches!(
        report,
        SolveReport::BranchAndBound(outcome) if outcome.status == SearchStatus::NodeLimit
    );
    match (report.solution(), node_limit) {
        (Some(solution), false) => {
            writeln!(out, "Status: OPTIMAL")?;
            writeln!(out, "Objective value: {:.4}", solution.objective_value)?;
            render_values(&mut out, program, solution)?;
        }
        (Some(solution), true) => {
            writeln!(out, "Status: NODE LIMIT")?;
            writeln!(out, "Best found objective value: {:.4} (not proven optimal)", solution.objective_value)?;
            render_values(&mut out, program, solution)?;
        }
        (None, true) => writeln!(out, "Status: NODE LIMIT\nNo integer point found before the node budget ran out.")?,
        (None, false) => writeln!(out, "Status: INFEASIBLE\nNo integer point satisfies the constraints.")?,
    }
    if let Some(sensitivity) = sensitivity {
        render_sensitivity(&mut out, sensitivity)?;
    }
    Ok(out)
}

fn render_tableaux(out: &mut String, log: &IterationLog<Tableau>) -> fmt::Result {
    let last = log.len().saturating_sub(1);
    for (k, tableau) in log.iter().enumerate() {
        let marker = if k == last { " (final)" } else { "" };
        writeln!(out, "Iteration {k}{marker}:")?;
        writeln!(out, "{tableau}")?;
    }
    Ok(())
}

fn render_values(out: &mut String, program: &LinearProgram, solution: &Solution) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "Variables:")?;
    for (i, value) in solution.values.iter().enumerate() {
        writeln!(
            out,
            "  {:6} {:12.4}  ({})",
            LinearProgram::variable_name(i),
            value,
            program.restriction(i)
        )?;
    }
    Ok(())
}

fn render_revised(out: &mut String, outcome: &RevisedOutcome) -> fmt::Result {
    for it in outcome.iterations.iter() {
        writeln!(out, "Iteration {} (phase {}):", it.number, it.phase)?;
        writeln!(out, "  basis:          {}", it.basis.join(", "))?;
        writeln!(out, "  x_B:            {}", numbers(&it.basic_values))?;
        writeln!(out, "  B^-1:")?;
        for row in &it.basis_inverse {
            writeln!(out, "    {}", numbers(row))?;
        }
        writeln!(out, "  shadow prices:  {}", numbers(&it.shadow_prices))?;
        let reduced: Vec<String> = outcome
            .columns
            .iter()
            .zip(&it.reduced_costs)
            .map(|(name, r)| format!("{name}={r:.4}"))
            .collect();
        writeln!(out, "  reduced costs:  {}", reduced.join(", "))?;
        writeln!(out, "  objective:      {:.4}", it.objective)?;
        match (&it.entering, &it.leaving, it.ratio) {
            (Some(entering), Some(leaving), Some(ratio)) => {
                writeln!(out, "  pivot:          {entering} enters, {leaving} leaves (ratio {ratio:.4})")?
            }
            _ => writeln!(out, "  optimal")?,
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_branch_and_bound(out: &mut String, outcome: &BranchAndBoundOutcome) -> fmt::Result {
    for node in &outcome.nodes {
        let parent = node.parent.map_or("-".to_string(), |p| p.to_string());
        let branch = node.constraint.as_ref().map_or("root".to_string(), |c| c.to_string());
        let bound = node.bound.map_or("-".to_string(), |b| format!("{b:.4}"));
        writeln!(
            out,
            "Node {} (parent {parent}, depth {}): {branch}, bound {bound}, {:?}",
            node.id, node.depth, node.status
        )?;
        render_tableaux(out, &node.iterations)?;
    }
    writeln!(out, "Search: {:?} after {} nodes", outcome.status, outcome.nodes.len())?;
    writeln!(out)
}

fn render_cutting_plane(out: &mut String, outcome: &CuttingPlaneOutcome) -> fmt::Result {
    render_tableaux(out, &outcome.iterations)?;
    writeln!(out, "Cuts:")?;
    for cut in &outcome.cuts {
        writeln!(
            out,
            "  {} from row {}: [{}] = {:.4}",
            cut.name,
            cut.source_row,
            numbers(&cut.coefficients),
            cut.rhs
        )?;
    }
    writeln!(out)
}

fn render_sensitivity(out: &mut String, report: &SensitivityReport) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "Sensitivity analysis:")?;
    writeln!(out, "  basis: {}", report.basis.join(", "))?;
    writeln!(out)?;

    if !report.binding_constraints.is_empty() {
        writeln!(out, "Binding constraints:")?;
        for name in &report.binding_constraints {
            writeln!(out, "  - {name}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Shadow prices:")?;
    for sp in &report.shadow_prices {
        writeln!(out, "  {:10} {:10.4}", sp.constraint, sp.value)?;
        writeln!(out, "    {}", sp.interpretation)?;
    }
    writeln!(out)?;

    writeln!(out, "Reduced costs:")?;
    for rc in &report.reduced_costs {
        let basic = if rc.is_basic { "basic" } else { "non-basic" };
        writeln!(
            out,
            "  {:10} value {:10.4}  reduced cost {:10.4}  {basic}",
            rc.variable, rc.value, rc.reduced_cost
        )?;
    }
    writeln!(out)?;

    writeln!(out, "RHS ranges:")?;
    for range in &report.rhs_ranges {
        render_range(out, range)?;
    }
    writeln!(out)?;

    writeln!(out, "Objective coefficient ranges:")?;
    for range in &report.objective_ranges {
        render_range(out, range)?;
    }
    writeln!(out)?;

    writeln!(out, "Primal objective z*:  {:.6}", report.objective_value)?;
    writeln!(out, "Dual objective b'y:   {:.6}", report.dual_objective_value)?;
    let verdict = if report.strong_duality_holds(1e-6) { "holds" } else { "VIOLATED" };
    writeln!(out, "Strong duality {verdict} (gap {:.2e})", report.duality_gap)
}

fn render_range(out: &mut String, range: &SensitivityRange) -> fmt::Result {
    writeln!(
        out,
        "  {:10} current {:10.4}  delta [{}, {}]  range [{}, {}]",
        range.name,
        range.current,
        bound(range.lower_delta),
        bound(range.upper_delta),
        bound(range.lower_bound()),
        bound(range.upper_bound())
    )
}

pub fn render_knapsack(outcome: &KnapsackOutcome) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:10} {:8} {:5} {:24} {:>10} {:>10} {:>10} {:>6} {:10} {:>10}",
        "node", "parent", "depth", "fixed", "value", "capacity", "bound", "frac", "status", "best"
    )?;
    for node in &outcome.nodes {
        writeln!(
            out,
            "{:10} {:8} {:5} {:24} {:>10.2} {:>10.2} {:>10} {:>6} {:10} {:>10.2}",
            node.id,
            node.parent.as_deref().unwrap_or("-"),
            node.depth,
            node.fixed_summary(),
            node.current_value,
            node.remaining_capacity,
            node.upper_bound.map_or("-".to_string(), |b| format!("{b:.2}")),
            node.fractional_item.map_or("-".to_string(), |i| format!("x{i}")),
            format!("{:?}", node.status),
            node.best_value
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Search: {:?} after {} nodes", outcome.status, outcome.nodes.len())?;
    writeln!(out, "Best value: {:.4}", outcome.best_value)?;
    let selected: Vec<String> = outcome
        .selection
        .iter()
        .filter(|&(_, &v)| v == 1)
        .map(|(index, _)| format!("x{index}"))
        .collect();
    writeln!(out, "Selected items: {}", selected.join(", "))?;
    Ok(out)
}

/// Node table in CSV form, one row per explored node.
pub fn knapsack_csv(outcome: &KnapsackOutcome) -> Result<String, fmt::Error> {
    let mut csv = String::new();
    writeln!(
        csv,
        "NodeID,ParentID,Depth,FixedVariables,CurrentValue,RemainingCapacity,UpperBound,FractionalItem,Status,BestAtThisPoint"
    )?;
    for node in &outcome.nodes {
        writeln!(
            csv,
            "{},{},{},\"{}\",{},{},{},{},{:?},{}",
            node.id,
            node.parent.as_deref().unwrap_or(""),
            node.depth,
            node.fixed_summary(),
            node.current_value,
            node.remaining_capacity,
            node.upper_bound.map_or(String::new(), |b| b.to_string()),
            node.fractional_item.map_or(String::new(), |i| format!("x{i}")),
            node.status,
            node.best_value
        )?;
    }
    Ok(csv)
}

fn numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn bound(value: f64) -> String {
    if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:.4}")
    }
}
