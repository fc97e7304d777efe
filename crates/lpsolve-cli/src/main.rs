mod report;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use lpsolve_lang::{KnapsackParser, ModelParser};
use lpsolve_solver::{LinearProgram, Method, NodeOrder, SolveError, Solver, SolverOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lpsolve")]
#[command(about = "Tableau-level LP and integer programming solver", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model and print every iteration
    Solve {
        /// The model file
        file: PathBuf,
        /// primal, dual, revised, branch-and-bound or cutting-plane
        #[arg(short, long, default_value = "primal")]
        method: Method,
        /// Append a sensitivity analysis of the final tableau
        #[arg(short, long)]
        sensitivity: bool,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pivot budget per simplex run
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Branch-and-bound node budget
        #[arg(long)]
        max_nodes: Option<usize>,
        /// Gomory cut budget
        #[arg(long)]
        max_cuts: Option<usize>,
        /// Pivot and sign tolerance
        #[arg(long)]
        tolerance: Option<f64>,
        /// Explore branch-and-bound nodes best bound first
        #[arg(long)]
        best_first: bool,
    },
    /// Solve a 0/1 knapsack item file by branch and bound
    Knapsack {
        /// The item file
        file: PathBuf,
        /// Capacity, overriding the file's capacity= line
        #[arg(short, long)]
        capacity: Option<f64>,
        /// Export the node table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Node budget
        #[arg(long)]
        max_nodes: Option<usize>,
    },
    /// Check a model file for errors
    Check {
        /// The model file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            method,
            sensitivity,
            format,
            output,
            max_iterations,
            max_nodes,
            max_cuts,
            tolerance,
            best_first,
        } => {
            let program = read_model(&file);

            let mut options = SolverOptions::new();
            if let Some(max) = max_iterations {
                options = options.with_max_iterations(max);
            }
            if let Some(max) = max_nodes {
                options = options.with_max_nodes(max);
            }
            if let Some(max) = max_cuts {
                options = options.with_max_cuts(max);
            }
            if let Some(tol) = tolerance {
                options = options.with_tolerance(tol);
            }
            if best_first {
                options = options.with_node_order(NodeOrder::BestFirst);
            }
            let solver = Solver::new().with_options(options);

            let report = solver
                .solve(&program, method)
                .unwrap_or_else(|e| fail_solve(&e));

            let analysis = if sensitivity {
                match report.final_tableau() {
                    Some(tableau) => Some(
                        solver
                            .sensitivity(&program, tableau)
                            .unwrap_or_else(|e| fail_solve(&e)),
                    ),
                    None => {
                        eprintln!("Sensitivity analysis needs a primal or dual simplex solve, skipping it");
                        None
                    }
                }
            } else {
                None
            };

            let text = if format == "json" {
                let value = serde_json::json!({
                    "method": method.to_string(),
                    "program": program,
                    "report": report,
                    "sensitivity": analysis,
                });
                serde_json::to_string_pretty(&value).unwrap_or_else(|e| {
                    eprintln!("Error encoding JSON: {}", e);
                    std::process::exit(1);
                })
            } else {
                report::render_solve(&program, &report, analysis.as_ref()).unwrap_or_else(|e| {
                    eprintln!("Error rendering report: {}", e);
                    std::process::exit(1);
                })
            };
            emit(&text, output.as_deref());
        }
        Commands::Knapsack {
            file,
            capacity,
            csv,
            max_nodes,
        } => {
            let source = read_source(&file);
            let problem = KnapsackParser::load(&source, capacity).unwrap_or_else(|e| {
                eprintln!("Parse error: {}", e);
                std::process::exit(1);
            });

            let mut options = SolverOptions::new();
            if let Some(max) = max_nodes {
                options = options.with_max_nodes(max);
            }
            let outcome = Solver::new()
                .with_options(options)
                .knapsack(&problem)
                .unwrap_or_else(|e| fail_solve(&e));

            match report::render_knapsack(&outcome) {
                Ok(text) => print!("{}", text),
                Err(e) => {
                    eprintln!("Error rendering report: {}", e);
                    std::process::exit(1);
                }
            }
            if let Some(path) = csv {
                match report::knapsack_csv(&outcome) {
                    Ok(table) => {
                        emit(&table, Some(&path));
                        println!("Node table written to {}", path.display());
                    }
                    Err(e) => {
                        eprintln!("Error rendering CSV: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Commands::Check { file } => {
            let program = read_model(&file);
            if let Err(e) = program.validate() {
                eprintln!("Invalid model: {}", e);
                std::process::exit(1);
            }

            let integers = program.restrictions.iter().filter(|r| r.is_integer()).count();
            println!("OK: {}", file.display());
            println!(
                "  {} problem with {} variables ({} integer), {} constraints",
                if program.is_maximization() { "Maximization" } else { "Minimization" },
                program.num_variables(),
                integers,
                program.num_constraints()
            );
            for (j, constraint) in program.constraints.iter().enumerate() {
                println!("  c{}: {}", j + 1, constraint);
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_source(file: &Path) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_model(file: &Path) -> LinearProgram {
    let source = read_source(file);
    match ModelParser::parse(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn fail_solve(error: &SolveError) -> ! {
    match error {
        SolveError::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No solution exists that satisfies all constraints.");
        }
        SolveError::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal solution.");
        }
        other => eprintln!("Solver error: {}", other),
    }
    std::process::exit(1);
}

fn emit(text: &str, output: Option<&Path>) {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                eprintln!("Error writing {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
        None => print!("{}", text),
    }
}
