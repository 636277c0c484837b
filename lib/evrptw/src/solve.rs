use std::fmt;
use std::time::{Duration, Instant};
use good_lp::{constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, SolverModel};
use good_lp::Solution as _;
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use tracing::*;

use crate::*;
use crate::graph::Arc;
use crate::model::{LinExpr, Model, Sense};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SolveStatus {
    Optimal,
    /// Stopped by the time limit with an incumbent in hand.
    TimeLimitFeasible,
    Infeasible,
    Unknown,
}

impl SolveStatus {
    /// Whether the status comes with a variable assignment.
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimitFeasible)
    }
}

impl From<SolutionStatus> for SolveStatus {
    fn from(status: SolutionStatus) -> Self {
        match status {
            SolutionStatus::Optimal => SolveStatus::Optimal,
            // gap and time limits both leave an unproven incumbent
            SolutionStatus::TimeLimit | SolutionStatus::GapLimit => SolveStatus::TimeLimitFeasible,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::TimeLimitFeasible => "time-limit-feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    /// Every arc of the model, `true` if the vehicle drives along it.
    pub arc_selection: Map<Arc, bool>,
    /// Values in `Model::variables` order, empty without a solution.
    pub values: Vec<f64>,
    pub runtime: Duration,
}

impl Solution {
    pub fn without_values(status: SolveStatus, runtime: Duration) -> Solution {
        Solution { status, objective_value: None, arc_selection: Map::default(), values: Vec::new(), runtime }
    }

    /// Read a solution off a complete variable assignment.  Binaries count as selected above 0.5.
    pub fn from_values(model: &Model, status: SolveStatus, values: Vec<f64>, runtime: Duration) -> Solution {
        let arc_selection = model.arc_vars()
            .map(|(a, v)| (a, values[v.index()] > 0.5))
            .collect();
        let objective_value = Some(model.objective().eval(&values));
        Solution { status, objective_value, arc_selection, values, runtime }
    }

    pub fn selected_arcs(&self) -> Vec<Arc> {
        let mut arcs: Vec<_> = self.arc_selection.iter()
            .filter_map(|(&a, &on)| if on { Some(a) } else { None })
            .collect();
        arcs.sort_unstable();
        arcs
    }
}

/// Anything that can turn a [`Model`] into a [`Solution`] within a time limit.
pub trait SolverAdapter {
    fn solve(&self, model: &Model, time_limit: Duration) -> Solution;
}

/// Branch-and-bound with the pure-Rust `microlp` backend of `good_lp`.
#[derive(Debug, Copy, Clone, Default)]
pub struct GoodLpSolver;

fn to_expression(expr: &LinExpr, vars: &[good_lp::Variable]) -> Expression {
    expr.terms().iter()
        .map(|&(v, c)| c * vars[v.index()])
        .sum::<Expression>() + expr.constant
}

fn run_backend(model: &Model, time_limit: Duration) -> Result<(SolveStatus, Vec<f64>), ResolutionError> {
    let mut problem = ProblemVariables::new();
    let vars: Vec<_> = model.variables().iter()
        .map(|v| {
            let mut def = variable().min(v.lb);
            if let Some(ub) = v.ub {
                def = def.max(ub);
            }
            if v.binary {
                def = def.binary();
            }
            problem.add(def)
        })
        .collect();

    let mut lp = problem.minimise(to_expression(&model.objective(), &vars))
        .using(microlp)
        .with_time_limit(time_limit.as_secs_f64());
    for c in model.constraints() {
        let lhs = to_expression(&c.lhs, &vars);
        lp = lp.with(match c.sense {
            Sense::Le => constraint::leq(lhs, c.rhs),
            Sense::Ge => constraint::geq(lhs, c.rhs),
            Sense::Eq => constraint::eq(lhs, c.rhs),
        });
    }

    let solution = lp.solve()?;
    let values = vars.iter().map(|&v| solution.value(v)).collect();
    Ok((solution.status().into(), values))
}

impl SolverAdapter for GoodLpSolver {
    #[instrument(level="info", skip(self, model))]
    fn solve(&self, model: &Model, time_limit: Duration) -> Solution {
        let start = Instant::now();
        let result = run_backend(model, time_limit);
        let runtime = start.elapsed();
        let solution = match result {
            Ok((status, values)) => {
                if status == SolveStatus::TimeLimitFeasible {
                    warn!(?time_limit, "time limit reached, returning incumbent");
                }
                Solution::from_values(model, status, values, runtime)
            }
            Err(ResolutionError::Infeasible) => Solution::without_values(SolveStatus::Infeasible, runtime),
            Err(e) => {
                warn!(error=%e, ?time_limit, "no solution found");
                Solution::without_values(SolveStatus::Unknown, runtime)
            }
        };
        info!(status=%solution.status, obj=?solution.objective_value, ?runtime, "solve finished");
        solution
    }
}
