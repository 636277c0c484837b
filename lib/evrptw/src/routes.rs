use std::fmt;
use std::time::Duration;
use bit_set::BitSet;
use tracing::*;

use crate::*;
use crate::expand::ExtendedNodeSet;
use crate::graph::ArcSet;
use crate::solve::{Solution, SolveStatus};

/// One vehicle's tour in extended indices, from the origin to the terminal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Route {
    pub nodes: Vec<Loc>,
}

impl Route {
    pub fn arcs(&self) -> impl Iterator<Item=(Loc, Loc)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn distance(&self, arcs: &ArcSet) -> f64 {
        self.arcs().filter_map(|(i, j)| arcs.dist(i, j)).fold(0.0, |acc, d| acc + d)
    }

    /// Names of the instance nodes visited, e.g. `D0 S3 C12 D0`.
    pub fn names<'a>(&self, nodes: &ExtendedNodeSet, data: &'a EvrptwInstance) -> Vec<&'a str> {
        self.nodes.iter()
            .map(|&i| data.nodes[nodes.record[i]].name.as_str())
            .collect()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RouteError {
    /// The chain of selected arcs starting with `(origin, start)` does not lead to the terminal:
    /// `at` has no unique unvisited successor.
    BrokenChain { start: Loc, at: Loc },
    /// A selected arc that no route from the origin passes along.
    UnreachedArc { from: Loc, to: Loc },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::BrokenChain { start, at } =>
                write!(f, "route leaving the depot towards {} breaks off at node {}", start, at),
            RouteError::UnreachedArc { from, to } =>
                write!(f, "selected arc ({}, {}) is not on any route", from, to),
        }
    }
}

impl std::error::Error for RouteError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Routes(Vec<Route>),
    /// The solver gave no assignment to read routes from.
    Unsolved(SolveStatus),
}

#[instrument(level="info", skip(solution, nodes), fields(status=%solution.status))]
pub fn extract_routes(solution: &Solution, nodes: &ExtendedNodeSet) -> Result<Extraction, RouteError> {
    if !solution.status.has_solution() {
        return Ok(Extraction::Unsolved(solution.status));
    }

    let selected = solution.selected_arcs();
    let mut succ: Vec<Vec<Loc>> = vec![Vec::new(); nodes.len()];
    for &(i, j) in &selected {
        succ[i].push(j);
    }

    let mut visited = BitSet::with_capacity(nodes.len());
    let mut covered = 0;
    let mut routes = Vec::new();

    for &start in &succ[nodes.origin] {
        let broken = RouteError::BrokenChain { start, at: nodes.origin };
        if start != nodes.terminal && !visited.insert(start) {
            return Err(broken);
        }
        let mut route = vec![nodes.origin, start];
        covered += 1;
        let mut current = start;

        while current != nodes.terminal {
            let broken = RouteError::BrokenChain { start, at: current };
            if route.len() > nodes.len() {
                return Err(broken);
            }
            let next = match succ[current].as_slice() {
                &[next] => next,
                _ => return Err(broken),
            };
            if next != nodes.terminal && !visited.insert(next) {
                return Err(broken);
            }
            trace!(from=current, to=next);
            route.push(next);
            covered += 1;
            current = next;
        }
        routes.push(Route { nodes: route });
    }

    if covered < selected.len() {
        let on_route: Map<_, _> = routes.iter()
            .flat_map(|r| r.arcs())
            .map(|a| (a, ()))
            .collect();
        if let Some(&(from, to)) = selected.iter().find(|a| !on_route.contains_key(*a)) {
            return Err(RouteError::UnreachedArc { from, to });
        }
    }

    debug!(routes=routes.len(), "extracted routes");
    Ok(Extraction::Routes(routes))
}

/// What a caller reports about a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub status: SolveStatus,
    pub routes: Vec<Route>,
    /// Recomputed from the arc lengths along every route.
    pub total_distance: f64,
    pub vehicles: usize,
    pub vehicle_penalty: f64,
    pub objective_value: Option<f64>,
    pub solve_time: Duration,
}

pub fn summarize(solution: &Solution, enc: &Encoding) -> Result<PlanSummary, RouteError> {
    let routes = match extract_routes(solution, &enc.nodes)? {
        Extraction::Routes(routes) => routes,
        Extraction::Unsolved(_) => Vec::new(),
    };
    // an empty f64 sum is -0.0
    let total_distance = routes.iter().fold(0.0, |acc, r| acc + r.distance(&enc.arcs));
    let vehicles = routes.len();
    Ok(PlanSummary {
        status: solution.status,
        total_distance,
        vehicles,
        vehicle_penalty: vehicles as f64 * enc.model.vehicle_penalty,
        objective_value: solution.objective_value,
        solve_time: solution.runtime,
        routes,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::{GoodLpSolver, SolverAdapter};
    use crate::test_data::*;

    fn with_arcs(enc: &Encoding, selected: &[(Loc, Loc)]) -> Solution {
        let arc_selection = enc.arcs.arcs().iter()
            .map(|a| (*a, selected.contains(a)))
            .collect();
        Solution {
            status: SolveStatus::Optimal,
            objective_value: None,
            arc_selection,
            values: Vec::new(),
            runtime: Duration::from_millis(1),
        }
    }

    fn spare_station() -> Encoding {
        encode(&instance(SPARE_STATION), &EncodeOptions::default()).unwrap()
    }

    #[test]
    fn follow_chain() {
        let enc = spare_station();
        let sol = with_arcs(&enc, &[(0, 1), (1, 3), (3, 4)]);
        let routes = extract_routes(&sol, &enc.nodes).unwrap();
        assert_eq!(routes, Extraction::Routes(vec![Route { nodes: vec![0, 1, 3, 4] }]));
    }

    #[test]
    fn dangling_arc() {
        let enc = spare_station();
        let sol = with_arcs(&enc, &[(0, 3)]);
        assert_eq!(extract_routes(&sol, &enc.nodes), Err(RouteError::BrokenChain { start: 3, at: 3 }));
    }

    #[test]
    fn cycle() {
        let enc = spare_station();
        let sol = with_arcs(&enc, &[(0, 1), (1, 3), (3, 1)]);
        assert_eq!(extract_routes(&sol, &enc.nodes), Err(RouteError::BrokenChain { start: 1, at: 3 }));
    }

    #[test]
    fn two_successors() {
        let enc = spare_station();
        let sol = with_arcs(&enc, &[(0, 3), (3, 1), (3, 4), (1, 4)]);
        assert_eq!(extract_routes(&sol, &enc.nodes), Err(RouteError::BrokenChain { start: 3, at: 3 }));
    }

    #[test]
    fn disconnected_subtour() {
        let opts = EncodeOptions { self_loops: true, ..Default::default() };
        let enc = encode(&instance(SPARE_STATION), &opts).unwrap();
        let sol = with_arcs(&enc, &[(0, 3), (3, 4), (1, 2), (2, 1)]);
        assert_eq!(extract_routes(&sol, &enc.nodes), Err(RouteError::UnreachedArc { from: 1, to: 2 }));
    }

    #[test]
    fn unsolved_has_no_routes() {
        let enc = spare_station();
        let sol = Solution::without_values(SolveStatus::Infeasible, Duration::from_secs(1));
        assert_eq!(extract_routes(&sol, &enc.nodes), Ok(Extraction::Unsolved(SolveStatus::Infeasible)));
        let summary = summarize(&sol, &enc).unwrap();
        assert!(summary.routes.is_empty());
        assert_eq!(summary.vehicles, 0);
        assert_eq!(summary.objective_value, None);
        assert_eq!(summary.total_distance, 0.0);
        assert!(summary.total_distance.is_sign_positive());
        assert!(Route { nodes: vec![0] }.distance(&enc.arcs).is_sign_positive());
    }

    #[test]
    fn spare_station_plan_summarises() -> anyhow::Result<()> {
        let _g = init_test_logging(None::<&str>);
        let data = instance(SPARE_STATION);
        for &copies in &[1, 2, 3] {
            let opts = EncodeOptions { station_copies: copies, ..Default::default() };
            let enc = encode(&data, &opts)?;
            let sol = GoodLpSolver.solve(&enc.model, Duration::from_secs(60));
            assert_eq!(sol.status, SolveStatus::Optimal);
            let summary = summarize(&sol, &enc)?;
            let customer = enc.nodes.customers.start;
            assert_eq!(summary.routes, vec![Route { nodes: vec![enc.nodes.origin, customer, enc.nodes.terminal] }]);
            assert!((summary.total_distance - 10.0).abs() < 1e-6, "{}", summary.total_distance);
        }
        Ok(())
    }

    #[test]
    fn route_names() {
        let data = instance(SPARE_STATION);
        let enc = encode(&data, &EncodeOptions::default()).unwrap();
        let route = Route { nodes: vec![0, 2, 3, 4] };
        assert_eq!(route.names(&enc.nodes, &data), vec!["D0", "S1", "C1", "D0"]);
        let expected = 2f64.sqrt() + 13f64.sqrt() + 5.0;
        assert!((route.distance(&enc.arcs) - expected).abs() < 1e-9);
    }

    #[test]
    fn distance_matches_objective() -> anyhow::Result<()> {
        let _g = init_test_logging(None::<&str>);
        for text in &[SINGLE, RECHARGE_TWICE, TWO_VEHICLES] {
            let enc = encode(&instance(text), &EncodeOptions::default())?;
            let sol = GoodLpSolver.solve(&enc.model, Duration::from_secs(60));
            assert_eq!(sol.status, SolveStatus::Optimal);
            let summary = summarize(&sol, &enc)?;
            let modelled = enc.model.distance.eval(&sol.values);
            assert!((summary.total_distance - modelled).abs() < 1e-6, "{} vs {}", summary.total_distance, modelled);
            let obj = summary.objective_value.unwrap();
            assert!((summary.total_distance + summary.vehicle_penalty - obj).abs() < 1e-6);
            for r in &summary.routes {
                assert_eq!(r.nodes.first(), Some(&enc.nodes.origin));
                assert_eq!(r.nodes.last(), Some(&enc.nodes.terminal));
            }
        }
        Ok(())
    }
}
