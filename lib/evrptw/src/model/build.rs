use std::iter::once;
use tracing::*;

use super::*;
use crate::{EncodeOptions, FleetParams, Loc};
use crate::expand::ExtendedNodeSet;
use crate::graph::ArcSet;

/// Assemble the E-VRPTW formulation over `nodes` and `arcs`.
///
/// Variables come first in a fixed order (`t`, `u`, `b` per node, then `x` per arc) so that two
/// builds from the same input produce identical models.
#[instrument(level="info", skip(nodes, arcs, fleet))]
pub fn build_model(
    nodes: &ExtendedNodeSet,
    arcs: &ArcSet,
    fleet: &FleetParams,
    options: &EncodeOptions,
) -> Result<Model, ModelError> {
    let mut model = Model::new(options.vehicle_penalty);

    for &kind in VarKind::NODE_KINDS.iter() {
        for i in 0..nodes.len() {
            model.add_var(Variable { kind, index: VarIndex::Node(i), lb: 0.0, ub: None, binary: false });
        }
    }
    let mut distance = LinExpr::new();
    for &(i, j) in arcs.arcs() {
        let x = model.add_var(Variable {
            kind: VarKind::ArcSelect,
            index: VarIndex::Arc(i, j),
            lb: 0.0,
            ub: Some(1.0),
            binary: true,
        });
        match arcs.dist(i, j) {
            Some(d) if i != j => distance.add_term(x, d),
            _ => {},
        }
    }
    model.distance = distance;

    let mut b = Builder { model, nodes, arcs, fleet };
    b.visits()?;
    b.flow_conservation()?;
    b.time_propagation()?;
    b.time_windows()?;
    b.cargo()?;
    b.battery()?;
    if arcs.self_loops {
        b.no_self_loops()?;
    }
    b.vehicles(options.max_vehicles)?;

    let model = b.model;
    debug!(sizes=?model.family_sizes(), "constraint families");
    Ok(model)
}

struct Builder<'a> {
    model: Model,
    nodes: &'a ExtendedNodeSet,
    arcs: &'a ArcSet,
    fleet: &'a FleetParams,
}

impl<'a> Builder<'a> {
    fn t(&self, family: Family, i: Loc) -> Result<VarId, ModelError> {
        self.model.lookup_node(family, VarKind::ArrivalTime, i)
    }

    fn u(&self, family: Family, i: Loc) -> Result<VarId, ModelError> {
        self.model.lookup_node(family, VarKind::Cargo, i)
    }

    fn b(&self, family: Family, i: Loc) -> Result<VarId, ModelError> {
        self.model.lookup_node(family, VarKind::Battery, i)
    }

    fn x(&self, family: Family, i: Loc, j: Loc) -> Result<VarId, ModelError> {
        self.model.lookup_arc(family, i, j)
    }

    fn travel_time(&self, family: Family, i: Loc, j: Loc) -> Result<f64, ModelError> {
        self.arcs.time(i, j).ok_or(ModelError::InconsistentIndexRange { family, index: VarIndex::Arc(i, j) })
    }

    fn dist(&self, family: Family, i: Loc, j: Loc) -> Result<f64, ModelError> {
        self.arcs.dist(i, j).ok_or(ModelError::InconsistentIndexRange { family, index: VarIndex::Arc(i, j) })
    }

    fn node_attr(&self, family: Family, attr: &[f64], i: Loc) -> Result<f64, ModelError> {
        attr.get(i).copied().ok_or(ModelError::InconsistentIndexRange { family, index: VarIndex::Node(i) })
    }

    /// Arcs leaving `i`, ignoring `(i, i)`.
    fn out_arcs(&self, i: Loc) -> impl Iterator<Item=Loc> + 'a {
        let arcs = self.arcs;
        arcs.succ(i).iter().copied().filter(move |&j| j != i)
    }

    /// Arcs entering `j`, ignoring `(j, j)`.
    fn in_arcs(&self, j: Loc) -> impl Iterator<Item=Loc> + 'a {
        let arcs = self.arcs;
        arcs.pred(j).iter().copied().filter(move |&i| i != j)
    }

    fn out_sum(&self, family: Family, i: Loc) -> Result<LinExpr, ModelError> {
        self.out_arcs(i).map(|j| self.x(family, i, j)).collect::<Result<LinExpr, _>>()
    }

    /// `m·(1 - x)`
    fn slack(m: f64, x: VarId) -> LinExpr {
        LinExpr::constant(m) - m * x
    }

    fn add(&mut self, family: Family, lhs: impl Into<LinExpr>, sense: Sense, rhs: impl Into<LinExpr>) {
        self.model.add_constraint(Constraint::new(family, lhs, sense, rhs));
    }

    /// Each customer is left exactly once, each station copy at most once.
    fn visits(&mut self) -> Result<(), ModelError> {
        for c in self.nodes.customers.clone() {
            let lhs = self.out_sum(Family::VisitCustomer, c)?;
            self.add(Family::VisitCustomer, lhs, Sense::Eq, 1.0);
        }
        for s in self.nodes.stations.clone() {
            let lhs = self.out_sum(Family::VisitStation, s)?;
            self.add(Family::VisitStation, lhs, Sense::Le, 1.0);
        }
        Ok(())
    }

    fn flow_conservation(&mut self) -> Result<(), ModelError> {
        let family = Family::FlowConservation;
        for v in self.nodes.stations.clone().chain(self.nodes.customers.clone()) {
            let inflow = self.in_arcs(v).map(|i| self.x(family, i, v)).collect::<Result<LinExpr, _>>()?;
            let outflow = self.out_sum(family, v)?;
            self.add(family, inflow - outflow, Sense::Eq, 0.0);
        }
        Ok(())
    }

    /// Big-M precedence on arrival times.  Leaving a station additionally takes the time to charge
    /// back to full: `g·(Q - b[i])`.
    fn time_propagation(&mut self) -> Result<(), ModelError> {
        let big_m = self.nodes.latest_due_time();
        let q = self.fleet.battery_capacity;
        let g = self.fleet.charge_rate;

        let family = Family::TimeFromCustomer;
        for i in once(self.nodes.origin).chain(self.nodes.customers.clone()) {
            let service = self.node_attr(family, &self.nodes.service_time, i)?;
            for j in self.out_arcs(i) {
                let x = self.x(family, i, j)?;
                let tt = self.travel_time(family, i, j)?;
                // t[i] + (tt + s[i])·x - M·(1 - x) <= t[j]
                let lhs = LinExpr::from(self.t(family, i)?) + (tt + service) * x - Self::slack(big_m, x);
                let rhs = self.t(family, j)?;
                self.add(family, lhs, Sense::Le, rhs);
            }
        }

        let family = Family::TimeFromStation;
        let big_m = big_m + q * g;
        for i in self.nodes.stations.clone() {
            for j in self.out_arcs(i) {
                let x = self.x(family, i, j)?;
                let tt = self.travel_time(family, i, j)?;
                // t[i] + tt·x + g·(Q - b[i]) - (M + Q·g)·(1 - x) <= t[j]
                let lhs = LinExpr::from(self.t(family, i)?)
                    + tt * x
                    + (LinExpr::constant(g * q) - g * self.b(family, i)?)
                    - Self::slack(big_m, x);
                let rhs = self.t(family, j)?;
                self.add(family, lhs, Sense::Le, rhs);
            }
        }
        Ok(())
    }

    fn time_windows(&mut self) -> Result<(), ModelError> {
        for v in 0..self.nodes.len() {
            let start = self.node_attr(Family::TimeWindowStart, &self.nodes.tw_start, v)?;
            let t = self.t(Family::TimeWindowStart, v)?;
            self.add(Family::TimeWindowStart, t, Sense::Ge, start);

            let end = self.node_attr(Family::TimeWindowEnd, &self.nodes.tw_end, v)?;
            let t = self.t(Family::TimeWindowEnd, v)?;
            self.add(Family::TimeWindowEnd, t, Sense::Le, end);
        }
        Ok(())
    }

    fn cargo(&mut self) -> Result<(), ModelError> {
        let cap = self.fleet.cargo_capacity;
        let family = Family::CargoDepletion;
        for i in self.nodes.sources() {
            let demand = self.node_attr(family, &self.nodes.demand, i)?;
            for j in self.out_arcs(i) {
                let x = self.x(family, i, j)?;
                // u[j] <= u[i] - q[i]·x + C·(1 - x)
                let rhs = LinExpr::from(self.u(family, i)?) - demand * x + Self::slack(cap, x);
                let lhs = self.u(family, j)?;
                self.add(family, lhs, Sense::Le, rhs);
            }
        }

        let origin = self.nodes.origin;
        let u0 = self.u(Family::CargoStart, origin)?;
        self.add(Family::CargoStart, u0, Sense::Le, cap);
        Ok(())
    }

    fn battery(&mut self) -> Result<(), ModelError> {
        let q = self.fleet.battery_capacity;
        let h = self.fleet.consumption_rate;

        let family = Family::BatteryFromCustomer;
        for i in self.nodes.customers.clone() {
            for j in self.out_arcs(i) {
                let x = self.x(family, i, j)?;
                let used = h * self.dist(family, i, j)?;
                // b[j] <= b[i] - h·d·x + Q·(1 - x)
                let rhs = LinExpr::from(self.b(family, i)?) - used * x + Self::slack(q, x);
                let lhs = self.b(family, j)?;
                self.add(family, lhs, Sense::Le, rhs);
            }
        }

        let family = Family::BatteryFromStation;
        for i in once(self.nodes.origin).chain(self.nodes.stations.clone()) {
            for j in self.out_arcs(i) {
                let x = self.x(family, i, j)?;
                let used = h * self.dist(family, i, j)?;
                // b[j] <= Q - h·d·x
                let rhs = LinExpr::constant(q) - used * x;
                let lhs = self.b(family, j)?;
                self.add(family, lhs, Sense::Le, rhs);
            }
        }
        Ok(())
    }

    fn no_self_loops(&mut self) -> Result<(), ModelError> {
        let family = Family::NoSelfLoop;
        let arcs = self.arcs;
        for &(i, j) in arcs.arcs() {
            if i == j || self.nodes.same_station(i, j) {
                let x = self.x(family, i, j)?;
                self.add(family, x, Sense::Eq, 0.0);
            }
        }
        Ok(())
    }

    /// Arcs leaving the depot, one per vehicle used.
    fn vehicles(&mut self, max_vehicles: Option<usize>) -> Result<(), ModelError> {
        let origin = self.nodes.origin;
        let vehicles = self.out_sum(Family::MaxVehicles, origin)?;
        if let Some(k) = max_vehicles {
            self.add(Family::MaxVehicles, vehicles.clone(), Sense::Le, k as f64);
        }
        self.model.vehicles = vehicles;
        Ok(())
    }
}
