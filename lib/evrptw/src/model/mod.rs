//! A solver-neutral description of a mixed-integer linear program.
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::*;
use crate::graph::Arc;

mod build;
mod lp;

pub use build::build_model;

/// What a variable stands for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum VarKind {
    /// Service start time at a node.
    ArrivalTime,
    /// Load still on board when arriving at a node.
    Cargo,
    /// Battery level when arriving at a node.
    Battery,
    /// Whether a vehicle drives along an arc.
    ArcSelect,
}

impl VarKind {
    pub const NODE_KINDS: [VarKind; 3] = [VarKind::ArrivalTime, VarKind::Cargo, VarKind::Battery];

    fn prefix(&self) -> &'static str {
        match self {
            VarKind::ArrivalTime => "t",
            VarKind::Cargo => "u",
            VarKind::Battery => "b",
            VarKind::ArcSelect => "x",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VarIndex {
    Node(Loc),
    Arc(Loc, Loc),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(&self) -> usize { self.0 }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Variable {
    pub kind: VarKind,
    pub index: VarIndex,
    pub lb: f64,
    pub ub: Option<f64>,
    pub binary: bool,
}

impl Variable {
    pub fn name(&self) -> String {
        match self.index {
            VarIndex::Node(i) => format!("{}_{}", self.kind.prefix(), i),
            VarIndex::Arc(i, j) => format!("{}_{}_{}", self.kind.prefix(), i, j),
        }
    }
}

/// `Σ coef·var + constant`.  Terms are kept sorted by variable with no repeats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self { Self::default() }

    pub fn constant(c: f64) -> Self {
        LinExpr { terms: Vec::new(), constant: c }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn coef(&self, var: VarId) -> f64 {
        match self.terms.binary_search_by_key(&var, |&(v, _)| v) {
            Ok(k) => self.terms[k].1,
            Err(_) => 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        match self.terms.binary_search_by_key(&var, |&(v, _)| v) {
            Ok(k) => {
                self.terms[k].1 += coef;
                if self.terms[k].1 == 0.0 {
                    self.terms.remove(k);
                }
            }
            Err(k) => if coef != 0.0 { self.terms.insert(k, (var, coef)) },
        }
    }

    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.index()]).sum::<f64>() + self.constant
    }
}

impl From<VarId> for LinExpr {
    fn from(v: VarId) -> Self {
        LinExpr { terms: vec![(v, 1.0)], constant: 0.0 }
    }
}

impl From<f64> for LinExpr {
    fn from(c: f64) -> Self { LinExpr::constant(c) }
}

impl std::iter::FromIterator<VarId> for LinExpr {
    fn from_iter<I: IntoIterator<Item=VarId>>(iter: I) -> Self {
        let mut e = LinExpr::new();
        for v in iter {
            e.add_term(v, 1.0);
        }
        e
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        for (v, c) in rhs.terms {
            self.add_term(v, c);
        }
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;
    fn sub(self, rhs: T) -> LinExpr {
        let rhs: LinExpr = rhs.into();
        self + rhs * -1.0
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;
    fn mul(mut self, k: f64) -> LinExpr {
        if k == 0.0 {
            return LinExpr::constant(0.0);
        }
        self.terms.iter_mut().for_each(|t| t.1 *= k);
        self.constant *= k;
        self
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;
    fn mul(self, v: VarId) -> LinExpr {
        LinExpr::constant(0.0) + LinExpr::from(v) * self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        })
    }
}

/// Named constraint families of the E-VRPTW formulation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Family {
    VisitCustomer,
    VisitStation,
    FlowConservation,
    TimeFromCustomer,
    TimeFromStation,
    TimeWindowStart,
    TimeWindowEnd,
    CargoDepletion,
    CargoStart,
    BatteryFromCustomer,
    BatteryFromStation,
    NoSelfLoop,
    MaxVehicles,
}

impl Family {
    pub const ALL: [Family; 13] = [
        Family::VisitCustomer,
        Family::VisitStation,
        Family::FlowConservation,
        Family::TimeFromCustomer,
        Family::TimeFromStation,
        Family::TimeWindowStart,
        Family::TimeWindowEnd,
        Family::CargoDepletion,
        Family::CargoStart,
        Family::BatteryFromCustomer,
        Family::BatteryFromStation,
        Family::NoSelfLoop,
        Family::MaxVehicles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Family::VisitCustomer => "visit_customer",
            Family::VisitStation => "visit_station",
            Family::FlowConservation => "flow",
            Family::TimeFromCustomer => "time_customer",
            Family::TimeFromStation => "time_station",
            Family::TimeWindowStart => "tw_start",
            Family::TimeWindowEnd => "tw_end",
            Family::CargoDepletion => "cargo",
            Family::CargoStart => "cargo_start",
            Family::BatteryFromCustomer => "battery_customer",
            Family::BatteryFromStation => "battery_station",
            Family::NoSelfLoop => "no_self_loop",
            Family::MaxVehicles => "max_vehicles",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `lhs <sense> rhs` with every variable on the left and the constant on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub family: Family,
    pub lhs: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(family: Family, lhs: impl Into<LinExpr>, sense: Sense, rhs: impl Into<LinExpr>) -> Constraint {
        let lhs: LinExpr = lhs.into();
        let mut lhs = lhs - rhs;
        // `+ 0.0` turns a negated zero constant into 0.0
        let rhs = -lhs.constant + 0.0;
        lhs.constant = 0.0;
        Constraint { family, lhs, sense, rhs }
    }

    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let v = self.lhs.eval(values);
        match self.sense {
            Sense::Le => v <= self.rhs + tol,
            Sense::Ge => v >= self.rhs - tol,
            Sense::Eq => (v - self.rhs).abs() <= tol,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ModelError {
    /// A constraint family referred to a node or arc that is not part of the model.
    InconsistentIndexRange { family: Family, index: VarIndex },
    /// Every charging station needs at least one copy in the extended node space.
    NoStationCopies,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InconsistentIndexRange { family, index } =>
                write!(f, "constraint family {} refers to {:?}, which is not in the model", family, index),
            ModelError::NoStationCopies =>
                f.write_str("station_copies must be at least 1"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Variables, constraints and a linear objective to minimise.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    variables: Vec<Variable>,
    node_vars: Map<(VarKind, Loc), VarId>,
    arc_vars: Map<Arc, VarId>,
    constraints: Vec<Constraint>,
    /// Total length of the selected arcs.
    pub distance: LinExpr,
    /// Number of vehicles leaving the depot.
    pub vehicles: LinExpr,
    pub vehicle_penalty: f64,
}

impl Model {
    fn new(vehicle_penalty: f64) -> Model {
        Model {
            variables: Vec::new(),
            node_vars: Map::default(),
            arc_vars: Map::default(),
            constraints: Vec::new(),
            distance: LinExpr::new(),
            vehicles: LinExpr::new(),
            vehicle_penalty,
        }
    }

    fn add_var(&mut self, var: Variable) -> VarId {
        let id = VarId(self.variables.len());
        match var.index {
            VarIndex::Node(i) => { self.node_vars.insert((var.kind, i), id); },
            VarIndex::Arc(i, j) => { self.arc_vars.insert((i, j), id); },
        }
        self.variables.push(var);
        id
    }

    fn add_constraint(&mut self, c: Constraint) {
        self.constraints.push(c);
    }

    fn lookup_node(&self, family: Family, kind: VarKind, i: Loc) -> Result<VarId, ModelError> {
        self.node_var(kind, i)
            .ok_or(ModelError::InconsistentIndexRange { family, index: VarIndex::Node(i) })
    }

    fn lookup_arc(&self, family: Family, i: Loc, j: Loc) -> Result<VarId, ModelError> {
        self.arc_var(i, j)
            .ok_or(ModelError::InconsistentIndexRange { family, index: VarIndex::Arc(i, j) })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn family(&self, family: Family) -> impl Iterator<Item=&Constraint> + '_ {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    pub fn family_sizes(&self) -> Map<Family, usize> {
        let mut sizes = Map::default();
        for c in &self.constraints {
            *sizes.entry(c.family).or_insert(0) += 1;
        }
        sizes
    }

    pub fn node_var(&self, kind: VarKind, i: Loc) -> Option<VarId> {
        self.node_vars.get(&(kind, i)).copied()
    }

    pub fn arc_var(&self, i: Loc, j: Loc) -> Option<VarId> {
        self.arc_vars.get(&(i, j)).copied()
    }

    /// Arc-selection variables in arc order.
    pub fn arc_vars(&self) -> impl Iterator<Item=(Arc, VarId)> + '_ {
        self.variables.iter()
            .enumerate()
            .filter_map(|(k, v)| match v.index {
                VarIndex::Arc(i, j) => Some(((i, j), VarId(k))),
                VarIndex::Node(_) => None,
            })
    }

    /// `distance + vehicle_penalty · vehicles`
    pub fn objective(&self) -> LinExpr {
        self.distance.clone() + self.vehicles.clone() * self.vehicle_penalty
    }
}
