use itertools::iproduct;
use tracing::*;

use crate::*;
use crate::expand::ExtendedNodeSet;
use instances::raw::metrics::{Euclidean, pair_distances_pp};

pub type Arc = (Loc, Loc);

/// Arcs over the extended node space with their lengths and travel times.
///
/// Only arcs leaving `{origin} ∪ stations ∪ customers` and entering
/// `stations ∪ customers ∪ {terminal}` exist.  `(i, i)` arcs and arcs between copies of the same
/// station have zero length and are present only when the set was built with `self_loops`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcSet {
    arcs: Vec<Arc>,
    pub distance: Map<Arc, f64>,
    pub travel_time: Map<Arc, f64>,
    succ: Vec<Vec<Loc>>,
    pred: Vec<Vec<Loc>>,
    pub self_loops: bool,
}

impl ArcSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// All arcs, ordered by tail then head.
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    #[inline]
    pub fn contains(&self, arc: &Arc) -> bool {
        self.distance.contains_key(arc)
    }

    /// Heads of the arcs leaving `i`.
    pub fn succ(&self, i: Loc) -> &[Loc] {
        self.succ.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tails of the arcs entering `j`.
    pub fn pred(&self, j: Loc) -> &[Loc] {
        self.pred.get(j).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dist(&self, i: Loc, j: Loc) -> Option<f64> {
        self.distance.get(&(i, j)).copied()
    }

    pub fn time(&self, i: Loc, j: Loc) -> Option<f64> {
        self.travel_time.get(&(i, j)).copied()
    }
}

#[instrument(level="debug", skip(nodes, fleet))]
pub fn build_arcs(nodes: &ExtendedNodeSet, fleet: &FleetParams, self_loops: bool) -> ArcSet {
    let arcs: Vec<Arc> = iproduct!(nodes.sources(), nodes.sinks())
        .filter(|&(i, j)| self_loops || !(i == j || nodes.same_station(i, j)))
        .collect();

    let distance = pair_distances_pp(Euclidean(), &nodes.coords, arcs.iter().copied(), |d| d);
    let speed = fleet.speed;
    let travel_time = distance.iter().map(|(&a, &d)| (a, d / speed)).collect();

    let mut succ = vec![Vec::new(); nodes.len()];
    let mut pred = vec![Vec::new(); nodes.len()];
    for &(i, j) in &arcs {
        trace!(i, j, dist=?distance.get(&(i, j)));
        succ[i].push(j);
        pred[j].push(i);
    }

    debug!(count=arcs.len(), "built arcs");
    ArcSet { arcs, distance, travel_time, succ, pred, self_loops }
}
