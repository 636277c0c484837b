use std::ops::Range;
use tracing::*;

use crate::*;
use instances::dataset::evrptw::{Time, Demand};

/// Role of an index in the extended node space.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ExtKind {
    Origin,
    Station,
    Customer,
    Terminal,
}

/// The node index space the MILP is built over.
///
/// Indices are laid out as `origin < stations < customers < terminal`.  Every physical charging
/// station occupies `copies` adjacent indices, so a station can be visited up to `copies` times
/// while each index is still visited at most once.  The terminal is a copy of the origin depot,
/// which lets "return to depot" be a visit to a node of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedNodeSet {
    pub coords: Vec<(f64, f64)>,
    pub demand: Vec<Demand>,
    pub tw_start: Vec<Time>,
    pub tw_end: Vec<Time>,
    pub service_time: Vec<Time>,
    /// Position of the originating record in `EvrptwInstance::nodes`.
    pub record: Vec<usize>,
    pub origin: Loc,
    pub stations: Range<Loc>,
    pub customers: Range<Loc>,
    pub terminal: Loc,
    pub copies: usize,
}

impl ExtendedNodeSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_station(&self, i: Loc) -> bool {
        self.stations.contains(&i)
    }

    #[inline]
    pub fn is_customer(&self, i: Loc) -> bool {
        self.customers.contains(&i)
    }

    pub fn kind(&self, i: Loc) -> Option<ExtKind> {
        if i == self.origin {
            Some(ExtKind::Origin)
        } else if self.is_station(i) {
            Some(ExtKind::Station)
        } else if self.is_customer(i) {
            Some(ExtKind::Customer)
        } else if i == self.terminal {
            Some(ExtKind::Terminal)
        } else {
            None
        }
    }

    /// Nodes an arc may leave from: origin, stations and customers.
    pub fn sources(&self) -> impl Iterator<Item=Loc> + Clone {
        std::iter::once(self.origin)
            .chain(self.stations.clone())
            .chain(self.customers.clone())
    }

    /// Nodes an arc may enter: stations, customers and the terminal.
    pub fn sinks(&self) -> impl Iterator<Item=Loc> + Clone {
        self.stations.clone()
            .chain(self.customers.clone())
            .chain(std::iter::once(self.terminal))
    }

    /// The copies of the physical station that `i` belongs to.
    pub fn station_copies(&self, i: Loc) -> Option<Range<Loc>> {
        if !self.is_station(i) {
            return None;
        }
        let first = self.stations.start + (i - self.stations.start) / self.copies * self.copies;
        Some(first..first + self.copies)
    }

    /// Whether `i` and `j` are copies of one physical station (including `i == j`).
    pub fn same_station(&self, i: Loc, j: Loc) -> bool {
        self.station_copies(i).map_or(false, |r| r.contains(&j))
    }

    /// Largest due time over all nodes, used as the big-M of the time constraints.
    pub fn latest_due_time(&self) -> Time {
        self.tw_end.iter().cloned().fold(0.0, f64::max)
    }

    fn push(&mut self, rec_idx: usize, rec: &NodeRecord, demand: Demand) {
        self.coords.push((rec.x, rec.y));
        self.demand.push(demand);
        self.tw_start.push(rec.ready_time);
        self.tw_end.push(rec.due_time);
        self.service_time.push(rec.service_time);
        self.record.push(rec_idx);
    }
}

/// Build the extended node space with `copies` dummy nodes per charging station.
///
/// Panics if `copies` is 0; [`crate::encode`] rejects that case with an error first.
#[instrument(level="debug", skip(data), fields(instance=%data.id))]
pub fn expand(data: &EvrptwInstance, copies: usize) -> ExtendedNodeSet {
    assert!(copies > 0, "every station needs at least one copy");
    let n_stations = data.stations().count();
    let n_customers = data.customers().count();
    let n = 2 + copies * n_stations + n_customers;

    let mut nodes = ExtendedNodeSet {
        coords: Vec::with_capacity(n),
        demand: Vec::with_capacity(n),
        tw_start: Vec::with_capacity(n),
        tw_end: Vec::with_capacity(n),
        service_time: Vec::with_capacity(n),
        record: Vec::with_capacity(n),
        origin: 0,
        stations: 1..1 + copies * n_stations,
        customers: 1 + copies * n_stations..n - 1,
        terminal: n - 1,
        copies,
    };

    let depot = data.depot();
    nodes.push(data.depot, depot, depot.demand);

    for (k, rec) in data.nodes.iter().enumerate().filter(|(_, r)| r.kind == NodeKind::Station) {
        for _ in 0..copies {
            nodes.push(k, rec, 0.0);
        }
    }

    for (k, rec) in data.nodes.iter().enumerate().filter(|(_, r)| r.kind == NodeKind::Customer) {
        nodes.push(k, rec, rec.demand);
    }

    nodes.push(data.depot, depot, depot.demand);

    debug_assert_eq!(nodes.len(), n);
    debug!(n, stations=n_stations, customers=n_customers, copies, "expanded");
    nodes
}
