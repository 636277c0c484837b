use std::path::Path;
use fnv::FnvHashMap;
use tracing::*;

pub mod data;
pub mod expand;
pub mod graph;
pub mod model;
pub mod solve;
pub mod routes;

pub use instances::dataset::evrptw::EvrptwInstance;
pub use instances::raw::evrptw::{NodeRecord, NodeKind, FleetParams};

use expand::ExtendedNodeSet;
use graph::ArcSet;
use model::{Model, ModelError};

pub type Map<K, V> = FnvHashMap<K, V>;

/// An index into the extended node space.
pub type Loc = usize;


mod logging_setup {
    use super::*;
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> anyhow::Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p.as_ref())?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.init(); }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.init(); }
                None
            }
        };
        return Ok(flush_guard)
    }

    /// Install the global subscriber: human-readable records on stderr, filtered by `RUST_LOG`,
    /// plus newline-delimited JSON in `logfile` if one is given.  Keep the guard alive until exit.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> anyhow::Result<Option<WorkerGuard>> {
        return build_and_set_global_subscriber(logfile, false);
    }

    #[allow(dead_code)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        return build_and_set_global_subscriber(logfile, true).ok().flatten();
    }
}
pub use logging_setup::*;


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Number of interchangeable copies of each charging station.
    pub station_copies: usize,
    /// Keep `(i, i)` arcs in the arc set and forbid them with a constraint instead.
    pub self_loops: bool,
    /// Objective weight of every vehicle leaving the depot.
    pub vehicle_penalty: f64,
    pub max_vehicles: Option<usize>,
}

pub const DEFAULT_VEHICLE_PENALTY: f64 = 500.0;

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            station_copies: 2,
            self_loops: false,
            vehicle_penalty: DEFAULT_VEHICLE_PENALTY,
            max_vehicles: None,
        }
    }
}

/// The MILP encoding of one instance together with the index space it was built over.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub nodes: ExtendedNodeSet,
    pub arcs: ArcSet,
    pub model: Model,
}

#[instrument(level="info", skip(data), fields(instance=%data.id))]
pub fn encode(data: &EvrptwInstance, options: &EncodeOptions) -> Result<Encoding, ModelError> {
    if options.station_copies == 0 {
        return Err(ModelError::NoStationCopies);
    }
    let nodes = expand::expand(data, options.station_copies);
    let arcs = graph::build_arcs(&nodes, &data.fleet, options.self_loops);
    let model = model::build_model(&nodes, &arcs, &data.fleet, options)?;
    info!(
        nodes=nodes.len(),
        arcs=arcs.len(),
        variables=model.variables().len(),
        constraints=model.constraints().len(),
        "encoded"
    );
    Ok(Encoding { nodes, arcs, model })
}


#[cfg(test)]
pub(crate) mod test_data {
    use super::*;
    use proptest::prelude::*;

    pub const SINGLE: &str = "\
StringID Type x y demand ReadyTime DueDate ServiceTime
D0 d 0.0 0.0 0.0 0.0 1000.0 0.0
C1 c 3.0 4.0 10.0 0.0 1000.0 10.0

Q Vehicle fuel tank capacity /100.0/
C Vehicle load capacity /200.0/
r fuel consumption rate /1.0/
g inverse refueling rate /1.0/
v average Velocity /1.0/
";

    /// A customer that cannot be reached before its due time.
    pub const LATE: &str = "\
StringID Type x y demand ReadyTime DueDate ServiceTime
D0 d 0.0 0.0 0.0 0.0 1000.0 0.0
C1 c 100.0 0.0 10.0 0.0 50.0 10.0

Q Vehicle fuel tank capacity /500.0/
C Vehicle load capacity /200.0/
r fuel consumption rate /1.0/
g inverse refueling rate /1.0/
v average Velocity /1.0/
";

    /// As [`SINGLE`], with a station the vehicle never needs.
    pub const SPARE_STATION: &str = "\
StringID Type x y demand ReadyTime DueDate ServiceTime
D0 d 0.0 0.0 0.0 0.0 1000.0 0.0
S1 f 1.0 1.0 0.0 0.0 1000.0 0.0
C1 c 3.0 4.0 10.0 0.0 1000.0 10.0

Q Vehicle fuel tank capacity /100.0/
C Vehicle load capacity /200.0/
r fuel consumption rate /1.0/
g inverse refueling rate /1.0/
v average Velocity /1.0/
";

    /// The round trip is 20 but the battery holds 12: the vehicle must charge at the station on
    /// the way out and again on the way back.
    pub const RECHARGE_TWICE: &str = "\
StringID Type x y demand ReadyTime DueDate ServiceTime
D0 d 0.0 0.0 0.0 0.0 1000.0 0.0
S1 f 5.0 0.0 0.0 0.0 1000.0 0.0
C1 c 10.0 0.0 10.0 0.0 1000.0 0.0

Q Vehicle fuel tank capacity /12.0/
C Vehicle load capacity /200.0/
r fuel consumption rate /1.0/
g inverse refueling rate /1.0/
v average Velocity /1.0/
";

    /// Two customers whose joint demand exceeds the cargo capacity.
    pub const TWO_VEHICLES: &str = "\
StringID Type x y demand ReadyTime DueDate ServiceTime
D0 d 0.0 0.0 0.0 0.0 1000.0 0.0
C1 c 3.0 4.0 60.0 0.0 1000.0 0.0
C2 c -3.0 4.0 60.0 0.0 1000.0 0.0

Q Vehicle fuel tank capacity /100.0/
C Vehicle load capacity /100.0/
r fuel consumption rate /1.0/
g inverse refueling rate /1.0/
v average Velocity /1.0/
";

    pub fn instance(text: &str) -> EvrptwInstance {
        EvrptwInstance::from_text("test", text).unwrap()
    }

    /// Random instances with one depot placed anywhere among 0-4 stations and 0-9 customers.
    pub fn arb_instance() -> impl Strategy<Value=EvrptwInstance> {
        let record = |kind: NodeKind| {
            (0.0..100.0f64, 0.0..100.0f64, 0.0..30.0f64, 0.0..100.0f64, 100.0..1000.0f64, 0.0..20.0f64)
                .prop_map(move |(x, y, demand, ready_time, due_time, service_time)| NodeRecord {
                    name: String::new(),
                    kind,
                    x,
                    y,
                    demand,
                    ready_time,
                    due_time,
                    service_time,
                })
        };
        (
            record(NodeKind::Depot),
            prop::collection::vec(record(NodeKind::Station), 0..5),
            prop::collection::vec(record(NodeKind::Customer), 0..10),
            any::<prop::sample::Index>(),
        ).prop_map(|(depot, stations, customers, at)| {
            let mut nodes: Vec<_> = stations.into_iter().chain(customers).collect();
            let depot_idx = at.index(nodes.len() + 1);
            nodes.insert(depot_idx, depot);
            EvrptwInstance {
                id: "arb".to_string(),
                nodes,
                fleet: FleetParams {
                    battery_capacity: 100.0,
                    cargo_capacity: 100.0,
                    consumption_rate: 1.0,
                    charge_rate: 1.0,
                    speed: 1.0,
                },
                depot: depot_idx,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_data::*;

    #[test]
    fn encode_is_deterministic() -> anyhow::Result<()> {
        let _g = init_test_logging(None::<&str>);
        let data = instance(SPARE_STATION);
        let a = encode(&data, &EncodeOptions::default())?;
        let b = encode(&instance(SPARE_STATION), &EncodeOptions::default())?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn encode_sizes() -> anyhow::Result<()> {
        let data = instance(SPARE_STATION);
        let enc = encode(&data, &EncodeOptions::default())?;
        // origin, 2 station copies, 1 customer, terminal
        assert_eq!(enc.nodes.len(), 5);
        // sources {0,1,2,3} x sinks {1,2,3,4} without (1,1), (1,2), (2,1), (2,2), (3,3)
        assert_eq!(enc.arcs.len(), 11);
        assert_eq!(enc.model.variables().len(), 3 * 5 + 11);
        Ok(())
    }

    #[test]
    fn zero_station_copies_is_an_error() {
        let opts = EncodeOptions { station_copies: 0, ..Default::default() };
        assert_eq!(encode(&instance(SPARE_STATION), &opts), Err(ModelError::NoStationCopies));
        assert_eq!(encode(&instance(SINGLE), &opts), Err(ModelError::NoStationCopies));
    }
}
