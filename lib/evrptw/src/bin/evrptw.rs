use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::*;

use evrptw::*;
use evrptw::data::get_instance;
use evrptw::routes::{summarize, PlanSummary};
use evrptw::solve::{GoodLpSolver, SolverAdapter};

mod common;
use common::*;

#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Instance file, or the name of an instance in $DATA_ROOT/EVRPTW_schneider
    instance: String,
    /// Solver time limit in seconds
    #[structopt(long, default_value="500", validator=clap_float_validator(Some(0.0), None))]
    time_limit: f64,
    /// Objective cost of every vehicle used
    #[structopt(long, default_value="500", validator=clap_float_validator(None, None))]
    penalty: f64,
    #[structopt(long, default_value="2", validator=clap_range_validator(Some(1), None))]
    station_copies: usize,
    #[structopt(long)]
    max_vehicles: Option<usize>,
    /// Keep (i, i) arcs and forbid them with constraints
    #[structopt(long)]
    self_loops: bool,
    /// Write the model in CPLEX LP format before solving
    #[structopt(long)]
    write_lp: Option<PathBuf>,
    #[structopt(flatten)]
    output: OutputOptions,
}

struct Report<'a> {
    data: &'a EvrptwInstance,
    enc: &'a Encoding,
    summary: PlanSummary,
}

impl Report<'_> {
    fn summary_json(&self) -> json::JsonValue {
        let s = &self.summary;
        let model = &self.enc.model;
        json::object! {
            instance: self.data.id.as_str(),
            status: s.status.to_string(),
            objective: s.objective_value,
            total_distance: s.total_distance,
            vehicles: s.vehicles,
            vehicle_penalty: s.vehicle_penalty,
            solve_time: s.solve_time.as_secs_f64(),
            model: json::object! {
                nodes: self.enc.nodes.len(),
                arcs: self.enc.arcs.len(),
                variables: model.variables().len(),
                constraints: model.constraints().len(),
            },
        }
    }
}

impl JsonReport for Report<'_> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let mut root = self.summary_json();
        let routes: Vec<json::JsonValue> = self.summary.routes.iter()
            .map(|r| json::object! {
                nodes: r.nodes.clone(),
                names: r.names(&self.enc.nodes, self.data),
                distance: r.distance(&self.enc.arcs),
            })
            .collect();
        root["routes"] = routes.into();
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        self.summary_json().write_pretty(&mut buf, 2)?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.as_ref())?;
    debug!(?args);

    let data = get_instance(&args.instance)?;
    let options = EncodeOptions {
        station_copies: args.station_copies,
        self_loops: args.self_loops,
        vehicle_penalty: args.penalty,
        max_vehicles: args.max_vehicles,
    };
    let enc = encode(&data, &options)?;

    if let Some(path) = args.write_lp.as_ref() {
        let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
        let mut writer = BufWriter::new(file);
        enc.model.write_lp(&mut writer)?;
        writer.flush()?;
        info!(?path, "wrote LP file");
    }

    let time_limit = Duration::try_from_secs_f64(args.time_limit)
        .with_context(|| format!("time limit of {} seconds is out of range", args.time_limit))?;
    let solution = GoodLpSolver.solve(&enc.model, time_limit);
    let summary = summarize(&solution, &enc)?;
    for r in &summary.routes {
        info!(route=%r.names(&enc.nodes, &data).join(" "), distance=r.distance(&enc.arcs));
    }
    output_report(&args.output, Report { data: &data, enc: &enc, summary })?;
    Ok(())
}
