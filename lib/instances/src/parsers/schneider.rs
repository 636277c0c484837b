use std::path::Path;
use anyhow::Context;
use itertools::Itertools;

use crate::ParseError;
use crate::raw::evrptw::*;
use super::{
  ParseInstance,
  common::*,
  nom_prelude::*,
};

#[derive(Debug, Copy, Clone)]
pub struct SchneiderFmt<P>(pub P);

impl<P: AsRef<Path>> ParseInstance<SchneiderFmt<P>> for Schneider {
  fn parse(path: SchneiderFmt<P>) -> crate::Result<Schneider> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {:?}", path))?;
    let instance = parse_schneider(&data)
      .with_context(|| format!("failed to parse {:?}", path))?;
    Ok(instance)
  }
}

/// Parse the text of an E-VRPTW instance.
///
/// The first line is a header and is ignored.  Node records follow, one per line, up to the first
/// blank line; everything after it is fleet parameters.  Records may come in any order.
pub fn parse_schneider(input: &str) -> Result<Schneider, ParseError> {
  let mut lines = input.lines()
    .enumerate()
    .map(|(k, l)| (k + 1, l))
    .skip(1);

  let mut nodes = Vec::new();
  for (lineno, line) in &mut lines {
    if line.trim().is_empty() {
      break;
    }
    nodes.push(parsers::node_record(lineno, line)?);
  }

  let mut fleet = FleetSlots::default();
  for (lineno, line) in lines {
    if line.trim().is_empty() {
      continue;
    }
    parsers::fleet_param(lineno, line, &mut fleet)?;
  }

  let depots = nodes.iter().positions(|n| n.kind == NodeKind::Depot).collect_vec();
  if depots.len() != 1 {
    return Err(ParseError::DepotCount(depots.len()));
  }

  Ok(Schneider {
    nodes,
    fleet: fleet.finish()?,
    depot: depots[0],
  })
}

#[derive(Debug, Default)]
struct FleetSlots {
  battery_capacity: Option<f64>,
  cargo_capacity: Option<f64>,
  consumption_rate: Option<f64>,
  charge_rate: Option<f64>,
  speed: Option<f64>,
}

impl FleetSlots {
  fn slot(&mut self, code: char) -> Option<&mut Option<f64>> {
    match code {
      'Q' => Some(&mut self.battery_capacity),
      'C' => Some(&mut self.cargo_capacity),
      'r' => Some(&mut self.consumption_rate),
      'g' => Some(&mut self.charge_rate),
      'v' => Some(&mut self.speed),
      _ => None,
    }
  }

  fn finish(self) -> Result<FleetParams, ParseError> {
    let get = |slot: Option<f64>, name: &'static str| {
      match slot {
        None => Err(ParseError::MissingFleetParam(name)),
        Some(value) if value <= 0.0 => Err(ParseError::NonPositiveFleetParam { name, value }),
        Some(value) => Ok(value),
      }
    };
    Ok(FleetParams {
      battery_capacity: get(self.battery_capacity, "battery capacity")?,
      cargo_capacity: get(self.cargo_capacity, "cargo capacity")?,
      consumption_rate: get(self.consumption_rate, "consumption rate")?,
      charge_rate: get(self.charge_rate, "charge rate")?,
      speed: get(self.speed, "speed")?,
    })
  }
}


mod parsers {
  use super::*;

  //  C20  c  30.0  50.0  10.0  10.0  73.0  90.0
  pub fn node_record(line: usize, text: &str) -> Result<NodeRecord, ParseError> {
    let fields = match tokens::<error::Error<&str>>(text).finish() {
      Ok((_, fields)) => fields,
      Err(_) => return Err(ParseError::FieldCount { line, found: 0 }),
    };
    let found = fields.len();
    let (name, code, x, y, demand, ready, due, service) = fields.into_iter()
      .collect_tuple()
      .ok_or(ParseError::FieldCount { line, found })?;

    let kind = NodeKind::from_code(code)
      .ok_or_else(|| ParseError::UnknownNodeType { line, code: code.to_string() })?;

    Ok(NodeRecord {
      name: name.to_string(),
      kind,
      x: float_field(line, "x", x)?,
      y: float_field(line, "y", y)?,
      demand: float_field(line, "demand", demand)?,
      ready_time: float_field(line, "ready time", ready)?,
      due_time: float_field(line, "due time", due)?,
      service_time: float_field(line, "service time", service)?,
    })
  }

  // Q Vehicle fuel tank capacity /77.75/
  pub(super) fn fleet_param(line: usize, text: &str, fleet: &mut FleetSlots) -> Result<(), ParseError> {
    let text = text.trim();
    let unknown = || ParseError::UnknownFleetParam {
      line,
      label: text.split('/').next().unwrap_or_default().trim().to_string(),
    };
    let code = text.chars().next().ok_or_else(unknown)?;
    let slot = fleet.slot(code).ok_or_else(unknown)?;

    match slash_value::<error::Error<&str>>(text).finish() {
      Ok((_, value)) if value.is_finite() => {
        *slot = Some(value);
        Ok(())
      }
      _ => Err(ParseError::MalformedField { line, field: "fleet parameter", value: text.to_string() }),
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  const TINY: &str = "\
StringID   Type       x          y          demand     ReadyTime  DueDate    ServiceTime
D0         d          40.0       50.0       0.0        0.0        1236.0     0.0
S0         f          40.0       50.0       0.0        0.0        1236.0     0.0
S15        f          39.0       26.0       0.0        0.0        1236.0     0.0
C20        c          30.0       50.0       10.0       10.0       73.0       90.0
C65        c          48.0       40.0       10.0       67.0       139.0      90.0

Q Vehicle fuel tank capacity /77.75/
C Vehicle load capacity /200.0/
r fuel consumption rate /1.0/
g inverse refueling rate /3.39/
v average Velocity /1.0/
";

  fn with_line(line: usize, replacement: &str) -> String {
    replace_line(TINY, line, replacement)
  }

  fn replace_line(base: &str, line: usize, replacement: &str) -> String {
    base.lines()
      .enumerate()
      .map(|(k, l)| if k + 1 == line { replacement } else { l })
      .join("\n")
  }

  #[test]
  fn tiny() -> crate::Result<()> {
    let inst = parse_schneider(TINY)?;
    assert_eq!(inst.nodes.len(), 5);
    assert_eq!(inst.depot, 0);
    assert_eq!(inst.nodes.iter().filter(|n| n.kind == NodeKind::Station).count(), 2);
    assert_eq!(inst.nodes.iter().filter(|n| n.kind == NodeKind::Customer).count(), 2);
    let c20 = &inst.nodes[3];
    assert_eq!(c20.name, "C20");
    assert_eq!((c20.x, c20.y), (30.0, 50.0));
    assert_eq!((c20.demand, c20.ready_time, c20.due_time, c20.service_time), (10.0, 10.0, 73.0, 90.0));
    assert_eq!(inst.fleet, FleetParams {
      battery_capacity: 77.75,
      cargo_capacity: 200.0,
      consumption_rate: 1.0,
      charge_rate: 3.39,
      speed: 1.0,
    });
    Ok(())
  }

  #[test]
  fn depot_need_not_come_first() -> crate::Result<()> {
    let text = with_line(2, "C99 c 1 1 1 0 10 0");
    let text = replace_line(&text, 4, "D1 d 39.0 26.0 0.0 0.0 1236.0 0.0");
    let inst = parse_schneider(&text)?;
    assert_eq!(inst.depot, 2);
    Ok(())
  }

  #[test]
  fn unknown_node_type() {
    let text = with_line(4, "S15 x 39.0 26.0 0.0 0.0 1236.0 0.0");
    assert_eq!(parse_schneider(&text), Err(ParseError::UnknownNodeType { line: 4, code: "x".to_string() }));
  }

  #[test]
  fn unknown_fleet_param() {
    let text = with_line(10, "z something /3.0/");
    assert_eq!(parse_schneider(&text), Err(ParseError::UnknownFleetParam { line: 10, label: "z something".to_string() }));
  }

  #[test]
  fn malformed_fields() {
    let text = with_line(5, "C20 c 30.0 fifty 10.0 10.0 73.0 90.0");
    assert_eq!(parse_schneider(&text), Err(ParseError::MalformedField {
      line: 5,
      field: "y",
      value: "fifty".to_string(),
    }));

    let text = with_line(8, "Q Vehicle fuel tank capacity /lots/");
    assert!(matches!(parse_schneider(&text), Err(ParseError::MalformedField { line: 8, .. })));
  }

  #[test]
  fn wrong_field_count() {
    let text = with_line(5, "C20 c 30.0 50.0 10.0 10.0 73.0");
    assert_eq!(parse_schneider(&text), Err(ParseError::FieldCount { line: 5, found: 7 }));
  }

  #[test]
  fn missing_or_bad_fleet_param() {
    let text = with_line(12, "");
    assert_eq!(parse_schneider(&text), Err(ParseError::MissingFleetParam("speed")));

    let text = with_line(9, "C Vehicle load capacity /0.0/");
    assert_eq!(parse_schneider(&text), Err(ParseError::NonPositiveFleetParam { name: "cargo capacity", value: 0.0 }));
  }

  #[test]
  fn depot_count() {
    let text = with_line(2, "C99 c 1 1 1 0 10 0");
    assert_eq!(parse_schneider(&text), Err(ParseError::DepotCount(0)));

    let text = with_line(3, "D1 d 40.0 50.0 0.0 0.0 1236.0 0.0");
    assert_eq!(parse_schneider(&text), Err(ParseError::DepotCount(2)));
  }

  #[test]
  fn no_fleet_section() {
    let text = TINY.lines().take(6).join("\n");
    assert_eq!(parse_schneider(&text), Err(ParseError::MissingFleetParam("battery capacity")));
  }

  #[test]
  fn missing_file() {
    assert!(Schneider::parse(SchneiderFmt("/does/not/exist.txt")).is_err());
  }
}
