pub type Time = f64;
pub type Demand = f64;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeKind {
  Depot,
  Customer,
  Station,
}

impl NodeKind {
  pub fn from_code(code: &str) -> Option<NodeKind> {
    match code {
      "d" => Some(NodeKind::Depot),
      "c" => Some(NodeKind::Customer),
      "f" => Some(NodeKind::Station),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
  pub name: String,
  pub kind: NodeKind,
  pub x: f64,
  pub y: f64,
  pub demand: Demand,
  pub ready_time: Time,
  pub due_time: Time,
  pub service_time: Time,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FleetParams {
  pub battery_capacity: f64,
  pub cargo_capacity: Demand,
  pub consumption_rate: f64,
  /// Time needed to recharge one unit of battery.
  pub charge_rate: f64,
  pub speed: f64,
}

/// An instance in the layout of Schneider et al. (2014): node list, blank line, fleet parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Schneider {
  pub nodes: Vec<NodeRecord>,
  pub fleet: FleetParams,
  /// Index of the (unique) depot record in `nodes`.
  pub depot: usize,
}
