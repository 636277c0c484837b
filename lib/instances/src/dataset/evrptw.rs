use super::*;
use crate::parsers::{ParseInstance, SchneiderFmt};
use crate::raw::{
  FromRaw,
  evrptw::{Schneider, NodeRecord, NodeKind, FleetParams},
};

pub use crate::raw::evrptw::{Time, Demand};

/// A parsed E-VRPTW instance.  Records keep their file order.
#[derive(Debug, Clone, PartialEq)]
pub struct EvrptwInstance {
  pub id: String,
  pub nodes: Vec<NodeRecord>,
  pub fleet: FleetParams,
  pub depot: usize,
}

impl FromRaw<Schneider> for EvrptwInstance {
  fn from_raw(raw: Schneider, id: Cow<str>) -> EvrptwInstance {
    EvrptwInstance {
      id: id.into_owned(),
      nodes: raw.nodes,
      fleet: raw.fleet,
      depot: raw.depot,
    }
  }
}

impl EvrptwInstance {
  pub fn from_path(path: impl AsRef<Path>) -> Result<EvrptwInstance> {
    let path = path.as_ref();
    let raw = Schneider::parse(SchneiderFmt(path))?;
    let id = path.file_stem()
      .map(|s| s.to_string_lossy())
      .unwrap_or(Cow::Borrowed("unnamed"));
    Ok(EvrptwInstance::from_raw(raw, id))
  }

  pub fn from_text(id: &str, text: &str) -> std::result::Result<EvrptwInstance, crate::ParseError> {
    let raw = crate::parse_schneider(text)?;
    Ok(EvrptwInstance::from_raw(raw, Cow::Borrowed(id)))
  }

  pub fn depot(&self) -> &NodeRecord { &self.nodes[self.depot] }

  pub fn stations(&self) -> impl Iterator<Item=&NodeRecord> + '_ {
    self.nodes.iter().filter(|n| n.kind == NodeKind::Station)
  }

  pub fn customers(&self) -> impl Iterator<Item=&NodeRecord> + '_ {
    self.nodes.iter().filter(|n| n.kind == NodeKind::Customer)
  }
}

pub enum EvrptwSchneider {}

impl Dataset for StdLayout<EvrptwSchneider> {
  type Instance = EvrptwInstance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    let (instance, path) = self.instance_path(idx)?;
    let raw = Schneider::parse(SchneiderFmt(&path)).context(format!("failed to load {:?}", path))?;
    Ok(EvrptwInstance::from_raw(raw, instance))
  }
}

/// The E-VRPTW benchmark set of Schneider et al., expected under `$DATA_ROOT/EVRPTW_schneider`.
pub fn schneider() -> Result<StdLayout<EvrptwSchneider>> {
  StdLayout::new("EVRPTW_schneider", "txt")
}
