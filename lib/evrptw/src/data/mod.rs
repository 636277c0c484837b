use std::path::Path;
use anyhow::{Context, Result};
use instances::dataset::{evrptw, Dataset, IdxNameMap};

use crate::EvrptwInstance;

pub fn get_instance_by_name(name: &str) -> Result<EvrptwInstance> {
  let dset = evrptw::schneider()?;
  get_instance_by_index(dset.name_to_index(name)?)
}

pub fn get_instance_by_index(idx: usize) -> Result<EvrptwInstance> {
  evrptw::schneider()?.load_instance(idx)
}

/// `instance` is either a path to an instance file or the name of an instance in the
/// `EVRPTW_schneider` dataset.
pub fn get_instance(instance: &str) -> Result<EvrptwInstance> {
  let path = Path::new(instance);
  if path.is_file() {
    EvrptwInstance::from_path(path).with_context(|| format!("failed to load {}", instance))
  } else {
    get_instance_by_name(instance)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[should_panic]
  fn fail_load_instance() {
    get_instance("non-existent").unwrap();
  }

  #[test]
  #[should_panic]
  fn fail_load_instance_idx() {
    get_instance_by_index(99999).unwrap();
  }

  #[test]
  fn load_by_path() -> Result<()> {
    let data = get_instance(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/EVRPTW_demo/tiny5.txt"))?;
    assert_eq!(data.id, "tiny5");
    assert_eq!(data.customers().count(), 5);
    assert_eq!(data.stations().count(), 2);
    Ok(())
  }
}
