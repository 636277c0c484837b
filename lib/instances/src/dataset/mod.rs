use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::{Error, Map};
use std::borrow::Cow;


/// Two-way mapping between instance indices and instance names.
pub trait IdxNameMap {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>>;

  fn name_to_index(&self, name: &str) -> Result<usize>;

  fn len(&self) -> usize;

  fn check_idx(&self, idx: usize) -> Result<()> {
    let len = self.len();
    if idx < len { Ok(()) } else { Err(Error::IndexOutOfRange { idx, len }.into()) }
  }
}

pub trait Dataset: IdxNameMap {
  type Instance;
  fn load_instance(&self, idx: usize) -> Result<Self::Instance>;

  fn load_instance_by_name(&self, name: &str) -> Result<Self::Instance> {
    self.load_instance(self.name_to_index(name)?)
  }
}


/// A directory of instance files plus an `INDEX.txt` listing the instance names, separated by
/// whitespace.  The position of a name in the index is the instance's index, and its file is
/// `NAME.SUFFIX` in the same directory.  `D` tags the file format.
pub struct StdLayout<D> {
  _format: PhantomData<D>,
  names: Vec<String>,
  positions: Map<String, usize>,
  dir: PathBuf,
  suffix: String,
}


impl<D> StdLayout<D> {
  /// Open `dir` relative to the `DATA_ROOT` environment variable.
  pub fn new(dir: impl AsRef<Path>, suffix: &str) -> Result<StdLayout<D>> {
    let root = std::env::var("DATA_ROOT").context("environment variable DATA_ROOT must be defined")?;
    Self::with_root(root, dir, suffix)
  }

  pub fn with_root(root: impl AsRef<Path>, dir: impl AsRef<Path>, suffix: &str) -> Result<StdLayout<D>> {
    let dir = root.as_ref().join(dir);
    let dir = dir.canonicalize().with_context(|| format!("dataset directory {:?} not found", &dir))?;

    let index = dir.join("INDEX.txt");
    let names: Vec<String> = std::fs::read_to_string(&index)
      .with_context(|| format!("failed to read {:?}", &index))?
      .split_whitespace()
      .map(String::from)
      .collect();
    let positions = names.iter().cloned().enumerate().map(|(i, s)| (s, i)).collect();

    Ok(StdLayout { _format: PhantomData, names, positions, dir, suffix: suffix.to_string() })
  }

  pub fn names(&self) -> impl Iterator<Item=&str> + '_ {
    self.names.iter().map(String::as_str)
  }

  fn instance_path(&self, idx: usize) -> Result<(Cow<str>, PathBuf)> {
    let name = self.index_to_name(idx)?;
    let path = self.dir.join(format!("{}.{}", name, self.suffix));
    Ok((name, path))
  }
}

impl<D> IdxNameMap for StdLayout<D> {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.check_idx(idx)?;
    Ok(Cow::Borrowed(&self.names[idx]))
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    match self.positions.get(name) {
      Some(&i) => Ok(i),
      None => Err(Error::UnknownInstanceName(name.to_string()).into()),
    }
  }

  fn len(&self) -> usize { self.names.len() }
}


pub mod evrptw;
