pub mod evrptw;
use std::borrow::Cow;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> Self;
}


pub mod metrics {
  use num_traits::{AsPrimitive, Num};
  use crate::Map;

  pub trait Metric {
    const SYM: bool = false;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64;
  }


  pub struct Euclidean();

  impl Metric for Euclidean {
    const SYM: bool = true;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64 {
      let a = p1.0.as_() - p2.0.as_();
      let b = p1.1.as_() - p2.1.as_();
      (a*a + b*b).sqrt()
    }
  }

  /// Compute the distance for every ordered pair in `pairs`, applying `func` to each distance.
  /// For symmetric metrics the reverse pair is reused when already present.
  pub fn pair_distances_pp<M, T, S>(
    _metric: M,
    coords: &[(T, T)],
    pairs: impl IntoIterator<Item=(usize, usize)>,
    func: impl Fn(f64) -> S,
  ) -> Map<(usize, usize), S>
    where
      M: Metric,
      T: Num + AsPrimitive<f64> + Copy,
      S: Copy
  {
    let mut matrix: Map<(usize, usize), S> = Map::default();
    for (i, j) in pairs {
      let d = match matrix.get(&(j, i)) {
        Some(&d) if M::SYM => d,
        _ => func(M::compute(coords[i], coords[j])),
      };
      matrix.insert((i, j), d);
    }
    matrix
  }

}
