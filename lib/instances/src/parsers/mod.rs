mod schneider;
pub use schneider::{SchneiderFmt, parse_schneider};


mod nom_prelude {
  pub use nom::{
    IResult,
    error,
    sequence::*,
    multi::*,
    combinator::*,
    character::complete::*,
    bytes::complete::{is_not, take_till},
    number::complete::double,
    Finish,
  };
}

mod common;

pub trait ParseInstance<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}
