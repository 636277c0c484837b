use super::nom_prelude::*;
use crate::ParseError;

/// Whitespace-separated tokens of a single line.
pub fn tokens<'a, E>(input: &'a str) -> IResult<&'a str, Vec<&'a str>, E>
  where
    E: error::ParseError<&'a str>
{
  all_consuming(delimited(
    space0,
    separated_list0(space1, is_not(" \t\r\n")),
    space0,
  ))(input)
}

/// Value of a `<label> .../<value>/` line; the closing slash is optional.
pub fn slash_value<'a, E>(input: &'a str) -> IResult<&'a str, f64, E>
  where
    E: error::ParseError<&'a str>
{
  all_consuming(preceded(
    pair(take_till(|c| c == '/'), char('/')),
    terminated(
      preceded(space0, double),
      tuple((space0, opt(char('/')), space0)),
    ),
  ))(input)
}

/// A finite floating point field, failing with [`ParseError::MalformedField`].
pub fn float_field(line: usize, field: &'static str, text: &str) -> Result<f64, ParseError> {
  let parsed: IResult<&str, f64, error::Error<&str>> = all_consuming(double)(text);
  match parsed.finish() {
    Ok((_, value)) if value.is_finite() => Ok(value),
    _ => Err(ParseError::MalformedField { line, field, value: text.to_string() }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_tokens() {
    let r: IResult<&str, Vec<&str>, error::Error<&str>> = tokens("  C20  c 30.0\t50.0 ");
    assert_eq!(r.finish().unwrap().1, vec!["C20", "c", "30.0", "50.0"]);
  }

  #[test]
  fn slash_values() {
    let v = |s: &'static str| slash_value::<error::Error<&str>>(s).finish().map(|(_, v)| v).ok();
    assert_eq!(v("Q Vehicle fuel tank capacity /77.75/"), Some(77.75));
    assert_eq!(v("v average Velocity /1.0"), Some(1.0));
    assert_eq!(v("C Vehicle load capacity /200.0/  "), Some(200.0));
    assert_eq!(v("C Vehicle load capacity 200.0"), None);
    assert_eq!(v("C Vehicle load capacity /abc/"), None);
  }

  #[test]
  fn floats() {
    assert_eq!(float_field(3, "x", "-1.5e1"), Ok(-15.0));
    assert!(matches!(float_field(3, "x", "12a"), Err(ParseError::MalformedField { line: 3, field: "x", .. })));
    assert!(float_field(3, "x", "inf").is_err());
  }
}
