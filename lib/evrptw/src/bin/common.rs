use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{Context, Result};
use structopt::StructOpt;

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
  /// `json-summ` reports the plan totals, `json` adds every route
  #[structopt(long="format", short="f", default_value="json-summ", possible_values=&OutputFormat::NAMES)]
  pub fmt: OutputFormat,
  /// Write the report here instead of stdout
  #[structopt(long="output", short="o")]
  pub file: Option<PathBuf>,
  /// Also write the log as JSON lines to this file
  #[structopt(long)]
  pub log: Option<PathBuf>,
}

/// Validate a numeric argument against inclusive bounds.
pub fn clap_range_validator<T>(minval: Option<T>, maxval: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        match (minval, maxval) {
            (Some(lo), _) if x < lo => Err(format!("must be at least {}", lo)),
            (_, Some(hi)) if x > hi => Err(format!("must be at most {}", hi)),
            _ => Ok(()),
        }
    }
}

/// As [`clap_range_validator`], also rejecting NaN and infinities.
pub fn clap_float_validator(minval: Option<f64>, maxval: Option<f64>) -> impl Fn(String) -> Result<(), String> {
    let in_range = clap_range_validator(minval, maxval);
    move |val| {
        let x: f64 = val.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
        if !x.is_finite() {
            return Err(format!("must be a finite number, got {}", val));
        }
        in_range(val)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    Json,
    JsonSummary,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 2] = ["json", "json-summ"];
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "json-summ" => Ok(OutputFormat::JsonSummary),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

pub trait JsonReport {
    fn write_json(&self, buf: impl Write) -> Result<()>;
    fn write_json_summary(&self, buf: impl Write) -> Result<()>;
}

pub fn output_report(options: &OutputOptions, report: impl JsonReport) -> Result<()> {
    let mut out: Box<dyn Write> = match options.file.as_ref() {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };
    match options.fmt {
        OutputFormat::Json => report.write_json(&mut out)?,
        OutputFormat::JsonSummary => report.write_json_summary(&mut out)?,
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
