//! Declarative data file read by the solver model.
//!
//! One `name = value;` assignment per parameter, preceded by a block comment
//! naming the instance. Floats always carry a decimal point.

use circbench_utils::atomic_write::write_file_atomic;
use circbench_utils::error::GenerationError;
use std::fmt::Write as _;
use std::path::Path;

use crate::instance::{BoundingBox, ProblemInstance};

/// Parameters read back from a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFileContents {
    /// Instance id from the header comment, if present.
    pub instance_id: Option<String>,
    pub radius: f64,
    pub n: usize,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub min_coverage: u32,
    pub min_dist: f64,
    pub bbox: BoundingBox,
}

impl DataFileContents {
    /// Whether this file describes exactly `instance`.
    #[must_use]
    pub fn describes(&self, instance: &ProblemInstance) -> bool {
        self.instance_id.as_deref().is_none_or(|id| id == instance.id)
            && self.n == instance.n()
            && self.xs == instance.xs
            && self.ys == instance.ys
            && self.radius == instance.radius
            && self.min_dist == instance.min_dist
            && self.min_coverage == instance.min_coverage
            && self.bbox == instance.bbox
    }
}

fn number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn array(values: &[f64]) -> String {
    values
        .iter()
        .map(|&v| number(v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render `instance` in the solver's data file syntax.
#[must_use]
pub fn render_data_file(instance: &ProblemInstance) -> String {
    let mut out = String::new();
    out.push_str("/*********************************************\n");
    out.push_str(" * OPL Data\n");
    out.push_str(" * Generated by circbench\n");
    let _ = writeln!(out, " * Instance: {}", instance.id);
    let _ = writeln!(out, " * Seed: {}", instance.seed);
    out.push_str(" *********************************************/\n");
    let _ = writeln!(out, "r = {};", number(instance.radius));
    let _ = writeln!(out, "n = {};", instance.n());
    let _ = writeln!(out, "x = [{}];", array(&instance.xs));
    let _ = writeln!(out, "y = [{}];", array(&instance.ys));
    let _ = writeln!(out, "minCoverage = {};", instance.min_coverage);
    let _ = writeln!(out, "minDistCirculos = {};", number(instance.min_dist));
    let _ = writeln!(out, "minX = {};", number(instance.bbox.min_x));
    let _ = writeln!(out, "minY = {};", number(instance.bbox.min_y));
    let _ = writeln!(out, "maxX = {};", number(instance.bbox.max_x));
    let _ = writeln!(out, "maxY = {};", number(instance.bbox.max_y));
    out
}

/// Atomically (re)write the data file the solver reads.
pub fn write_data_file(path: &Path, instance: &ProblemInstance) -> std::io::Result<()> {
    write_file_atomic(path, &render_data_file(instance))
        .map_err(|e| std::io::Error::other(format!("{e:#}")))
}

fn malformed(reason: impl Into<String>) -> GenerationError {
    GenerationError::DataFile {
        reason: reason.into(),
    }
}

/// Split off block comments, returning (comments, remaining text).
fn strip_comments(text: &str) -> Result<(String, String), GenerationError> {
    let mut comments = String::new();
    let mut body = String::new();
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        body.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("*/")
            .ok_or_else(|| malformed("unterminated comment"))?;
        comments.push_str(&after[..end]);
        comments.push('\n');
        rest = &after[end + 2..];
    }
    body.push_str(rest);
    Ok((comments, body))
}

fn parse_f64(name: &str, value: &str) -> Result<f64, GenerationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed(format!("{name}: '{}' is not a number", value.trim())))
}

fn parse_array(name: &str, value: &str) -> Result<Vec<f64>, GenerationError> {
    let inner = value
        .trim()
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| malformed(format!("{name}: expected [ ... ]")))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner.split(',').map(|item| parse_f64(name, item)).collect()
}

/// Parse a data file produced by [`render_data_file`].
pub fn parse_data_file(text: &str) -> Result<DataFileContents, GenerationError> {
    let (comments, body) = strip_comments(text)?;
    let instance_id = comments.lines().find_map(|line| {
        line.trim_start_matches([' ', '*'])
            .strip_prefix("Instance:")
            .map(|id| id.trim().to_string())
    });

    let mut radius = None;
    let mut n = None;
    let mut xs = None;
    let mut ys = None;
    let mut min_coverage = None;
    let mut min_dist = None;
    let mut bounds = [None; 4];

    for statement in body.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        let (name, value) = statement
            .split_once('=')
            .ok_or_else(|| malformed(format!("'{statement}' is not an assignment")))?;
        let name = name.trim();
        match name {
            "r" => radius = Some(parse_f64(name, value)?),
            "n" => {
                n = Some(
                    value
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| malformed(format!("n: '{}' is not a count", value.trim())))?,
                );
            }
            "x" => xs = Some(parse_array(name, value)?),
            "y" => ys = Some(parse_array(name, value)?),
            "minCoverage" => {
                min_coverage = Some(value.trim().parse::<u32>().map_err(|_| {
                    malformed(format!("minCoverage: '{}' is not a count", value.trim()))
                })?);
            }
            "minDistCirculos" => min_dist = Some(parse_f64(name, value)?),
            "minX" => bounds[0] = Some(parse_f64(name, value)?),
            "minY" => bounds[1] = Some(parse_f64(name, value)?),
            "maxX" => bounds[2] = Some(parse_f64(name, value)?),
            "maxY" => bounds[3] = Some(parse_f64(name, value)?),
            other => return Err(malformed(format!("unknown parameter '{other}'"))),
        }
    }

    let missing = |name: &str| malformed(format!("missing '{name}'"));
    let xs = xs.ok_or_else(|| missing("x"))?;
    let ys = ys.ok_or_else(|| missing("y"))?;
    let n = n.ok_or_else(|| missing("n"))?;
    if xs.len() != n || ys.len() != n {
        return Err(malformed(format!(
            "n = {n} but x has {} and y has {} values",
            xs.len(),
            ys.len()
        )));
    }

    Ok(DataFileContents {
        instance_id,
        radius: radius.ok_or_else(|| missing("r"))?,
        n,
        xs,
        ys,
        min_coverage: min_coverage.ok_or_else(|| missing("minCoverage"))?,
        min_dist: min_dist.ok_or_else(|| missing("minDistCirculos"))?,
        bbox: BoundingBox {
            min_x: bounds[0].ok_or_else(|| missing("minX"))?,
            min_y: bounds[1].ok_or_else(|| missing("minY"))?,
            max_x: bounds[2].ok_or_else(|| missing("maxX"))?,
            max_y: bounds[3].ok_or_else(|| missing("maxY"))?,
        },
    })
}
