use serde::{Deserialize, Serialize};
use tracing::debug;

use super::literal::{Literal, parse_literal};

/// Marker preceding the solution block in solver output.
pub const SOLUTION_MARKER: &str = "SOLUTION_DATA";

/// Solution block printed by the solver model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSolution {
    pub num_circles: u32,
    /// Selected circle centers.
    pub circles: Vec<(f64, f64)>,
    pub points: Vec<(f64, f64)>,
    /// How many selected circles cover each point, in `points` order.
    pub coverage_per_point: Vec<u32>,
    pub radius: Option<f64>,
    pub min_coverage: Option<u32>,
    pub min_dist_circles: Option<f64>,
    pub num_points: Option<usize>,
}

/// Extract the solution block from solver output, if one is present and
/// well formed.
#[must_use]
pub fn parse(raw: &str) -> Option<StructuredSolution> {
    for (marker_at, _) in raw.match_indices(SOLUTION_MARKER) {
        let Some(block) = block_after_marker(&raw[marker_at + SOLUTION_MARKER.len()..]) else {
            continue;
        };
        match parse_literal(block) {
            Ok(literal) => return solution_from_literal(&literal),
            Err(e) => {
                debug!(error = %e, "solution block is not a valid literal");
                return None;
            }
        }
    }
    None
}

/// [`parse`] over raw bytes; undecodable fragments are dropped.
#[must_use]
pub fn parse_bytes(raw: &[u8]) -> Option<StructuredSolution> {
    let text = String::from_utf8_lossy(raw);
    if text.contains(char::REPLACEMENT_CHARACTER) {
        let cleaned: String = text
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect();
        parse(&cleaned)
    } else {
        parse(&text)
    }
}

/// `rest` starts right after the marker. Expects `= {`, then returns the
/// text up to the matching `}`.
fn block_after_marker(rest: &str) -> Option<&str> {
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    if !rest.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, ch) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn pair(literal: &Literal) -> Option<(f64, f64)> {
    match literal.as_sequence()? {
        [x, y] => Some((x.as_f64()?, y.as_f64()?)),
        _ => None,
    }
}

fn pairs(literal: &Literal) -> Option<Vec<(f64, f64)>> {
    literal.as_sequence()?.iter().map(pair).collect()
}

fn count<T: TryFrom<u64>>(literal: &Literal) -> Option<T> {
    T::try_from(literal.as_u64()?).ok()
}

/// Optional field: absent or `None` is fine, present with the wrong type is
/// not.
fn optional<T>(
    dict: &Literal,
    key: &str,
    convert: impl Fn(&Literal) -> Option<T>,
) -> Result<Option<T>, ()> {
    match dict.get(key) {
        None | Some(Literal::None) => Ok(None),
        Some(value) => convert(value).map(Some).ok_or(()),
    }
}

fn solution_from_literal(literal: &Literal) -> Option<StructuredSolution> {
    if !matches!(literal, Literal::Dict(_)) {
        return None;
    }
    let num_circles: Option<u32> = optional(literal, "num_circles", count).ok()?;
    let circles = optional(literal, "circles", pairs).ok()?;
    if num_circles.is_none() && circles.is_none() {
        return None;
    }
    let circles = circles.unwrap_or_default();
    let num_circles = match num_circles {
        Some(n) => n,
        None => u32::try_from(circles.len()).ok()?,
    };

    let coverage_per_point: Vec<u32> = optional(literal, "coverage_per_point", |v| {
        v.as_sequence()?
            .iter()
            .map(count::<u32>)
            .collect::<Option<Vec<u32>>>()
    })
    .ok()?
    .unwrap_or_default();

    Some(StructuredSolution {
        num_circles,
        circles,
        points: optional(literal, "points", pairs).ok()?.unwrap_or_default(),
        coverage_per_point,
        radius: optional(literal, "radius", Literal::as_f64).ok()?,
        min_coverage: optional(literal, "min_coverage", count).ok()?,
        min_dist_circles: optional(literal, "min_dist_circles", Literal::as_f64).ok()?,
        num_points: optional(literal, "num_points", count).ok()?,
    })
}
