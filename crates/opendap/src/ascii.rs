//! Parser for the OPeNDAP ASCII response form (`.ascii?...`).
//!
//! Two layouts are accepted:
//!
//! GrADS Data Server, one header per array followed by rows prefixed with
//! their leading indices:
//!
//! ```text
//! ugrd10m, [2][3][4]
//! [0][0], 1.0, 2.0, 3.0, 4.0
//! ...
//! lat, [3]
//! -38.25, -38.0, -37.75
//! ```
//!
//! THREDDS/Hyrax, a DDS preamble terminated by a dashed line, then
//! `Grid.member[dims]` headers:
//!
//! ```text
//! Dataset { ... } name;
//! ---------------------------------------------
//! VHM0.VHM0[1][2][2]
//! [0][0], 2.5, NaN
//! ```
//!
//! Arrays are keyed by the last dot-separated segment of their name, so
//! `VHM0.latitude` and `latitude` both resolve as `latitude`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{OpendapError, OpendapResult};

/// One array from an ASCII response, values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct AsciiArray {
    pub name: String,
    pub dims: Vec<usize>,
    pub values: Vec<f64>,
}

impl AsciiArray {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All arrays of a parsed response.
#[derive(Debug, Clone, Default)]
pub struct AsciiResponse {
    arrays: HashMap<String, AsciiArray>,
}

impl AsciiResponse {
    pub fn get(&self, name: &str) -> Option<&AsciiArray> {
        self.arrays.get(name)
    }

    /// Like [`get`](Self::get), failing with `MissingVariable`.
    pub fn require(&self, name: &str) -> OpendapResult<&AsciiArray> {
        self.get(name)
            .ok_or_else(|| OpendapError::MissingVariable(name.to_string()))
    }

    /// Take ownership of an array.
    pub fn take(&mut self, name: &str) -> OpendapResult<AsciiArray> {
        self.arrays
            .remove(name)
            .ok_or_else(|| OpendapError::MissingVariable(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_.\-]*)\s*,?\s*((?:\[\d+\])+)\s*$")
            .expect("header pattern is valid")
    })
}

fn index_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\[\d+\])+\s*,?").expect("index prefix pattern is valid"))
}

fn is_separator(line: &str) -> bool {
    line.len() >= 10 && line.chars().all(|c| c == '-')
}

fn parse_number(token: &str) -> OpendapResult<f64> {
    let trimmed = token.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.trim_start_matches(&['-', '+'][..]) == "nan" {
        return Ok(f64::NAN);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| OpendapError::Malformed(format!("'{}' is not a number", trimmed)))
}

fn parse_dims(brackets: &str) -> OpendapResult<Vec<usize>> {
    brackets.trim_start_matches('[')
        .trim_end_matches(']')
        .split("][")
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| OpendapError::Malformed(format!("bad dimension '{}'", d)))
        })
        .collect()
}

struct Pending {
    name: String,
    dims: Vec<usize>,
    values: Vec<f64>,
}

impl Pending {
    fn finish(self) -> OpendapResult<AsciiArray> {
        let expected: usize = self.dims.iter().product();
        if self.values.len() != expected {
            return Err(OpendapError::Malformed(format!(
                "{}: expected {} values for {:?}, got {}",
                self.name,
                expected,
                self.dims,
                self.values.len()
            )));
        }
        Ok(AsciiArray {
            name: self.name,
            dims: self.dims,
            values: self.values,
        })
    }
}

/// Parse an ASCII response body.
pub fn parse_ascii(body: &str) -> OpendapResult<AsciiResponse> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(OpendapError::Malformed(
            "server returned an HTML page instead of data".to_string(),
        ));
    }

    let lines: Vec<&str> = body.lines().collect();
    let start = lines
        .iter()
        .position(|l| is_separator(l.trim()))
        .map_or(0, |i| i + 1);

    let mut response = AsciiResponse::default();
    let mut current: Option<Pending> = None;

    for raw in &lines[start..] {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = header_regex().captures(line) {
            if let Some(done) = current.take() {
                let array = done.finish()?;
                response.arrays.insert(array.name.clone(), array);
            }
            let full_name = &caps[1];
            let name = full_name.rsplit('.').next().unwrap_or(full_name);
            current = Some(Pending {
                name: name.to_string(),
                dims: parse_dims(&caps[2])?,
                values: Vec::new(),
            });
            continue;
        }

        let Some(pending) = current.as_mut() else {
            // Text before the first array (e.g. a DDS without separator)
            continue;
        };

        let data = index_prefix_regex().replace(line, "");
        for token in data.split(',') {
            if token.trim().is_empty() {
                continue;
            }
            pending.values.push(parse_number(token)?);
        }
    }

    if let Some(done) = current.take() {
        let array = done.finish()?;
        response.arrays.insert(array.name.clone(), array);
    }

    if response.arrays.is_empty() {
        return Err(OpendapError::Malformed("response contains no arrays".to_string()));
    }
    Ok(response)
}
