//! Platform version records

use serde::Serialize;

/// Unparsed version captures, as produced by a version parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawVersion {
    pub major: String,
    pub minor: Option<String>,
}

impl RawVersion {
    pub fn new(major: impl Into<String>, minor: Option<&str>) -> Self {
        Self {
            major: major.into(),
            minor: minor.map(str::to_string),
        }
    }
}

/// Structured version of an active platform.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlatformVersion {
    /// `"major.minor"`
    pub str: String,
    /// Numeric form of `str`, e.g. `9.1`
    pub num: f64,
    pub major: u32,
    pub minor: u32,
}

impl PlatformVersion {
    /// Returns `None` when the major capture is not an integer.
    /// A missing or non-numeric minor reads as `0`.
    pub fn from_raw(raw: &RawVersion) -> Option<Self> {
        let major: u32 = raw.major.trim().parse().ok()?;
        let minor: u32 = raw
            .minor
            .as_deref()
            .and_then(|m| m.trim().parse().ok())
            .unwrap_or(0);

        let str = format!("{major}.{minor}");
        let num = str.parse().unwrap_or(major as f64);
        Some(Self {
            str,
            num,
            major,
            minor,
        })
    }
}
