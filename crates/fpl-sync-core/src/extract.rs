// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// Clause extraction. Each extractor runs one leftmost match against the blob it
// is handed; no parse result is kept between calls, so the blob stays the only
// state.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// `\n-N0450F350 DCT ABC DCT XYZ` (item 15: speed, level, route).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedLevelRouteClause {
    pub full_match: String,
    pub speed: String,
    pub level: String,
    /// Everything after the level up to the line break or `)`, leading space included.
    pub route_tail: String,
    pub span: Range<usize>,
}

impl SpeedLevelRouteClause {
    /// The route as a user would type it.
    pub fn route(&self) -> &str {
        self.route_tail.trim()
    }
}

/// `\n-KJFK1230` (item 13: departure aerodrome and time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginTimeClause {
    pub full_match: String,
    pub time_digits: String,
    pub span: Range<usize>,
}

/// `(FPL-BAW123-IS` (item 7: aircraft identification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallsignClause {
    pub full_match: String,
    pub callsign: String,
    pub span: Range<usize>,
}

pub fn extract_speed_level_route(blob: &str) -> Option<SpeedLevelRouteClause> {
    static SLR_RE: OnceLock<Regex> = OnceLock::new();
    let re = SLR_RE
        .get_or_init(|| Regex::new(r"\n-([NM][0-9]+)(F[0-9]{3})([^\r\n)]*)").unwrap());

    let caps = re.captures(blob)?;
    let whole = caps.get(0)?;
    Some(SpeedLevelRouteClause {
        full_match: whole.as_str().to_string(),
        speed: caps[1].to_string(),
        level: caps[2].to_string(),
        route_tail: caps.get(3).map(|m| m.as_str()).unwrap_or("").to_string(),
        span: whole.range(),
    })
}

/// Builds the departure-clause pattern for one origin. The origin is fixed for
/// a session, so callers that extract repeatedly compile this once.
pub fn origin_time_pattern(origin_icao: &str) -> Option<Regex> {
    let origin = origin_icao.trim().to_uppercase();
    if origin.is_empty() {
        return None;
    }

    let pattern = format!(r"\n-{}([0-9]{{4}})", regex::escape(&origin));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("Origin pattern rejected — origin={} error={}", origin, e);
            None
        }
    }
}

/// The origin code is context supplied by the caller, never read from the blob.
pub fn extract_origin_time(blob: &str, origin_icao: &str) -> Option<OriginTimeClause> {
    let re = origin_time_pattern(origin_icao)?;
    extract_origin_time_with(blob, &re)
}

pub fn extract_origin_time_with(blob: &str, pattern: &Regex) -> Option<OriginTimeClause> {
    let caps = pattern.captures(blob)?;
    let whole = caps.get(0)?;
    Some(OriginTimeClause {
        full_match: whole.as_str().to_string(),
        time_digits: caps[1].to_string(),
        span: whole.range(),
    })
}

pub fn extract_callsign(blob: &str) -> Option<CallsignClause> {
    static CS_RE: OnceLock<Regex> = OnceLock::new();
    let re = CS_RE.get_or_init(|| Regex::new(r"\(FPL-([^-]+)-IS").unwrap());

    let caps = re.captures(blob)?;
    let whole = caps.get(0)?;
    Some(CallsignClause {
        full_match: whole.as_str().to_string(),
        callsign: caps[1].to_string(),
        span: whole.range(),
    })
}
