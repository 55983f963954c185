// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::extract::{CallsignClause, OriginTimeClause, SpeedLevelRouteClause};
use crate::sanitize::{is_complete_time, is_level_token, sanitize, FieldKind};
use std::borrow::Cow;
use std::ops::Range;

/// Replaces exactly one clause span. Returns the blob untouched when the clause
/// is no longer present or the replacement equals the current text.
fn splice<'a>(
    blob: &'a str,
    span: &Range<usize>,
    full_match: &str,
    replacement: &str,
) -> Cow<'a, str> {
    if replacement == full_match {
        return Cow::Borrowed(blob);
    }

    // The clause may come from an older version of the blob; fall back to the
    // first occurrence of its text.
    let range = if blob.get(span.clone()) == Some(full_match) {
        span.clone()
    } else {
        match blob.find(full_match) {
            Some(start) => start..start + full_match.len(),
            None => return Cow::Borrowed(blob),
        }
    };

    let mut out = String::with_capacity(blob.len() - range.len() + replacement.len());
    out.push_str(&blob[..range.start]);
    out.push_str(replacement);
    out.push_str(&blob[range.end..]);
    Cow::Owned(out)
}

/// Rewrites the speed/level/route clause.
///
/// `new_route` of `Some("")` clears the route, `None` keeps the current tail
/// byte for byte. A `new_level` that is not `F` plus three digits is ignored
/// together with the rest of the edit.
pub fn rebuild_speed_level_route<'a>(
    blob: &'a str,
    clause: &SpeedLevelRouteClause,
    new_level: Option<&str>,
    new_route: Option<&str>,
) -> Cow<'a, str> {
    if new_level.is_none() && new_route.is_none() {
        return Cow::Borrowed(blob);
    }
    if let Some(level) = new_level {
        if !is_level_token(level) {
            return Cow::Borrowed(blob);
        }
    }

    let level = new_level.unwrap_or(&clause.level);
    let tail = match new_route {
        Some("") => String::new(),
        Some(route) => format!(" {}", route),
        None => clause.route_tail.clone(),
    };
    let rebuilt = format!("\n-{}{}{}", clause.speed, level, tail);

    splice(blob, &clause.span, &clause.full_match, &rebuilt)
}

pub fn rebuild_origin_time<'a>(
    blob: &'a str,
    clause: &OriginTimeClause,
    new_digits: &str,
) -> Cow<'a, str> {
    if !is_complete_time(new_digits) {
        return Cow::Borrowed(blob);
    }

    let prefix_len = clause.full_match.len() - clause.time_digits.len();
    let rebuilt = format!("{}{}", &clause.full_match[..prefix_len], new_digits);

    splice(blob, &clause.span, &clause.full_match, &rebuilt)
}

pub fn rebuild_callsign<'a>(
    blob: &'a str,
    clause: &CallsignClause,
    new_callsign: &str,
) -> Cow<'a, str> {
    let callsign = sanitize(FieldKind::Callsign, new_callsign);
    if callsign.is_empty() {
        return Cow::Borrowed(blob);
    }

    let rebuilt = format!("(FPL-{}-IS", callsign);
    splice(blob, &clause.span, &clause.full_match, &rebuilt)
}
