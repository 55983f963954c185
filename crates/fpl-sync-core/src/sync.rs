// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// Sync controller. Owns the current blob and one pending-commit slot per typed
// field. A commit always reads the blob as it is when the commit fires, and each
// rebuild only touches its own clause, so commits from different fields compose
// in any order. Within one field the last scheduled value wins.

use crate::config::SyncConfig;
use crate::extract::{
    extract_callsign, extract_origin_time_with, extract_speed_level_route, origin_time_pattern,
};
use crate::link::filing_link;
use crate::rebuild::{rebuild_callsign, rebuild_origin_time, rebuild_speed_level_route};
use crate::sanitize::{clamp_cursor, is_complete_time, level_token, sanitize, FieldKind};
use crate::FlightPlanBlob;
use chrono::{DateTime, Utc};
use log::{debug, info};
use regex::Regex;
use std::borrow::Cow;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The clause is not in the blob.
    ExtractionMiss,
    /// Nothing usable left after sanitizing (or an incomplete time).
    SanitizationEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Valid edit that reproduced the existing clause.
    Unchanged,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub field: FieldKind,
    pub value: String,
    pub outcome: CommitOutcome,
}

/// Values shown by the input fields. Overwritten wholesale, never authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mirrors {
    pub callsign: String,
    pub departure_time: String,
    /// `None` until the blob or the user provides a route.
    pub route: Option<String>,
    /// Last level pick that went through.
    pub level: Option<String>,
}

/// What a field shows right after a keystroke, with the caret to put back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMirror {
    pub text: String,
    /// Byte offset into `text`, always on a char boundary.
    pub cursor: usize,
}

#[derive(Debug, Clone)]
struct PendingCommit {
    deadline: Instant,
    value: String,
    seq: u64,
}

#[derive(Debug, Default)]
struct PendingSlots {
    callsign: Option<PendingCommit>,
    departure_time: Option<PendingCommit>,
    route: Option<PendingCommit>,
}

impl PendingSlots {
    fn slot_mut(&mut self, field: FieldKind) -> Option<&mut Option<PendingCommit>> {
        match field {
            FieldKind::Callsign => Some(&mut self.callsign),
            FieldKind::DepartureTime => Some(&mut self.departure_time),
            FieldKind::Route => Some(&mut self.route),
            FieldKind::Level => None,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (FieldKind, &PendingCommit)> {
        [
            (FieldKind::Callsign, self.callsign.as_ref()),
            (FieldKind::DepartureTime, self.departure_time.as_ref()),
            (FieldKind::Route, self.route.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, slot)| slot.map(|p| (field, p)))
    }

    /// The earliest pending commit, optionally only among those due at `now`.
    fn earliest(&self, due_at: Option<Instant>) -> Option<FieldKind> {
        self.iter()
            .filter(|(_, p)| due_at.map_or(true, |now| p.deadline <= now))
            .min_by_key(|(_, p)| (p.deadline, p.seq))
            .map(|(field, _)| field)
    }

    fn len(&self) -> usize {
        self.iter().count()
    }
}

pub struct SyncController {
    blob: FlightPlanBlob,
    origin_icao: String,
    origin_re: Option<Regex>,
    config: SyncConfig,
    mirrors: Mirrors,
    filing_link: String,
    pending: PendingSlots,
    next_seq: u64,
    revision: u64,
}

impl SyncController {
    /// Binds a fresh controller to `blob`. Mirrors are prefilled from whatever
    /// clauses the blob already has, and the filing link is computed right away.
    pub fn init(
        blob: impl Into<FlightPlanBlob>,
        origin_icao: &str,
        config: SyncConfig,
    ) -> Self {
        let blob = blob.into();
        let origin_icao = origin_icao.trim().to_uppercase();
        let origin_re = origin_time_pattern(&origin_icao);

        let mut mirrors = Mirrors::default();
        if let Some(cs) = extract_callsign(blob.as_str()) {
            mirrors.callsign = cs.callsign.to_uppercase();
        }
        if let Some(ot) = origin_re
            .as_ref()
            .and_then(|re| extract_origin_time_with(blob.as_str(), re))
        {
            mirrors.departure_time = ot.time_digits;
        }
        if let Some(slr) = extract_speed_level_route(blob.as_str()) {
            mirrors.route = Some(slr.route().to_string());
            mirrors.level = Some(slr.level);
        }

        let filing_link = filing_link(&config, blob.as_str());
        info!(
            "Sync controller bound — origin={} bytes={} callsign={}",
            origin_icao,
            blob.as_str().len(),
            mirrors.callsign
        );

        Self {
            blob,
            origin_icao,
            origin_re,
            config,
            mirrors,
            filing_link,
            pending: PendingSlots::default(),
            next_seq: 0,
            revision: 0,
        }
    }

    /// Drops every pending commit and hands back the last committed blob.
    pub fn dispose(self) -> FlightPlanBlob {
        let dropped = self.pending.len();
        if dropped > 0 {
            debug!("Disposing controller with {} pending commit(s) dropped", dropped);
        }
        self.blob
    }

    pub fn blob(&self) -> &FlightPlanBlob {
        &self.blob
    }

    pub fn origin_icao(&self) -> &str {
        &self.origin_icao
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn mirrors(&self) -> &Mirrors {
        &self.mirrors
    }

    pub fn filing_link(&self) -> &str {
        &self.filing_link
    }

    /// Number of commits that actually replaced the blob.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_pending(&self, field: FieldKind) -> bool {
        self.pending.iter().any(|(f, _)| f == field)
    }

    /// When the next debounced commit is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, p)| p.deadline).min()
    }

    /// A keystroke in `field`, with the caret at byte `cursor` of `raw`
    /// (`None` for the end of the text).
    ///
    /// The sanitized text lands in the mirror at once and is returned for the
    /// field to display, with the caret moved past only the characters that
    /// survived. Route text is shown as typed and only cleaned when it
    /// commits. Typed fields then (re)arm their own debounce slot; level input
    /// has no slot and commits immediately.
    pub fn on_edit(
        &mut self,
        field: FieldKind,
        raw: &str,
        cursor: Option<usize>,
        now: Instant,
    ) -> FieldMirror {
        let clean = match field {
            FieldKind::Route => raw.to_string(),
            FieldKind::Level => level_token(raw).unwrap_or_default(),
            _ => sanitize(field, raw),
        };
        let cursor = match (field, cursor) {
            (_, None) | (FieldKind::Level, _) => clean.len(),
            (FieldKind::Route, Some(pos)) => clamp_cursor(&clean, pos),
            (_, Some(pos)) => {
                let before = &raw[..clamp_cursor(raw, pos)];
                clamp_cursor(&clean, sanitize(field, before).len())
            }
        };

        match field {
            FieldKind::Callsign => self.mirrors.callsign = clean.clone(),
            FieldKind::DepartureTime => self.mirrors.departure_time = clean.clone(),
            FieldKind::Route => self.mirrors.route = Some(clean.clone()),
            FieldKind::Level => {
                self.select_level(raw);
                return FieldMirror {
                    text: clean,
                    cursor,
                };
            }
        }

        let deadline = now + self.config.quiet_period(field);
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(slot) = self.pending.slot_mut(field) {
            if slot.is_some() {
                debug!("Replacing pending {:?} commit", field);
            }
            *slot = Some(PendingCommit {
                deadline,
                value: clean.clone(),
                seq,
            });
        }
        FieldMirror {
            text: clean,
            cursor,
        }
    }

    /// Fires every commit whose quiet period has elapsed, oldest deadline first.
    pub fn tick(&mut self, now: Instant) -> Vec<CommitReport> {
        let mut reports = Vec::new();
        while let Some(field) = self.pending.earliest(Some(now)) {
            if let Some(report) = self.fire(field) {
                reports.push(report);
            }
        }
        reports
    }

    /// Fires all pending commits regardless of their deadlines.
    pub fn flush(&mut self) -> Vec<CommitReport> {
        let mut reports = Vec::new();
        while let Some(field) = self.pending.earliest(None) {
            if let Some(report) = self.fire(field) {
                reports.push(report);
            }
        }
        reports
    }

    fn fire(&mut self, field: FieldKind) -> Option<CommitReport> {
        let pending = self.pending.slot_mut(field)?.take()?;
        Some(self.commit(field, pending.value))
    }

    fn cancel(&mut self, field: FieldKind) {
        if let Some(slot) = self.pending.slot_mut(field) {
            *slot = None;
        }
    }

    /// A level choice. Commits immediately and carries the route field's
    /// current text, even when that text has not been committed yet.
    pub fn select_level(&mut self, choice: &str) -> CommitReport {
        self.commit(FieldKind::Level, choice.trim().to_string())
    }

    /// A preset callsign. Replaces whatever is being typed and commits now.
    pub fn select_callsign(&mut self, preset: &str) -> CommitReport {
        self.cancel(FieldKind::Callsign);
        let clean = sanitize(FieldKind::Callsign, preset);
        self.mirrors.callsign = clean.clone();
        self.commit(FieldKind::Callsign, clean)
    }

    /// Sets the departure time to the given UTC instant (HHMM) and commits now.
    pub fn use_current_time(&mut self, utc: DateTime<Utc>) -> CommitReport {
        self.cancel(FieldKind::DepartureTime);
        let hhmm = utc.format("%H%M").to_string();
        self.mirrors.departure_time = hhmm.clone();
        self.commit(FieldKind::DepartureTime, hhmm)
    }

    fn commit(&mut self, field: FieldKind, value: String) -> CommitReport {
        let outcome = match self.apply(field, &value) {
            Ok(Some(next)) => {
                self.blob = FlightPlanBlob::new(next);
                self.revision += 1;
                self.publish(field, &value);
                CommitOutcome::Committed
            }
            Ok(None) => {
                self.publish(field, &value);
                CommitOutcome::Unchanged
            }
            Err(reason) => CommitOutcome::Skipped(reason),
        };

        match outcome {
            CommitOutcome::Committed => {
                info!("Committed {:?} '{}' (rev {})", field, value, self.revision)
            }
            _ => debug!("{:?} '{}' -> {:?}", field, value, outcome),
        }

        CommitReport {
            field,
            value,
            outcome,
        }
    }

    /// Extracts from the current blob and rebuilds. `Ok(None)` means the
    /// rebuild produced identical text.
    fn apply(&self, field: FieldKind, value: &str) -> Result<Option<String>, SkipReason> {
        let blob = self.blob.as_str();
        let rebuilt = match field {
            FieldKind::Callsign => {
                if sanitize(FieldKind::Callsign, value).is_empty() {
                    return Err(SkipReason::SanitizationEmpty);
                }
                let clause = extract_callsign(blob).ok_or(SkipReason::ExtractionMiss)?;
                rebuild_callsign(blob, &clause, value)
            }
            FieldKind::DepartureTime => {
                if !is_complete_time(value) {
                    return Err(SkipReason::SanitizationEmpty);
                }
                let clause = self
                    .origin_re
                    .as_ref()
                    .and_then(|re| extract_origin_time_with(blob, re))
                    .ok_or(SkipReason::ExtractionMiss)?;
                rebuild_origin_time(blob, &clause, value)
            }
            FieldKind::Route => {
                let clause = extract_speed_level_route(blob).ok_or(SkipReason::ExtractionMiss)?;
                let route = sanitize(FieldKind::Route, value);
                rebuild_speed_level_route(blob, &clause, None, Some(route.as_str()))
            }
            FieldKind::Level => {
                let token = level_token(value).ok_or(SkipReason::SanitizationEmpty)?;
                let clause = extract_speed_level_route(blob).ok_or(SkipReason::ExtractionMiss)?;
                // Only carry the route field when it says something other than
                // the blob; an untouched route keeps its tail byte for byte.
                let route = self
                    .mirrors
                    .route
                    .as_deref()
                    .map(|r| sanitize(FieldKind::Route, r))
                    .filter(|r| r != clause.route());
                rebuild_speed_level_route(blob, &clause, Some(token.as_str()), route.as_deref())
            }
        };

        Ok(match rebuilt {
            Cow::Owned(next) if next != blob => Some(next),
            _ => None,
        })
    }

    fn publish(&mut self, field: FieldKind, value: &str) {
        match field {
            FieldKind::Callsign => self.mirrors.callsign = sanitize(FieldKind::Callsign, value),
            FieldKind::DepartureTime => self.mirrors.departure_time = value.to_string(),
            FieldKind::Route => {}
            FieldKind::Level => self.mirrors.level = level_token(value),
        }
        self.filing_link = filing_link(&self.config, self.blob.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    const PLAN: &str = "(FPL-ABC123-IS\n-A320/M-SDE3FGHIJ1RWY/LB1\n-KJFK1230\n-N0450F350 DCT ABC DCT XYZ\n-KBOS0100\n-DOF/260101)";

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller() -> SyncController {
        SyncController::init(PLAN, "kjfk", SyncConfig::default())
    }

    #[test]
    fn test_init_prefills_mirrors_and_link() {
        let ctl = controller();
        assert_eq!(ctl.origin_icao(), "KJFK");
        assert_eq!(ctl.mirrors().callsign, "ABC123");
        assert_eq!(ctl.mirrors().departure_time, "1230");
        assert_eq!(ctl.mirrors().route.as_deref(), Some("DCT ABC DCT XYZ"));
        assert_eq!(ctl.mirrors().level.as_deref(), Some("F350"));
        assert!(ctl
            .filing_link()
            .starts_with("https://my.vatsim.net/pilots/flightplan/beta?raw=%28FPL-ABC123-IS%0A"));
        assert_eq!(ctl.revision(), 0);
    }

    #[test]
    fn test_debounce_coalesces_typing() {
        let mut ctl = controller();
        let t0 = Instant::now();
        assert_eq!(ctl.on_edit(FieldKind::Callsign, "b", None, t0).text, "B");
        ctl.on_edit(FieldKind::Callsign, "ba", None, t0 + ms(80));
        ctl.on_edit(FieldKind::Callsign, "baw", None, t0 + ms(160));

        // Quiet period restarts on each keystroke.
        assert!(ctl.tick(t0 + ms(300)).is_empty());
        assert_eq!(ctl.next_deadline(), Some(t0 + ms(360)));

        let reports = ctl.tick(t0 + ms(360));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].value, "BAW");
        assert_eq!(reports[0].outcome, CommitOutcome::Committed);
        assert!(ctl.blob().as_str().starts_with("(FPL-BAW-IS\n"));
        assert_eq!(ctl.revision(), 1);
        assert!(ctl.tick(t0 + ms(1000)).is_empty());
    }

    #[test]
    fn test_fields_have_independent_slots() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.on_edit(FieldKind::Route, "DCT QQQ", None, t0);
        ctl.on_edit(FieldKind::Callsign, "EZY1", None, t0 + ms(100));
        ctl.on_edit(FieldKind::DepartureTime, "0915", None, t0 + ms(100));

        // Route (t0+250) fires before callsign (t0+300) and time (t0+350).
        let reports = ctl.tick(t0 + ms(400));
        let fields: Vec<FieldKind> = reports.iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec![FieldKind::Route, FieldKind::Callsign, FieldKind::DepartureTime]
        );
        assert_eq!(
            ctl.blob().as_str(),
            "(FPL-EZY1-IS\n-A320/M-SDE3FGHIJ1RWY/LB1\n-KJFK0915\n-N0450F350 DCT QQQ\n-KBOS0100\n-DOF/260101)"
        );
    }

    #[test]
    fn test_commit_reads_blob_at_fire_time() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.on_edit(FieldKind::Route, "DCT NEW", None, t0);
        // The level pick lands while the route edit is still pending.
        ctl.select_level("F370");
        assert!(ctl.blob().as_str().contains("\n-N0450F370 DCT NEW\n"));

        let reports = ctl.tick(t0 + ms(250));
        assert_eq!(reports[0].outcome, CommitOutcome::Unchanged);
        assert!(ctl.blob().as_str().contains("\n-N0450F370 DCT NEW\n"));
    }

    #[test]
    fn test_level_selection_keeps_route() {
        let mut ctl = controller();
        let report = ctl.select_level("F370");
        assert_eq!(report.outcome, CommitOutcome::Committed);
        assert_eq!(ctl.blob().as_str(), PLAN.replace("F350", "F370"));
        assert_eq!(ctl.mirrors().level.as_deref(), Some("F370"));

        assert_eq!(ctl.select_level("F370").outcome, CommitOutcome::Unchanged);
        assert_eq!(
            ctl.select_level("FL").outcome,
            CommitOutcome::Skipped(SkipReason::SanitizationEmpty)
        );
    }

    #[test]
    fn test_level_edit_shows_token() {
        let mut ctl = controller();
        let shown = ctl.on_edit(FieldKind::Level, "fl370", Some(2), Instant::now());
        assert_eq!(shown.text, "F370");
        assert_eq!(shown.cursor, 4);
        assert!(ctl.blob().as_str().contains("\n-N0450F370 DCT ABC DCT XYZ\n"));
        assert!(!ctl.has_pending(FieldKind::Level));
    }

    #[test]
    fn test_edit_cursor_stays_on_char_boundary() {
        let mut ctl = controller();
        let t0 = Instant::now();

        let shown = ctl.on_edit(FieldKind::Route, "DCT É", Some(5), t0);
        assert_eq!(shown.text, "DCT É");
        assert_eq!(shown.cursor, 4);

        // "0é9|15": only the digits before the caret count.
        let shown = ctl.on_edit(FieldKind::DepartureTime, "0é915", Some(4), t0);
        assert_eq!(shown.text, "0915");
        assert_eq!(shown.cursor, 2);
        assert!(shown.text.is_char_boundary(shown.cursor));
    }

    #[test]
    fn test_missing_clauses_are_silent() {
        let plan = "(FPL-ABC123-IS\n-A320/M-S/C\n-KJFK1230)";
        let mut ctl = SyncController::init(plan, "KJFK", SyncConfig::default());
        let link = ctl.filing_link().to_string();
        let report = ctl.select_level("F370");
        assert_eq!(report.outcome, CommitOutcome::Skipped(SkipReason::ExtractionMiss));
        assert_eq!(ctl.blob().as_str(), plan);
        assert_eq!(ctl.filing_link(), link);
        assert_eq!(ctl.mirrors().route, None);
    }

    #[test]
    fn test_incomplete_time_replaces_pending_complete_time() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.on_edit(FieldKind::DepartureTime, "0915", None, t0);
        let shown = ctl.on_edit(FieldKind::DepartureTime, "091", None, t0 + ms(50));
        assert_eq!(shown.text, "091");

        let reports = ctl.tick(t0 + ms(500));
        assert_eq!(
            reports[0].outcome,
            CommitOutcome::Skipped(SkipReason::SanitizationEmpty)
        );
        assert!(ctl.blob().as_str().contains("\n-KJFK1230\n"));
    }

    #[test]
    fn test_use_current_time_and_preset() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.on_edit(FieldKind::Callsign, "zzz", None, t0);
        let utc = Utc.with_ymd_and_hms(2026, 3, 1, 7, 5, 0).unwrap();
        assert_eq!(ctl.use_current_time(utc).outcome, CommitOutcome::Committed);
        assert_eq!(ctl.mirrors().departure_time, "0705");

        assert_eq!(ctl.select_callsign("dlh4ab").outcome, CommitOutcome::Committed);
        assert!(!ctl.has_pending(FieldKind::Callsign));
        assert!(ctl.tick(t0 + ms(1000)).is_empty());
        assert!(ctl
            .blob()
            .as_str()
            .starts_with("(FPL-DLH4AB-IS\n-A320/M-SDE3FGHIJ1RWY/LB1\n-KJFK0705\n"));
    }

    #[test]
    fn test_dispose_drops_pending() {
        let mut ctl = controller();
        ctl.on_edit(FieldKind::Route, "DCT GONE", None, Instant::now());
        let blob = ctl.dispose();
        assert_eq!(blob.as_str(), PLAN);
    }

    #[test]
    fn test_flush_fires_everything() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.on_edit(FieldKind::Route, "", None, t0);
        let reports = ctl.flush();
        assert_eq!(reports.len(), 1);
        assert!(ctl.blob().as_str().contains("\n-N0450F350\n-KBOS0100"));
        assert_eq!(ctl.next_deadline(), None);
    }
}
