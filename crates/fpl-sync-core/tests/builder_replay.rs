// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use fpl_sync_core::builder::FplFields;
use fpl_sync_core::config::SyncConfig;
use fpl_sync_core::extract::{extract_callsign, extract_origin_time, extract_speed_level_route};
use fpl_sync_core::script::{parse_script, ScriptAction};
use fpl_sync_core::sync::{CommitOutcome, SyncController};
use fpl_sync_core::FlightPlanBlob;
use std::fs;
use std::time::Instant;
use tempfile::tempdir;

fn fields() -> FplFields {
    FplFields {
        callsign: "KLM1023".to_string(),
        actype: "B738".to_string(),
        wakecat: "M".to_string(),
        equipment: "SDE2E3FGHIRWY".to_string(),
        surveillance: "/LB1".to_string(),
        dep_icao: "EHAM".to_string(),
        dep_time: "1405".to_string(),
        speed: "N0452".to_string(),
        level: "F370".to_string(),
        route: "LOPIK UL980 NIK".to_string(),
        dest_icao: "LFPG".to_string(),
        eet: "0055".to_string(),
        pbn: "A1B1C1D1O1S2".to_string(),
        dof: "260301".to_string(),
        ..FplFields::default()
    }
}

#[test]
fn test_composed_plan_exposes_every_clause() {
    let text = fields().to_icao_fpl();

    assert_eq!(extract_callsign(&text).unwrap().callsign, "KLM1023");
    assert_eq!(extract_origin_time(&text, "EHAM").unwrap().time_digits, "1405");
    let slr = extract_speed_level_route(&text).unwrap();
    assert_eq!(slr.speed, "N0452");
    assert_eq!(slr.level, "F370");
    assert_eq!(slr.route(), "LOPIK UL980 NIK");
}

#[test]
fn test_fields_file_to_plan() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fields.json");
    fs::write(&path, serde_json::to_string_pretty(&fields()).unwrap()).unwrap();

    let loaded = FplFields::load(&path).unwrap();
    assert_eq!(loaded, fields());
}

/// Drives the controller the way the CLI replay does: advance virtual time to
/// each step, fire what is due, apply the step, then flush.
fn replay(blob: &str, origin: &str, script: &str) -> (SyncController, Vec<CommitOutcome>) {
    let steps = parse_script(script).unwrap();
    let mut ctl = SyncController::init(FlightPlanBlob::from(blob), origin, SyncConfig::default());
    let t0 = Instant::now();
    let mut outcomes = Vec::new();

    for step in steps {
        let now = t0 + step.at;
        outcomes.extend(ctl.tick(now).into_iter().map(|r| r.outcome));
        match step.action {
            ScriptAction::Type { field, raw } => {
                ctl.on_edit(field, &raw, None, now);
            }
            ScriptAction::PickLevel(choice) => outcomes.push(ctl.select_level(&choice).outcome),
            ScriptAction::PickCallsign(preset) => {
                outcomes.push(ctl.select_callsign(&preset).outcome)
            }
        }
    }
    outcomes.extend(ctl.flush().into_iter().map(|r| r.outcome));
    (ctl, outcomes)
}

#[test]
fn test_replayed_session() {
    let text = fields().to_icao_fpl();
    let script = "\
# user retypes the callsign, then adjusts the route and level
0    callsign k
60   callsign kl
120  callsign klm9
400  route LOPIK UL980 NIK UN858 ABB
450  level F390
900  time 14
950  time 1430
";
    let (ctl, outcomes) = replay(&text, "EHAM", script);

    assert_eq!(
        outcomes,
        vec![
            CommitOutcome::Committed, // KLM9
            CommitOutcome::Committed, // level + pending route
            CommitOutcome::Unchanged, // route lands on identical text
            CommitOutcome::Committed, // 1430
        ]
    );
    assert_eq!(
        ctl.blob().as_str(),
        "(FPL-KLM9-IS\n-B738/M-SDE2E3FGHIRWY/LB1\n-EHAM1430\n-N0452F390 LOPIK UL980 NIK UN858 ABB\n-LFPG0055\n-PBN/A1B1C1D1O1S2 DOF/260301)"
    );
    assert_eq!(ctl.revision(), 3);
    assert!(ctl.filing_link().ends_with("%0A-EHAM1430%0A-N0452F390%20LOPIK%20UL980%20NIK%20UN858%20ABB%0A-LFPG0055%0A-PBN%2FA1B1C1D1O1S2%20DOF%2F260301%29"));
}
