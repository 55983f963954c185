// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// Composes a fresh multiline ICAO FPL message. The text it produces is what the
// sync controller later edits clause by clause.

use crate::FplError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FplFields {
    pub callsign: String,
    pub actype: String,
    pub wakecat: String,
    pub equipment: String,
    pub surveillance: String,
    pub dep_icao: String,
    pub dep_time: String,
    pub speed: String,
    pub level: String,
    pub route: String,
    pub dest_icao: String,
    pub eet: String,
    pub alt1: String,
    pub alt2: String,
    // Item 18
    pub pbn: String,
    pub nav: String,
    pub rnp: String,
    pub dof: String,
    pub reg: String,
    pub sel: String,
    pub code: String,
    pub rvr: String,
    pub opr: String,
    pub per: String,
    pub rmk: String,
}

impl FplFields {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FplError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Item 18 tokens, in filing order. `RNP` carries no slash.
    fn other_info(&self) -> Vec<String> {
        let slashed = [
            ("PBN", &self.pbn),
            ("NAV", &self.nav),
            ("RNP", &self.rnp),
            ("DOF", &self.dof),
            ("REG", &self.reg),
            ("SEL", &self.sel),
            ("CODE", &self.code),
            ("RVR", &self.rvr),
            ("OPR", &self.opr),
            ("PER", &self.per),
            ("RMK", &self.rmk),
        ];

        slashed
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| {
                if *key == "RNP" {
                    format!("RNP{}", value)
                } else {
                    format!("{}/{}", key, value)
                }
            })
            .collect()
    }

    /// Builds the message. The closing parenthesis goes on the last line.
    pub fn to_icao_fpl(&self) -> String {
        let mut lines = vec![
            format!("(FPL-{}-IS", self.callsign),
            format!(
                "-{}/{}-{}{}",
                self.actype, self.wakecat, self.equipment, self.surveillance
            ),
            format!("-{}{}", self.dep_icao, self.dep_time),
        ];

        let route = self.route.trim();
        let route_part = if route.is_empty() {
            String::new()
        } else {
            format!(" {}", route)
        };
        lines.push(format!("-{}{}{}", self.speed, self.level, route_part));

        let mut dest = format!("-{}{}", self.dest_icao, self.eet);
        for alt in [&self.alt1, &self.alt2] {
            let alt = alt.trim();
            if !alt.is_empty() {
                dest.push(' ');
                dest.push_str(alt);
            }
        }
        lines.push(dest);

        let other = self.other_info();
        if !other.is_empty() {
            lines.push(format!("-{}", other.join(" ")));
        }

        if let Some(last) = lines.last_mut() {
            last.push(')');
        }
        lines.join("\n")
    }
}
