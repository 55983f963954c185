// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fpl_sync_core::builder::FplFields;
use fpl_sync_core::config::SyncConfig;
use fpl_sync_core::extract::{extract_callsign, extract_origin_time, extract_speed_level_route};
use fpl_sync_core::sanitize::FieldKind;
use fpl_sync_core::script::{parse_script, ScriptAction};
use fpl_sync_core::sync::{CommitReport, SyncController};
use fpl_sync_core::FlightPlanBlob;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.json (quiet periods, filing link target)
    #[arg(short, long, env = "FPL_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log commits and scheduling decisions
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the editable fields found in a flight plan
    Show {
        #[arg(short, long)]
        origin: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        blob: PathBuf,
    },
    /// Edit fields of a flight plan and print the result
    Edit {
        #[arg(short, long)]
        origin: String,
        #[arg(long)]
        callsign: Option<String>,
        /// Departure time, HHMM (or "now" for the current UTC time)
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        route: Option<String>,
        /// Write the result back to the file
        #[arg(long)]
        in_place: bool,
        blob: PathBuf,
    },
    /// Compose a flight plan from a JSON field file
    Build { fields: PathBuf },
    /// Replay a timed edit script against a flight plan
    Replay {
        #[arg(short, long)]
        origin: String,
        blob: PathBuf,
        script: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    // A logger can only be installed once; a second init is harmless.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn load_blob(path: &Path) -> Result<FlightPlanBlob> {
    FlightPlanBlob::load(path).with_context(|| format!("Failed to read flight plan {:?}", path))
}

fn print_report(report: &CommitReport) {
    println!("{:?} '{}' -> {:?}", report.field, report.value, report.outcome);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SyncConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Show { origin, json, blob } => {
            let blob = load_blob(&blob)?;
            let text = blob.as_str();
            let ctl = SyncController::init(blob.clone(), &origin, config);

            let callsign = extract_callsign(text).map(|c| c.callsign);
            let time = extract_origin_time(text, &origin).map(|c| c.time_digits);
            let slr = extract_speed_level_route(text);

            if json {
                let value = serde_json::json!({
                    "callsign": callsign,
                    "departure_time": time,
                    "speed": slr.as_ref().map(|c| c.speed.clone()),
                    "level": slr.as_ref().map(|c| c.level.clone()),
                    "route": slr.as_ref().map(|c| c.route().to_string()),
                    "filing_link": ctl.filing_link(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let show = |v: Option<&str>| v.unwrap_or("-").to_string();
                println!("Callsign:       {}", show(callsign.as_deref()));
                println!("Departure time: {}", show(time.as_deref()));
                println!("Speed:          {}", show(slr.as_ref().map(|c| c.speed.as_str())));
                println!("Level:          {}", show(slr.as_ref().map(|c| c.level.as_str())));
                println!("Route:          {}", show(slr.as_ref().map(|c| c.route())));
                println!("Filing link:    {}", ctl.filing_link());
            }
        }
        Commands::Edit {
            origin,
            callsign,
            time,
            level,
            route,
            in_place,
            blob: path,
        } => {
            let blob = load_blob(&path)?;
            let mut ctl = SyncController::init(blob, &origin, config);
            let now = Instant::now();

            // Route is typed before the level pick so the level commit carries it.
            if let Some(route) = &route {
                ctl.on_edit(FieldKind::Route, route, None, now);
            }
            if let Some(callsign) = &callsign {
                ctl.on_edit(FieldKind::Callsign, callsign, None, now);
            }
            match time.as_deref() {
                Some("now") => print_report(&ctl.use_current_time(chrono::Utc::now())),
                Some(time) => {
                    ctl.on_edit(FieldKind::DepartureTime, time, None, now);
                }
                None => {}
            }
            if let Some(level) = &level {
                print_report(&ctl.select_level(level));
            }
            for report in ctl.flush() {
                print_report(&report);
            }

            let link = ctl.filing_link().to_string();
            let result = ctl.dispose();
            if in_place {
                std::fs::write(&path, result.as_str())
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Updated {:?}", path);
            } else {
                println!("{}", result);
            }
            println!("Filing link: {}", link);
        }
        Commands::Build { fields } => {
            let fields = FplFields::load(&fields)
                .with_context(|| format!("Failed to read fields {:?}", fields))?;
            println!("{}", fields.to_icao_fpl());
        }
        Commands::Replay {
            origin,
            blob,
            script,
        } => {
            let blob = load_blob(&blob)?;
            let script_text = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {:?}", script))?;
            let steps = parse_script(&script_text)?;

            let mut ctl = SyncController::init(blob, &origin, config);
            let t0 = Instant::now();
            for step in steps {
                let now = t0 + step.at;
                for report in ctl.tick(now) {
                    print!("[{:>6} ms] ", step.at.as_millis());
                    print_report(&report);
                }
                match step.action {
                    ScriptAction::Type { field, raw } => {
                        let shown = ctl.on_edit(field, &raw, None, now);
                        log::debug!("{:?} shows '{}'", field, shown.text);
                    }
                    ScriptAction::PickLevel(choice) => {
                        print!("[{:>6} ms] ", step.at.as_millis());
                        print_report(&ctl.select_level(&choice));
                    }
                    ScriptAction::PickCallsign(preset) => {
                        print!("[{:>6} ms] ", step.at.as_millis());
                        print_report(&ctl.select_callsign(&preset));
                    }
                }
            }
            for report in ctl.flush() {
                print!("[ flush  ] ");
                print_report(&report);
            }

            println!();
            println!("{}", ctl.blob());
            println!("Filing link: {}", ctl.filing_link());
        }
    }

    Ok(())
}
