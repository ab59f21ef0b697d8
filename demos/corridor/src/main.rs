//! corridor: smart vs. normal emergency preemption on one scenario.
//!
//! Reads a JSON scenario (default: `scenario.json` next to this crate), runs
//! every mission once with green-wave preemption and once with
//! stop-and-wait preemption, and prints measured and predicted mission times
//! side by side.
//!
//! ```text
//! cargo run -p corridor -- [scenario.json] [output-dir]
//! RUST_LOG=info cargo run -p corridor
//! ```
//!
//! With an output directory, each run writes `signal_states.csv`,
//! `ambulance_tracks.csv` and `events.csv` under `<output-dir>/<mode>/`.

mod network;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;

use ev_core::{AmbulanceId, SimConfig, Tick};
use ev_fleet::Mission;
use ev_output::{CsvWriter, SimOutputObserver};
use ev_signal::{ControllerParams, PreemptionMode, SignalBoard};
use ev_sim::{EventLog, SimBuilder, SimEvent, SimObserver};
use ev_spatial::AStarPlanner;

use network::NetworkSource;

const DEFAULT_SCENARIO: &str = include_str!("../scenario.json");

// ── Scenario file ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AmbulanceSpec {
    mission: Mission,
    speed_m_per_tick: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    config: SimConfig,
    /// Shared by both runs; `mode` is overridden per run.
    params: ControllerParams,
    network: NetworkSource,
    ambulances: Vec<AmbulanceSpec>,
    civilians: usize,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Collects the event log and forwards everything to the CSV writer, if any.
struct RunObserver {
    log: EventLog,
    csv: Option<SimOutputObserver<CsvWriter>>,
    snapshots: usize,
}

impl SimObserver for RunObserver {
    fn on_event(&mut self, event: &SimEvent) {
        self.log.on_event(event);
        if let Some(csv) = &mut self.csv {
            csv.on_event(event);
        }
    }

    fn on_snapshot(&mut self, tick: Tick, board: &SignalBoard, fleet: &ev_fleet::Fleet) {
        self.snapshots += 1;
        if let Some(csv) = &mut self.csv {
            csv.on_snapshot(tick, board, fleet);
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        if let Some(csv) = &mut self.csv {
            csv.on_sim_end(final_tick);
        }
    }
}

// ── Runs ──────────────────────────────────────────────────────────────────────

/// Per-ambulance measured and predicted mission times of one run.
struct RunSummary {
    mode: PreemptionMode,
    measured: Vec<Option<f64>>,
    predicted: Vec<Option<f64>>,
    idle_at: Option<Tick>,
    events: EventLog,
}

fn run_mode(scenario: &Scenario, mode: PreemptionMode, output: Option<&Path>) -> Result<RunSummary> {
    let (graph, signals) = network::load(&scenario.network)?;
    let params = ControllerParams { mode, ..scenario.params.clone() };

    let mut builder = SimBuilder::new(scenario.config.clone(), graph, AStarPlanner)
        .params(params)
        .signals(signals)
        .civilians(Default::default(), scenario.civilians);
    for spec in &scenario.ambulances {
        builder = builder.ambulance(spec.mission, spec.speed_m_per_tick);
    }
    let mut sim = builder.build().with_context(|| format!("building the {mode} run"))?;

    let csv = match output {
        Some(dir) => {
            let dir = dir.join(mode.as_str());
            std::fs::create_dir_all(&dir)?;
            Some(SimOutputObserver::new(CsvWriter::new(&dir)?))
        }
        None => None,
    };
    let mut obs = RunObserver { log: EventLog::new(), csv, snapshots: 0 };

    let t0 = Instant::now();
    let idle_at = sim.run_until_idle(scenario.config.total_ticks, &mut obs);
    log::info!(
        "{mode} run: {} events, {} snapshots in {:.3} s",
        obs.log.len(),
        obs.snapshots,
        t0.elapsed().as_secs_f64()
    );

    if let Some(e) = obs.csv.as_mut().and_then(SimOutputObserver::take_error) {
        eprintln!("output error: {e}");
    }

    let ids = (0..scenario.ambulances.len()).map(|i| AmbulanceId(i as u32));
    Ok(RunSummary {
        mode,
        measured: ids.clone().map(|id| sim.eta_secs(id)).collect(),
        predicted: ids.map(|id| sim.predicted_eta_secs(id)).collect(),
        idle_at,
        events: obs.log,
    })
}

fn fmt_secs(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_owned(), |s| format!("{s:.1}"))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let scenario_path = args.next().map(PathBuf::from);
    let output = args.next().map(PathBuf::from);

    let scenario: Scenario = match &scenario_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => serde_json::from_str(DEFAULT_SCENARIO).context("parsing built-in scenario")?,
    };

    println!("=== corridor: emergency preemption, smart vs. normal ===");
    println!(
        "Ambulances: {}  |  Civilians: {}  |  Tick: {} ms  |  Max ticks: {}",
        scenario.ambulances.len(),
        scenario.civilians,
        scenario.config.tick_duration_ms,
        scenario.config.total_ticks,
    );
    println!();

    let runs = [
        run_mode(&scenario, PreemptionMode::Smart, output.as_deref())?,
        run_mode(&scenario, PreemptionMode::Normal, output.as_deref())?,
    ];

    for run in &runs {
        let idle = run.idle_at.map_or_else(|| "not finished".to_owned(), |t| t.to_string());
        println!(
            "{:<7} idle at {idle:<14} held {:>3}  preempted {:>3}  conflicts {:>3}",
            run.mode.as_str(),
            run.events.of_kind("ambulance_held").count(),
            run.events.of_kind("signal_preempted").count(),
            run.events.of_kind("preemption_conflict").count(),
        );
    }
    println!();

    println!(
        "{:<10} {:>12} {:>12} {:>12} {:>12}",
        "Ambulance", "smart (s)", "predicted", "normal (s)", "predicted"
    );
    println!("{}", "-".repeat(62));
    let [smart, normal] = &runs;
    for i in 0..scenario.ambulances.len() {
        println!(
            "{:<10} {:>12} {:>12} {:>12} {:>12}",
            i,
            fmt_secs(smart.measured[i]),
            fmt_secs(smart.predicted[i]),
            fmt_secs(normal.measured[i]),
            fmt_secs(normal.predicted[i]),
        );
    }

    if let Some(dir) = &output {
        println!();
        println!("CSV output written to {}", dir.display());
    }
    Ok(())
}
