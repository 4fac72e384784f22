use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use ecosim::app::{Action, Dashboard, LogKind, Outcome, Session, Settings, Units};
use ecosim::chart::{ChartRenderer, InstrumentedRenderer, JsonFileRenderer, MemoryRenderer};
use ecosim::controls::{parse_pair, ControlKind};
use ecosim::errors::{install_panic_hook, report_error, StderrNotifier};
use ecosim::geo::EnvLocation;
use ecosim::logging::{log, obj, v_str, Domain, Level};
use ecosim::present::{apply, TerminalSurface};
use ecosim::state::{Config, StoreBackend};
use ecosim::tracker::Form;
use ecosim::widget::{find, registry, WidgetSession};

/// Environmental simulators and personal footprint trackers
#[derive(Parser, Debug)]
#[command(name = "ecosim", version)]
struct Cli {
    /// Storage backend: sqlite, file or memory
    #[arg(long, env = "ECOSIM_STORE", global = true)]
    store: Option<String>,

    /// SQLite file or data directory
    #[arg(long, env = "ECOSIM_STORE_PATH", global = true)]
    store_path: Option<String>,

    /// Where chart specs are written
    #[arg(long, env = "ECOSIM_CHART_DIR", global = true)]
    chart_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List widgets and their controls
    List,
    /// Evaluate one widget with the given control values
    Simulate {
        widget: String,
        /// name=value control settings
        pairs: Vec<String>,
        /// Write the chart spec to the chart directory
        #[arg(long)]
        chart: bool,
    },
    /// Write a widget's illustrative charts
    Charts { widget: String },
    /// Submit a record: activity, water, waste, purchase or sighting
    Log {
        kind: String,
        /// field=value form fields
        pairs: Vec<String>,
    },
    /// Delete a record by id
    Delete { kind: String, id: String },
    /// Print one log as JSON, newest first
    Show { kind: String },
    /// Today's tracker summary
    Dashboard {
        #[arg(long)]
        chart: bool,
    },
    /// Change daily targets or display units
    Settings {
        #[arg(long)]
        water_target: Option<f64>,
        #[arg(long)]
        carbon_budget: Option<f64>,
        #[arg(long)]
        units: Option<String>,
    },
}

fn config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(store) = &cli.store {
        config.store = StoreBackend::parse(store)?;
    }
    if let Some(path) = &cli.store_path {
        config.store_path = path.clone();
    }
    if let Some(dir) = &cli.chart_dir {
        config.chart_dir = dir.clone();
    }
    Ok(config)
}

fn pairs(raw: &[String]) -> Result<Vec<(&str, &str)>> {
    raw.iter()
        .map(|arg| parse_pair(arg).ok_or_else(|| anyhow!("expected name=value, got '{}'", arg)))
        .collect()
}

fn log_kind(raw: &str) -> Result<LogKind> {
    LogKind::parse(raw).ok_or_else(|| anyhow!("unknown log '{}' (activity|water|waste|purchase|sighting)", raw))
}

fn report(outcome: Option<Outcome>) -> ExitCode {
    match outcome {
        Some(Outcome::Added { id, .. }) => {
            println!("added {}", id);
            ExitCode::SUCCESS
        }
        Some(Outcome::Deleted { id, .. }) => {
            println!("deleted {}", id);
            ExitCode::SUCCESS
        }
        Some(Outcome::SettingsUpdated) => {
            println!("settings updated");
            ExitCode::SUCCESS
        }
        None => ExitCode::from(2),
    }
}

fn list() {
    for widget in registry() {
        println!("{}  ({})", widget.name(), widget.title());
        for control in widget.controls() {
            match &control.kind {
                ControlKind::Range { min, max, default, .. } => {
                    println!("    {:<16} {} [{}..{}] default {}", control.name, control.label, min, max, default)
                }
                ControlKind::Select { options, default } => {
                    println!("    {:<16} {} {{{}}} default {}", control.name, control.label, options.join("|"), default)
                }
            }
        }
    }
}

fn simulate(config: &Config, widget: &str, raw_pairs: &[String], chart: bool) -> Result<()> {
    let mut session = WidgetSession::by_name(widget)?;
    for (name, value) in pairs(raw_pairs)? {
        session.set(name, value)?;
    }
    let stdout = io::stdout();
    let mut surface = TerminalSurface::new(stdout.lock());
    let mut renderer: Box<dyn ChartRenderer> = if chart {
        Box::new(InstrumentedRenderer::new(JsonFileRenderer::new(&config.chart_dir)))
    } else {
        Box::new(MemoryRenderer::default())
    };
    let evaluation = session.refresh(&mut surface, renderer.as_mut())?;
    let mut out = surface.into_inner();
    writeln!(out, "{}", serde_json::to_string_pretty(&evaluation.metrics)?)?;
    if chart {
        writeln!(out, "chart {}", config.chart_dir.join(format!("{}.json", evaluation.chart.id)).display())?;
    }
    Ok(())
}

fn charts(config: &Config, widget: &str) -> Result<()> {
    let widget = find(widget)?;
    let mut renderer = InstrumentedRenderer::new(JsonFileRenderer::new(&config.chart_dir));
    let specs = widget.illustrative_charts();
    if specs.is_empty() {
        println!("{} has no illustrative charts", widget.name());
    }
    for spec in specs {
        renderer.render(&spec)?;
        println!("{}", renderer.inner().path_for(&spec).display());
    }
    Ok(())
}

fn dashboard(config: &Config, chart: bool) -> Result<()> {
    let session = Session::open(config.open_store()?, StderrNotifier);
    let mut state = session.state().clone();
    state.settings = config.overlay(state.settings);
    let dash = Dashboard::from_state(&state, Utc::now().date_naive());

    let stdout = io::stdout();
    let mut surface = TerminalSurface::new(stdout.lock());
    apply(&dash.patches, &mut surface);
    if chart {
        let mut renderer = InstrumentedRenderer::new(JsonFileRenderer::new(&config.chart_dir));
        for spec in &dash.charts {
            renderer.render(spec)?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = config(&cli)?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("store", v_str(&format!("{:?}", config.store))), ("path", v_str(&config.store_path))]),
    );

    let now = Utc::now();
    match &cli.command {
        Command::List => list(),
        Command::Simulate { widget, pairs, chart } => simulate(&config, widget, pairs, *chart)?,
        Command::Charts { widget } => charts(&config, widget)?,
        Command::Log { kind, pairs: raw } => {
            let kind = log_kind(kind)?;
            let form = Form::from_pairs(pairs(raw)?);
            let mut session = Session::open(config.open_store()?, StderrNotifier);
            let outcome = match kind {
                LogKind::Sightings => session.submit_sighting(form, &mut EnvLocation, now)?,
                _ => session.submit(kind, form, now)?,
            };
            return Ok(report(outcome));
        }
        Command::Delete { kind, id } => {
            let log = log_kind(kind)?;
            let mut session = Session::open(config.open_store()?, StderrNotifier);
            let outcome = session.apply(Action::Delete { log, id: id.clone() }, now)?;
            return Ok(report(outcome));
        }
        Command::Show { kind } => {
            let kind = log_kind(kind)?;
            let session = Session::open(config.open_store()?, StderrNotifier);
            println!("{}", serde_json::to_string_pretty(&session.state().listing(kind))?);
        }
        Command::Dashboard { chart } => dashboard(&config, *chart)?,
        Command::Settings { water_target, carbon_budget, units } => {
            let mut session = Session::open(config.open_store()?, StderrNotifier);
            let current = session.state().settings.clone();
            let units = match units {
                Some(raw) => Units::parse(raw).ok_or_else(|| anyhow!("unknown units '{}' (metric|imperial)", raw))?,
                None => current.units,
            };
            if water_target.is_none() && carbon_budget.is_none() && units == current.units {
                bail!("nothing to change");
            }
            let settings = Settings {
                daily_water_target_l: water_target.unwrap_or(current.daily_water_target_l),
                daily_carbon_budget_kg: carbon_budget.unwrap_or(current.daily_carbon_budget_kg),
                units,
            };
            let outcome = session.apply(Action::UpdateSettings(settings), now)?;
            return Ok(report(outcome));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    install_panic_hook();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
