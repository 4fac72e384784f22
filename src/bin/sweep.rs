//! Sweep one control of a widget across its range and chart a metric.
//!
//! Usage: cargo run --bin sweep -- runoff_erosion rainfall_mm runoff_mm --steps 20

use anyhow::{anyhow, bail, Result};
use clap::Parser;

use ecosim::chart::{ChartRenderer, ChartSpec, InstrumentedRenderer, JsonFileRenderer};
use ecosim::controls::{ControlKind, ControlValues};
use ecosim::errors::{install_panic_hook, report_error};
use ecosim::logging::ProfileScope;
use ecosim::widget::{find, Widget};

#[derive(Parser, Debug)]
#[command(name = "sweep")]
struct Args {
    widget: String,
    /// Control to vary; every other control stays at its default
    control: String,
    /// Numeric field of the widget's metrics to plot
    metric: String,
    /// Points across a range control (select controls use their options)
    #[arg(long, default_value_t = 10)]
    steps: u32,
    /// Write the chart spec here instead of printing it
    #[arg(long, env = "ECOSIM_CHART_DIR")]
    chart_dir: Option<std::path::PathBuf>,
}

fn sweep_points(kind: &ControlKind, steps: u32) -> Vec<String> {
    match kind {
        ControlKind::Range { min, max, .. } => {
            let steps = steps.max(1);
            (0..=steps)
                .map(|i| {
                    let v = min + (max - min) * i as f64 / steps as f64;
                    format!("{}", (v * 1000.0).round() / 1000.0)
                })
                .collect()
        }
        ControlKind::Select { options, .. } => options.iter().map(|o| o.to_string()).collect(),
    }
}

fn metric_at(widget: &dyn Widget, control: &str, raw: &str, metric: &str) -> Result<f64> {
    let mut values = ControlValues::new(widget.controls());
    values.set(control, raw)?;
    let evaluation = widget.evaluate(&values);
    evaluation
        .metrics
        .get(metric)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow!("{} has no numeric metric '{}'", widget.name(), metric))
}

fn run(args: Args) -> Result<()> {
    let widget = find(&args.widget)?;
    let spec = widget
        .controls()
        .into_iter()
        .find(|c| c.name == args.control)
        .ok_or_else(|| anyhow!("{} has no control '{}'", args.widget, args.control))?;

    let _scope = ProfileScope::new("sweep");
    let points = sweep_points(&spec.kind, args.steps);
    if points.is_empty() {
        bail!("control '{}' has nothing to sweep", args.control);
    }
    let data = points
        .iter()
        .map(|raw| metric_at(widget.as_ref(), &args.control, raw, &args.metric))
        .collect::<Result<Vec<f64>>>()?;

    let id = format!("{}-{}-sweep", args.widget, args.control);
    let chart = match spec.kind {
        ControlKind::Range { .. } => ChartSpec::line(&id, points.clone()),
        ControlKind::Select { .. } => ChartSpec::bar(&id, points.clone()),
    }
    .with_dataset(&args.metric, data)
    .with_title(&format!("{} vs {}", args.metric, spec.label));

    match args.chart_dir {
        Some(dir) => {
            let mut renderer = InstrumentedRenderer::new(JsonFileRenderer::new(dir));
            renderer.render(&chart)?;
            println!("{}", renderer.inner().path_for(&chart).display());
        }
        None => println!("{}", serde_json::to_string_pretty(&chart)?),
    }
    Ok(())
}

fn main() {
    install_panic_hook();
    if let Err(err) = run(Args::parse()) {
        report_error(&err);
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
