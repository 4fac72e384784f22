//! Chart adapter: shapes labels and series into the charting library's
//! configuration object and hands it to a renderer.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Doughnut,
    Radar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub background_color: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePlugin {
    pub display: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Plugins {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TitlePlugin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: Plugins,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self { responsive: true, plugins: Plugins::default() }
    }
}

/// A chart configuration: `{type, data: {labels, datasets}, options}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Stable identifier, used as the canvas id / output file stem.
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl ChartSpec {
    pub fn new<L: Into<String>>(id: &str, kind: ChartKind, labels: impl IntoIterator<Item = L>) -> Self {
        Self {
            id: id.to_string(),
            kind,
            data: ChartData {
                labels: labels.into_iter().map(Into::into).collect(),
                datasets: Vec::new(),
            },
            options: ChartOptions::default(),
        }
    }

    pub fn bar<L: Into<String>>(id: &str, labels: impl IntoIterator<Item = L>) -> Self {
        Self::new(id, ChartKind::Bar, labels)
    }

    pub fn doughnut<L: Into<String>>(id: &str, labels: impl IntoIterator<Item = L>) -> Self {
        Self::new(id, ChartKind::Doughnut, labels)
    }

    pub fn radar<L: Into<String>>(id: &str, labels: impl IntoIterator<Item = L>) -> Self {
        Self::new(id, ChartKind::Radar, labels)
    }

    pub fn line<L: Into<String>>(id: &str, labels: impl IntoIterator<Item = L>) -> Self {
        Self::new(id, ChartKind::Line, labels)
    }

    pub fn with_dataset(mut self, label: &str, data: Vec<f64>) -> Self {
        self.data.datasets.push(Dataset { label: label.to_string(), data, background_color: Vec::new() });
        self
    }

    pub fn with_colored_dataset(mut self, label: &str, data: Vec<f64>, colors: Vec<&str>) -> Self {
        self.data.datasets.push(Dataset {
            label: label.to_string(),
            data,
            background_color: colors.into_iter().map(str::to_string).collect(),
        });
        self
    }

    pub fn with_title(mut self, text: &str) -> Self {
        self.options.plugins.title = Some(TitlePlugin { display: true, text: text.to_string() });
        self
    }

    /// Every series has one point per label.
    pub fn is_well_formed(&self) -> bool {
        let n = self.data.labels.len();
        self.data.datasets.iter().all(|d| d.data.len() == n)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// The external charting facility.
pub trait ChartRenderer {
    fn render(&mut self, spec: &ChartSpec) -> Result<()>;
}

/// Writes `<dir>/<id>.json` per chart.
pub struct JsonFileRenderer {
    dir: PathBuf,
}

impl JsonFileRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, spec: &ChartSpec) -> PathBuf {
        self.dir.join(format!("{}.json", spec.id))
    }
}

impl ChartRenderer for JsonFileRenderer {
    fn render(&mut self, spec: &ChartSpec) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating chart dir {}", self.dir.display()))?;
        let path = self.path_for(spec);
        let body = serde_json::to_string_pretty(spec)?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Keeps the latest spec per chart id.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    pub charts: HashMap<String, ChartSpec>,
    pub renders: usize,
}

impl ChartRenderer for MemoryRenderer {
    fn render(&mut self, spec: &ChartSpec) -> Result<()> {
        self.renders += 1;
        self.charts.insert(spec.id.clone(), spec.clone());
        Ok(())
    }
}

/// Timing wrapper around any renderer; distinguishes first render from updates.
pub struct InstrumentedRenderer<R: ChartRenderer> {
    inner: R,
    seen: HashMap<String, u64>,
}

impl<R: ChartRenderer> InstrumentedRenderer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, seen: HashMap::new() }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Number of times a chart id has been rendered.
    pub fn render_count(&self, id: &str) -> u64 {
        self.seen.get(id).copied().unwrap_or(0)
    }
}

impl<R: ChartRenderer> ChartRenderer for InstrumentedRenderer<R> {
    fn render(&mut self, spec: &ChartSpec) -> Result<()> {
        let count = self.seen.entry(spec.id.clone()).or_insert(0);
        let phase = if *count == 0 { "create" } else { "update" };
        *count += 1;

        let scope = ProfileScope::with_context("chart_render", &[("chart", v_str(&spec.id))]);
        let result = self.inner.render(spec);
        log(
            Level::Debug,
            Domain::Chart,
            "chart_render",
            obj(&[
                ("chart", v_str(&spec.id)),
                ("phase", v_str(phase)),
                ("points", v_num(spec.data.datasets.iter().map(|d| d.data.len()).sum::<usize>() as f64)),
                ("elapsed_ms", v_num(scope.elapsed_ms())),
                ("ok", serde_json::Value::Bool(result.is_ok())),
            ]),
        );
        result
    }
}
