//! The reactive cycle: a control changes, metrics are derived, the surface
//! and the chart are refreshed.

use anyhow::Result;
use serde::Serialize;

use crate::chart::{ChartRenderer, ChartSpec};
use crate::controls::{ControlSpec, ControlValues};
use crate::derive::{
    AirQuality, EmbodiedCarbon, HabitatFitness, NutrientPulse, RunoffErosion, Simulator, StreamResponse,
};
use crate::errors::AppError;
use crate::lookup::Severity;
use crate::logging::{log, log_control_change, log_derivation, obj, v_num, v_str, Domain, Level, ProfileScope};
use crate::present::{apply, Patch, Surface};

/// Output of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub widget: &'static str,
    pub headline: f64,
    pub severity: Severity,
    pub metrics: serde_json::Value,
    pub patches: Vec<Patch>,
    pub chart: ChartSpec,
}

/// Type-erased simulator, so widgets can be listed and driven by name.
pub trait Widget {
    fn name(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn controls(&self) -> Vec<ControlSpec>;
    fn evaluate(&self, values: &ControlValues) -> Evaluation;
    fn illustrative_charts(&self) -> Vec<ChartSpec>;
}

impl<S: Simulator> Widget for S {
    fn name(&self) -> &'static str {
        Simulator::name(self)
    }

    fn title(&self) -> &'static str {
        Simulator::title(self)
    }

    fn controls(&self) -> Vec<ControlSpec> {
        Simulator::controls(self)
    }

    fn evaluate(&self, values: &ControlValues) -> Evaluation {
        let _scope = ProfileScope::with_context("derive", &[("widget", v_str(Simulator::name(self)))]);
        let metrics = self.derive(values);
        let (headline, severity) = self.headline(&metrics);
        let patches = self.patches(&metrics);
        let chart = self.chart(&metrics);
        let metrics = serde_json::to_value(&metrics).unwrap_or(serde_json::Value::Null);
        Evaluation { widget: Simulator::name(self), headline, severity, metrics, patches, chart }
    }

    fn illustrative_charts(&self) -> Vec<ChartSpec> {
        Simulator::illustrative_charts(self)
    }
}

/// Every simulator, in menu order.
pub fn registry() -> Vec<Box<dyn Widget>> {
    vec![
        Box::new(NutrientPulse),
        Box::new(RunoffErosion),
        Box::new(AirQuality),
        Box::new(StreamResponse),
        Box::new(HabitatFitness),
        Box::new(EmbodiedCarbon),
    ]
}

pub fn find(name: &str) -> Result<Box<dyn Widget>, AppError> {
    registry()
        .into_iter()
        .find(|w| w.name() == name)
        .ok_or_else(|| AppError::UnknownWidget(name.to_string()))
}

/// One live widget: its control values plus the last evaluation.
pub struct WidgetSession {
    widget: Box<dyn Widget>,
    values: ControlValues,
    last: Option<Evaluation>,
}

impl WidgetSession {
    pub fn new(widget: Box<dyn Widget>) -> Self {
        let values = ControlValues::new(widget.controls());
        Self { widget, values, last: None }
    }

    pub fn by_name(name: &str) -> Result<Self, AppError> {
        Ok(Self::new(find(name)?))
    }

    pub fn widget(&self) -> &dyn Widget {
        self.widget.as_ref()
    }

    pub fn values(&self) -> &ControlValues {
        &self.values
    }

    pub fn last(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    /// Set a control without re-evaluating.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), AppError> {
        let applied = self.values.set(name, raw)?;
        let applied = serde_json::to_value(applied).unwrap_or(serde_json::Value::Null);
        log_control_change(self.widget.name(), name, raw, &applied);
        Ok(())
    }

    /// Derive and return the current evaluation.
    pub fn evaluate(&mut self) -> &Evaluation {
        let evaluation = self.widget.evaluate(&self.values);
        log_derivation(self.widget.name(), evaluation.severity.label(), evaluation.headline);
        self.last.insert(evaluation)
    }

    /// Full cycle: derive, project onto the surface, push the chart.
    pub fn refresh(&mut self, surface: &mut dyn Surface, charts: &mut dyn ChartRenderer) -> Result<&Evaluation> {
        let widget = self.widget.name();
        let evaluation = self.evaluate();
        apply(&evaluation.patches, surface);
        log(
            Level::Trace,
            Domain::Render,
            "patched",
            obj(&[("widget", v_str(widget)), ("patches", v_num(evaluation.patches.len() as f64))]),
        );
        charts.render(&evaluation.chart)?;
        Ok(evaluation)
    }

    /// A control-change event: apply the value, then run the full cycle.
    pub fn change(
        &mut self,
        name: &str,
        raw: &str,
        surface: &mut dyn Surface,
        charts: &mut dyn ChartRenderer,
    ) -> Result<&Evaluation> {
        self.set(name, raw)?;
        self.refresh(surface, charts)
    }
}
