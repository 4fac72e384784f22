//! Control surface: declared inputs of a widget and their current values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::ControlError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    Range { min: f64, max: f64, step: f64, default: f64 },
    Select { options: Vec<&'static str>, default: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: ControlKind,
}

impl ControlSpec {
    pub fn range(name: &'static str, label: &'static str, min: f64, max: f64, step: f64, default: f64) -> Self {
        Self { name, label, kind: ControlKind::Range { min, max, step, default } }
    }

    pub fn select(name: &'static str, label: &'static str, options: Vec<&'static str>, default: &'static str) -> Self {
        Self { name, label, kind: ControlKind::Select { options, default } }
    }

    pub fn default_value(&self) -> ControlValue {
        match &self.kind {
            ControlKind::Range { default, .. } => ControlValue::Number(*default),
            ControlKind::Select { default, .. } => ControlValue::Tag((*default).to_string()),
        }
    }

    /// Interpret raw input text for this control.
    pub fn parse(&self, raw: &str) -> Result<ControlValue, ControlError> {
        match &self.kind {
            ControlKind::Range { min, max, step, .. } => {
                let value: f64 = raw.trim().parse().map_err(|_| ControlError::NotNumeric {
                    name: self.name.to_string(),
                    raw: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(ControlError::NotNumeric {
                        name: self.name.to_string(),
                        raw: raw.to_string(),
                    });
                }
                Ok(ControlValue::Number(snap(value.clamp(*min, *max), *min, *max, *step)))
            }
            // Unknown tags are kept; the lookup tables fall back on them.
            ControlKind::Select { .. } => Ok(ControlValue::Tag(raw.trim().to_lowercase())),
        }
    }
}

/// Nearest slider position `min + k * step`, kept inside `[min, max]`.
fn snap(value: f64, min: f64, max: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return value;
    }
    let snapped = min + ((value - min) / step).round() * step;
    // Strip float noise like 25.000000000000004
    let snapped = (snapped * 1e9).round() / 1e9;
    snapped.clamp(min, max)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Number(f64),
    Tag(String),
}

impl ControlValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ControlValue::Number(n) => Some(*n),
            ControlValue::Tag(_) => None,
        }
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            ControlValue::Tag(t) => Some(t),
            ControlValue::Number(_) => None,
        }
    }
}

/// Current values of every control of one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlValues {
    specs: Vec<ControlSpec>,
    values: BTreeMap<&'static str, ControlValue>,
}

impl ControlValues {
    /// Values at their declared defaults.
    pub fn new(specs: Vec<ControlSpec>) -> Self {
        let values = specs.iter().map(|s| (s.name, s.default_value())).collect();
        Self { specs, values }
    }

    pub fn specs(&self) -> &[ControlSpec] {
        &self.specs
    }

    pub fn set(&mut self, name: &str, raw: &str) -> Result<&ControlValue, ControlError> {
        let spec = self
            .specs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ControlError::UnknownControl(name.to_string()))?;
        let value = spec.parse(raw)?;
        let slot = self.values.entry(spec.name).or_insert_with(|| spec.default_value());
        *slot = value;
        Ok(slot)
    }

    /// Apply `name=value` pairs in order, stopping at the first failure.
    pub fn apply_pairs<'a, I>(&mut self, pairs: I) -> Result<(), ControlError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, raw) in pairs {
            self.set(name, raw)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ControlValue> {
        self.values.get(name)
    }

    /// Numeric value, or the declared default (0.0 for undeclared names).
    pub fn number(&self, name: &str) -> f64 {
        self.get(name)
            .and_then(ControlValue::as_number)
            .or_else(|| self.declared_default(name).and_then(|v| v.as_number()))
            .unwrap_or(0.0)
    }

    /// Tag value, or the declared default ("" for undeclared names).
    pub fn tag(&self, name: &str) -> String {
        self.get(name)
            .and_then(|v| v.as_tag().map(str::to_string))
            .or_else(|| self.declared_default(name).and_then(|v| v.as_tag().map(str::to_string)))
            .unwrap_or_default()
    }

    fn declared_default(&self, name: &str) -> Option<ControlValue> {
        self.specs.iter().find(|s| s.name == name).map(ControlSpec::default_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ControlValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

/// Split `name=value` CLI arguments.
pub fn parse_pair(arg: &str) -> Option<(&str, &str)> {
    let (name, value) = arg.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}
