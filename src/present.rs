//! Presentation updater: derived metrics become patches, patches land on a surface.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::derive::clamp_pct;
use crate::lookup::Severity;

/// One write to an output node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch {
    Text { node: String, text: String },
    Width { node: String, pct: f64 },
    Color { node: String, hex: String },
}

impl Patch {
    pub fn text(node: &str, text: impl Into<String>) -> Self {
        Patch::Text { node: node.to_string(), text: text.into() }
    }

    pub fn width(node: &str, pct: f64) -> Self {
        Patch::Width { node: node.to_string(), pct }
    }

    pub fn color(node: &str, hex: &str) -> Self {
        Patch::Color { node: node.to_string(), hex: hex.to_string() }
    }

    pub fn node(&self) -> &str {
        match self {
            Patch::Text { node, .. } | Patch::Width { node, .. } | Patch::Color { node, .. } => node,
        }
    }
}

/// Headline value, its band label, and the proportional bar, colored by band.
pub fn banded(prefix: &str, value_text: String, severity: Severity, bar_pct: f64) -> Vec<Patch> {
    vec![
        Patch::text(&format!("{prefix}-value"), value_text),
        Patch::text(&format!("{prefix}-label"), severity.label()),
        Patch::color(&format!("{prefix}-label"), severity.color()),
        Patch::width(&format!("{prefix}-bar"), bar_pct),
        Patch::color(&format!("{prefix}-bar"), severity.color()),
    ]
}

/// Output nodes a widget writes to.
pub trait Surface {
    fn set_text(&mut self, node: &str, text: &str);
    fn set_width_pct(&mut self, node: &str, pct: f64);
    fn set_color(&mut self, node: &str, hex: &str);
}

pub fn apply(patches: &[Patch], surface: &mut dyn Surface) {
    for patch in patches {
        match patch {
            Patch::Text { node, text } => surface.set_text(node, text),
            Patch::Width { node, pct } => surface.set_width_pct(node, clamp_pct(*pct)),
            Patch::Color { node, hex } => surface.set_color(node, hex),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// In-memory node tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySurface {
    pub nodes: BTreeMap<String, NodeState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, node: &str) -> Option<&str> {
        self.nodes.get(node).and_then(|n| n.text.as_deref())
    }

    pub fn width(&self, node: &str) -> Option<f64> {
        self.nodes.get(node).and_then(|n| n.width_pct)
    }

    pub fn color(&self, node: &str) -> Option<&str> {
        self.nodes.get(node).and_then(|n| n.color.as_deref())
    }
}

impl Surface for MemorySurface {
    fn set_text(&mut self, node: &str, text: &str) {
        self.nodes.entry(node.to_string()).or_default().text = Some(text.to_string());
    }

    fn set_width_pct(&mut self, node: &str, pct: f64) {
        self.nodes.entry(node.to_string()).or_default().width_pct = Some(pct);
    }

    fn set_color(&mut self, node: &str, hex: &str) {
        self.nodes.entry(node.to_string()).or_default().color = Some(hex.to_string());
    }
}

/// Line-oriented rendering for a terminal: text as `node: text`, widths as bars.
pub struct TerminalSurface<W: Write> {
    out: W,
    bar_cells: usize,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out, bar_cells: 30 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn set_text(&mut self, node: &str, text: &str) {
        let _ = writeln!(self.out, "{:<28} {}", node, text);
    }

    fn set_width_pct(&mut self, node: &str, pct: f64) {
        let filled = ((pct / 100.0) * self.bar_cells as f64).round() as usize;
        let filled = filled.min(self.bar_cells);
        let _ = writeln!(
            self.out,
            "{:<28} [{}{}] {:>5.1}%",
            node,
            "#".repeat(filled),
            ".".repeat(self.bar_cells - filled),
            pct
        );
    }

    // Colors carry no meaning on a plain terminal.
    fn set_color(&mut self, _node: &str, _hex: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_writes_every_node() {
        let mut surface = MemorySurface::new();
        apply(&banded("pulse", "10.3".into(), Severity::Critical, 100.0), &mut surface);
        assert_eq!(surface.text("pulse-value"), Some("10.3"));
        assert_eq!(surface.text("pulse-label"), Some("Critical"));
        assert_eq!(surface.color("pulse-bar"), Some("#c62828"));
        assert_eq!(surface.width("pulse-bar"), Some(100.0));
    }

    #[test]
    fn test_widths_clamped_on_apply() {
        let mut surface = MemorySurface::new();
        apply(&[Patch::width("a", 180.0), Patch::width("b", -4.0)], &mut surface);
        assert_eq!(surface.width("a"), Some(100.0));
        assert_eq!(surface.width("b"), Some(0.0));
    }

    #[test]
    fn test_terminal_bar() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.set_width_pct("bar", 50.0);
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.contains(&format!("[{}{}]", "#".repeat(15), ".".repeat(15))));
        assert!(out.contains("50.0%"));
    }
}
