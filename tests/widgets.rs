//! End-to-end widget cycle: control change -> derive -> surface + chart.

use ecosim::chart::{InstrumentedRenderer, JsonFileRenderer, MemoryRenderer};
use ecosim::controls::ControlValues;
use ecosim::present::{MemorySurface, Patch};
use ecosim::widget::{find, registry, WidgetSession};

// ---------------------------------------------------------------------------
// Page load renders every widget at its defaults
// ---------------------------------------------------------------------------
#[test]
fn every_widget_renders_on_load() {
    for widget in registry() {
        let mut session = WidgetSession::new(widget);
        let mut surface = MemorySurface::new();
        let mut charts = MemoryRenderer::default();
        let evaluation = session.refresh(&mut surface, &mut charts).unwrap().clone();

        for patch in &evaluation.patches {
            match patch {
                Patch::Text { node, text } => assert_eq!(surface.text(node), Some(text.as_str())),
                Patch::Width { node, .. } => {
                    let width = surface.width(node).unwrap();
                    assert!((0.0..=100.0).contains(&width), "{node} width {width}");
                }
                Patch::Color { node, hex } => assert_eq!(surface.color(node), Some(hex.as_str())),
            }
        }
        assert!(charts.charts.contains_key(&evaluation.chart.id));
        assert!(evaluation.chart.is_well_formed());
    }
}

// ---------------------------------------------------------------------------
// Changing a control re-renders the same chart id (update, not create)
// ---------------------------------------------------------------------------
#[test]
fn control_change_updates_existing_chart() {
    let mut session = WidgetSession::by_name("runoff_erosion").unwrap();
    let mut surface = MemorySurface::new();
    let mut charts = InstrumentedRenderer::new(MemoryRenderer::default());

    let first_id = session.refresh(&mut surface, &mut charts).unwrap().chart.id.clone();
    session.change("rainfall_mm", "150", &mut surface, &mut charts).unwrap();
    session.change("rainfall_mm", "0", &mut surface, &mut charts).unwrap();

    assert_eq!(charts.render_count(&first_id), 3);
    assert_eq!(charts.inner().charts.len(), 1);
    assert_eq!(session.last().unwrap().metrics["runoff_mm"], 0.0);
}

// ---------------------------------------------------------------------------
// Out-of-range input is clamped, unknown tags fall back, garbage is refused
// ---------------------------------------------------------------------------
#[test]
fn input_edges() {
    let widget = find("embodied_carbon").unwrap();
    let mut values = ControlValues::new(widget.controls());

    values.set("quantity_t", "100000").unwrap();
    assert_eq!(values.number("quantity_t"), 500.0);

    values.set("material", "unobtainium").unwrap();
    let fallback = widget.evaluate(&values);
    values.set("material", "concrete").unwrap();
    assert_eq!(widget.evaluate(&values), fallback);

    assert!(values.set("transport_km", "far").is_err());
    assert!(values.set("colour", "red").is_err());
}

// ---------------------------------------------------------------------------
// Illustrative charts land on disk as library-shaped JSON
// ---------------------------------------------------------------------------
#[test]
fn illustrative_charts_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut renderer = InstrumentedRenderer::new(JsonFileRenderer::new(dir.path()));
    let mut written = 0;
    for widget in registry() {
        for spec in widget.illustrative_charts() {
            ecosim::chart::ChartRenderer::render(&mut renderer, &spec).unwrap();
            let path = renderer.inner().path_for(&spec);
            let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            assert!(json["type"].is_string());
            assert!(json["data"]["labels"].is_array());
            assert_eq!(json["options"]["responsive"], true);
            written += 1;
        }
    }
    assert!(written >= 4);
}
