//! Error taxonomy and the reporting edge.
//!
//! Pure code returns the typed errors below. The CLI and the session layer
//! surface validation and location failures through a [`Notifier`], and
//! anything uncaught is logged by [`report_error`] or the panic hook.

use thiserror::Error;

use crate::logging::{log, obj, v_str, Domain, Level};

/// A control change that could not be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("widget has no control named '{0}'")]
    UnknownControl(String),
    #[error("control '{name}' expects a number, got '{raw}'")]
    NotNumeric { name: String, raw: String },
}

/// A form submission that was aborted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("please fill in the '{0}' field")]
    MissingField(&'static str),
    #[error("'{field}' must be a non-negative number, got '{raw}'")]
    InvalidNumber { field: &'static str, raw: String },
    #[error("'{field}' must be a date (YYYY-MM-DD), got '{raw}'")]
    InvalidDate { field: &'static str, raw: String },
    #[error("unknown {field} '{raw}'")]
    UnknownCategory { field: &'static str, raw: String },
    #[error("no record with id '{0}'")]
    UnknownRecord(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    Denied,
    #[error("location unavailable")]
    Unavailable,
    #[error("invalid coordinates: {0}")]
    Invalid(String),
}

/// Failures of the widget layer. Form and location problems go to the
/// [`Notifier`]; storage reports through `anyhow`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("unknown widget '{0}'")]
    UnknownWidget(String),
}

/// Blocking user-facing message channel (the page's `alert`).
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// Prints alerts to stderr.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&mut self, message: &str) {
        eprintln!("! {}", message);
    }
}

/// Keeps every alert, for tests and batch runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub alerts: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn alert(&mut self, message: &str) {
        (**self).alert(message)
    }
}

/// Log an error nothing upstream handled. Not forwarded anywhere else.
pub fn report_error(err: &anyhow::Error) {
    let chain: Vec<serde_json::Value> = err.chain().map(|c| v_str(&c.to_string())).collect();
    log(
        Level::Error,
        Domain::System,
        "uncaught_error",
        obj(&[
            ("msg", v_str(&err.to_string())),
            ("chain", serde_json::Value::Array(chain)),
        ]),
    );
}

/// Log panics as fatal structured events before the default hook runs.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        log(
            Level::Fatal,
            Domain::System,
            "panic",
            obj(&[("msg", v_str(&payload)), ("location", v_str(&location))]),
        );
        default_hook(info);
    }));
}
