//! Environmental-science widgets and personal trackers.
//!
//! Two halves share one presentation layer:
//! - simulators (`derive`, driven through `widget`): control values in,
//!   metrics, surface patches and a chart spec out;
//! - trackers (`tracker`, owned by `app`): validated records kept in logs
//!   and persisted through `storage`.

pub mod app;
pub mod chart;
pub mod controls;
pub mod derive;
pub mod errors;
pub mod geo;
pub mod logging;
pub mod lookup;
pub mod present;
pub mod state;
pub mod storage;
pub mod tracker;
pub mod widget;
