//! TUI module: Terminal User Interface using Ratatui.
//!
//! Two screens:
//! - Patient data input form
//! - Triage report

mod app;
mod styles;
mod ui;

pub use app::{App, SvmTriageService};
pub use styles::MedicalTheme;
