//! Variance analysis wizard: a four-step form that collects a segment, KPIs
//! and supporting documents, submits them to an analysis service and renders
//! the returned report with a trend chart and text/DOCX exports.

pub mod cli;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod ports;
pub mod render;
pub mod submission;
#[cfg(feature = "tui")]
mod tui;
pub mod wizard;
