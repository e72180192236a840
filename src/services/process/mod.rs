//! ProcessInspector port: responsibility and boundaries
//!
//! This module is responsible ONLY for answering "is the process running"
//! and "where is its primary visible window". It MUST NOT decide anything
//! about monitors or resolutions; those decisions belong to the engine.

mod dry_run;
mod proc_scan;
mod r#trait;
mod wmctrl;
mod xdotool;

pub use self::dry_run::DryRunProcessInspector;
pub use self::proc_scan::ProcScanInspector;
pub use self::r#trait::ProcessInspector;
