pub mod display;
pub mod process;
pub mod sim;

pub use display::{DisplayController, DisplayInspector};
pub use process::ProcessInspector;
pub use sim::SimulatedDesktop;

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tracing::warn;

/// Три порта к платформе, которыми пользуется движок сверки
pub struct OsPorts {
    pub process: Arc<dyn ProcessInspector>,
    pub displays: Arc<dyn DisplayInspector>,
    pub controller: Arc<dyn DisplayController>,
    /// Эмулированный рабочий стол; присутствует только в dry-run режиме
    pub simulated: Option<Arc<SimulatedDesktop>>,
}

/// Фабрика портов: реальные бэкенды или эмуляция в зависимости от dry_run
pub fn create_os_ports(config: Arc<Config>, dry_run: bool) -> Result<OsPorts> {
    if dry_run {
        // Два эмулированных монитора рядом, как типичная раскладка
        let desktop = SimulatedDesktop::with_monitors(&[
            (0, 0, 1920, 1080),
            (1920, 0, 1920, 1080),
        ]);

        return Ok(OsPorts {
            process: Arc::new(process::DryRunProcessInspector::new(desktop.clone())),
            displays: Arc::new(display::DryRunDisplay::new(desktop.clone())),
            controller: Arc::new(display::DryRunDisplay::new(desktop.clone())),
            simulated: Some(desktop),
        });
    }

    let xrandr = Arc::new(display::XrandrDisplay::new());
    if let Err(e) = xrandr.test() {
        warn!("xrandr недоступен, смена режимов работать не будет: {}", e);
    }

    Ok(OsPorts {
        process: Arc::new(process::ProcScanInspector::new(config)),
        displays: xrandr.clone(),
        controller: xrandr,
        simulated: None,
    })
}
