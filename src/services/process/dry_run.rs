use crate::error::Result;
use crate::model::WindowInfo;
use crate::services::sim::SimulatedDesktop;
use std::sync::Arc;
use tracing::info;

use super::r#trait::ProcessInspector;

/// Инспектор процессов поверх эмулированного рабочего стола
pub struct DryRunProcessInspector {
    desktop: Arc<SimulatedDesktop>,
}

impl DryRunProcessInspector {
    pub fn new(desktop: Arc<SimulatedDesktop>) -> Self {
        info!("Инициализация DryRunProcessInspector");
        Self { desktop }
    }
}

#[async_trait::async_trait]
impl ProcessInspector for DryRunProcessInspector {
    async fn is_running(&self, name_pattern: &str) -> Result<bool> {
        Ok(self.desktop.is_running(name_pattern))
    }

    async fn find_primary_window(&self, name_pattern: &str) -> Result<Option<WindowInfo>> {
        Ok(self.desktop.find_window(name_pattern))
    }
}
