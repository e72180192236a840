use crate::error::{ResError, Result};
use crate::model::{ChangeOutcome, MonitorLayout, Resolution};
use crate::services::sim::SimulatedDesktop;
use std::sync::Arc;
use tracing::info;

use super::r#trait::{DisplayController, DisplayInspector};

/// Порты дисплея поверх эмулированного рабочего стола: раскладка читается из
/// него, смена режима логируется и применяется к эмулированному монитору
pub struct DryRunDisplay {
    desktop: Arc<SimulatedDesktop>,
}

impl DryRunDisplay {
    pub fn new(desktop: Arc<SimulatedDesktop>) -> Self {
        info!("Инициализация DryRunDisplay");
        Self { desktop }
    }
}

#[async_trait::async_trait]
impl DisplayInspector for DryRunDisplay {
    async fn current_layout(&self) -> Result<MonitorLayout> {
        Ok(self.desktop.layout())
    }

    async fn current_resolution(&self, index: usize) -> Result<Resolution> {
        self.desktop
            .resolution(index)
            .ok_or(ResError::MonitorNotFound(index))
    }
}

#[async_trait::async_trait]
impl DisplayController for DryRunDisplay {
    async fn set_resolution(
        &self,
        index: usize,
        resolution: Resolution,
        _bits_per_pixel: u32,
        refresh_hz: u32,
    ) -> Result<ChangeOutcome> {
        let outcome = self.desktop.apply_resolution(index, resolution);
        info!(
            "[DRY RUN] Смена режима монитора {} на {} @ {}Гц: {}",
            index, resolution, refresh_hz, outcome
        );
        Ok(outcome)
    }
}
