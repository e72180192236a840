use crate::error::Result;
use crate::model::{ChangeOutcome, MonitorLayout, Resolution};

/// Порт чтения раскладки мониторов; раскладка перечитывается на каждый запрос
#[async_trait::async_trait]
pub trait DisplayInspector: Send + Sync {
    async fn current_layout(&self) -> Result<MonitorLayout>;

    async fn current_resolution(&self, index: usize) -> Result<Resolution>;
}

/// Порт смены режима монитора.
///
/// Вызов синхронный: возвращается только после подтверждения или отказа ОС.
/// Неуспешный результат (`RestartRequired`, `Failed`) — это значение, а не
/// ошибка: движок логирует его и повторит попытку на следующем тике.
#[async_trait::async_trait]
pub trait DisplayController: Send + Sync {
    async fn set_resolution(
        &self,
        index: usize,
        resolution: Resolution,
        bits_per_pixel: u32,
        refresh_hz: u32,
    ) -> Result<ChangeOutcome>;
}
