use crate::error::Result;
use crate::model::WindowInfo;

/// Port for process and window inspection.
///
/// Implementations answer two questions only: is a process whose name
/// contains the pattern running, and where is its primary visible window.
/// They MUST NOT fail when a process disappears mid-scan (such entries are
/// skipped) and MUST NOT return invisible or zero-area helper windows.
#[async_trait::async_trait]
pub trait ProcessInspector: Send + Sync {
    /// true, если имя какого-либо запущенного процесса содержит паттерн
    /// (без учёта регистра)
    async fn is_running(&self, name_pattern: &str) -> Result<bool>;

    /// Первое видимое окно ненулевой площади среди процессов, подходящих
    /// под паттерн; `None`, если такого окна нет
    async fn find_primary_window(&self, name_pattern: &str) -> Result<Option<WindowInfo>>;
}
