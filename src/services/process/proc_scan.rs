use crate::config::Config;
use crate::error::{ResError, Result};
use crate::model::WindowInfo;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::r#trait::ProcessInspector;
use super::wmctrl::WmctrlLookup;
use super::xdotool::XdotoolLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupMethod {
    Xdotool,
    Wmctrl,
}

/// Инспектор процессов поверх /proc с поиском окон через внешние утилиты.
///
/// Имена процессов сверяются по подстроке без учёта регистра; записи,
/// исчезнувшие во время сканирования, просто пропускаются. Рабочий метод
/// поиска окон определяется пробой и кэшируется; после сбоя кэш сбрасывается
/// и метод определяется заново при следующем запросе.
pub struct ProcScanInspector {
    config: Arc<Config>,
    method: RwLock<Option<LookupMethod>>,
    xdotool: XdotoolLookup,
    wmctrl: WmctrlLookup,
}

impl ProcScanInspector {
    pub fn new(config: Arc<Config>) -> Self {
        info!("Инициализация ProcScanInspector");
        Self {
            config,
            method: RwLock::new(None),
            xdotool: XdotoolLookup::new(),
            wmctrl: WmctrlLookup::new(),
        }
    }

    /// Собрать pid всех процессов, чьё имя содержит паттерн
    fn matching_pids(&self, name_pattern: &str) -> Result<Vec<u32>> {
        let pattern_lower = name_pattern.to_lowercase();
        let entries = std::fs::read_dir("/proc")
            .map_err(|e| ResError::Query(format!("нет доступа к /proc: {}", e)))?;

        let mut pids = Vec::new();

        for entry in entries {
            // Запись могла исчезнуть между перечислением и чтением
            let Ok(entry) = entry else { continue };
            let name = entry.file_name();
            let Some(pid) = name.to_str().and_then(|n| n.parse::<u32>().ok()) else {
                continue;
            };

            if let Some(process_name) = read_process_name(&entry.path()) {
                if process_name.to_lowercase().contains(&pattern_lower) {
                    pids.push(pid);
                }
            }
        }

        Ok(pids)
    }

    fn detect_method(&self) -> Result<LookupMethod> {
        match self.config.window.lookup_backend.as_str() {
            "xdotool" => return Ok(LookupMethod::Xdotool),
            "wmctrl" => return Ok(LookupMethod::Wmctrl),
            _ => {}
        }

        info!("Определяем рабочий метод поиска окон...");

        if self.xdotool.test().is_ok() {
            info!("Используем xdotool");
            return Ok(LookupMethod::Xdotool);
        }

        if self.wmctrl.test().is_ok() {
            info!("Используем wmctrl");
            return Ok(LookupMethod::Wmctrl);
        }

        Err(ResError::ServiceUnavailable(
            "ни один метод поиска окон не работает (нужен xdotool или wmctrl)".to_string(),
        ))
    }

    fn ensure_method(&self) -> Result<LookupMethod> {
        if let Some(method) = *self.method.read() {
            return Ok(method);
        }

        let method = self.detect_method()?;
        *self.method.write() = Some(method);
        Ok(method)
    }

    fn window_for_pid(&self, method: LookupMethod, pid: u32) -> Result<Option<WindowInfo>> {
        match method {
            LookupMethod::Xdotool => self.xdotool.find_window_for_pid(pid),
            LookupMethod::Wmctrl => self.wmctrl.find_window_for_pid(pid),
        }
    }
}

/// Имя процесса из /proc/<pid>/comm; `None`, если процесс уже завершился
fn read_process_name(proc_dir: &Path) -> Option<String> {
    let comm = std::fs::read_to_string(proc_dir.join("comm")).ok()?;
    let comm = comm.trim();
    if comm.is_empty() {
        None
    } else {
        Some(comm.to_string())
    }
}

#[async_trait::async_trait]
impl ProcessInspector for ProcScanInspector {
    async fn is_running(&self, name_pattern: &str) -> Result<bool> {
        let running = !self.matching_pids(name_pattern)?.is_empty();
        debug!("Процесс '{}' запущен: {}", name_pattern, running);
        Ok(running)
    }

    async fn find_primary_window(&self, name_pattern: &str) -> Result<Option<WindowInfo>> {
        let pids = self.matching_pids(name_pattern)?;
        if pids.is_empty() {
            return Ok(None);
        }

        let method = self.ensure_method()?;

        for pid in pids {
            match self.window_for_pid(method, pid) {
                Ok(Some(window)) => return Ok(Some(window)),
                Ok(None) => continue,
                Err(e) => {
                    // Метод перестал работать: сбрасываем кэш и переопределим
                    // его при следующем запросе
                    warn!("Метод поиска окон {:?} перестал работать: {}", method, e);
                    *self.method.write() = None;
                    return Err(e);
                }
            }
        }

        Ok(None)
    }
}
