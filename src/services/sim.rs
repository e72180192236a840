use parking_lot::RwLock;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::info;

use crate::model::{ChangeOutcome, MonitorInfo, MonitorLayout, Rect, Resolution, WindowInfo};

#[derive(Debug, Clone)]
struct SimMonitor {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    current: Resolution,
}

#[derive(Debug, Clone)]
struct SimProcess {
    name: String,
    pid: u32,
    window: Option<Rect>,
}

#[derive(Default)]
struct SimState {
    monitors: Vec<SimMonitor>,
    processes: Vec<SimProcess>,
    calls: Vec<(usize, Resolution)>,
    forced_outcome: Option<ChangeOutcome>,
    next_pid: u32,
}

/// Эмулированный рабочий стол для dry-run режима и тестов движка.
///
/// Держит мониторы, фиктивные процессы с окнами и журнал всех вызовов смены
/// разрешения. Dry-run порты читают и изменяют только это состояние, реальные
/// системные вызовы не выполняются.
pub struct SimulatedDesktop {
    state: RwLock<SimState>,
}

impl SimulatedDesktop {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(SimState {
                next_pid: 1000,
                ..SimState::default()
            }),
        })
    }

    /// Рабочий стол с мониторами по заданным прямоугольникам (x, y, w, h)
    pub fn with_monitors(specs: &[(i32, i32, u32, u32)]) -> Arc<Self> {
        let desktop = Self::new();
        for &(x, y, w, h) in specs {
            desktop.add_monitor(x, y, w, h);
        }
        desktop
    }

    pub fn add_monitor(&self, x: i32, y: i32, width: u32, height: u32) {
        self.state.write().monitors.push(SimMonitor {
            x,
            y,
            width,
            height,
            current: Resolution::new(width, height),
        });
    }

    /// Запустить фиктивный процесс; окно может отсутствовать
    pub fn spawn_process(&self, name: &str, window: Option<Rect>) -> u32 {
        let mut state = self.state.write();
        state.next_pid += 1;
        let pid = state.next_pid;
        state.processes.push(SimProcess {
            name: name.to_string(),
            pid,
            window,
        });
        pid
    }

    pub fn kill_process(&self, name: &str) {
        let name_lower = name.to_lowercase();
        self.state
            .write()
            .processes
            .retain(|p| !p.name.to_lowercase().contains(&name_lower));
    }

    pub fn move_window(&self, name: &str, rect: Rect) {
        let name_lower = name.to_lowercase();
        for process in self.state.write().processes.iter_mut() {
            if process.name.to_lowercase().contains(&name_lower) {
                process.window = Some(rect);
            }
        }
    }

    pub fn is_running(&self, pattern: &str) -> bool {
        let pattern_lower = pattern.to_lowercase();
        self.state
            .read()
            .processes
            .iter()
            .any(|p| p.name.to_lowercase().contains(&pattern_lower))
    }

    /// Первое видимое окно ненулевой площади среди подходящих процессов
    pub fn find_window(&self, pattern: &str) -> Option<WindowInfo> {
        let pattern_lower = pattern.to_lowercase();
        self.state
            .read()
            .processes
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&pattern_lower))
            .find_map(|p| {
                p.window
                    .filter(|rect| rect.has_area())
                    .map(|rect| WindowInfo::new(p.pid as u64, p.pid, rect))
            })
    }

    pub fn layout(&self) -> MonitorLayout {
        self.state
            .read()
            .monitors
            .iter()
            .enumerate()
            .map(|(index, m)| MonitorInfo {
                index,
                name: format!("SIM-{}", index),
                x: m.x,
                y: m.y,
                width: m.width,
                height: m.height,
                current: m.current,
            })
            .collect()
    }

    pub fn resolution(&self, index: usize) -> Option<Resolution> {
        self.state.read().monitors.get(index).map(|m| m.current)
    }

    /// Выставить текущий режим монитора напрямую, без записи в журнал вызовов
    pub fn set_monitor_resolution(&self, index: usize, resolution: Resolution) {
        if let Some(monitor) = self.state.write().monitors.get_mut(index) {
            monitor.current = resolution;
        }
    }

    /// Смена режима от имени контроллера: вызов фиксируется в журнале,
    /// при успехе режим применяется
    pub fn apply_resolution(&self, index: usize, resolution: Resolution) -> ChangeOutcome {
        let mut state = self.state.write();
        state.calls.push((index, resolution));

        if let Some(outcome) = state.forced_outcome {
            return outcome;
        }

        match state.monitors.get_mut(index) {
            Some(monitor) => {
                monitor.current = resolution;
                ChangeOutcome::Success
            }
            None => ChangeOutcome::Failed(-1),
        }
    }

    /// Журнал всех вызовов смены разрешения в порядке поступления
    pub fn resolution_calls(&self) -> Vec<(usize, Resolution)> {
        self.state.read().calls.clone()
    }

    /// Принудительный результат следующих вызовов смены разрешения
    pub fn force_outcome(&self, outcome: Option<ChangeOutcome>) {
        self.state.write().forced_outcome = outcome;
    }
}

/// Демонстрационная задача для dry-run: периодически "запускает" и
/// "завершает" отслеживаемое приложение с окном в центре первого монитора
pub async fn run_demo(desktop: Arc<SimulatedDesktop>, app_name: String) {
    info!(
        "Dry-run режим - эмулируем жизненный цикл приложения '{}'",
        app_name
    );

    let mut ticker = interval(Duration::from_secs(10));
    let mut present = false;

    loop {
        ticker.tick().await;

        if present {
            info!("[DRY RUN] Приложение '{}' завершилось", app_name);
            desktop.kill_process(&app_name);
        } else {
            let rect = desktop
                .layout()
                .first()
                .map(|m| Rect::new(m.x + 100, m.y + 100, 800, 600))
                .unwrap_or_else(|| Rect::new(100, 100, 800, 600));
            info!("[DRY RUN] Приложение '{}' запущено: {:?}", app_name, rect);
            desktop.spawn_process(&app_name, Some(rect));
        }

        present = !present;
    }
}
