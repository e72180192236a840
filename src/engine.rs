use crate::config::Config;
use crate::error::Result;
use crate::geometry::resolve_monitor_for_rect;
use crate::model::{ChangeOutcome, Resolution};
use crate::services::{DisplayController, DisplayInspector, ProcessInspector};
use crate::store::{ConfigStore, Configuration};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Состояние наблюдения за одним приложением: последний занятый монитор
/// и переключён ли он в целевой режим. Живёт только в пределах одного
/// запуска мониторинга, не сохраняется.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingState {
    pub monitor: Option<usize>,
    pub elevated: bool,
}

/// Движок сверки: единственный владелец флага запуска и единственный
/// источник команд смены режима.
///
/// Все смены разрешения для монитора строго последовательны, потому что их
/// выдаёт один-единственный воркер; параллельной сверки приложений нет
/// намеренно, чтобы два потока не слали конфликтующие команды одному
/// монитору.
pub struct ReconciliationEngine {
    config: Arc<Config>,
    store: Arc<ConfigStore>,
    process: Arc<dyn ProcessInspector>,
    displays: Arc<dyn DisplayInspector>,
    controller: Arc<dyn DisplayController>,
    running: AtomicBool,
    tracked: DashMap<String, TrackingState>,
}

impl ReconciliationEngine {
    pub fn new(
        config: Arc<Config>,
        store: Arc<ConfigStore>,
        process: Arc<dyn ProcessInspector>,
        displays: Arc<dyn DisplayInspector>,
        controller: Arc<dyn DisplayController>,
    ) -> Self {
        Self {
            config,
            store,
            process,
            displays,
            controller,
            running: AtomicBool::new(false),
            tracked: DashMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Установить флаг запуска; `false`, если мониторинг уже шёл
    pub fn try_engage(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }

    /// Снять флаг запуска; воркер заметит это на ближайшей точке опроса
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Снимок состояния наблюдения по всем приложениям
    pub fn status(&self) -> Vec<(String, TrackingState)> {
        self.tracked
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Тело воркера: внешний цикл тиков по всем конфигурациям
    pub async fn run(self: Arc<Self>) {
        let tick = Duration::from_millis(self.config.monitoring.tick_interval_ms);
        info!(
            "Цикл сверки запущен (тик {}мс, удержание {}мс)",
            self.config.monitoring.tick_interval_ms, self.config.monitoring.hold_interval_ms
        );

        while self.is_running() {
            let snapshot = self.store.snapshot();

            for app_config in &snapshot {
                if !self.is_running() {
                    break;
                }
                if let Err(e) = self.reconcile(app_config).await {
                    // Временный сбой опроса: пропускаем приложение на этом
                    // тике и пробуем снова на следующем
                    warn!("Пропускаем '{}' на этом тике: {}", app_config.app_name, e);
                }
            }

            self.sleep_while_running(tick).await;
        }

        self.tracked.clear();
        info!("Цикл сверки остановлен");
    }

    /// Один проход сверки для одного приложения
    async fn reconcile(&self, app_config: &Configuration) -> Result<()> {
        let key = app_config.app_name.to_lowercase();

        if !self.process.is_running(&app_config.app_name).await? {
            // Приложение не запущено: возврат здесь не выполняется,
            // он происходит только на выходе из цикла удержания
            if self.tracked.remove(&key).is_some() {
                debug!("Процесс '{}' исчез, наблюдение снято", app_config.app_name);
            }
            return Ok(());
        }

        let Some(window) = self.process.find_primary_window(&app_config.app_name).await? else {
            debug!("У '{}' нет видимого окна, пропускаем тик", app_config.app_name);
            self.tracked.insert(
                key,
                TrackingState {
                    monitor: None,
                    elevated: false,
                },
            );
            return Ok(());
        };

        let layout = self.displays.current_layout().await?;
        let Some(monitor_index) = resolve_monitor_for_rect(&window.rect, &layout) else {
            debug!("Окно '{}' вне всех мониторов", app_config.app_name);
            self.tracked.insert(
                key,
                TrackingState {
                    monitor: None,
                    elevated: false,
                },
            );
            return Ok(());
        };

        let Some(rule) = app_config.rules.get(&monitor_index).copied() else {
            debug!(
                "Монитор {} не настроен для '{}', пропускаем",
                monitor_index, app_config.app_name
            );
            self.tracked.insert(
                key,
                TrackingState {
                    monitor: Some(monitor_index),
                    elevated: false,
                },
            );
            return Ok(());
        };

        // Активация: переключаем только при реальном расхождении,
        // повторных команд ОС не шлём
        let current = self.displays.current_resolution(monitor_index).await?;
        if current != rule.target {
            info!(
                "Активация: '{}' на мониторе {}, {} -> {}",
                app_config.app_name, monitor_index, current, rule.target
            );
            self.apply_change(monitor_index, rule.target).await?;
        }

        self.tracked.insert(
            key.clone(),
            TrackingState {
                monitor: Some(monitor_index),
                elevated: true,
            },
        );

        self.hold(app_config, monitor_index).await;

        // Деактивация: единственное место, где выполняется возврат
        let needs_revert = match self.displays.current_resolution(monitor_index).await {
            Ok(current) => current != rule.normal,
            Err(e) => {
                // Текущий режим неизвестен: безопаснее вернуть принудительно
                warn!(
                    "Не удалось узнать режим монитора {}: {}, возвращаем принудительно",
                    monitor_index, e
                );
                true
            }
        };

        if needs_revert {
            info!(
                "Возврат: монитор {} -> {} ('{}' больше не на нём)",
                monitor_index, rule.normal, app_config.app_name
            );
            self.apply_change(monitor_index, rule.normal).await?;
        }

        self.tracked.insert(
            key,
            TrackingState {
                monitor: Some(monitor_index),
                elevated: false,
            },
        );

        Ok(())
    }

    /// Цикл удержания: пока окно приложения остаётся на мониторе, движок
    /// следит только за этой парой (app, monitor) с коротким интервалом.
    /// Выход — окно ушло, процесс завершился, сбой опроса или снятый флаг.
    async fn hold(&self, app_config: &Configuration, monitor_index: usize) {
        let interval = Duration::from_millis(self.config.monitoring.hold_interval_ms);
        debug!(
            "Удержание монитора {} для '{}'",
            monitor_index, app_config.app_name
        );

        while self.is_running() {
            match self.still_occupied(app_config, monitor_index).await {
                Ok(true) => sleep(interval).await,
                Ok(false) => break,
                Err(e) => {
                    // Сбой в цикле удержания не фатален: выходим в сторону
                    // возврата обычного режима
                    warn!(
                        "Сбой опроса при удержании монитора {}: {}",
                        monitor_index, e
                    );
                    break;
                }
            }
        }
    }

    async fn still_occupied(
        &self,
        app_config: &Configuration,
        monitor_index: usize,
    ) -> Result<bool> {
        if !self.process.is_running(&app_config.app_name).await? {
            return Ok(false);
        }

        let Some(window) = self.process.find_primary_window(&app_config.app_name).await? else {
            return Ok(false);
        };

        let layout = self.displays.current_layout().await?;
        Ok(resolve_monitor_for_rect(&window.rect, &layout) == Some(monitor_index))
    }

    /// Выдать команду смены режима; неуспешный результат логируется и будет
    /// повторён на последующих тиках, пока расхождение сохраняется
    async fn apply_change(&self, monitor_index: usize, resolution: Resolution) -> Result<()> {
        let outcome = self
            .controller
            .set_resolution(
                monitor_index,
                resolution,
                self.config.display.bits_per_pixel,
                self.config.display.refresh_hz,
            )
            .await?;

        match outcome {
            ChangeOutcome::Success => {
                info!("Монитор {} переключён на {}", monitor_index, resolution);
            }
            outcome => {
                warn!(
                    "Смена режима монитора {} на {} не удалась: {}",
                    monitor_index, resolution, outcome
                );
            }
        }

        Ok(())
    }

    /// Сон, прерываемый снятием флага: проверяем его с шагом интервала
    /// удержания, чтобы остановка не ждала весь внешний тик
    async fn sleep_while_running(&self, total: Duration) {
        let step = Duration::from_millis(self.config.monitoring.hold_interval_ms);
        let mut remaining = total;

        while self.is_running() && !remaining.is_zero() {
            let chunk = remaining.min(step);
            sleep(chunk).await;
            remaining = remaining.saturating_sub(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rect, Resolution};
    use crate::services::display::DryRunDisplay;
    use crate::services::process::DryRunProcessInspector;
    use crate::services::sim::SimulatedDesktop;
    use tokio::task::JoinHandle;

    fn res(w: u32, h: u32) -> Resolution {
        Resolution::new(w, h)
    }

    fn fast_config() -> Arc<Config> {
        let mut config = Config::default();
        config.monitoring.tick_interval_ms = 100;
        config.monitoring.hold_interval_ms = 100;
        Arc::new(config)
    }

    fn setup() -> (
        Arc<SimulatedDesktop>,
        Arc<ConfigStore>,
        Arc<ReconciliationEngine>,
    ) {
        let desktop = SimulatedDesktop::with_monitors(&[
            (0, 0, 1920, 1080),
            (1920, 0, 1920, 1080),
        ]);
        let store = Arc::new(ConfigStore::new());
        let engine = Arc::new(ReconciliationEngine::new(
            fast_config(),
            store.clone(),
            Arc::new(DryRunProcessInspector::new(desktop.clone())),
            Arc::new(DryRunDisplay::new(desktop.clone())),
            Arc::new(DryRunDisplay::new(desktop.clone())),
        ));
        (desktop, store, engine)
    }

    fn engage(engine: &Arc<ReconciliationEngine>) -> JoinHandle<()> {
        assert!(engine.try_engage());
        tokio::spawn(engine.clone().run())
    }

    #[tokio::test]
    async fn test_activation_hold_and_revert_on_exit() {
        let (desktop, store, engine) = setup();
        store
            .add("game.exe", 1, res(1920, 1080), res(2560, 1440))
            .unwrap();
        // Окно с центром на мониторе 1
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));

        let handle = engage(&engine);
        sleep(Duration::from_millis(400)).await;

        // Ровно один вызов активации, повторов во время удержания нет
        assert_eq!(desktop.resolution_calls(), vec![(1, res(2560, 1440))]);
        assert_eq!(desktop.resolution(1), Some(res(2560, 1440)));
        assert!(engine
            .status()
            .iter()
            .any(|(app, st)| app == "game.exe" && st.elevated && st.monitor == Some(1)));

        desktop.kill_process("game.exe");
        sleep(Duration::from_millis(500)).await;

        // Ровно один вызов возврата
        assert_eq!(
            desktop.resolution_calls(),
            vec![(1, res(2560, 1440)), (1, res(1920, 1080))]
        );
        assert_eq!(desktop.resolution(1), Some(res(1920, 1080)));

        engine.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_revert_when_window_moves_off_monitor() {
        let (desktop, store, engine) = setup();
        store
            .add("game.exe", 1, res(1920, 1080), res(2560, 1440))
            .unwrap();
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));

        let handle = engage(&engine);
        sleep(Duration::from_millis(400)).await;
        assert_eq!(desktop.resolution_calls().len(), 1);

        // Окно переехало на монитор 0, для которого правила нет
        desktop.move_window("game.exe", Rect::new(100, 100, 800, 600));
        sleep(Duration::from_millis(500)).await;

        assert_eq!(
            desktop.resolution_calls(),
            vec![(1, res(2560, 1440)), (1, res(1920, 1080))]
        );

        engine.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_no_matching_process_no_calls() {
        let (desktop, store, engine) = setup();
        store
            .add("game.exe", 1, res(1920, 1080), res(2560, 1440))
            .unwrap();

        let handle = engage(&engine);
        sleep(Duration::from_millis(450)).await;

        assert!(desktop.resolution_calls().is_empty());

        engine.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_already_at_target_is_idempotent() {
        let (desktop, store, engine) = setup();
        store
            .add("game.exe", 1, res(1920, 1080), res(2560, 1440))
            .unwrap();
        desktop.set_monitor_resolution(1, res(2560, 1440));
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));

        let handle = engage(&engine);
        sleep(Duration::from_millis(450)).await;

        // Монитор уже в целевом режиме: ни одной команды ОС
        assert!(desktop.resolution_calls().is_empty());

        desktop.kill_process("game.exe");
        sleep(Duration::from_millis(500)).await;

        assert_eq!(desktop.resolution_calls(), vec![(1, res(1920, 1080))]);

        engine.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_change_is_not_fatal_and_retried() {
        let (desktop, store, engine) = setup();
        store
            .add("game.exe", 1, res(1920, 1080), res(2560, 1440))
            .unwrap();
        desktop.force_outcome(Some(ChangeOutcome::Failed(13)));
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));

        let handle = engage(&engine);
        sleep(Duration::from_millis(400)).await;

        // Попытка была, монитор остался в обычном режиме, движок жив
        assert_eq!(desktop.resolution_calls(), vec![(1, res(2560, 1440))]);
        assert_eq!(desktop.resolution(1), Some(res(1920, 1080)));
        assert!(engine.is_running());

        // Процесс завершился; текущий режим равен обычному, возврат не нужен
        desktop.kill_process("game.exe");
        sleep(Duration::from_millis(500)).await;
        assert_eq!(desktop.resolution_calls().len(), 1);

        // Сбой прошёл, приложение запустилось снова: повторная активация
        desktop.force_outcome(None);
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));
        sleep(Duration::from_millis(400)).await;

        assert_eq!(desktop.resolution_calls().len(), 2);
        assert_eq!(desktop.resolution(1), Some(res(2560, 1440)));

        engine.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_clears_tracking_and_joins() {
        let (desktop, store, engine) = setup();
        store
            .add("game.exe", 1, res(1920, 1080), res(2560, 1440))
            .unwrap();
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));

        let handle = engage(&engine);
        sleep(Duration::from_millis(400)).await;
        assert!(!engine.status().is_empty());

        engine.request_stop();
        handle.await.unwrap();

        assert!(!engine.is_running());
        assert!(engine.status().is_empty());
    }
}
