use crate::config::Config;
use crate::engine::ReconciliationEngine;
use crate::error::{ResError, Result};
use crate::model::Resolution;
use crate::services::OsPorts;
use crate::store::{self, ConfigStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Управляющая поверхность: запуск/остановка мониторинга и работа с
/// хранилищем конфигураций. Тонкая обёртка над хранилищем и жизненным
/// циклом движка; привязка к конкретному интерфейсу (CLI, GUI) снаружи.
pub struct ControlSurface {
    config: Arc<Config>,
    store: Arc<ConfigStore>,
    engine: Arc<ReconciliationEngine>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ControlSurface {
    pub fn new(config: Arc<Config>, store: Arc<ConfigStore>, ports: OsPorts) -> Self {
        let engine = Arc::new(ReconciliationEngine::new(
            config.clone(),
            store.clone(),
            ports.process,
            ports.displays,
            ports.controller,
        ));

        Self {
            config,
            store,
            engine,
            worker: tokio::sync::Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<ReconciliationEngine> {
        &self.engine
    }

    /// Запустить фоновый воркер сверки.
    /// Ошибка, если мониторинг уже идёт или конфигураций нет.
    pub async fn start(&self) -> Result<()> {
        if self.store.is_empty() {
            return Err(ResError::NoConfigurations);
        }

        if !self.engine.try_engage() {
            return Err(ResError::AlreadyRunning);
        }

        let engine = self.engine.clone();
        let handle = tokio::spawn(engine.run());
        *self.worker.lock().await = Some(handle);

        info!("Мониторинг запущен ({} конфигураций)", self.store.len());
        Ok(())
    }

    /// Остановить мониторинг: снять флаг и дождаться выхода воркера.
    /// Идемпотентно: остановка незапущенного мониторинга — успех без действий.
    pub async fn stop(&self) -> Result<()> {
        self.engine.request_stop();

        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Воркер сверки завершился аварийно: {}", e);
            }
            info!("Мониторинг остановлен");
        }

        Ok(())
    }

    /// Добавить правило из сырых полей ввода (все поля — строки).
    /// Нечисловое или пустое поле — ошибка валидации без изменения хранилища.
    pub fn add_configuration(
        &self,
        app_name: &str,
        monitor_index: &str,
        normal_width: &str,
        normal_height: &str,
        target_width: &str,
        target_height: &str,
    ) -> Result<()> {
        let monitor_index: usize = monitor_index.trim().parse().map_err(|_| {
            ResError::Validation(format!("некорректный индекс монитора: '{}'", monitor_index))
        })?;

        let normal = Resolution::new(
            parse_dimension(normal_width, "обычная ширина")?,
            parse_dimension(normal_height, "обычная высота")?,
        );
        let target = Resolution::new(
            parse_dimension(target_width, "целевая ширина")?,
            parse_dimension(target_height, "целевая высота")?,
        );

        self.store.add(app_name, monitor_index, normal, target)
    }

    /// Добавить правило из строки формата `app,monitor,WxH,WxH`
    pub fn add_rule_line(&self, line: &str) -> Result<()> {
        let (app_name, monitor_index, normal, target) = store::parse_line(line)?;
        self.store.add(&app_name, monitor_index, normal, target)
    }

    /// Человекочитаемый список правил в порядке добавления
    pub fn list(&self) -> Vec<String> {
        self.store.list_summaries()
    }

    pub fn save(&self) -> Result<()> {
        self.store
            .save_to(&self.config.storage.configurations_path)
    }

    pub fn load(&self) -> Result<usize> {
        self.store
            .load_from(&self.config.storage.configurations_path)
    }
}

fn parse_dimension(field: &str, what: &str) -> Result<u32> {
    let value: u32 = field
        .trim()
        .parse()
        .map_err(|_| ResError::Validation(format!("{}: некорректное значение '{}'", what, field)))?;

    if value == 0 {
        return ResError::validation(format!("{}: значение должно быть больше 0", what));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;
    use crate::services::create_os_ports;

    fn fast_config() -> Arc<Config> {
        let mut config = Config::default();
        config.monitoring.tick_interval_ms = 100;
        config.monitoring.hold_interval_ms = 100;
        Arc::new(config)
    }

    fn setup() -> ControlSurface {
        let config = fast_config();
        let store = Arc::new(ConfigStore::new());
        let ports = create_os_ports(config.clone(), true).unwrap();
        ControlSurface::new(config, store, ports)
    }

    #[tokio::test]
    async fn test_start_with_empty_store_rejected() {
        let control = setup();

        let err = control.start().await.unwrap_err();
        assert!(matches!(err, ResError::NoConfigurations));
        // Воркер не запускался
        assert!(!control.engine().is_running());
        assert!(control.worker.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_start_twice_rejected_then_stop_idempotent() {
        let control = setup();
        control
            .add_configuration("game.exe", "1", "1920", "1080", "2560", "1440")
            .unwrap();

        control.start().await.unwrap();
        let err = control.start().await.unwrap_err();
        assert!(matches!(err, ResError::AlreadyRunning));

        control.stop().await.unwrap();
        assert!(!control.engine().is_running());

        // Повторная остановка — успех без действий
        control.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_add_configuration_validation() {
        let control = setup();

        let err = control
            .add_configuration("game.exe", "abc", "1920", "1080", "2560", "1440")
            .unwrap_err();
        assert!(matches!(err, ResError::Validation(_)));

        let err = control
            .add_configuration("game.exe", "1", "1920", "0", "2560", "1440")
            .unwrap_err();
        assert!(matches!(err, ResError::Validation(_)));

        // Хранилище не изменилось
        assert!(control.list().is_empty());
    }

    #[tokio::test]
    async fn test_full_cycle_with_simulated_desktop() {
        let config = fast_config();
        let store = Arc::new(ConfigStore::new());
        let ports = create_os_ports(config.clone(), true).unwrap();
        let desktop = ports.simulated.clone().unwrap();
        let control = ControlSurface::new(config, store, ports);

        control
            .add_configuration("game.exe", "1", "1920", "1080", "1280", "720")
            .unwrap();
        desktop.spawn_process("game.exe", Some(Rect::new(2400, 300, 800, 600)));

        control.start().await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(400)).await;

        assert_eq!(
            desktop.resolution_calls(),
            vec![(1, Resolution::new(1280, 720))]
        );

        // stop снимает флаг, воркер выходит из удержания и возвращает режим
        control.stop().await.unwrap();
        assert_eq!(
            desktop.resolution_calls(),
            vec![
                (1, Resolution::new(1280, 720)),
                (1, Resolution::new(1920, 1080)),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_format() {
        let control = setup();
        control
            .add_configuration("game.exe", "1", "1920", "1080", "2560", "1440")
            .unwrap();

        let listed = control.list();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].contains("game.exe"));
        assert!(listed[0].contains("1920x1080"));
        assert!(listed[0].contains("2560x1440"));
    }
}
