use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub monitoring: MonitoringConfig,
    pub display: DisplayConfig,
    pub window: WindowConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

/// Интервалы цикла сверки: внешний тик обходит все конфигурации,
/// внутренний интервал используется в цикле удержания активного монитора
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    pub tick_interval_ms: u64,
    pub hold_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub backend: String,
    pub bits_per_pixel: u32,
    pub refresh_hz: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub lookup_backend: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub configurations_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "resmgr_rust=info".to_string(),
            },
            monitoring: MonitoringConfig {
                tick_interval_ms: 5000,
                hold_interval_ms: 2000,
            },
            display: DisplayConfig {
                backend: "xrandr".to_string(),
                bits_per_pixel: 32,
                refresh_hz: 60,
            },
            window: WindowConfig {
                lookup_backend: "auto".to_string(),
            },
            storage: StorageConfig {
                configurations_path: "configurations.txt".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("RESMGR_"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация интервалов цикла сверки
        if self.monitoring.tick_interval_ms < 100 {
            anyhow::bail!("tick_interval_ms должно быть минимум 100");
        }

        if self.monitoring.hold_interval_ms < 100 {
            anyhow::bail!("hold_interval_ms должно быть минимум 100");
        }

        // Валидация настроек дисплея
        match self.display.backend.as_str() {
            "xrandr" => {}
            _ => anyhow::bail!("Неверный бэкенд дисплея: {}", self.display.backend),
        }

        if self.display.bits_per_pixel == 0 || self.display.refresh_hz == 0 {
            anyhow::bail!("bits_per_pixel и refresh_hz должны быть больше 0");
        }

        // Валидация поиска окон
        match self.window.lookup_backend.as_str() {
            "auto" | "xdotool" | "wmctrl" => {}
            _ => anyhow::bail!(
                "Неверный бэкенд поиска окон: {}",
                self.window.lookup_backend
            ),
        }

        if self.storage.configurations_path.is_empty() {
            anyhow::bail!("configurations_path не может быть пустым");
        }

        Ok(())
    }
}
