use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod control;
mod engine;
mod error;
mod geometry;
mod model;
mod services;
mod store;

use config::Config;
use control::ControlSurface;
use store::ConfigStore;

#[derive(Parser, Debug)]
#[command(name = "resmgr-rust")]
#[command(about = "Утилита для автоматического переключения разрешения мониторов")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "resmgr.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Добавить правило вида "app,monitor,WxH,WxH" (можно несколько раз)
    #[arg(long)]
    add: Vec<String>,

    /// Показать правила и выйти, не запуская мониторинг
    #[arg(long)]
    list: bool,

    /// Сохранить правила в файл хранилища
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск Resolution Manager v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные смены разрешения отключены");
    }

    // Хранилище правил: сохранённый файл подхватывается автоматически,
    // его отсутствие не ошибка
    let store = Arc::new(ConfigStore::new());
    let loaded = store.load_from(&config.storage.configurations_path)?;
    if loaded > 0 {
        info!("Загружено {} правил из хранилища", loaded);
    }

    // Инициализация портов к платформе
    let ports = services::create_os_ports(config.clone(), args.dry_run)?;
    let simulated = ports.simulated.clone();
    let control = ControlSurface::new(config.clone(), store.clone(), ports);

    info!("Все компоненты инициализированы");

    for line in &args.add {
        control.add_rule_line(line)?;
        info!("Добавлено правило: {}", line);
    }

    if args.save {
        control.save()?;
    }

    if args.list {
        for summary in control.list() {
            println!("{}", summary);
        }
        return Ok(());
    }

    // В dry-run эмулируем жизненный цикл первого отслеживаемого приложения
    if let Some(desktop) = simulated {
        if let Some(first) = store.snapshot().first() {
            tokio::spawn(services::sim::run_demo(desktop, first.app_name.clone()));
        }
    }

    control.start().await?;

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Остановка с ожиданием выхода воркера (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, control.stop()).await {
        Ok(result) => {
            result?;
            info!("Воркер сверки завершил работу корректно");
        }
        Err(_) => warn!("Таймаут при остановке воркера сверки"),
    }

    info!("Resolution Manager завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
