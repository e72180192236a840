use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Некорректные данные: {0}")]
    Validation(String),

    #[error("Ошибка опроса системы: {0}")]
    Query(String),

    #[error("Ошибка хранилища конфигураций: {0}")]
    Persistence(String),

    #[error("Мониторинг уже запущен")]
    AlreadyRunning,

    #[error("Нет конфигураций для мониторинга")]
    NoConfigurations,

    #[error("Монитор с индексом {0} не найден")]
    MonitorNotFound(usize),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl ResError {
    pub fn validation<T>(msg: impl Into<String>) -> Result<T> {
        Err(ResError::Validation(msg.into()))
    }

    pub fn query<T>(msg: impl Into<String>) -> Result<T> {
        Err(ResError::Query(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, ResError>;
