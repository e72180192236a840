use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ResError, Result};
use crate::model::Resolution;

/// Пара разрешений для одного монитора
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorRule {
    pub normal: Resolution,
    pub target: Resolution,
}

/// Конфигурация одного приложения.
///
/// Ключ — имя приложения; сопоставление имён везде регистронезависимое
/// (подстрока в имени процесса), поэтому и слияние конфигураций выполняется
/// по нормализованному (приведённому к нижнему регистру) имени. Каждый
/// индекс монитора встречается в конфигурации не более одного раза.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub app_name: String,
    pub rules: BTreeMap<usize, MonitorRule>,
}

impl Configuration {
    pub fn new(app_name: String) -> Self {
        Self {
            app_name,
            rules: BTreeMap::new(),
        }
    }

    /// Совпадает ли имя приложения (без учёта регистра)
    pub fn matches_name(&self, name: &str) -> bool {
        self.app_name.eq_ignore_ascii_case(name)
    }

    /// Человекочитаемые строки: одна на каждое правило монитора
    pub fn summaries(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|(index, rule)| {
                format!(
                    "{} (монитор {}): обычное {}, целевое {}",
                    self.app_name, index, rule.normal, rule.target
                )
            })
            .collect()
    }
}

/// Хранилище конфигураций: список приложений в порядке добавления.
///
/// Читается воркером сверки (снимок на каждый тик) и изменяется управляющим
/// потоком; доступ редкий, поэтому достаточно одной эксклюзивной блокировки.
pub struct ConfigStore {
    inner: RwLock<Vec<Configuration>>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Добавить или обновить правило (app, monitor).
    ///
    /// Если для приложения уже есть правило с этим индексом монитора,
    /// заменяется только оно; остальные правила приложения не затрагиваются.
    pub fn add(
        &self,
        app_name: &str,
        monitor_index: usize,
        normal: Resolution,
        target: Resolution,
    ) -> Result<()> {
        let app_name = app_name.trim();
        if app_name.is_empty() {
            return ResError::validation("Имя приложения не может быть пустым");
        }
        if normal.width == 0 || normal.height == 0 || target.width == 0 || target.height == 0 {
            return ResError::validation("Ширина и высота должны быть положительными");
        }

        let rule = MonitorRule { normal, target };
        let mut configs = self.inner.write();

        match configs.iter_mut().find(|c| c.matches_name(app_name)) {
            Some(existing) => {
                debug!(
                    "Обновление правила: {} монитор {} -> обычное {}, целевое {}",
                    existing.app_name, monitor_index, normal, target
                );
                existing.rules.insert(monitor_index, rule);
            }
            None => {
                debug!(
                    "Новая конфигурация: {} монитор {} -> обычное {}, целевое {}",
                    app_name, monitor_index, normal, target
                );
                let mut config = Configuration::new(app_name.to_string());
                config.rules.insert(monitor_index, rule);
                configs.push(config);
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Снимок всех конфигураций для одного тика сверки
    pub fn snapshot(&self) -> Vec<Configuration> {
        self.inner.read().clone()
    }

    /// Человекочитаемый список всех правил в порядке добавления приложений
    pub fn list_summaries(&self) -> Vec<String> {
        self.inner
            .read()
            .iter()
            .flat_map(|config| config.summaries())
            .collect()
    }

    /// Сериализация в строки формата `app,monitor,WxH,WxH`
    pub fn to_lines(&self) -> Vec<String> {
        self.inner
            .read()
            .iter()
            .flat_map(|config| {
                config.rules.iter().map(|(index, rule)| {
                    format!(
                        "{},{},{},{}",
                        config.app_name, index, rule.normal, rule.target
                    )
                })
            })
            .collect()
    }

    /// Загрузка строк формата `app,monitor,WxH,WxH`.
    ///
    /// Сначала разбираются все строки, потом применяются: некорректная
    /// строка делает весь вызов ошибкой, и хранилище не меняется вовсе.
    pub fn merge_lines<'a, I: IntoIterator<Item = &'a str>>(&self, lines: I) -> Result<usize> {
        let mut parsed = Vec::new();

        for (number, line) in lines.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry = parse_line(line).map_err(|e| {
                ResError::Persistence(format!("строка {}: {}", number + 1, e))
            })?;
            parsed.push(entry);
        }

        let count = parsed.len();
        for (app_name, monitor_index, normal, target) in parsed {
            self.add(&app_name, monitor_index, normal, target)?;
        }

        Ok(count)
    }

    /// Загрузить правила из файла; отсутствие файла не является ошибкой
    pub fn load_from<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Файл конфигураций {:?} отсутствует, хранилище пустое", path);
                return Ok(0);
            }
            Err(e) => return Err(ResError::Io(e)),
        };

        let count = self.merge_lines(content.lines())?;
        info!("Загружено {} правил из {:?}", count, path);
        Ok(count)
    }

    /// Сохранить все правила в файл
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut content = self.to_lines().join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        std::fs::write(path, content)
            .map_err(|e| ResError::Persistence(format!("не удалось записать {:?}: {}", path, e)))?;

        info!("Конфигурации сохранены в {:?}", path);
        Ok(())
    }
}

/// Разбор одной строки `app,monitor,WxH,WxH`
pub fn parse_line(line: &str) -> Result<(String, usize, Resolution, Resolution)> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 4 {
        return ResError::validation(format!(
            "ожидалось 4 поля через запятую, получено {}: '{}'",
            fields.len(),
            line
        ));
    }

    let app_name = fields[0].trim();
    if app_name.is_empty() {
        return ResError::validation(format!("пустое имя приложения: '{}'", line));
    }

    let monitor_index: usize = fields[1]
        .trim()
        .parse()
        .map_err(|_| ResError::Validation(format!("некорректный индекс монитора: '{}'", fields[1])))?;

    let normal: Resolution = fields[2].parse()?;
    let target: Resolution = fields[3].parse()?;

    Ok((app_name.to_string(), monitor_index, normal, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(w: u32, h: u32) -> Resolution {
        Resolution::new(w, h)
    }

    #[test]
    fn test_add_and_list_order() {
        let store = ConfigStore::new();
        store.add("game.exe", 1, res(1920, 1080), res(2560, 1440)).unwrap();
        store.add("editor.exe", 0, res(1920, 1080), res(1280, 720)).unwrap();

        let summaries = store.list_summaries();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].starts_with("game.exe"));
        assert!(summaries[1].starts_with("editor.exe"));
    }

    #[test]
    fn test_upsert_replaces_only_named_monitor() {
        let store = ConfigStore::new();
        store.add("game.exe", 0, res(1920, 1080), res(2560, 1440)).unwrap();
        store.add("game.exe", 1, res(1920, 1080), res(3840, 2160)).unwrap();
        // Повторное добавление для монитора 1 заменяет только его правило
        store.add("game.exe", 1, res(1600, 900), res(2560, 1440)).unwrap();

        assert_eq!(store.len(), 1);
        let config = &store.snapshot()[0];
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[&0].target, res(2560, 1440));
        assert_eq!(config.rules[&1].normal, res(1600, 900));
        assert_eq!(config.rules[&1].target, res(2560, 1440));
    }

    #[test]
    fn test_merge_is_case_insensitive() {
        let store = ConfigStore::new();
        store.add("Game.exe", 0, res(1920, 1080), res(2560, 1440)).unwrap();
        store.add("game.EXE", 1, res(1920, 1080), res(2560, 1440)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].rules.len(), 2);
    }

    #[test]
    fn test_add_validation() {
        let store = ConfigStore::new();
        assert!(store.add("", 0, res(1920, 1080), res(2560, 1440)).is_err());
        assert!(store.add("app", 0, res(0, 1080), res(2560, 1440)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_lines_round_trip() {
        let store = ConfigStore::new();
        store.add("game.exe", 1, res(1920, 1080), res(2560, 1440)).unwrap();
        store.add("game.exe", 0, res(1280, 720), res(1920, 1080)).unwrap();
        store.add("editor.exe", 2, res(2560, 1440), res(1920, 1080)).unwrap();

        let lines = store.to_lines();
        let restored = ConfigStore::new();
        restored
            .merge_lines(lines.iter().map(|s| s.as_str()))
            .unwrap();

        assert_eq!(store.snapshot(), restored.snapshot());
    }

    #[test]
    fn test_malformed_line_is_fatal_and_atomic() {
        let store = ConfigStore::new();
        let lines = vec![
            "game.exe,1,1920x1080,2560x1440",
            // Отсутствует целевое разрешение
            "app,1,1920x1080",
        ];

        let err = store.merge_lines(lines).unwrap_err();
        assert!(matches!(err, ResError::Persistence(_)));
        // Ни одна строка не применена
        assert!(store.is_empty());
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("app,abc,1920x1080,2560x1440").is_err());
        assert!(parse_line("app,1,1920,2560x1440").is_err());
        assert!(parse_line(",1,1920x1080,2560x1440").is_err());
        assert!(parse_line("a,b,c,d,e").is_err());
    }

    #[test]
    fn test_load_missing_file_is_empty_store() {
        let store = ConfigStore::new();
        let count = store
            .load_from("/nonexistent/resmgr-test-configurations.txt")
            .unwrap();
        assert_eq!(count, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "resmgr-test-{}.txt",
            std::process::id()
        ));

        let store = ConfigStore::new();
        store.add("game.exe", 1, res(1920, 1080), res(2560, 1440)).unwrap();
        store.save_to(&path).unwrap();

        let restored = ConfigStore::new();
        restored.load_from(&path).unwrap();
        assert_eq!(store.snapshot(), restored.snapshot());

        let _ = std::fs::remove_file(&path);
    }
}
