use serde::{Deserialize, Serialize};
use std::fmt;

use super::Resolution;

/// Описание одного монитора: позиция в раскладке, габариты и текущий режим.
/// Индексы позиционные и считаются стабильными в пределах одного запуска
/// мониторинга; раскладка перечитывается на каждом тике.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub index: usize,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub current: Resolution,
}

impl MonitorInfo {
    /// Содержит ли ограничивающий прямоугольник монитора точку.
    /// Интервалы полуоткрытые: [x, x+width) × [y, y+height)
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && px < self.x + self.width as i32
            && py >= self.y
            && py < self.y + self.height as i32
    }
}

impl fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "монитор {} ({}) {}x{}+{}+{}, текущий режим {}",
            self.index, self.name, self.width, self.height, self.x, self.y, self.current
        )
    }
}

/// Раскладка мониторов в порядке перечисления системой
pub type MonitorLayout = Vec<MonitorInfo>;

/// Результат синхронной смены режима монитора
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Success,
    RestartRequired,
    Failed(i32),
}

impl ChangeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChangeOutcome::Success)
    }
}

impl fmt::Display for ChangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOutcome::Success => write!(f, "успешно"),
            ChangeOutcome::RestartRequired => write!(f, "требуется перезагрузка системы"),
            ChangeOutcome::Failed(code) => write!(f, "ошибка (код {})", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(index: usize, x: i32, y: i32, w: u32, h: u32) -> MonitorInfo {
        MonitorInfo {
            index,
            name: format!("SIM-{}", index),
            x,
            y,
            width: w,
            height: h,
            current: Resolution::new(w, h),
        }
    }

    #[test]
    fn test_contains_half_open() {
        let m = monitor(0, 0, 0, 1920, 1080);
        assert!(m.contains(0, 0));
        assert!(m.contains(1919, 1079));
        // Правая и нижняя границы не включаются
        assert!(!m.contains(1920, 500));
        assert!(!m.contains(500, 1080));
        assert!(!m.contains(-1, 0));
    }
}
