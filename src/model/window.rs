use serde::{Deserialize, Serialize};
use std::fmt;

/// Прямоугольник окна в экранных координатах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Центральная точка прямоугольника
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width as i32) / 2,
            self.y + (self.height as i32) / 2,
        )
    }

    /// Окно с нулевой площадью (свернутое или служебное) не учитывается
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Информация об окне процесса
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: u64,
    pub pid: u32,
    pub rect: Rect,
}

impl WindowInfo {
    pub fn new(id: u64, pid: u32, rect: Rect) -> Self {
        Self { id, pid, rect }
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "окно 0x{:x} (pid {}) {}x{}+{}+{}",
            self.id, self.pid, self.rect.width, self.rect.height, self.rect.x, self.rect.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center() {
        let rect = Rect::new(100, 200, 800, 600);
        assert_eq!(rect.center(), (500, 500));
    }

    #[test]
    fn test_rect_area() {
        assert!(Rect::new(0, 0, 1, 1).has_area());
        assert!(!Rect::new(10, 10, 0, 300).has_area());
        assert!(!Rect::new(10, 10, 300, 0).has_area());
    }
}
