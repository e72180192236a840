pub mod monitor;
pub mod window;

pub use monitor::{ChangeOutcome, MonitorInfo, MonitorLayout};
pub use window::{Rect, WindowInfo};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResError;

/// Разрешение экрана в пикселях
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ResError;

    /// Разбор строки вида "1920x1080"; ширина и высота должны быть
    /// положительными целыми числами
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| ResError::Validation(format!("Некорректное разрешение: '{}'", s)))?;

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| ResError::Validation(format!("Некорректная ширина: '{}'", w)))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| ResError::Validation(format!("Некорректная высота: '{}'", h)))?;

        if width == 0 || height == 0 {
            return ResError::validation(format!("Разрешение должно быть положительным: '{}'", s));
        }

        Ok(Self { width, height })
    }
}
