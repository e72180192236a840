use crate::error::{ResError, Result};
use crate::model::{Rect, WindowInfo};
use std::process::Command;
use tracing::debug;

pub struct XdotoolLookup;

impl XdotoolLookup {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").arg("--version").output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ResError::Internal("xdotool failed".to_string()))
        }
    }

    /// Найти первое видимое окно ненулевой площади для процесса
    pub fn find_window_for_pid(&self, pid: u32) -> Result<Option<WindowInfo>> {
        let output = Command::new("xdotool")
            .args(["search", "--pid", &pid.to_string(), "--onlyvisible"])
            .output()
            .map_err(|e| ResError::Query(format!("xdotool не найден: {}", e)))?;

        // xdotool search возвращает ненулевой код, когда окон нет
        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        for line in stdout.lines() {
            let Ok(window_id) = line.trim().parse::<u64>() else {
                continue;
            };

            match self.window_geometry(window_id) {
                Ok(rect) if rect.has_area() => {
                    debug!("xdotool нашёл окно {} для pid {}: {:?}", window_id, pid, rect);
                    return Ok(Some(WindowInfo::new(window_id, pid, rect)));
                }
                Ok(_) => debug!("Окно {} имеет нулевую площадь, пропускаем", window_id),
                Err(e) => debug!("Не удалось получить геометрию окна {}: {}", window_id, e),
            }
        }

        Ok(None)
    }

    fn window_geometry(&self, window_id: u64) -> Result<Rect> {
        let output = Command::new("xdotool")
            .args(["getwindowgeometry", "--shell", &window_id.to_string()])
            .output()
            .map_err(|e| ResError::Query(format!("xdotool не найден: {}", e)))?;

        if !output.status.success() {
            return ResError::query(format!("xdotool getwindowgeometry вернул ошибку для {}", window_id));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_shell_geometry(&stdout)
    }
}

/// Разбор вывода `xdotool getwindowgeometry --shell`:
/// строки вида X=..., Y=..., WIDTH=..., HEIGHT=...
fn parse_shell_geometry(output: &str) -> Result<Rect> {
    let mut x = None;
    let mut y = None;
    let mut width = None;
    let mut height = None;

    for line in output.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            match key {
                "X" => x = value.parse::<i32>().ok(),
                "Y" => y = value.parse::<i32>().ok(),
                "WIDTH" => width = value.parse::<u32>().ok(),
                "HEIGHT" => height = value.parse::<u32>().ok(),
                _ => {}
            }
        }
    }

    match (x, y, width, height) {
        (Some(x), Some(y), Some(width), Some(height)) => Ok(Rect::new(x, y, width, height)),
        _ => ResError::query(format!("некорректный вывод геометрии xdotool: '{}'", output.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_geometry() {
        let output = "WINDOW=70254594\nX=1920\nY=32\nWIDTH=800\nHEIGHT=600\nSCREEN=0\n";
        let rect = parse_shell_geometry(output).unwrap();
        assert_eq!(rect, Rect::new(1920, 32, 800, 600));
    }

    #[test]
    fn test_parse_shell_geometry_incomplete() {
        assert!(parse_shell_geometry("X=10\nY=20\n").is_err());
        assert!(parse_shell_geometry("").is_err());
    }
}
