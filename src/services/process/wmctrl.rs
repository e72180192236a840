use crate::error::{ResError, Result};
use crate::model::{Rect, WindowInfo};
use std::process::Command;
use tracing::debug;

pub struct WmctrlLookup;

impl WmctrlLookup {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("wmctrl").args(["-l"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ResError::Internal("wmctrl failed".to_string()))
        }
    }

    /// Найти первое окно ненулевой площади для процесса.
    /// wmctrl перечисляет только управляемые (видимые) окна.
    pub fn find_window_for_pid(&self, pid: u32) -> Result<Option<WindowInfo>> {
        let output = Command::new("wmctrl")
            .args(["-l", "-p", "-G"])
            .output()
            .map_err(|e| ResError::Query(format!("wmctrl не найден: {}", e)))?;

        if !output.status.success() {
            return ResError::query("wmctrl вернул ошибку");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        for line in stdout.lines() {
            if let Some(window) = parse_list_line(line, pid) {
                if window.rect.has_area() {
                    debug!("wmctrl нашёл окно 0x{:x} для pid {}", window.id, pid);
                    return Ok(Some(window));
                }
            }
        }

        Ok(None)
    }
}

/// Разбор строки `wmctrl -l -p -G`:
/// `0x04000007  0 1234   1920 32   800  600  host title...`
fn parse_list_line(line: &str, wanted_pid: u32) -> Option<WindowInfo> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return None;
    }

    let pid: u32 = parts[2].parse().ok()?;
    if pid != wanted_pid {
        return None;
    }

    let id = u64::from_str_radix(parts[0].trim_start_matches("0x"), 16).ok()?;
    let x: i32 = parts[3].parse().ok()?;
    let y: i32 = parts[4].parse().ok()?;
    let width: u32 = parts[5].parse().ok()?;
    let height: u32 = parts[6].parse().ok()?;

    Some(WindowInfo::new(id, pid, Rect::new(x, y, width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0x04000007  0 1234   1920 32   800  600  host Steam\n\
                          0x04200011  1 5678   0    0    1280 1024 host Editor\n";

    #[test]
    fn test_parse_matching_pid() {
        let window = SAMPLE
            .lines()
            .find_map(|l| parse_list_line(l, 1234))
            .unwrap();
        assert_eq!(window.id, 0x04000007);
        assert_eq!(window.rect, Rect::new(1920, 32, 800, 600));
    }

    #[test]
    fn test_parse_no_match() {
        assert!(SAMPLE.lines().find_map(|l| parse_list_line(l, 999)).is_none());
    }

    #[test]
    fn test_parse_garbage_line() {
        assert!(parse_list_line("не окно вовсе", 1234).is_none());
        assert!(parse_list_line("", 1234).is_none());
    }
}
