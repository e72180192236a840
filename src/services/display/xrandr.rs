use crate::error::{ResError, Result};
use crate::model::{ChangeOutcome, MonitorInfo, MonitorLayout, Resolution};
use std::process::Command;
use tracing::{debug, info, warn};

use super::r#trait::{DisplayController, DisplayInspector};

/// Бэкенд дисплея поверх xrandr: перечисление мониторов через
/// `xrandr --listmonitors`, смена режима через `xrandr --output ... --mode`
pub struct XrandrDisplay;

impl XrandrDisplay {
    pub fn new() -> Self {
        info!("Инициализация XrandrDisplay");
        Self
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("xrandr").args(["--listmonitors"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ResError::Internal("xrandr failed".to_string()))
        }
    }

    fn query_layout(&self) -> Result<MonitorLayout> {
        let output = Command::new("xrandr")
            .args(["--listmonitors"])
            .output()
            .map_err(|e| ResError::Query(format!("xrandr не найден: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return ResError::query(format!("xrandr вернул ошибку: {}", stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_listmonitors(&stdout)
    }
}

#[async_trait::async_trait]
impl DisplayInspector for XrandrDisplay {
    async fn current_layout(&self) -> Result<MonitorLayout> {
        self.query_layout()
    }

    async fn current_resolution(&self, index: usize) -> Result<Resolution> {
        let layout = self.query_layout()?;
        layout
            .get(index)
            .map(|monitor| monitor.current)
            .ok_or(ResError::MonitorNotFound(index))
    }
}

#[async_trait::async_trait]
impl DisplayController for XrandrDisplay {
    async fn set_resolution(
        &self,
        index: usize,
        resolution: Resolution,
        bits_per_pixel: u32,
        refresh_hz: u32,
    ) -> Result<ChangeOutcome> {
        let layout = self.query_layout()?;
        let monitor = layout
            .get(index)
            .ok_or(ResError::MonitorNotFound(index))?;

        // У xrandr нет переключения глубины цвета; значение принимается
        // по контракту порта и этим бэкендом не используется
        debug!("bits_per_pixel={} игнорируется бэкендом xrandr", bits_per_pixel);

        info!(
            "Смена режима монитора {} ({}) на {} @ {}Гц",
            index, monitor.name, resolution, refresh_hz
        );

        let output = Command::new("xrandr")
            .args([
                "--output",
                &monitor.name,
                "--mode",
                &resolution.to_string(),
                "--rate",
                &refresh_hz.to_string(),
            ])
            .output()
            .map_err(|e| ResError::Query(format!("xrandr не найден: {}", e)))?;

        if output.status.success() {
            info!("Режим монитора {} изменён на {}", index, resolution);
            Ok(ChangeOutcome::Success)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            warn!(
                "xrandr не смог сменить режим монитора {} (код {}): {}",
                index,
                code,
                stderr.trim()
            );
            Ok(ChangeOutcome::Failed(code))
        }
    }
}

/// Разбор вывода `xrandr --listmonitors`:
/// ```text
/// Monitors: 2
///  0: +*eDP-1 1920/309x1080/174+0+0  eDP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
fn parse_listmonitors(output: &str) -> Result<MonitorLayout> {
    let mut layout = Vec::new();

    for line in output.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return ResError::query(format!("некорректная строка xrandr: '{}'", line));
        }

        let index: usize = parts[0]
            .trim_end_matches(':')
            .parse()
            .map_err(|_| ResError::Query(format!("некорректный индекс монитора: '{}'", parts[0])))?;
        let name = parts[parts.len() - 1].to_string();
        let (width, height, x, y) = parse_geometry(parts[2])
            .ok_or_else(|| ResError::Query(format!("некорректная геометрия xrandr: '{}'", parts[2])))?;

        layout.push(MonitorInfo {
            index,
            name,
            x,
            y,
            width,
            height,
            current: Resolution::new(width, height),
        });
    }

    Ok(layout)
}

/// Геометрия вида `1920/309x1080/174+0+0` -> (1920, 1080, 0, 0)
fn parse_geometry(geometry: &str) -> Option<(u32, u32, i32, i32)> {
    // Смещения могут быть отрицательными: ищем разделители `+` или `-`
    // после блока размеров
    let dims_end = geometry.find(|c| c == '+' || c == '-')?;
    let (dims, offsets) = geometry.split_at(dims_end);

    let (w_part, h_part) = dims.split_once('x')?;
    let width: u32 = w_part.split('/').next()?.parse().ok()?;
    let height: u32 = h_part.split('/').next()?.parse().ok()?;

    let mut coords = Vec::new();
    let mut rest = offsets;
    while !rest.is_empty() {
        let sign = &rest[..1];
        let tail = &rest[1..];
        let end = tail.find(|c| c == '+' || c == '-').unwrap_or(tail.len());
        let value: i32 = tail[..end].parse().ok()?;
        coords.push(if sign == "-" { -value } else { value });
        rest = &tail[end..];
    }

    if coords.len() != 2 {
        return None;
    }

    Some((width, height, coords[0], coords[1]))
}
