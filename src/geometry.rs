//! Geometry resolver: responsibility and boundaries
//!
//! This module maps a window's bounding rectangle to the monitor that
//! contains its center point, given the current layout. It is pure and
//! stateless: no OS queries, no caching. Monitor occupancy decisions
//! (activation, hold, reversion) belong exclusively to the engine.

use crate::model::{MonitorLayout, Rect};

/// Определить, на каком мониторе находится окно.
///
/// Берётся центральная точка прямоугольника; возвращается индекс первого
/// монитора в порядке раскладки, чей полуоткрытый ограничивающий
/// прямоугольник содержит эту точку. `None`, если точка вне всех мониторов
/// (окно свернуто или за пределами экранов). Перекрывающиеся раскладки не
/// поддерживаются: выигрывает первый найденный монитор.
pub fn resolve_monitor_for_rect(rect: &Rect, layout: &MonitorLayout) -> Option<usize> {
    let (cx, cy) = rect.center();

    layout
        .iter()
        .find(|monitor| monitor.contains(cx, cy))
        .map(|monitor| monitor.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MonitorInfo, Resolution};

    fn layout_two_side_by_side() -> MonitorLayout {
        vec![
            MonitorInfo {
                index: 0,
                name: "SIM-0".to_string(),
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                current: Resolution::new(1920, 1080),
            },
            MonitorInfo {
                index: 1,
                name: "SIM-1".to_string(),
                x: 1920,
                y: 0,
                width: 2560,
                height: 1440,
                current: Resolution::new(2560, 1440),
            },
        ]
    }

    #[test]
    fn test_rect_inside_single_monitor() {
        let layout = layout_two_side_by_side();

        let rect = Rect::new(100, 100, 800, 600);
        assert_eq!(resolve_monitor_for_rect(&rect, &layout), Some(0));

        let rect = Rect::new(2000, 100, 800, 600);
        assert_eq!(resolve_monitor_for_rect(&rect, &layout), Some(1));
    }

    #[test]
    fn test_center_on_shared_boundary() {
        let layout = layout_two_side_by_side();

        // Центр ровно на x=1920: граница исключена из первого монитора
        // и включена во второй (полуоткрытые интервалы)
        let rect = Rect::new(1820, 100, 200, 200);
        assert_eq!(rect.center().0, 1920);
        assert_eq!(resolve_monitor_for_rect(&rect, &layout), Some(1));
    }

    #[test]
    fn test_rect_off_screen() {
        let layout = layout_two_side_by_side();

        let rect = Rect::new(-5000, -5000, 300, 300);
        assert_eq!(resolve_monitor_for_rect(&rect, &layout), None);

        let rect = Rect::new(0, 2000, 300, 300);
        assert_eq!(resolve_monitor_for_rect(&rect, &layout), None);
    }

    #[test]
    fn test_empty_layout() {
        let rect = Rect::new(0, 0, 100, 100);
        assert_eq!(resolve_monitor_for_rect(&rect, &vec![]), None);
    }
}
