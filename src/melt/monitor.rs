use crate::melt::sprite::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<MonitorRect> for Bounds {
    fn from(rect: MonitorRect) -> Self {
        Bounds::new(rect.width, rect.height)
    }
}

pub fn monitor_contains_point(rect: MonitorRect, point: (i32, i32)) -> bool {
    point.0 >= rect.x
        && point.0 < rect.x + rect.width
        && point.1 >= rect.y
        && point.1 < rect.y + rect.height
}

pub fn global_to_local(point: (i32, i32), origin: (i32, i32)) -> (i32, i32) {
    (point.0 - origin.0, point.1 - origin.1)
}

/// Pointer position in overlay-local coordinates, or `None` while the pointer
/// is on another monitor.
pub fn pointer_on_monitor(rect: MonitorRect, global: Option<(i32, i32)>) -> Option<(i32, i32)> {
    global
        .filter(|point| monitor_contains_point(rect, *point))
        .map(|point| global_to_local(point, (rect.x, rect.y)))
}

#[cfg(windows)]
pub fn resolve_cursor_position() -> Option<(i32, i32)> {
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

    let mut point = POINT::default();
    if unsafe { GetCursorPos(&mut point) }.is_ok() {
        Some((point.x, point.y))
    } else {
        None
    }
}

#[cfg(not(windows))]
pub fn resolve_cursor_position() -> Option<(i32, i32)> {
    None
}
