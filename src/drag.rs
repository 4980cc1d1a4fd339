//! Pointer drag state and the geometry math behind move/resize.
//!
//! A drag starts with a left-button press on a decoration and ends on the
//! next button release. Title drags move the frame; frame drags resize it
//! along one of eight directions chosen by a hit-test over the press
//! position. All the arithmetic lives here as pure functions so the event
//! handlers stay thin.

/// What a drag in progress is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Moving the whole frame by its titlebar
    Title,
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

/// An in-progress drag.
///
/// `anchor_*` is the pointer's root position the deltas are measured from.
/// For title drags it stays at the press position, so every motion applies
/// the total displacement to the fixed `origin_*`. For resize drags it is
/// moved to the pointer after each motion, so the per-motion deltas
/// accumulate into the geometry. The two schemes are not interchangeable.
#[derive(Debug, Clone, Copy)]
pub struct Drag {
    pub kind: DragKind,
    pub anchor_x: i16,
    pub anchor_y: i16,
    pub origin_x: i16,
    pub origin_y: i16,
}

/// Per-motion geometry change for a resize drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeDelta {
    pub dx: i32,
    pub dy: i32,
    pub dw: i32,
    pub dh: i32,
}

/// Classify a press at `(x, y)` inside a frame of the given size.
///
/// The frame interior is split into a 3x3 grid: four corner zones, four
/// edge bands, and a middle that resolves to Top or Bottom by the vertical
/// halfway line. Both corner extents derive from the frame's width.
pub fn hit_test(width: u16, height: u16, x: i16, y: i16, corner_grip: u16) -> DragKind {
    let w = width as i32;
    let h = height as i32;
    let x = x as i32;
    let y = y as i32;
    let cw = (w / 2).min(corner_grip as i32);
    let ch = (w / 2).min(corner_grip as i32);

    if x >= w - cw {
        if y >= h - ch {
            DragKind::BottomRight
        } else if y <= ch {
            DragKind::TopRight
        } else {
            DragKind::Right
        }
    } else if x <= cw {
        if y >= h - ch {
            DragKind::BottomLeft
        } else if y <= ch {
            DragKind::TopLeft
        } else {
            DragKind::Left
        }
    } else if y >= h / 2 {
        DragKind::Bottom
    } else {
        DragKind::Top
    }
}

/// Geometry change for one motion of a resize drag, measured from the
/// anchor to the current pointer root position.
///
/// Right/bottom variants grow with the pointer; left/top variants grow
/// against it and shift the origin so the opposite edge stays put.
pub fn resize_delta(kind: DragKind, anchor_x: i16, anchor_y: i16, root_x: i16, root_y: i16) -> ResizeDelta {
    let mut delta = ResizeDelta::default();

    match kind {
        DragKind::Right | DragKind::TopRight | DragKind::BottomRight => {
            delta.dw = root_x as i32 - anchor_x as i32;
        }
        DragKind::Left | DragKind::TopLeft | DragKind::BottomLeft => {
            delta.dw = anchor_x as i32 - root_x as i32;
            delta.dx = -delta.dw;
        }
        _ => {}
    }

    match kind {
        DragKind::Bottom | DragKind::BottomLeft | DragKind::BottomRight => {
            delta.dh = root_y as i32 - anchor_y as i32;
        }
        DragKind::Top | DragKind::TopLeft | DragKind::TopRight => {
            delta.dh = anchor_y as i32 - root_y as i32;
            delta.dy = -delta.dh;
        }
        _ => {}
    }

    delta
}

/// One rectangle of a snap layout, in the coordinate space of its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapRect {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

/// Target geometry for frame, title, and client after an edge snap.
/// The frame rectangle is root-relative; title and client are
/// frame-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapLayout {
    pub frame: SnapRect,
    pub title: SnapRect,
    pub client: SnapRect,
}

/// Detect an edge snap for a title drag.
///
/// Returns the half-screen layout when the pointer's root position sits on
/// the very first or last pixel column/row of the screen, in the order
/// left, right, top, bottom. `title_height` and `border_width` are the
/// decoration's current values.
pub fn snap_layout(
    root_x: i16,
    root_y: i16,
    screen_width: u16,
    screen_height: u16,
    title_height: u16,
    border_width: u16,
) -> Option<SnapLayout> {
    let sw = screen_width;
    let sh = screen_height;
    let th = title_height;
    let bw2 = 2 * border_width;

    let half_screen = |frame_x: i16, frame_w: u16| SnapLayout {
        frame: SnapRect {
            x: frame_x,
            y: 0,
            width: frame_w,
            height: sh - bw2,
        },
        title: SnapRect {
            x: 0,
            y: 0,
            width: frame_w,
            height: th,
        },
        client: SnapRect {
            x: 0,
            y: th as i16,
            width: frame_w,
            height: sh - th - bw2,
        },
    };

    if root_x == 0 {
        Some(half_screen(0, sw / 2))
    } else if root_x == sw as i16 - 1 {
        Some(half_screen(sw as i16 / 2, sw / 2))
    } else if root_y == 0 {
        Some(SnapLayout {
            frame: SnapRect {
                x: 0,
                y: 0,
                width: sw,
                height: sh / 2 - bw2,
            },
            title: SnapRect {
                x: 0,
                y: 0,
                width: sw,
                height: th,
            },
            client: SnapRect {
                x: 0,
                y: th as i16,
                width: sw,
                height: sh / 2 - th - bw2,
            },
        })
    } else if root_y == sh as i16 - 1 {
        Some(SnapLayout {
            frame: SnapRect {
                x: 0,
                y: sh as i16 / 2,
                width: sw,
                height: sh / 2 - bw2,
            },
            title: SnapRect {
                x: 0,
                y: 0,
                width: sw,
                height: th,
            },
            client: SnapRect {
                x: 0,
                y: th as i16,
                width: sw,
                height: sh / 2 - th - bw2,
            },
        })
    } else {
        None
    }
}
