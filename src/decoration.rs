//! Decoration geometry.
//!
//! Computes where the frame and titlebar go for a client rectangle. The
//! frame is offset up and left so the client area keeps its requested
//! position on screen, clamped so the decoration never starts off-screen.

use crate::config::AppearanceConfig;

/// Placement and sizes for a new decoration around a client rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorGeometry {
    /// Frame position, root-relative
    pub frame_x: i16,
    pub frame_y: i16,
    /// Frame size, excluding its border
    pub frame_width: u16,
    pub frame_height: u16,
    /// Titlebar size, excluding its inner border
    pub title_width: u16,
    pub title_height: u16,
    /// Client offset within the frame
    pub client_x: i16,
    pub client_y: i16,
}

impl DecorGeometry {
    /// Compute the decoration for a client currently at `(x, y)` with the
    /// given size.
    pub fn for_client(x: i16, y: i16, width: u16, height: u16, appearance: &AppearanceConfig) -> Self {
        let border = appearance.frame_border_width;
        let title_h = appearance.titlebar_height;
        let inner = appearance.title_inner_border;

        Self {
            frame_x: (x as i32 - border as i32).max(0) as i16,
            frame_y: (y as i32 - (title_h + border) as i32).max(0) as i16,
            frame_width: width,
            frame_height: height + title_h,
            title_width: width.saturating_sub(2 * inner),
            title_height: title_h.saturating_sub(2 * inner),
            client_x: 0,
            client_y: title_h as i16,
        }
    }
}
