//! Pixel allocation for the decoration colors.
//!
//! Colors are configured as server-resolvable names and allocated from the
//! default colormap at startup. Allocation failure is not fatal: the
//! manager logs it and falls back to the screen's black or white pixel.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Colormap, ConnectionExt};

use crate::config::ColorConfig;

/// The eight pixel values painted onto decorations and the root.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub desktop_background: u32,
    pub window_background: u32,
    pub inactive_frame: u32,
    pub inactive_title: u32,
    pub inactive_title_border: u32,
    pub active_frame: u32,
    pub active_title: u32,
    pub active_title_border: u32,
}

impl Palette {
    /// Allocate every configured color by name.
    pub fn allocate(
        conn: &impl Connection,
        colormap: Colormap,
        black_pixel: u32,
        white_pixel: u32,
        colors: &ColorConfig,
    ) -> Self {
        let named = |name: &str, fallback: u32| -> u32 {
            let reply = conn
                .alloc_named_color(colormap, name.as_bytes())
                .map_err(anyhow::Error::from)
                .and_then(|cookie| cookie.reply().map_err(anyhow::Error::from));
            match reply {
                Ok(reply) => reply.pixel,
                Err(e) => {
                    log::error!("Failed to allocate color '{}': {}", name, e);
                    fallback
                }
            }
        };

        Self {
            desktop_background: named(&colors.desktop_background, black_pixel),
            window_background: named(&colors.window_background, white_pixel),
            inactive_frame: named(&colors.inactive_frame, black_pixel),
            inactive_title: named(&colors.inactive_title, black_pixel),
            inactive_title_border: named(&colors.inactive_title_border, black_pixel),
            active_frame: named(&colors.active_frame, black_pixel),
            active_title: named(&colors.active_title, white_pixel),
            active_title_border: named(&colors.active_title_border, black_pixel),
        }
    }
}
