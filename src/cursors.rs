//! Cursor setup from the server's `cursor` glyph font.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, Cursor};

// Glyph indices in the standard cursor font
const XC_LEFT_PTR: u16 = 68;
const XC_FLEUR: u16 = 52;
const XC_SIZING: u16 = 120;

/// The three cursor shapes the manager needs.
pub struct Cursors {
    /// Root window default
    pub normal: Cursor,
    /// Shown over titlebars (move handle)
    pub title_drag: Cursor,
    /// Shown over frames (resize handle)
    pub frame_resize: Cursor,
}

impl Cursors {
    pub fn create(conn: &impl Connection) -> Result<Self> {
        let cursor_font = conn.generate_id()?;
        conn.open_font(cursor_font, b"cursor")?;

        let glyph = |shape: u16| -> Result<Cursor> {
            let cursor = conn.generate_id()?;
            conn.create_glyph_cursor(
                cursor,
                cursor_font,
                cursor_font,
                shape,
                shape + 1, // mask glyph (solid fill)
                0, 0, 0, // foreground RGB (black)
                0xFFFF, 0xFFFF, 0xFFFF, // background RGB (white)
            )?;
            Ok(cursor)
        };

        let cursors = Self {
            normal: glyph(XC_LEFT_PTR)?,
            title_drag: glyph(XC_FLEUR)?,
            frame_resize: glyph(XC_SIZING)?,
        };

        conn.close_font(cursor_font)?;
        Ok(cursors)
    }
}
