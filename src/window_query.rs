//! Window property query functions.
//!
//! Stateless functions for querying X11 window properties.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};

/// Get a client's name from WM_NAME.
///
/// Any failure (window gone, property unset, bad encoding) yields an
/// empty string; callers treat that as "nothing to paint".
pub fn fetch_name(conn: &impl Connection, window: Window) -> String {
    let reply = conn
        .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::STRING, 0, 1024)
        .ok()
        .and_then(|cookie| cookie.reply().ok());

    match reply {
        Some(reply) if !reply.value.is_empty() => {
            String::from_utf8(reply.value).unwrap_or_default()
        }
        _ => String::new(),
    }
}
