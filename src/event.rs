//! Pointer, focus, and expose handling.
//!
//! Contains the handlers behind the event loop dispatch: the drag state
//! machine driven by button and motion events, the focus repaint pair,
//! titlebar redraw, and client configure requests.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::drag::{self, Drag, DragKind, SnapLayout};
use crate::registry::Decoration;
use crate::trace::StateTransition;
use crate::window_query;
use crate::Wm;

/// Grow a dimension by a signed delta, keeping it a valid window size.
fn grown(current: u16, delta: i32) -> u32 {
    (current as i32 + delta).max(1) as u32
}

impl Wm {
    /// Left-button press on a client, titlebar, or frame.
    pub fn handle_button_press(&mut self, event: ButtonPressEvent) -> Result<()> {
        if event.detail != 1 {
            return Ok(());
        }

        if self.registry.contains_client(event.event) {
            // Focus trap sprung: this is the first click on an unfocused
            // client. Take the focus, then replay the frozen click so
            // the application still sees it. Later clicks go straight to
            // the client until the trap is re-armed on focus-out.
            self.conn
                .ungrab_button(ButtonIndex::M1, event.event, ModMask::ANY)?;
            self.focus_and_raise(event.event)?;
            self.conn
                .allow_events(Allow::REPLAY_POINTER, x11rb::CURRENT_TIME)?;
            self.conn.flush()?;
            return Ok(());
        }

        if let Some(decoration) = self.registry.by_title(event.event).copied() {
            self.focus_and_raise(decoration.client)?;
            let geom = self.conn.get_geometry(decoration.frame)?.reply()?;
            self.start_drag(DragKind::Title, &event, geom.x, geom.y, decoration.frame);
            return Ok(());
        }

        if let Some(decoration) = self.registry.by_frame(event.event).copied() {
            let geom = self.conn.get_geometry(decoration.frame)?.reply()?;
            let kind = drag::hit_test(
                geom.width,
                geom.height,
                event.event_x,
                event.event_y,
                self.appearance.corner_grip,
            );
            self.start_drag(kind, &event, geom.x, geom.y, decoration.frame);
        }

        Ok(())
    }

    fn start_drag(
        &mut self,
        kind: DragKind,
        event: &ButtonPressEvent,
        origin_x: i16,
        origin_y: i16,
        frame: Window,
    ) {
        self.drag = Some(Drag {
            kind,
            anchor_x: event.root_x,
            anchor_y: event.root_y,
            origin_x,
            origin_y,
        });
        self.tracer.transition(&StateTransition::DragStarted {
            frame,
            kind: format!("{:?}", kind),
        });
        log::debug!("Drag started: {:?} on frame 0x{:x}", kind, frame);
    }

    /// Any button release ends the drag in progress.
    pub fn handle_button_release(&mut self, _event: ButtonReleaseEvent) {
        if self.drag.take().is_some() {
            self.tracer.transition(&StateTransition::DragEnded);
            log::debug!("Drag ended");
        }
    }

    /// Pointer motion with button 1 held on a titlebar or frame.
    pub fn handle_motion(&mut self, event: MotionNotifyEvent) -> Result<()> {
        let Some(drag) = self.drag else {
            return Ok(());
        };

        if let Some(decoration) = self.registry.by_title(event.event).copied() {
            self.drag_move(&decoration, drag, &event)?;
        } else if let Some(decoration) = self.registry.by_frame(event.event).copied() {
            self.drag_resize(&decoration, drag, &event)?;
        }

        Ok(())
    }

    /// Title drag: move the frame by the pointer's total displacement
    /// since the press, or snap to a half screen at the screen edges.
    ///
    /// The anchor stays at the press position, so intermediate motions
    /// never accumulate error.
    fn drag_move(&mut self, decoration: &Decoration, drag: Drag, event: &MotionNotifyEvent) -> Result<()> {
        let root_geom = self.conn.get_geometry(self.root)?.reply()?;
        let title_geom = self.conn.get_geometry(decoration.title)?.reply()?;
        let frame_geom = self.conn.get_geometry(decoration.frame)?.reply()?;

        if let Some(layout) = drag::snap_layout(
            event.root_x,
            event.root_y,
            root_geom.width,
            root_geom.height,
            title_geom.height,
            frame_geom.border_width,
        ) {
            self.apply_snap(decoration, &layout)?;
            return Ok(());
        }

        let x = drag.origin_x as i32 + (event.root_x as i32 - drag.anchor_x as i32);
        let y = drag.origin_y as i32 + (event.root_y as i32 - drag.anchor_y as i32);
        self.conn
            .configure_window(decoration.frame, &ConfigureWindowAux::new().x(x).y(y))?;
        self.conn.flush()?;
        Ok(())
    }

    fn apply_snap(&self, decoration: &Decoration, layout: &SnapLayout) -> Result<()> {
        for (window, rect) in [
            (decoration.frame, layout.frame),
            (decoration.title, layout.title),
            (decoration.client, layout.client),
        ] {
            self.conn.configure_window(
                window,
                &ConfigureWindowAux::new()
                    .x(rect.x as i32)
                    .y(rect.y as i32)
                    .width(rect.width as u32)
                    .height(rect.height as u32),
            )?;
        }
        self.conn.flush()?;
        Ok(())
    }

    /// Frame drag: resize frame, titlebar, and client coherently by the
    /// delta since the last motion, then move the anchor to the pointer.
    fn drag_resize(&mut self, decoration: &Decoration, drag: Drag, event: &MotionNotifyEvent) -> Result<()> {
        let delta = drag::resize_delta(drag.kind, drag.anchor_x, drag.anchor_y, event.root_x, event.root_y);

        let frame_geom = self.conn.get_geometry(decoration.frame)?.reply()?;
        let title_geom = self.conn.get_geometry(decoration.title)?.reply()?;
        let client_geom = self.conn.get_geometry(decoration.client)?.reply()?;

        self.conn.configure_window(
            decoration.frame,
            &ConfigureWindowAux::new()
                .x(frame_geom.x as i32 + delta.dx)
                .y(frame_geom.y as i32 + delta.dy)
                .width(grown(frame_geom.width, delta.dw))
                .height(grown(frame_geom.height, delta.dh)),
        )?;
        // The titlebar only follows horizontally; its height is fixed
        self.conn.configure_window(
            decoration.title,
            &ConfigureWindowAux::new().width(grown(title_geom.width, delta.dw)),
        )?;
        self.conn.configure_window(
            decoration.client,
            &ConfigureWindowAux::new()
                .width(grown(client_geom.width, delta.dw))
                .height(grown(client_geom.height, delta.dh)),
        )?;

        if let Some(d) = self.drag.as_mut() {
            d.anchor_x = event.root_x;
            d.anchor_y = event.root_y;
        }

        self.conn.flush()?;
        Ok(())
    }

    /// Paint the active colors when a frame's client gains focus.
    pub fn handle_focus_in(&mut self, event: FocusInEvent) -> Result<()> {
        let Some(decoration) = self.registry.by_frame(event.event).copied() else {
            return Ok(());
        };
        log::debug!("FocusIn on frame 0x{:x}", event.event);

        self.conn.change_window_attributes(
            decoration.frame,
            &ChangeWindowAttributesAux::new().border_pixel(self.palette.active_frame),
        )?;
        self.conn.change_window_attributes(
            decoration.title,
            &ChangeWindowAttributesAux::new()
                .background_pixel(self.palette.active_title)
                .border_pixel(self.palette.active_title_border),
        )?;
        self.conn.clear_area(false, decoration.title, 0, 0, 0, 0)?;
        self.draw_title(&decoration)?;
        self.conn.flush()?;
        Ok(())
    }

    /// Paint the inactive colors and re-arm the focus trap when a
    /// frame's client loses focus.
    pub fn handle_focus_out(&mut self, event: FocusOutEvent) -> Result<()> {
        let Some(decoration) = self.registry.by_frame(event.event).copied() else {
            return Ok(());
        };
        log::debug!("FocusOut on frame 0x{:x}", event.event);

        // The frame may have been destroyed under us; check the first
        // paint and skip the rest if it failed
        let cookie = self.conn.change_window_attributes(
            decoration.frame,
            &ChangeWindowAttributesAux::new().border_pixel(self.palette.inactive_frame),
        )?;
        if let Err(e) = cookie.check() {
            log::warn!(
                "Skipping inactive paint for dead frame 0x{:x}: {}",
                decoration.frame,
                e
            );
            return Ok(());
        }

        self.conn.change_window_attributes(
            decoration.title,
            &ChangeWindowAttributesAux::new()
                .background_pixel(self.palette.inactive_title)
                .border_pixel(self.palette.inactive_title_border),
        )?;
        self.conn.clear_area(false, decoration.title, 0, 0, 0, 0)?;
        self.draw_title(&decoration)?;
        self.arm_focus_trap(decoration.client)?;
        self.conn.flush()?;
        Ok(())
    }

    /// Redraw the titlebar text when a titlebar is exposed.
    pub fn handle_expose(&mut self, event: ExposeEvent) -> Result<()> {
        if let Some(decoration) = self.registry.by_title(event.window).copied() {
            self.draw_title(&decoration)?;
            self.conn.flush()?;
        }
        Ok(())
    }

    /// Draw the client's current name into its titlebar. A client with
    /// no name (or one that vanished) paints nothing.
    fn draw_title(&self, decoration: &Decoration) -> Result<()> {
        let name = window_query::fetch_name(&self.conn, decoration.client);
        if name.is_empty() {
            return Ok(());
        }

        let text = &name.as_bytes()[..name.len().min(255)];
        self.conn
            .image_text8(decoration.title, self.gc, 2, 13, text)?;
        Ok(())
    }

    /// Forward a client's geometry request, keeping its frame in step.
    pub fn handle_configure_request(&mut self, event: ConfigureRequestEvent) -> Result<()> {
        log::debug!("ConfigureRequest for window 0x{:x}", event.window);

        let aux = ConfigureWindowAux::from_configure_request(&event);
        if let Some(decoration) = self.registry.by_client(event.window).copied() {
            self.conn.configure_window(decoration.frame, &aux)?;
        }
        self.conn.configure_window(event.window, &aux)?;
        self.conn.flush()?;
        Ok(())
    }
}
