//! framewm - a minimal reparenting X11 window manager.
//!
//! Each client window is wrapped in a frame with a titlebar. Dragging the
//! titlebar moves the window (with half-screen snapping at the screen
//! edges), dragging the frame resizes it, and clicking a window focuses
//! and raises it.

mod config;
mod cursors;
mod decoration;
mod drag;
mod event;
mod palette;
mod registry;
mod trace;
mod window_query;

use std::collections::VecDeque;

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::protocol::{ErrorKind, Event};
use x11rb::rust_connection::RustConnection;

use config::{AppearanceConfig, Config};
use cursors::Cursors;
use decoration::DecorGeometry;
use drag::Drag;
use palette::Palette;
use registry::{Decoration, WindowRegistry};
use trace::{EventTracer, StateTransition};

/// The main window manager state
struct Wm {
    conn: RustConnection,
    root: Window,
    /// Decoration geometry settings
    appearance: AppearanceConfig,
    /// Allocated decoration pixels
    palette: Palette,
    /// Cursor shapes for root, titlebar, and frame
    cursors: Cursors,
    /// Graphics context for titlebar text
    gc: Gcontext,
    /// Managed decorations, indexed by all three window ids
    registry: WindowRegistry,
    /// Drag in progress, if any
    drag: Option<Drag>,
    /// Event tracer for debugging
    tracer: EventTracer,
}

impl Wm {
    /// Connect to X11 and set up session resources
    fn new() -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X11 server")?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        log::info!(
            "Connected to X11, screen {}, root window 0x{:x}, {}x{}",
            screen_num,
            root,
            screen.width_in_pixels,
            screen.height_in_pixels
        );

        let user_config = Config::load();

        // Graphics context for drawing titlebar text
        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            root,
            &CreateGCAux::new()
                .foreground(screen.black_pixel)
                .background(screen.white_pixel),
        )?;

        let cursors = Cursors::create(&conn)?;
        let palette = Palette::allocate(
            &conn,
            screen.default_colormap,
            screen.black_pixel,
            screen.white_pixel,
            &user_config.colors,
        );

        // Paint the desktop and install the default cursor
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .background_pixel(palette.desktop_background)
                .cursor(cursors.normal),
        )?;
        conn.clear_area(false, root, 0, 0, 0, 0)?;
        conn.flush()?;

        Ok(Self {
            conn,
            root,
            appearance: user_config.appearance,
            palette,
            cursors,
            gc,
            registry: WindowRegistry::new(),
            drag: None,
            tracer: EventTracer::new(512),
        })
    }

    /// Claim the window manager role on the root window.
    ///
    /// SubstructureRedirect is the key: only one client may hold it, so a
    /// BadAccess here means another window manager is already running.
    /// The request is checked synchronously to catch exactly that.
    fn become_wm(&self) -> Result<()> {
        let event_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::BUTTON_PRESS
            | EventMask::KEY_PRESS;

        let cookie = self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new().event_mask(event_mask),
        )?;
        self.conn.flush()?;

        match cookie.check() {
            Ok(()) => {}
            Err(ReplyError::X11Error(ref e)) if e.error_kind == ErrorKind::Access => {
                anyhow::bail!("another window manager is already running");
            }
            Err(e) => {
                return Err(e).context("failed to select events on the root window");
            }
        }

        log::info!("Successfully became the window manager");
        Ok(())
    }

    /// Frame every client that was mapped before the manager started.
    ///
    /// Runs under a server grab so no window can map or unmap between the
    /// tree query and the framing pass.
    fn adopt_existing_windows(&mut self) -> Result<()> {
        self.conn.grab_server()?;
        let result = self.adopt_children();
        self.conn.ungrab_server()?;
        self.conn.flush()?;
        result
    }

    fn adopt_children(&mut self) -> Result<()> {
        let tree = self.conn.query_tree(self.root)?.reply()?;

        for &window in &tree.children {
            let attrs = self.conn.get_window_attributes(window)?.reply()?;

            // Skip popups/menus and anything not visible
            if attrs.override_redirect || attrs.map_state != MapState::VIEWABLE {
                continue;
            }

            log::info!("Adopting existing window 0x{:x}", window);
            self.frame_window(window)?;
        }

        Ok(())
    }

    /// Wrap a client in a new frame + titlebar decoration.
    ///
    /// Safe to call for an already-framed client; the second call is a
    /// no-op.
    fn frame_window(&mut self, client: Window) -> Result<()> {
        if self.registry.contains_client(client) {
            return Ok(());
        }

        let geom = self.conn.get_geometry(client)?.reply()?;
        let decor =
            DecorGeometry::for_client(geom.x, geom.y, geom.width, geom.height, &self.appearance);

        let title = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            title,
            self.root,
            geom.x,
            geom.y,
            decor.title_width,
            decor.title_height,
            self.appearance.title_inner_border,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(self.palette.inactive_title)
                .border_pixel(self.palette.inactive_title_border)
                .event_mask(
                    EventMask::BUTTON_PRESS
                        | EventMask::BUTTON_RELEASE
                        | EventMask::BUTTON1_MOTION
                        | EventMask::EXPOSURE,
                )
                .cursor(self.cursors.title_drag),
        )?;

        let frame = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            frame,
            self.root,
            decor.frame_x,
            decor.frame_y,
            decor.frame_width,
            decor.frame_height,
            self.appearance.frame_border_width,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(self.palette.window_background)
                .border_pixel(self.palette.inactive_frame)
                .event_mask(
                    EventMask::BUTTON_PRESS
                        | EventMask::BUTTON_RELEASE
                        | EventMask::BUTTON1_MOTION
                        | EventMask::FOCUS_CHANGE
                        | EventMask::SUBSTRUCTURE_REDIRECT
                        | EventMask::SUBSTRUCTURE_NOTIFY,
                )
                .cursor(self.cursors.frame_resize),
        )?;

        // Titlebar at the top of the frame, client below it
        self.conn.reparent_window(title, frame, 0, 0)?;
        self.conn
            .reparent_window(client, frame, decor.client_x, decor.client_y)?;
        self.conn.map_window(title)?;
        self.conn.map_window(frame)?;

        // If the manager dies, the server reparents the client back to
        // the root instead of destroying it with the frame
        self.conn.change_save_set(SetMode::INSERT, client)?;

        self.arm_focus_trap(client)?;

        self.registry.insert(Decoration {
            title,
            client,
            frame,
        });
        self.tracer.transition(&StateTransition::WindowFramed {
            client,
            frame,
            title,
        });
        log::info!("Framed client 0x{:x} in frame 0x{:x}", client, frame);

        self.conn.flush()?;
        Ok(())
    }

    /// Tear down a client's decoration.
    ///
    /// The client itself is handed back to the root, never destroyed.
    fn unframe_window(&mut self, client: Window) -> Result<()> {
        let Some(decoration) = self.registry.by_client(client).copied() else {
            return Ok(());
        };

        self.conn.unmap_window(decoration.frame)?;

        // Hand the client back to the root before the frame (and the
        // titlebar with it) goes away
        let (x, y) = match self.conn.get_geometry(decoration.frame)?.reply() {
            Ok(g) => (g.x, g.y),
            Err(_) => (0, 0),
        };
        self.conn.reparent_window(client, self.root, x, y)?;
        self.conn.change_save_set(SetMode::DELETE, client)?;
        self.conn.destroy_window(decoration.frame)?;

        self.registry.remove_by_client(client);
        self.tracer
            .transition(&StateTransition::WindowUnframed { client });
        log::info!("Unframed client 0x{:x}", client);

        self.conn.flush()?;
        Ok(())
    }

    /// Passive left-button grab that lets the manager see the first click
    /// on an unfocused client before the application does.
    fn arm_focus_trap(&self, client: Window) -> Result<()> {
        self.conn.grab_button(
            false,
            client,
            EventMask::BUTTON_PRESS,
            GrabMode::SYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            ButtonIndex::M1,
            ModMask::ANY,
        )?;
        Ok(())
    }

    /// Give a registered client the input focus and raise its frame.
    /// Unknown windows (root clicks, orphans) are ignored.
    fn focus_and_raise(&mut self, client: Window) -> Result<()> {
        let Some(decoration) = self.registry.by_client(client).copied() else {
            return Ok(());
        };

        self.conn
            .set_input_focus(InputFocus::NONE, client, x11rb::CURRENT_TIME)?;
        self.conn.configure_window(
            decoration.frame,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.tracer
            .transition(&StateTransition::FocusMoved { client });
        Ok(())
    }

    /// Blocking event loop.
    ///
    /// Bursts of drag motions are collapsed down to the newest one before
    /// dispatch; without that, resize feedback lags the pointer badly.
    /// Non-motion events drained while collapsing are replayed in order.
    fn run(&mut self) -> Result<()> {
        log::info!("Entering event loop");

        let mut pending: VecDeque<Event> = VecDeque::new();

        loop {
            let event = match pending.pop_front() {
                Some(event) => event,
                None => self.conn.wait_for_event()?,
            };

            let event = if let Event::MotionNotify(motion) = event {
                let mut newest = motion;
                while let Some(next) = self.conn.poll_for_event()? {
                    match next {
                        Event::MotionNotify(m) => newest = m,
                        other => pending.push_back(other),
                    }
                }
                Event::MotionNotify(newest)
            } else {
                event
            };

            if let Err(e) = self.handle_event(event) {
                log::error!("Error handling event: {}", e);
            }
        }
    }

    /// Dispatch one X event
    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::MapRequest(e) => {
                self.tracer.record("MapRequest", Some(e.window), "");
                log::debug!("MapRequest for window 0x{:x}", e.window);
                self.frame_window(e.window)?;
                self.conn.map_window(e.window)?;
                self.conn.flush()?;
            }

            Event::ConfigureRequest(e) => {
                self.tracer
                    .record("ConfigureRequest", Some(e.window), "");
                self.handle_configure_request(e)?;
            }

            Event::UnmapNotify(e) => {
                self.tracer.record("UnmapNotify", Some(e.window), "");
                if e.event == self.root {
                    // Reparenting an adopted window generates an unmap
                    // reported against the root; not a client withdrawal
                    log::debug!("Ignoring UnmapNotify reported on the root for 0x{:x}", e.window);
                } else if self.registry.contains_client(e.window) {
                    log::debug!("UnmapNotify for client 0x{:x}", e.window);
                    self.unframe_window(e.window)?;
                }
            }

            Event::DestroyNotify(e) => {
                self.tracer
                    .record("DestroyNotify", Some(e.window), "");
                if self.registry.remove_id(e.window) {
                    self.tracer
                        .transition(&StateTransition::DecorationDropped { window: e.window });
                    log::debug!("Dropped destroyed window 0x{:x} from the registry", e.window);
                }
            }

            Event::ButtonPress(e) => {
                self.tracer
                    .record("ButtonPress", Some(e.event), &format!("button={}", e.detail));
                self.handle_button_press(e)?;
            }

            Event::ButtonRelease(e) => {
                self.tracer.record(
                    "ButtonRelease",
                    Some(e.event),
                    &format!("button={}", e.detail),
                );
                self.handle_button_release(e);
            }

            Event::MotionNotify(e) => {
                self.handle_motion(e)?;
            }

            Event::FocusIn(e) => {
                self.tracer.record("FocusIn", Some(e.event), "");
                self.handle_focus_in(e)?;
            }

            Event::FocusOut(e) => {
                self.tracer.record("FocusOut", Some(e.event), "");
                self.handle_focus_out(e)?;
            }

            Event::Expose(e) => {
                self.tracer.record("Expose", Some(e.window), "");
                self.handle_expose(e)?;
            }

            // Lifecycle notifications we observe but take no action on
            Event::MapNotify(e) => log::debug!("MapNotify for 0x{:x}", e.window),
            Event::CreateNotify(e) => log::debug!("CreateNotify for 0x{:x}", e.window),
            Event::ReparentNotify(e) => log::debug!("ReparentNotify for 0x{:x}", e.window),
            Event::ConfigureNotify(e) => log::debug!("ConfigureNotify for 0x{:x}", e.window),
            Event::KeyPress(e) => log::debug!("KeyPress keycode={}", e.detail),

            Event::Error(e) => {
                // Asynchronous errors: the referenced window is usually
                // already gone. Log and keep going.
                log::warn!(
                    "X error: {:?} from {} on resource 0x{:x}",
                    e.error_kind,
                    e.request_name.unwrap_or("unknown request"),
                    e.bad_value
                );
                if log::log_enabled!(log::Level::Debug) {
                    for entry in self.tracer.recent(8) {
                        log::debug!(
                            "  [{}] +{}ms {} 0x{:x} {}",
                            entry.seq,
                            entry.at_ms,
                            entry.kind,
                            entry.window.unwrap_or(0),
                            entry.detail
                        );
                    }
                }
            }

            _ => {}
        }

        Ok(())
    }
}

fn run_manager() -> Result<()> {
    let mut wm = Wm::new()?;
    wm.become_wm()?;
    wm.adopt_existing_windows()?;
    wm.run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting framewm");

    if let Err(e) = run_manager() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
