//! Integration tests for framewm using Xvfb.
//!
//! These tests require:
//! - Xvfb (headless X server)
//! - Built framewm binary
//!
//! Run with: RUST_LOG=info cargo test --test integration
//!
//! If Xvfb is not available, tests will be skipped. Each test runs its
//! own Xvfb on a dedicated display number so they can run in parallel.
//! The test process plays the application: it connects a second X client
//! to the display, creates windows, and asserts on what the manager did
//! to them.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

/// Check if Xvfb is available
fn xvfb_available() -> bool {
    Command::new("which")
        .arg("Xvfb")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Test fixture that manages Xvfb and framewm lifecycle
struct TestHarness {
    xvfb: Child,
    wm: Child,
    display: String,
}

impl TestHarness {
    /// Create a new test harness with Xvfb and framewm on `display`
    fn new(display: &str) -> Option<Self> {
        if !xvfb_available() {
            eprintln!("Xvfb not available, skipping integration tests");
            return None;
        }

        let xvfb = match Command::new("Xvfb")
            .args([display, "-screen", "0", "1280x800x24"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                eprintln!("Failed to start Xvfb: {}", e);
                return None;
            }
        };

        // Wait for Xvfb to accept connections
        let mut ready = false;
        for _ in 0..50 {
            if RustConnection::connect(Some(display)).is_ok() {
                ready = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        if !ready {
            eprintln!("Xvfb never came up on {}", display);
            return None;
        }

        let wm = match Command::new("./target/debug/framewm")
            .env("DISPLAY", display)
            .env("RUST_LOG", "info")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                eprintln!("Failed to start framewm: {}", e);
                return None;
            }
        };

        // Give the manager time to claim the root and scan
        std::thread::sleep(Duration::from_millis(500));

        Some(Self {
            xvfb,
            wm,
            display: display.to_string(),
        })
    }

    /// Connect a test client to the harness display
    fn connect(&self) -> (RustConnection, usize) {
        RustConnection::connect(Some(&self.display)).expect("failed to connect test client")
    }

    /// Create and map a plain application window at the given geometry
    fn map_client(
        &self,
        conn: &RustConnection,
        screen: &Screen,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
    ) -> Window {
        let win = conn.generate_id().unwrap();
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            win,
            screen.root,
            x,
            y,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new().background_pixel(screen.white_pixel),
        )
        .unwrap();
        conn.map_window(win).unwrap();
        conn.flush().unwrap();

        // Give the manager time to reparent
        std::thread::sleep(Duration::from_millis(1000));
        win
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        let _ = self.wm.kill();
        let _ = self.wm.wait();
        let _ = self.xvfb.kill();
        let _ = self.xvfb.wait();
    }
}

#[test]
fn test_map_request_gets_decorated() {
    let Some(harness) = TestHarness::new(":91") else {
        return;
    };
    let (conn, screen_num) = harness.connect();
    let screen = conn.setup().roots[screen_num].clone();

    let win = harness.map_client(&conn, &screen, 100, 100, 400, 300);

    // The client must have been reparented into a frame
    let parent = conn.query_tree(win).unwrap().reply().unwrap().parent;
    assert_ne!(parent, screen.root, "client was not reparented");

    // Frame placed so the client keeps its on-screen position
    let frame_geom = conn.get_geometry(parent).unwrap().reply().unwrap();
    assert_eq!((frame_geom.x, frame_geom.y), (97, 77));
    assert_eq!((frame_geom.width, frame_geom.height), (400, 320));
    assert_eq!(frame_geom.border_width, 3);

    // Frame contains exactly the titlebar and the client
    let children = conn.query_tree(parent).unwrap().reply().unwrap().children;
    assert_eq!(children.len(), 2);
    assert!(children.contains(&win));

    let title = children.iter().copied().find(|&w| w != win).unwrap();
    let title_geom = conn.get_geometry(title).unwrap().reply().unwrap();
    assert_eq!((title_geom.x, title_geom.y), (0, 0));
    assert_eq!((title_geom.width, title_geom.height), (398, 18));
    assert_eq!(title_geom.border_width, 1);

    // Client sits below the titlebar
    let client_geom = conn.get_geometry(win).unwrap().reply().unwrap();
    assert_eq!((client_geom.x, client_geom.y), (0, 20));
    assert_eq!((client_geom.width, client_geom.height), (400, 300));

    // Everything is viewable
    for w in [win, parent, title] {
        let attrs = conn.get_window_attributes(w).unwrap().reply().unwrap();
        assert_eq!(attrs.map_state, MapState::VIEWABLE, "0x{:x} not viewable", w);
    }
}

#[test]
fn test_destroy_removes_decoration() {
    let Some(harness) = TestHarness::new(":92") else {
        return;
    };
    let (conn, screen_num) = harness.connect();
    let screen = conn.setup().roots[screen_num].clone();

    let win = harness.map_client(&conn, &screen, 50, 60, 200, 150);
    let frame = conn.query_tree(win).unwrap().reply().unwrap().parent;
    assert_ne!(frame, screen.root);

    conn.destroy_window(win).unwrap();
    conn.flush().unwrap();
    std::thread::sleep(Duration::from_millis(1000));

    // The frame (and the titlebar inside it) must be gone from the tree
    let children = conn.query_tree(screen.root).unwrap().reply().unwrap().children;
    assert!(!children.contains(&frame), "frame survived its client");
    assert!(!children.contains(&win));
}

#[test]
fn test_preexisting_window_is_adopted() {
    // Start Xvfb only, map a window with no manager running, then start
    // the manager and check it picks the window up.
    if !xvfb_available() {
        eprintln!("Xvfb not available, skipping integration tests");
        return;
    }
    let display = ":93";
    let mut xvfb = Command::new("Xvfb")
        .args([display, "-screen", "0", "1280x800x24"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start Xvfb");

    let mut conn_attempt = None;
    for _ in 0..50 {
        if let Ok(c) = RustConnection::connect(Some(display)) {
            conn_attempt = Some(c);
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    let Some((conn, screen_num)) = conn_attempt else {
        let _ = xvfb.kill();
        panic!("Xvfb never came up");
    };
    let screen = conn.setup().roots[screen_num].clone();

    let win = conn.generate_id().unwrap();
    conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        win,
        screen.root,
        10,
        30,
        300,
        200,
        0,
        WindowClass::INPUT_OUTPUT,
        0,
        &CreateWindowAux::new().background_pixel(screen.white_pixel),
    )
    .unwrap();
    conn.map_window(win).unwrap();
    conn.flush().unwrap();
    std::thread::sleep(Duration::from_millis(300));

    let mut wm = Command::new("./target/debug/framewm")
        .env("DISPLAY", display)
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start framewm");
    std::thread::sleep(Duration::from_millis(1000));

    let parent = conn.query_tree(win).unwrap().reply().unwrap().parent;
    assert_ne!(parent, screen.root, "pre-existing window was not adopted");

    let _ = wm.kill();
    let _ = wm.wait();
    let _ = xvfb.kill();
    let _ = xvfb.wait();
}

#[test]
fn test_configure_request_reaches_client() {
    let Some(harness) = TestHarness::new(":94") else {
        return;
    };
    let (conn, screen_num) = harness.connect();
    let screen = conn.setup().roots[screen_num].clone();

    let win = harness.map_client(&conn, &screen, 100, 100, 400, 300);

    conn.configure_window(win, &ConfigureWindowAux::new().width(500).height(420))
        .unwrap();
    conn.flush().unwrap();
    std::thread::sleep(Duration::from_millis(1000));

    let geom = conn.get_geometry(win).unwrap().reply().unwrap();
    assert_eq!((geom.width, geom.height), (500, 420));
}

#[test]
fn test_second_manager_exits_with_failure() {
    let Some(harness) = TestHarness::new(":95") else {
        return;
    };

    let mut second = Command::new("./target/debug/framewm")
        .env("DISPLAY", &harness.display)
        .env("RUST_LOG", "info")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start second framewm");

    // The second instance must notice the existing manager and bail
    let mut status = None;
    for _ in 0..50 {
        if let Ok(Some(s)) = second.try_wait() {
            status = Some(s);
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    let Some(status) = status else {
        let _ = second.kill();
        panic!("second manager did not exit");
    };
    assert_eq!(status.code(), Some(1));
}
