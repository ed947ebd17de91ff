use xcb::Window;

use crate::{
    config::Config,
    error::{Result, TrackerError},
    window::{Rectangle, WindowGeometry},
    xconnection::{XConn, XEvent},
};

/**
 * Follows the active window and works out where it is on screen.
 *
 * Window managers reparent clients into one or more frame windows, so a
 * client's own geometry is relative to its frame. The tracker remembers the
 * chain of windows from the active window up to (excluding) the root: the
 * offsets along that chain give the absolute position, and a ConfigureNotify
 * on any member of it means the active window may have moved.
 */
pub struct WindowTracker<'a, X: XConn> {
    conn: &'a X,
    max_depth: usize,
    watch_ancestors: bool,
    ancestors: Vec<Window>,
}

impl<'a, X: XConn> WindowTracker<'a, X> {
    pub fn new(conn: &'a X, config: &Config) -> Self {
        WindowTracker {
            conn,
            max_depth: config.max_depth,
            watch_ancestors: config.watch_ancestors,
            ancestors: Vec::new(),
        }
    }

    /// The active window followed by its frames, innermost first.
    pub fn ancestors(&self) -> &[Window] {
        &self.ancestors
    }

    /// Watch the root window, report the current active window and then block
    /// on the event stream forever, calling `emit` for every new geometry.
    ///
    /// Only returns when the connection fails.
    pub fn start<F>(&mut self, mut emit: F) -> Result<()>
    where
        F: FnMut(WindowGeometry),
    {
        self.conn.watch_root()?;
        if let Some(geometry) = self.refresh()? {
            emit(geometry);
        }

        loop {
            if let Some(event) = self.conn.wait_for_event()? {
                debug!("got XEvent: {:?}", event);
                if let Some(geometry) = self.handle_event(event)? {
                    emit(geometry);
                }
            }
        }
    }

    /// Re-resolve the active window if `event` could have changed it.
    ///
    /// Recoverable failures are logged and yield `Ok(None)`; the next event
    /// gets another go.
    pub fn handle_event(&mut self, event: XEvent) -> Result<Option<WindowGeometry>> {
        match event {
            XEvent::ActiveWindowChanged => self.refresh(),
            XEvent::ConfigureNotify { id } if self.ancestors.contains(&id) => self.refresh(),
            XEvent::ConfigureNotify { .. } => Ok(None),
        }
    }

    fn refresh(&mut self) -> Result<Option<WindowGeometry>> {
        match self.resolve() {
            Ok(geometry) => Ok(Some(geometry)),
            Err(TrackerError::NoActiveWindow) => {
                debug!("no active window");
                Ok(None)
            }
            Err(e) if e.is_recoverable() => {
                warn!("skipping active window update: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Query the active window and compute its absolute geometry.
    pub fn resolve(&mut self) -> Result<WindowGeometry> {
        let active = self.conn.active_window()?;
        let chain = self.ancestor_chain(active)?;
        self.track_ancestors(chain);

        let local = self.conn.geometry(active)?;
        let (mut x, mut y) = (local.x, local.y);
        // The root sits at 0,0 and is not part of the chain
        for &frame in self.ancestors.iter().skip(1) {
            let offset = self.conn.geometry(frame)?;
            x += offset.x;
            y += offset.y;
        }

        let geometry = WindowGeometry::new(active, Rectangle::new(x, y, local.w, local.h));
        let class = match self.conn.wm_class(active) {
            Ok(class) => class.unwrap_or_default(),
            Err(e) if e.is_recoverable() => String::new(),
            Err(e) => return Err(e),
        };
        info!(
            "active window {:#x} ({}) at {},{} {}x{}",
            active, class, geometry.x, geometry.y, geometry.width, geometry.height
        );
        Ok(geometry)
    }

    fn ancestor_chain(&self, win: Window) -> Result<Vec<Window>> {
        let root = self.conn.root();
        let mut chain = Vec::new();
        let mut pointer = win;
        while pointer != root {
            // Ran off the top of a tree that is not ours
            if pointer == xcb::NONE {
                return Err(TrackerError::NotFound(win));
            }
            if chain.len() >= self.max_depth || chain.contains(&pointer) {
                return Err(TrackerError::DepthExceeded {
                    window: win,
                    max_depth: self.max_depth,
                });
            }
            chain.push(pointer);
            pointer = self.conn.parent(pointer)?;
        }
        Ok(chain)
    }

    fn track_ancestors(&mut self, chain: Vec<Window>) {
        if self.watch_ancestors {
            let old = below_top_level(&self.ancestors);
            let new = below_top_level(&chain);
            for &win in old.iter().filter(|w| !new.contains(w)) {
                self.conn.watch_window(win, false);
            }
            for &win in new.iter().filter(|w| !old.contains(w)) {
                self.conn.watch_window(win, true);
            }
            self.conn.flush();
        }
        self.ancestors = chain;
    }
}

// The last chain member is a child of the root, whose SubstructureNotify
// already reports it.
fn below_top_level(chain: &[Window]) -> &[Window] {
    &chain[..chain.len().saturating_sub(1)]
}
