//! An in-memory window tree standing in for the X server in tests.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet, VecDeque},
};

use xcb::Window;

use crate::{
    error::{Result, TrackerError},
    window::Rectangle,
    xconnection::{XConn, XEvent},
};

pub const ROOT: Window = 1;

pub struct MockXConn {
    parents: RefCell<HashMap<Window, Window>>,
    geometries: RefCell<HashMap<Window, Rectangle>>,
    classes: RefCell<HashMap<Window, String>>,
    active: Cell<Window>,
    events: RefCell<VecDeque<XEvent>>,
    watched: RefCell<HashSet<Window>>,
    root_watched: Cell<bool>,
    connected: Cell<bool>,
}

impl MockXConn {
    pub fn new() -> MockXConn {
        MockXConn {
            parents: RefCell::new(HashMap::new()),
            geometries: RefCell::new(HashMap::new()),
            classes: RefCell::new(HashMap::new()),
            active: Cell::new(xcb::NONE),
            events: RefCell::new(VecDeque::new()),
            watched: RefCell::new(HashSet::new()),
            root_watched: Cell::new(false),
            connected: Cell::new(true),
        }
    }

    /// Insert (or move) `win` under `parent` at the given local geometry.
    pub fn add(&self, win: Window, parent: Window, region: Rectangle) -> &MockXConn {
        self.parents.borrow_mut().insert(win, parent);
        self.geometries.borrow_mut().insert(win, region);
        self
    }

    pub fn set_class(&self, win: Window, class: &str) {
        self.classes.borrow_mut().insert(win, class.to_string());
    }

    pub fn set_parent(&self, win: Window, parent: Window) {
        self.parents.borrow_mut().insert(win, parent);
    }

    pub fn move_to(&self, win: Window, x: i32, y: i32) {
        if let Some(r) = self.geometries.borrow_mut().get_mut(&win) {
            r.x = x;
            r.y = y;
        }
    }

    /// Forget the window's geometry while keeping its place in the tree,
    /// as if it died between two requests.
    pub fn drop_geometry(&self, win: Window) {
        self.geometries.borrow_mut().remove(&win);
    }

    /// Every following geometry query fails as if the server went away.
    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    pub fn activate(&self, win: Window) {
        self.active.set(win);
    }

    pub fn push_event(&self, event: XEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn is_watched(&self, win: Window) -> bool {
        self.watched.borrow().contains(&win)
    }

    pub fn root_watched(&self) -> bool {
        self.root_watched.get()
    }
}

impl XConn for MockXConn {
    fn root(&self) -> Window {
        ROOT
    }

    fn watch_root(&self) -> Result<()> {
        self.root_watched.set(true);
        Ok(())
    }

    fn watch_window(&self, win: Window, watch: bool) {
        if watch {
            self.watched.borrow_mut().insert(win);
        } else {
            self.watched.borrow_mut().remove(&win);
        }
    }

    fn active_window(&self) -> Result<Window> {
        match self.active.get() {
            xcb::NONE | ROOT => Err(TrackerError::NoActiveWindow),
            win => Ok(win),
        }
    }

    fn parent(&self, win: Window) -> Result<Window> {
        self.parents.borrow().get(&win).copied().ok_or(TrackerError::NotFound(win))
    }

    fn geometry(&self, win: Window) -> Result<Rectangle> {
        if !self.connected.get() {
            return Err(TrackerError::ConnectionLost("server went away".to_string()));
        }
        if win == ROOT {
            return Ok(Rectangle::new(0, 0, 1920, 1080));
        }
        self.geometries.borrow().get(&win).copied().ok_or(TrackerError::NotFound(win))
    }

    fn wm_class(&self, win: Window) -> Result<Option<String>> {
        Ok(self.classes.borrow().get(&win).cloned())
    }

    fn wait_for_event(&self) -> Result<Option<XEvent>> {
        match self.events.borrow_mut().pop_front() {
            Some(event) => Ok(Some(event)),
            None => Err(TrackerError::ConnectionLost("no more scripted events".to_string())),
        }
    }

    fn flush(&self) {}
}
