use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use crate::window::WindowGeometry;

/// One of the five observable fields of the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryField {
    X,
    Y,
    Width,
    Height,
    WindowId,
}

impl fmt::Display for GeometryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryField::X => "x",
            GeometryField::Y => "y",
            GeometryField::Width => "w",
            GeometryField::Height => "h",
            GeometryField::WindowId => "wid",
        };
        f.write_str(name)
    }
}

/// A field that took a new value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryChange {
    pub field: GeometryField,
    pub value: i64,
}

type Observer = Arc<dyn Fn(&GeometryChange) + Send + Sync>;

/**
 * Holds the latest geometry of the active window for the presentation layer.
 *
 * Every setter compares before writing: storing the value a field already has
 * is a no-op, storing a new one fires exactly one change for that field.
 * Values are not validated. Observers run on the thread that made the change,
 * with no lock held, so they may write back to the sink or subscribe more
 * observers; an observer added during a notification hears the next one.
 */
#[derive(Default)]
pub struct GeometrySink {
    state: Mutex<WindowGeometry>,
    observers: Mutex<Vec<Observer>>,
}

impl GeometrySink {
    pub fn new() -> GeometrySink {
        GeometrySink::default()
    }

    /// Register a callback for every future field change.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&GeometryChange) + Send + Sync + 'static,
    {
        self.observers.lock().push(Arc::new(observer));
    }

    pub fn current(&self) -> WindowGeometry {
        *self.state.lock()
    }

    pub fn set_x(&self, x: i32) -> bool {
        self.set(GeometryField::X, i64::from(x), |g| &mut g.x, x)
    }

    pub fn set_y(&self, y: i32) -> bool {
        self.set(GeometryField::Y, i64::from(y), |g| &mut g.y, y)
    }

    pub fn set_width(&self, width: i32) -> bool {
        self.set(GeometryField::Width, i64::from(width), |g| &mut g.width, width)
    }

    pub fn set_height(&self, height: i32) -> bool {
        self.set(GeometryField::Height, i64::from(height), |g| &mut g.height, height)
    }

    pub fn set_window_id(&self, id: xcb::Window) -> bool {
        self.set(GeometryField::WindowId, i64::from(id), |g| &mut g.id, id)
    }

    /// Store a whole geometry, field by field. Returns the number of changes fired.
    pub fn apply(&self, geometry: &WindowGeometry) -> usize {
        [
            self.set_x(geometry.x),
            self.set_y(geometry.y),
            self.set_width(geometry.width),
            self.set_height(geometry.height),
            self.set_window_id(geometry.id),
        ]
        .iter()
        .filter(|&&changed| changed)
        .count()
    }

    fn set<T, F>(&self, field: GeometryField, value: i64, slot: F, new: T) -> bool
    where
        T: PartialEq,
        F: FnOnce(&mut WindowGeometry) -> &mut T,
    {
        {
            let mut state = self.state.lock();
            let current = slot(&mut *state);
            if *current == new {
                return false;
            }
            *current = new;
        }

        let change = GeometryChange { field, value };
        let observers = self.observers.lock().clone();
        for observer in observers.iter() {
            observer(&change);
        }
        true
    }
}
