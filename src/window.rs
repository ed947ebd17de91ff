use xcb::Window;

/// An X window position relative to its parent: top left corner + extent
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rectangle {
    /// Create a new Rectangle.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Rectangle {
        Rectangle { x, y, w, h }
    }

    /// Destructure this Rectangle into its component values (x, y, w, h).
    pub fn values(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.w, self.h)
    }
}

/**
 * Absolute on-screen position and size of the active window.
 *
 * x and y include the offsets of every frame window the window manager has
 * wrapped the client in, so they are relative to the root window's origin.
 */
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub id: Window,
}

impl WindowGeometry {
    pub fn new(id: Window, region: Rectangle) -> WindowGeometry {
        let (x, y, width, height) = region.values();
        WindowGeometry { x, y, width, height, id }
    }
}
