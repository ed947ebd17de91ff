use anyhow::Context;
use xcb::Window;

use crate::{
    error::{Result, TrackerError},
    window::Rectangle,
};

// Mask out the most significant bit, which indicates if it's a send_event
const XCB_RESPONSE_TYPE_MASK: u8 = 0x7F;
const ROOT_EVENT_MASK: &[(u32, u32)] = &[(
    xcb::CW_EVENT_MASK,
    xcb::EVENT_MASK_PROPERTY_CHANGE | xcb::EVENT_MASK_SUBSTRUCTURE_NOTIFY,
)];
const ANCESTOR_EVENT_MASK: &[(u32, u32)] = &[(xcb::CW_EVENT_MASK, xcb::EVENT_MASK_STRUCTURE_NOTIFY)];
const NO_EVENT_MASK: &[(u32, u32)] = &[(xcb::CW_EVENT_MASK, xcb::EVENT_MASK_NO_EVENT)];

// X protocol error codes
const BAD_WINDOW: u8 = 3;
const BAD_DRAWABLE: u8 = 9;

macro_rules! atoms {
    ( $( $name:ident ),+ ) => {
        #[allow(non_snake_case)]
        pub struct InternedAtoms {
            $(
                pub $name: xcb::Atom
            ),*
        }

        impl InternedAtoms {
            pub fn new(conn: &xcb::Connection) -> anyhow::Result<InternedAtoms> {
                Ok(InternedAtoms {
                    $(
                        $name: xcb::intern_atom(conn, false, stringify!($name)).get_reply()?.atom()
                    ),*
                })
            }
        }
    };
    // Allow trailing comma:
    ( $( $name:ident ),+ , ) => (atoms!($( $name ),+);)
}

atoms!(_NET_ACTIVE_WINDOW);

/**
 * The only two X events the tracker cares about.
 *
 * *PropertyNotify* on the root window for `_NET_ACTIVE_WINDOW` becomes
 * `ActiveWindowChanged`. *ConfigureNotify* is delivered for children of the
 * root (SubstructureNotify) and for any window we selected StructureNotify on;
 * `id` is the window that was reconfigured, not the one the event was
 * reported to.
 *
 * xcb docs: https://www.mankier.com/3/xcb_property_notify_event_t
 *           https://www.mankier.com/3/xcb_configure_notify_event_t
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XEvent {
    ActiveWindowChanged,
    ConfigureNotify {
        /// The ID of the window that was moved or resized
        id: Window,
    },
}

/// The subset of the X server the window tracker queries.
///
/// The connection is single-reader: whoever owns the implementor is the only
/// one allowed to wait for events on it.
pub trait XConn {
    /// The root window of the screen being watched
    fn root(&self) -> Window;

    /// Ask for property changes and substructure notifications on the root.
    fn watch_root(&self) -> Result<()>;

    /// Select (or drop) StructureNotify on a single window.
    fn watch_window(&self, win: Window, watch: bool);

    /// Current value of _NET_ACTIVE_WINDOW.
    fn active_window(&self) -> Result<Window>;

    fn parent(&self, win: Window) -> Result<Window>;

    /// Position and size of a window relative to its parent.
    fn geometry(&self, win: Window) -> Result<Rectangle>;

    /// The class half of WM_CLASS, None when the window does not set it.
    fn wm_class(&self, win: Window) -> Result<Option<String>>;

    /// Block until the next event. `Ok(None)` is an event we do not care about.
    fn wait_for_event(&self) -> Result<Option<XEvent>>;

    fn flush(&self);
}

/// Handles communication with an X server via xcb
pub struct XcbConnection {
    conn: xcb::Connection,
    root: Window,
    atoms: InternedAtoms,
}

impl XcbConnection {
    /// Connect to `display`, or to $DISPLAY when it is None.
    pub fn new(display: Option<&str>) -> anyhow::Result<XcbConnection> {
        let (conn, preferred_screen) = xcb::Connection::connect(display)
            .context("Unable to connect to X server")?;

        let root = conn
            .get_setup()
            .roots()
            .nth(preferred_screen as usize)
            .context("Unable to get the root window of the preferred screen")?
            .root();

        let atoms = InternedAtoms::new(&conn).context("Failed to intern atoms")?;

        Ok(XcbConnection { conn, root, atoms })
    }

    fn connection_lost(&self) -> TrackerError {
        match self.conn.has_error() {
            Err(e) => TrackerError::ConnectionLost(format!("{:?}", e)),
            Ok(()) => TrackerError::ConnectionLost("event queue closed".to_string()),
        }
    }

    // A failed reply on a broken connection carries no usable error, so check
    // the connection before looking at the error code.
    fn request_error(&self, request: &'static str, win: Window, err: xcb::GenericError) -> TrackerError {
        if self.conn.has_error().is_err() {
            return self.connection_lost();
        }
        // xcb hands out errors without a payload when the reply itself was empty
        if err.ptr.is_null() {
            return TrackerError::Request { request, code: 0 };
        }
        match err.error_code() {
            BAD_WINDOW | BAD_DRAWABLE => TrackerError::NotFound(win),
            code => TrackerError::Request { request, code },
        }
    }
}

impl XConn for XcbConnection {
    fn root(&self) -> Window {
        self.root
    }

    fn watch_root(&self) -> Result<()> {
        xcb::change_window_attributes_checked(&self.conn, self.root, ROOT_EVENT_MASK)
            .request_check()
            .map_err(|e| self.request_error("change_window_attributes", self.root, e))?;
        self.conn.flush();
        Ok(())
    }

    fn watch_window(&self, win: Window, watch: bool) {
        // Unchecked: a window that is already gone only produces an error event,
        // which wait_for_event drops.
        let mask = if watch { ANCESTOR_EVENT_MASK } else { NO_EVENT_MASK };
        xcb::change_window_attributes(&self.conn, win, mask);
    }

    fn active_window(&self) -> Result<Window> {
        // xcb docs: https://www.mankier.com/3/xcb_get_property
        let reply = xcb::get_property(
            &self.conn,                     // xcb connection to X11
            false,                          // should the property be deleted
            self.root,                      // target window to query
            self.atoms._NET_ACTIVE_WINDOW,  // the property we want
            xcb::ATOM_WINDOW,               // the type of the property
            0,                              // offset in the property to retrieve data from
            1,                              // how many 32bit multiples of data to retrieve
        )
        .get_reply()
        .map_err(|e| self.request_error("get_property", self.root, e))?;

        match reply.value::<u32>().first() {
            Some(&win) if win != xcb::NONE && win != self.root => Ok(win),
            _ => Err(TrackerError::NoActiveWindow),
        }
    }

    fn parent(&self, win: Window) -> Result<Window> {
        let reply = xcb::query_tree(&self.conn, win)
            .get_reply()
            .map_err(|e| self.request_error("query_tree", win, e))?;
        Ok(reply.parent())
    }

    fn geometry(&self, win: Window) -> Result<Rectangle> {
        let reply = xcb::get_geometry(&self.conn, win)
            .get_reply()
            .map_err(|e| self.request_error("get_geometry", win, e))?;
        Ok(Rectangle::new(
            i32::from(reply.x()),
            i32::from(reply.y()),
            i32::from(reply.width()),
            i32::from(reply.height()),
        ))
    }

    fn wm_class(&self, win: Window) -> Result<Option<String>> {
        let reply = xcb::get_property(
            &self.conn,
            false,
            win,
            xcb::ATOM_WM_CLASS,
            xcb::ATOM_STRING,
            0,
            1024,
        )
        .get_reply()
        .map_err(|e| self.request_error("get_property", win, e))?;
        Ok(class_from_wm_class(reply.value::<u8>()))
    }

    fn wait_for_event(&self) -> Result<Option<XEvent>> {
        let event = match self.conn.wait_for_event() {
            Some(event) => event,
            None => return Err(self.connection_lost()),
        };

        let etype = event.response_type() & XCB_RESPONSE_TYPE_MASK;
        let event = match etype {
            xcb::PROPERTY_NOTIFY => {
                let e: &xcb::PropertyNotifyEvent = unsafe { xcb::cast_event(&event) };
                if e.window() == self.root && e.atom() == self.atoms._NET_ACTIVE_WINDOW {
                    Some(XEvent::ActiveWindowChanged)
                } else {
                    None
                }
            }

            xcb::CONFIGURE_NOTIFY => {
                let e: &xcb::ConfigureNotifyEvent = unsafe { xcb::cast_event(&event) };
                Some(XEvent::ConfigureNotify { id: e.window() })
            }

            // NOTE: ignoring other event types, X errors included
            _ => None,
        };
        Ok(event)
    }

    fn flush(&self) {
        self.conn.flush();
    }
}

/// WM_CLASS is "instance\0class\0" in Latin-1; clients are not always careful
/// about either, so decode leniently.
fn class_from_wm_class(raw: &[u8]) -> Option<String> {
    raw.split(|&b| b == 0)
        .nth(1)
        .filter(|class| !class.is_empty())
        .map(|class| String::from_utf8_lossy(class).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_is_the_second_field() {
        assert_eq!(class_from_wm_class(b"alacritty\0Alacritty\0"), Some("Alacritty".to_string()));
        // a missing trailing NUL is tolerated
        assert_eq!(class_from_wm_class(b"xterm\0XTerm"), Some("XTerm".to_string()));
    }

    #[test]
    fn missing_class_is_none() {
        assert_eq!(class_from_wm_class(b""), None);
        assert_eq!(class_from_wm_class(b"instance-only\0"), None);
        assert_eq!(class_from_wm_class(b"instance-only"), None);
    }

    #[test]
    fn latin1_class_does_not_panic() {
        let class = class_from_wm_class(b"caf\xe9\0Caf\xe9\0").unwrap();
        assert!(class.starts_with("Caf"));
    }
}
