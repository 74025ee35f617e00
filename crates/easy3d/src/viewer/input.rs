//! Toolkit-neutral input events.
//!
//! A windowing backend translates its native events into [`Event`]s and
//! feeds them to [`Viewer::handle_event`](super::Viewer::handle_event).
//! Mouse positions are in pixels with the origin at the upper-left corner.

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, lower case for letters.
    Char(char),
    F1,
    Left,
    Right,
    Up,
    Down,
    Space,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };
    pub const ALT: Self = Self {
        shift: false,
        ctrl: false,
        alt: true,
    };

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// One input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    MousePress {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },
    MouseRelease {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },
    /// The cursor moved with the flagged buttons held down.
    MouseMove {
        x: f32,
        y: f32,
        left: bool,
        right: bool,
        middle: bool,
        modifiers: Modifiers,
    },
    /// Wheel rotation in notches, positive away from the user.
    Scroll { delta: f32, modifiers: Modifiers },
    KeyPress { key: Key, modifiers: Modifiers },
    Resize { width: u32, height: u32 },
    /// Advance animations by `dt` seconds and redraw.
    Redraw { dt: f32 },
    Close,
}

/// A source of input events driving [`Viewer::run`](super::Viewer::run).
///
/// `next_event` returns `None` when the source is exhausted, which also ends
/// the run loop. Any iterator of events is a source.
pub trait EventSource {
    fn next_event(&mut self) -> Option<Event>;
}

impl<I> EventSource for I
where
    I: Iterator<Item = Event>,
{
    fn next_event(&mut self) -> Option<Event> {
        self.next()
    }
}
