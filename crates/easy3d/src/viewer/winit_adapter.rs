//! Translation of winit window events into viewer [`Event`]s.
//!
//! ```ignore
//! let mut input = WinitInput::new();
//! // inside `ApplicationHandler::window_event`:
//! if let Some(event) = input.translate(&window_event) {
//!     viewer.handle_event(&event);
//! }
//! ```

use std::time::Instant;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};

use super::input::{Event, Key, Modifiers, MouseButton};

/// Pixels of a touchpad scroll counted as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 50.0;

/// Tracks the cursor, buttons and modifiers across winit events.
#[derive(Debug, Clone)]
pub struct WinitInput {
    cursor: (f32, f32),
    left: bool,
    right: bool,
    middle: bool,
    modifiers: Modifiers,
    last_frame: Option<Instant>,
}

impl Default for WinitInput {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitInput {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cursor: (0.0, 0.0),
            left: false,
            right: false,
            middle: false,
            modifiers: Modifiers::NONE,
            last_frame: None,
        }
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// The viewer event for a window event, if it maps to one.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<Event> {
        match event {
            WindowEvent::CloseRequested => Some(Event::Close),
            WindowEvent::Resized(size) => Some(Event::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = self
                    .last_frame
                    .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
                self.last_frame = Some(now);
                Some(Event::Redraw { dt })
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.modifiers = Modifiers {
                    shift: state.shift_key(),
                    ctrl: state.control_key() || state.super_key(),
                    alt: state.alt_key(),
                };
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                Some(Event::MouseMove {
                    x: self.cursor.0,
                    y: self.cursor.1,
                    left: self.left,
                    right: self.right,
                    middle: self.middle,
                    modifiers: self.modifiers,
                })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = mouse_button(*button)?;
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.left = pressed,
                    MouseButton::Right => self.right = pressed,
                    MouseButton::Middle => self.middle = pressed,
                }
                let (x, y) = self.cursor;
                let modifiers = self.modifiers;
                Some(if pressed {
                    Event::MousePress {
                        x,
                        y,
                        button,
                        modifiers,
                    }
                } else {
                    Event::MouseRelease {
                        x,
                        y,
                        button,
                        modifiers,
                    }
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_NOTCH) as f32,
                };
                Some(Event::Scroll {
                    delta,
                    modifiers: self.modifiers,
                })
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let key = translate_key(&event.logical_key)?;
                Some(Event::KeyPress {
                    key,
                    modifiers: self.modifiers,
                })
            }
            _ => None,
        }
    }
}

fn mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// The viewer key for a logical winit key. Letters are lower-cased.
#[must_use]
pub fn translate_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(named) => match named {
            NamedKey::F1 => Some(Key::F1),
            NamedKey::ArrowLeft => Some(Key::Left),
            NamedKey::ArrowRight => Some(Key::Right),
            NamedKey::ArrowUp => Some(Key::Up),
            NamedKey::ArrowDown => Some(Key::Down),
            NamedKey::Space => Some(Key::Space),
            NamedKey::Delete => Some(Key::Delete),
            _ => None,
        },
        WinitKey::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(' '), None) => Some(Key::Space),
                (Some(c), None) => Some(Key::Char(c.to_ascii_lowercase())),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    #[test]
    fn test_translate_named_keys() {
        assert_eq!(translate_key(&WinitKey::Named(NamedKey::F1)), Some(Key::F1));
        assert_eq!(
            translate_key(&WinitKey::Named(NamedKey::ArrowUp)),
            Some(Key::Up)
        );
        assert_eq!(translate_key(&WinitKey::Named(NamedKey::Escape)), None);
    }

    #[test]
    fn test_translate_characters() {
        assert_eq!(
            translate_key(&WinitKey::Character(SmolStr::new("K"))),
            Some(Key::Char('k'))
        );
        assert_eq!(
            translate_key(&WinitKey::Character(SmolStr::new("="))),
            Some(Key::Char('='))
        );
        assert_eq!(translate_key(&WinitKey::Character(SmolStr::new("ab"))), None);
    }
}
