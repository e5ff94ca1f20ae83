//! Windowing and raw input sampling on winit.
#![forbid(unsafe_code)]

use std::fmt;

pub use winit::dpi::{PhysicalPosition, PhysicalSize};
pub use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, MouseButton, WindowEvent};
pub use winit::event_loop::{ControlFlow, EventLoop};
pub use winit::keyboard::{KeyCode, PhysicalKey};
pub use winit::window::{CursorGrabMode, Window};

#[derive(Debug)]
pub enum WindowInitError {
    EventLoop(String),
    Window(winit::error::OsError),
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowInitError::EventLoop(message) => {
                write!(f, "event loop initialization failed: {}", message)
            }
            WindowInitError::Window(err) => write!(f, "window creation failed: {}", err),
        }
    }
}

impl std::error::Error for WindowInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WindowInitError::EventLoop(_) => None,
            WindowInitError::Window(err) => Some(err),
        }
    }
}

pub fn create_window(
    title: &str,
    width: u32,
    height: u32,
) -> Result<(EventLoop<()>, Window), WindowInitError> {
    let event_loop = EventLoop::new().map_err(|err| WindowInitError::EventLoop(err.to_string()))?;
    let window = winit::window::WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .map_err(WindowInitError::Window)?;
    Ok((event_loop, window))
}

/// Locks (or releases) the cursor for mouse-look. Returns whether the grab
/// took effect; some platforms only support one of the two grab modes.
pub fn grab_cursor(window: &Window, grab: bool) -> bool {
    if grab {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
            .is_ok();
        window.set_cursor_visible(!grabbed);
        grabbed
    } else {
        let _ = window.set_cursor_grab(CursorGrabMode::None);
        window.set_cursor_visible(true);
        false
    }
}

/// Held state for the fixed gameplay bindings, updated from key events and
/// read once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump: bool,
    pub confirm: bool,
}

impl HeldKeys {
    pub fn apply(&mut self, key: PhysicalKey, pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.back = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.sprint = pressed,
            KeyCode::Space => self.jump = pressed,
            KeyCode::KeyE => self.confirm = pressed,
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Accumulates raw cursor motion between frames; drained once per tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct MouseLook {
    dx: f64,
    dy: f64,
}

impl MouseLook {
    pub fn accumulate(&mut self, delta: (f64, f64)) {
        self.dx += delta.0;
        self.dy += delta.1;
    }

    pub fn take(&mut self) -> [f32; 2] {
        let delta = [self.dx as f32, self.dy as f32];
        self.dx = 0.0;
        self.dy = 0.0;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_track_press_and_release() {
        let mut keys = HeldKeys::default();
        keys.apply(PhysicalKey::Code(KeyCode::KeyW), true);
        keys.apply(PhysicalKey::Code(KeyCode::ShiftLeft), true);
        assert!(keys.forward);
        assert!(keys.sprint);
        keys.apply(PhysicalKey::Code(KeyCode::KeyW), false);
        assert!(!keys.forward);
        assert!(keys.sprint);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut keys = HeldKeys::default();
        keys.apply(PhysicalKey::Code(KeyCode::KeyQ), true);
        assert_eq!(keys, HeldKeys::default());
    }

    #[test]
    fn mouse_look_drains_on_take() {
        let mut look = MouseLook::default();
        look.accumulate((3.0, -1.5));
        look.accumulate((1.0, 0.5));
        assert_eq!(look.take(), [4.0, -1.0]);
        assert_eq!(look.take(), [0.0, 0.0]);
    }
}
