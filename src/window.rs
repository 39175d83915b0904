//! SDL2 host window: presents software-rendered frames and feeds input.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use sdl2::event::{Event, WindowEvent as SdlWindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::WindowContext;

use crate::clock::FrameScheduler;
use crate::error::Error;
use crate::input::{InputState, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    None,
    Quit,
    Resize(u32, u32),
}

/// Sleeps so frames start at most `fps` times per second.
#[derive(Debug)]
pub struct FrameLimiter {
    frame_time: Duration,
    previous: Instant,
}

impl FrameLimiter {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_time: Duration::from_secs(1) / fps.max(1),
            previous: Instant::now(),
        }
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }
}

impl FrameScheduler for FrameLimiter {
    fn wait_for_next_frame(&mut self) {
        let elapsed = self.previous.elapsed();
        if elapsed < self.frame_time {
            thread::sleep(self.frame_time - elapsed);
        }
        self.previous = Instant::now();
    }
}

fn map_key(keycode: Keycode) -> Option<Key> {
    let key = match keycode {
        Keycode::Space => Key::Space,
        Keycode::Return => Key::Enter,
        Keycode::Tab => Key::Tab,
        Keycode::Backspace => Key::Backspace,
        Keycode::LShift | Keycode::RShift => Key::Shift,
        Keycode::LCtrl | Keycode::RCtrl => Key::Ctrl,
        Keycode::LAlt | Keycode::RAlt => Key::Alt,
        Keycode::Escape => Key::Escape,
        Keycode::Up => Key::Up,
        Keycode::Down => Key::Down,
        Keycode::Left => Key::Left,
        Keycode::Right => Key::Right,
        other => {
            let name = other.name();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::char(c),
                _ => return None,
            }
        }
    };
    Some(key)
}

fn sdl_error(e: impl ToString) -> Error {
    Error::Window(e.to_string())
}

pub struct Window {
    canvas: Canvas<sdl2::video::Window>,
    // Borrows `texture_creator`; declared first so it is dropped first.
    texture: Texture<'static>,
    texture_creator: Box<TextureCreator<WindowContext>>,
    event_pump: sdl2::EventPump,
    width: u32,
    height: u32,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, Error> {
        let sdl_context = sdl2::init().map_err(sdl_error)?;
        let video_subsystem = sdl_context.video().map_err(sdl_error)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(sdl_error)?;

        let canvas = window.into_canvas().build().map_err(sdl_error)?;
        let texture_creator = Box::new(canvas.texture_creator());
        let event_pump = sdl_context.event_pump().map_err(sdl_error)?;
        let texture = Self::streaming_texture(&texture_creator, width, height)?;
        info!("opened {width}x{height} window \"{title}\"");

        Ok(Self {
            canvas,
            texture,
            texture_creator,
            event_pump,
            width,
            height,
        })
    }

    fn streaming_texture(
        creator: &TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Texture<'static>, Error> {
        // SAFETY: the creator is boxed and owned by the `Window`, which drops
        // the texture before the creator.
        let creator: &'static TextureCreator<WindowContext> = unsafe { &*(creator as *const _) };
        creator
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width, height)
            .map_err(sdl_error)
    }

    /// Drains pending events into `input` and reports the first quit or resize.
    pub fn poll_events(&mut self, input: &mut InputState) -> WindowEvent {
        let mut result = WindowEvent::None;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return WindowEvent::Quit,
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(key) = map_key(keycode) {
                        input.key_down(key);
                    }
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(key) = map_key(keycode) {
                        input.key_up(key);
                    }
                }
                Event::MouseButtonDown {
                    mouse_btn: MouseButton::Left,
                    x,
                    y,
                    ..
                } => {
                    input.mouse_move(x as f32, y as f32);
                    input.mouse_down();
                }
                Event::MouseButtonUp {
                    mouse_btn: MouseButton::Left,
                    ..
                } => input.mouse_up(),
                Event::MouseMotion { x, y, .. } => input.mouse_move(x as f32, y as f32),
                Event::Window { win_event, .. } => match win_event {
                    SdlWindowEvent::FocusLost => input.blur(),
                    SdlWindowEvent::FocusGained => input.focus(),
                    SdlWindowEvent::Resized(w, h) if result == WindowEvent::None => {
                        result = WindowEvent::Resize(w.max(1) as u32, h.max(1) as u32);
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        result
    }

    /// Shows an ARGB8888 frame of the window's current size.
    pub fn present(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.texture
            .update(None, frame, (self.width * 4) as usize)
            .map_err(sdl_error)?;
        self.canvas.clear();
        self.canvas
            .copy(&self.texture, None, Some(Rect::new(0, 0, self.width, self.height)))
            .map_err(sdl_error)?;
        self.canvas.present();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.texture = Self::streaming_texture(&self.texture_creator, width, height)?;
        self.width = width;
        self.height = height;
        debug!("window resized to {width}x{height}");
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_input_keys() {
        assert_eq!(map_key(Keycode::W), Some(Key::Char('W')));
        assert_eq!(map_key(Keycode::Up), Some(Key::Up));
        assert_eq!(map_key(Keycode::LShift), Some(Key::Shift));
        assert_eq!(map_key(Keycode::F1), None);
    }

    #[test]
    fn limiter_sleeps_to_the_frame_time() {
        let mut limiter = FrameLimiter::new(100);
        assert_eq!(limiter.frame_time(), Duration::from_millis(10));
        let start = Instant::now();
        limiter.wait_for_next_frame();
        limiter.wait_for_next_frame();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
