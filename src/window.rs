//! SDL2 host window: event translation and framebuffer blit.

use std::path::PathBuf;

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;

use crate::input::InputEvent;
use crate::render::{ByteOrder, ColorBuffer, RenderFlags};

pub const FPS: u64 = 60;
pub const FRAME_TARGET_TIME: f64 = 1000.0 / FPS as f64;

/// Degrees of orbit per pixel of mouse drag.
const ORBIT_SPEED: f32 = 0.4;
/// World units of pan per pixel of mouse drag.
const PAN_STEP: f32 = 0.01;
/// World units of zoom per wheel notch.
const ZOOM_STEP: f32 = 0.5;

/// Menu actions and viewport input produced by one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Quit,
    Input(InputEvent),
    LoadModel(PathBuf),
    LoadTexture(PathBuf),
}

pub struct FrameLimiter {
    previous_frame_time: u64,
}

impl FrameLimiter {
    pub fn new(window: &Window) -> Self {
        Self {
            previous_frame_time: window.timer().ticks64(),
        }
    }

    /// Sleeps to hold the target frame rate and returns the seconds elapsed
    /// since the previous call.
    pub fn wait_and_get_delta(&mut self, window: &Window) -> f32 {
        let mut current_time = window.timer().ticks64();
        let mut delta_time = current_time - self.previous_frame_time;

        if delta_time < FRAME_TARGET_TIME as u64 {
            let time_to_wait = (FRAME_TARGET_TIME as u64) - delta_time;
            std::thread::sleep(std::time::Duration::from_millis(time_to_wait));
            current_time = window.timer().ticks64();
            delta_time = current_time - self.previous_frame_time;
        }

        self.previous_frame_time = current_time;
        delta_time as f32 / 1000.0
    }
}

pub struct Window {
    canvas: sdl2::render::Canvas<sdl2::video::Window>,
    // Declared before the creator so it is dropped first.
    texture: sdl2::render::Texture<'static>,
    texture_creator: Box<sdl2::render::TextureCreator<sdl2::video::WindowContext>>,
    event_pump: sdl2::EventPump,
    timer_subsystem: sdl2::TimerSubsystem,
    byte_order: ByteOrder,
    scratch: Vec<u8>,
    width: u32,
    height: u32,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32, byte_order: ByteOrder) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;
        let timer_subsystem = sdl_context.timer()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
        let texture_creator = Box::new(canvas.texture_creator());
        let event_pump = sdl_context.event_pump()?;

        // SAFETY: texture_creator is heap-allocated and lives as long as Window.
        // The texture field is declared first, so it is dropped first.
        let texture_creator_ref: &'static sdl2::render::TextureCreator<sdl2::video::WindowContext> =
            unsafe { &*(texture_creator.as_ref() as *const _) };
        let texture = texture_creator_ref
            .create_texture_streaming(pixel_format(byte_order), width, height)
            .map_err(|e| e.to_string())?;

        Ok(Self {
            canvas,
            texture,
            texture_creator,
            event_pump,
            timer_subsystem,
            byte_order,
            scratch: Vec::new(),
            width,
            height,
        })
    }

    /// Drain the SDL queue.
    pub fn poll_events(&mut self) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        for event in self.event_pump.poll_iter() {
            if let Some(event) = translate(event) {
                events.push(event);
            }
        }
        events
    }

    /// Blit `frame`, flipping rows since the framebuffer is stored bottom-up.
    pub fn present(&mut self, frame: &ColorBuffer) -> Result<(), String> {
        if (frame.width(), frame.height()) != (self.width, self.height)
            || frame.byte_order() != self.byte_order
        {
            self.byte_order = frame.byte_order();
            self.resize(frame.width(), frame.height())?;
        }
        frame.write_bytes(&mut self.scratch);
        self.texture
            .update(None, &self.scratch, (self.width * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas.copy_ex(
            &self.texture,
            None,
            Some(Rect::new(0, 0, self.width, self.height)),
            0.0,
            None,
            false,
            true,
        )?;
        self.canvas.present();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), String> {
        self.width = width;
        self.height = height;
        // SAFETY: Same as in new() - texture_creator outlives texture
        let texture_creator_ref: &'static sdl2::render::TextureCreator<sdl2::video::WindowContext> =
            unsafe { &*(self.texture_creator.as_ref() as *const _) };
        self.texture = texture_creator_ref
            .create_texture_streaming(pixel_format(self.byte_order), width, height)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timer(&self) -> &sdl2::TimerSubsystem {
        &self.timer_subsystem
    }
}

/// SDL format whose in-memory byte order matches the framebuffer.
fn pixel_format(byte_order: ByteOrder) -> PixelFormatEnum {
    // Packed SDL formats name channels from the most significant byte.
    let little = cfg!(target_endian = "little");
    match (byte_order, little) {
        (ByteOrder::Rgba, true) => PixelFormatEnum::ABGR8888,
        (ByteOrder::Rgba, false) => PixelFormatEnum::RGBA8888,
        (ByteOrder::Bgra, true) => PixelFormatEnum::ARGB8888,
        (ByteOrder::Bgra, false) => PixelFormatEnum::BGRA8888,
    }
}

fn translate(event: Event) -> Option<WindowEvent> {
    let input = match event {
        Event::Quit { .. }
        | Event::KeyDown {
            keycode: Some(Keycode::Escape),
            ..
        } => return Some(WindowEvent::Quit),
        Event::DropFile { filename, .. } => {
            let path = PathBuf::from(filename);
            let is_model = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
            return Some(if is_model {
                WindowEvent::LoadModel(path)
            } else {
                WindowEvent::LoadTexture(path)
            });
        }
        Event::Window {
            win_event: sdl2::event::WindowEvent::Resized(w, h),
            ..
        } => InputEvent::Resize {
            width: w.max(1) as u32,
            height: h.max(1) as u32,
        },
        Event::MouseMotion {
            mousestate,
            xrel,
            yrel,
            ..
        } => {
            if mousestate.is_mouse_button_pressed(MouseButton::Left) {
                InputEvent::Orbit {
                    dx: xrel as f32 * ORBIT_SPEED,
                    dy: -yrel as f32 * ORBIT_SPEED,
                }
            } else if mousestate.is_mouse_button_pressed(MouseButton::Right)
                || mousestate.is_mouse_button_pressed(MouseButton::Middle)
            {
                InputEvent::Pan {
                    dx: yrel as f32 * PAN_STEP,
                    dy: xrel as f32 * PAN_STEP,
                }
            } else {
                return None;
            }
        }
        Event::MouseWheel { y, .. } => InputEvent::Zoom(y as f32 * ZOOM_STEP),
        Event::KeyDown {
            keycode: Some(key), ..
        } => match key {
            Keycode::R => InputEvent::ResetView,
            Keycode::Num1 => InputEvent::Toggle(RenderFlags::WIREFRAME),
            Keycode::Num2 => InputEvent::Toggle(RenderFlags::SHADED),
            Keycode::Num3 => InputEvent::Toggle(RenderFlags::DEPTH),
            Keycode::Num4 => InputEvent::Toggle(RenderFlags::NORMALS),
            Keycode::Num5 => InputEvent::Toggle(RenderFlags::VERTEX_NORMALS),
            _ => return None,
        },
        _ => return None,
    };
    Some(WindowEvent::Input(input))
}
