use anyhow::Context;
use chip8_vm::{
    display::{from_u8_rgb, FrameBuffer, HEIGHT, WIDTH},
    keyboard::KeyState,
};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

pub struct Frontend {
    window: Window,
    on: u32,
    off: u32,
}

impl Frontend {
    pub fn new(scale: usize) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "chip8-vm - ESC to exit",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: to_scale(scale)?,
                ..WindowOptions::default()
            },
        )
        .context("could not open window")?;
        window.set_position(500, 300);
        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
        Ok(Self {
            window,
            on: from_u8_rgb(0, 127, 255),
            off: from_u8_rgb(0, 0, 0),
        })
    }

    pub fn is_running(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// Refresh `keys` from the window: held keys replace the old state, and
    /// the last new press of this frame becomes the last pressed key.
    pub fn poll_keys(&self, keys: &mut KeyState) {
        keys.reset();
        for key in self.window.get_keys() {
            if let Some(num) = key_to_num(key) {
                keys.press(num);
            }
        }
        keys.clear_pressed();
        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            if let Some(num) = key_to_num(key) {
                keys.press(num);
            }
        }
    }

    pub fn present(&mut self, fb: &FrameBuffer) -> anyhow::Result<()> {
        self.window
            .update_with_buffer(&fb.to_rgb(self.on, self.off), WIDTH, HEIGHT)
            .context("could not update window")
    }
}

fn to_scale(scale: usize) -> anyhow::Result<Scale> {
    Ok(match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        16 => Scale::X16,
        32 => Scale::X32,
        _ => anyhow::bail!("unsupported scale {scale}, use 1, 2, 4, 8, 16 or 32"),
    })
}

// 1 2 3 4      1 2 3 C
// Q W E R  ->  4 5 6 D
// A S D F      7 8 9 E
// Z X C V      A 0 B F
pub fn key_to_num(key: Key) -> Option<u8> {
    match key {
        Key::Key1 => Some(0x1),
        Key::Key2 => Some(0x2),
        Key::Key3 => Some(0x3),
        Key::Key4 => Some(0xC),
        Key::Q => Some(0x4),
        Key::W => Some(0x5),
        Key::E => Some(0x6),
        Key::R => Some(0xD),
        Key::A => Some(0x7),
        Key::S => Some(0x8),
        Key::D => Some(0x9),
        Key::F => Some(0xE),
        Key::Z => Some(0xA),
        Key::X => Some(0x0),
        Key::C => Some(0xB),
        Key::V => Some(0xF),
        _ => None,
    }
}
