pub const KEY_COUNT: usize = 16;

/// Layout of the hex keypad as it appears on the device, row by row.
pub const KEYPAD_LAYOUT: [[u8; 4]; 4] = [
    [0x1, 0x2, 0x3, 0xC],
    [0x4, 0x5, 0x6, 0xD],
    [0x7, 0x8, 0x9, 0xE],
    [0xA, 0x0, 0xB, 0xF],
];

/// What the engine needs to know about input. Keys are logical, 0x0..=0xF.
pub trait Keypad {
    fn is_down(&self, key: u8) -> bool;

    /// The most recently pressed key, if one was pressed since the host
    /// last polled.
    fn last_pressed(&self) -> Option<u8>;
}

/// Plain held/pressed state, filled in by the host each frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    keys: [bool; KEY_COUNT],
    last: Option<u8>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.keys = [false; KEY_COUNT];
        self.last = None;
    }

    pub fn press(&mut self, key: u8) {
        if let Some(held) = self.keys.get_mut(key as usize) {
            *held = true;
            self.last = Some(key);
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(held) = self.keys.get_mut(key as usize) {
            *held = false;
        }
    }

    /// Forget the last press but keep what is held.
    pub fn clear_pressed(&mut self) {
        self.last = None;
    }
}

impl Keypad for KeyState {
    fn is_down(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    fn last_pressed(&self) -> Option<u8> {
        self.last
    }
}
