pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

pub const PIXEL_ON: u8 = 0xFF;
pub const PIXEL_OFF: u8 = 0x00;

/// 64x32 monochrome surface, one byte per cell.
///
/// Coordinates wrap on both axes, so a sprite leaving the right edge comes
/// back in on the left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    cells: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            cells: vec![PIXEL_OFF; WIDTH * HEIGHT],
        }
    }

    fn index(x: usize, y: usize) -> usize {
        (y % HEIGHT) * WIDTH + (x % WIDTH)
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[Self::index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, val: u8) {
        self.cells[Self::index(x, y)] = val;
    }

    pub fn is_on(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == PIXEL_ON
    }

    pub fn clear(&mut self) {
        self.cells.fill(PIXEL_OFF);
    }

    /// XOR `sprite` (one byte per row, MSB leftmost) onto the surface with
    /// its top-left corner at (x, y).
    ///
    /// Returns true if any lit cell was switched off.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (i, row) in sprite.iter().enumerate() {
            for j in 0..8 {
                if (row >> (7 - j)) & 1 == 0 {
                    continue;
                }
                let index = Self::index(x as usize + j, y as usize + i);
                let previous = self.cells[index];
                self.cells[index] = previous ^ PIXEL_ON;
                if previous == PIXEL_ON {
                    collision = true;
                }
            }
        }
        collision
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Expand into 0RGB pixels for a window buffer.
    pub fn to_rgb(&self, on: u32, off: u32) -> Vec<u32> {
        self.cells
            .iter()
            .map(|&cell| if cell == PIXEL_ON { on } else { off })
            .collect()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn from_u8_rgb(r: u8, g: u8, b: u8) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}
