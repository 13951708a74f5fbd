use crate::{error::VmError, rom::Rom};

pub type TypeAddr = u16; // in reality u12

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

pub const FONT_START: TypeAddr = 0x000;
pub const FONT_GLYPH_SIZE: u16 = 5;
type FontBytes = [u8; 5 * 16];

pub const FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Flat 4k address space.
///
/// 000 -> 04F holds the font, 050 -> 1FF is otherwise reserved, programs
/// start at 200. Accesses are checked: anything at or past 4096 is a
/// [`VmError::MemoryFault`] rather than a panic.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        let start = FONT_START as usize;
        bytes[start..start + FONT.len()].copy_from_slice(&FONT);
        Self { bytes }
    }

    pub fn get(&self, addr: usize) -> Result<u8, VmError> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(VmError::MemoryFault { addr })
    }

    pub fn set(&mut self, addr: usize, val: u8) -> Result<(), VmError> {
        let cell = self
            .bytes
            .get_mut(addr)
            .ok_or(VmError::MemoryFault { addr })?;
        *cell = val;
        Ok(())
    }

    /// `len` bytes starting at `addr`, all of which must be in range.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], VmError> {
        self.bytes
            .get(addr..addr + len)
            .ok_or(VmError::MemoryFault {
                addr: MEMORY_SIZE.max(addr),
            })
    }

    /// Mutable counterpart of [`Memory::slice`].
    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8], VmError> {
        self.bytes
            .get_mut(addr..addr + len)
            .ok_or(VmError::MemoryFault {
                addr: MEMORY_SIZE.max(addr),
            })
    }

    /// Big-endian instruction word at `pc`.
    pub fn fetch(&self, pc: TypeAddr) -> Result<u16, VmError> {
        let pc = pc as usize;
        let (l, r) = (self.get(pc)?, self.get(pc + 1)?);
        Ok(((l as u16) << 8) | r as u16)
    }

    // loads program instructions starting at address 0x200
    pub fn load(&mut self, rom: &Rom) {
        let start = PROGRAM_START as usize;
        let bytes = rom.bytes();
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
