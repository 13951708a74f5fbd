use crate::{error::VmError, memory::TypeAddr, memory::PROGRAM_START};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;

/// V0..VF. VF doubles as the carry/borrow/collision flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    registers: [u8; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
        }
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[reg_num as usize] = value;
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let reg = &mut self.registers[reg_num as usize];
        *reg = reg.wrapping_add(value);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[reg_num as usize]
    }

    pub fn set_flag(&mut self, value: bool) {
        self.registers[0xF] = value as u8;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.registers
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl ProgramCounter {
    pub fn new() -> Self {
        Self(PROGRAM_START)
    }

    /// Move past one instruction.
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    /// Move past the next instruction as well as this one.
    pub fn skip(&mut self) {
        self.0 = self.0.wrapping_add(4);
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

impl Default for ProgramCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }

    pub fn add(&mut self, value: u8) {
        self.0 = self.0.wrapping_add(value as u16);
    }
}

/// Fixed 16-entry call stack. Overflow and underflow are faults rather than
/// silent wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    addresses: [TypeAddr; STACK_DEPTH],
    sp: u8,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    /// Store the address of the calling instruction.
    pub fn push(&mut self, addr: TypeAddr) -> Result<(), VmError> {
        let slot = self
            .addresses
            .get_mut(self.sp as usize)
            .ok_or(VmError::StackOverflow { pc: addr })?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    /// `pc` is only used to report where an underflow happened.
    pub fn pop(&mut self, pc: TypeAddr) -> Result<TypeAddr, VmError> {
        if self.sp == 0 {
            return Err(VmError::StackUnderflow { pc });
        }
        self.sp -= 1;
        Ok(self.addresses[self.sp as usize])
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn get(&self, slot: usize) -> Option<TypeAddr> {
        self.addresses.get(slot).copied()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
