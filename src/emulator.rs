use std::fmt;

use crate::{
    config::Quirks,
    decode::{decode, Instruction, Op},
    display::FrameBuffer,
    error::VmError,
    keyboard::{KeyState, Keypad},
    memory::{Memory, TypeAddr, FONT_GLYPH_SIZE, FONT_START},
    registers::{IndexRegister, ProgramCounter, Registers, Stack},
    rng::{RandomSource, SeededRng},
    rom::Rom,
    timer::Timer,
};

/// What a single `step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    /// FX0A found no key press; pc is unchanged and the same instruction
    /// runs again on the next step.
    AwaitingKey,
    /// FX0A stored this key and moved on. The press is spent: the host
    /// must not report it to another FX0A.
    KeyTaken(u8),
}

// where pc goes after an instruction
enum Flow {
    Next,
    Skip,
    Jump(TypeAddr),
    Wait,
    TookKey(u8),
}

impl Flow {
    fn skip_if(cond: bool) -> Self {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

pub struct Emulator<R: RandomSource = SeededRng> {
    fb: FrameBuffer,
    pub regs: Registers,
    pub mem: Memory,
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
    pub delay_timer: Timer,
    pub sound_timer: Timer,
    rng: R,
    quirks: Quirks,
    awaiting_key: bool,
    loaded: bool,
}

impl Emulator<SeededRng> {
    pub fn new(seed: u64) -> Self {
        log::debug!("new emulator, rng seed {seed}");
        Self::with_rng(SeededRng::new(seed))
    }
}

impl<R: RandomSource> Emulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(),
            pc: ProgramCounter::new(),
            index: IndexRegister::default(),
            stack: Stack::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            rng,
            quirks: Quirks::default(),
            awaiting_key: false,
            loaded: false,
        }
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Copy the program to 0x200. Meant to be called once, before the first
    /// step.
    pub fn load(&mut self, rom: &Rom) {
        if self.loaded {
            log::warn!("loading a second program over the first one");
        }
        log::debug!("loading {} byte program", rom.len());
        self.mem.load(rom);
        self.loaded = true;
    }

    /// Fetch, decode and execute exactly one instruction.
    ///
    /// On error nothing has been changed by the faulting instruction and pc
    /// still points at it.
    pub fn step(&mut self, keypad: &dyn Keypad) -> Result<StepOutcome, VmError> {
        let pc = self.pc.0;
        let ins = decode(self.mem.fetch(pc)?, pc)?;
        log::trace!("{pc:#06X}: {:04X}  {ins}", ins.raw.code());
        self.execute_ins(ins, keypad)
    }

    pub fn execute_ins(
        &mut self,
        ins: Instruction,
        keypad: &dyn Keypad,
    ) -> Result<StepOutcome, VmError> {
        let (vx, vy) = (ins.x(), ins.y());
        let flow = match ins.op {
            Op::ClearScreen => {
                self.fb.clear();
                Flow::Next
            }
            Op::PopSubroutine => {
                // back to the call, then past it
                let addr = self.stack.pop(self.pc.0)?;
                self.pc.set_addr(addr);
                Flow::Next
            }
            Op::Jump => Flow::Jump(ins.addr()),
            Op::PushSubroutine => {
                self.stack.push(self.pc.0)?;
                Flow::Jump(ins.addr())
            }
            Op::SkipEqualConstant => Flow::skip_if(self.regs.get(vx) == ins.kk()),
            Op::SkipNotEqualConstant => Flow::skip_if(self.regs.get(vx) != ins.kk()),
            Op::SkipEqualRegister => Flow::skip_if(self.regs.get(vx) == self.regs.get(vy)),
            Op::SetRegister => {
                self.regs.set_register(vx, ins.kk());
                Flow::Next
            }
            Op::AddToRegister => {
                self.regs.add_to_register(vx, ins.kk());
                Flow::Next
            }
            Op::CopyRegister => {
                self.regs.set_register(vx, self.regs.get(vy));
                Flow::Next
            }
            Op::Or => {
                self.regs
                    .set_register(vx, self.regs.get(vx) | self.regs.get(vy));
                Flow::Next
            }
            Op::And => {
                self.regs
                    .set_register(vx, self.regs.get(vx) & self.regs.get(vy));
                Flow::Next
            }
            Op::XOr => {
                self.regs
                    .set_register(vx, self.regs.get(vx) ^ self.regs.get(vy));
                Flow::Next
            }
            Op::Add => {
                let (z, carry) = self.regs.get(vx).overflowing_add(self.regs.get(vy));
                self.regs.set_register(vx, z);
                self.regs.set_flag(carry);
                Flow::Next
            }
            Op::SubtractForward => {
                let (z, borrow) = self.regs.get(vx).overflowing_sub(self.regs.get(vy));
                self.regs.set_register(vx, z);
                self.regs.set_flag(!borrow);
                Flow::Next
            }
            Op::SubtractBackward => {
                let (z, borrow) = self.regs.get(vy).overflowing_sub(self.regs.get(vx));
                self.regs.set_register(vx, z);
                self.regs.set_flag(!borrow);
                Flow::Next
            }
            Op::RightShift => {
                let vx_value = self.regs.get(vx);
                self.regs.set_register(vx, vx_value >> 1);
                self.regs.set_register(0xF, vx_value & 1);
                Flow::Next
            }
            Op::LeftShift => {
                let vx_value = self.regs.get(vx);
                self.regs.set_register(vx, vx_value << 1);
                self.regs.set_register(0xF, (vx_value >> 7) & 1);
                Flow::Next
            }
            Op::SkipNotEqualRegister => Flow::skip_if(self.regs.get(vx) != self.regs.get(vy)),
            Op::SetIndexRegister => {
                self.index.set_addr(ins.addr());
                Flow::Next
            }
            Op::JumpWithOffset => Flow::Jump(ins.addr() + self.regs.get(0) as u16),
            Op::Random => {
                let byte = self.rng.next_byte();
                self.regs.set_register(vx, byte & ins.kk());
                Flow::Next
            }
            Op::Display => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                // one byte per row, 8 pixels wide
                let sprite = self.mem.slice(self.index.0 as usize, ins.n() as usize)?;
                let collision = self.fb.paint(x, y, sprite);
                self.regs.set_flag(collision);
                Flow::Next
            }
            Op::SkipIfPressed => Flow::skip_if(keypad.is_down(self.regs.get(vx))),
            Op::SkipIfNotPressed => Flow::skip_if(!keypad.is_down(self.regs.get(vx))),
            Op::CopyDelayToRegister => {
                self.regs.set_register(vx, self.delay_timer.count);
                Flow::Next
            }
            Op::GetKey => match keypad.last_pressed() {
                Some(key) => {
                    self.regs.set_register(vx, key);
                    Flow::TookKey(key)
                }
                None => Flow::Wait,
            },
            Op::CopyRegisterToDelay => {
                self.delay_timer.set(self.regs.get(vx));
                Flow::Next
            }
            Op::CopyRegisterToSound => {
                self.sound_timer.set(self.regs.get(vx));
                Flow::Next
            }
            Op::AddToIndex => {
                self.index.add(self.regs.get(vx));
                Flow::Next
            }
            Op::PointChar => {
                let glyph = self.regs.get(vx) as u16;
                self.index.set_addr(FONT_START + glyph * FONT_GLYPH_SIZE);
                Flow::Next
            }
            Op::ToDecimal => {
                let value = self.regs.get(vx);
                let digits = self.mem.slice_mut(self.index.0 as usize, 3)?;
                digits.copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
                Flow::Next
            }
            Op::StoreRegisterToMemory => {
                let count = vx as usize + 1;
                let dest = self.mem.slice_mut(self.index.0 as usize, count)?;
                dest.copy_from_slice(&self.regs.as_slice()[..count]);
                Flow::Next
            }
            Op::LoadRegisterFromMemory => {
                let count = if self.quirks.load_store_exclusive {
                    vx as usize
                } else {
                    vx as usize + 1
                };
                let src = self.mem.slice(self.index.0 as usize, count)?;
                for (reg, &byte) in src.iter().enumerate() {
                    self.regs.set_register(reg as u8, byte);
                }
                Flow::Next
            }
        };

        self.awaiting_key = matches!(flow, Flow::Wait);
        match flow {
            Flow::Next => self.pc.increment(),
            Flow::Skip => self.pc.skip(),
            Flow::Jump(addr) => self.pc.set_addr(addr),
            Flow::Wait => return Ok(StepOutcome::AwaitingKey),
            Flow::TookKey(key) => {
                self.pc.increment();
                return Ok(StepOutcome::KeyTaken(key));
            }
        }
        Ok(StepOutcome::Executed)
    }

    /// Run up to `budget` steps against `keys`, returning how many
    /// instructions completed.
    ///
    /// Stops early while FX0A is waiting. A press taken by FX0A is cleared
    /// from `keys`, so a following FX0A waits for a new one.
    pub fn run(&mut self, budget: u32, keys: &mut KeyState) -> Result<u32, VmError> {
        let mut done = 0;
        while done < budget {
            match self.step(&*keys)? {
                StepOutcome::Executed => {}
                StepOutcome::AwaitingKey => break,
                StepOutcome::KeyTaken(_) => keys.clear_pressed(),
            }
            done += 1;
        }
        Ok(done)
    }

    /// One 1/60 s period of real time has passed. Independent of `step`.
    pub fn tick(&mut self) {
        self.delay_timer.tick();
        self.sound_timer.tick();
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.awaiting_key
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    pub fn dump(&self) -> RegisterDump<'_> {
        RegisterDump {
            regs: &self.regs,
            pc: self.pc.0,
            index: self.index.0,
            sp: self.stack.sp(),
        }
    }
}

/// Text snapshot of the register file for fault reports.
pub struct RegisterDump<'a> {
    regs: &'a Registers,
    pc: TypeAddr,
    index: TypeAddr,
    sp: u8,
}

impl fmt::Display for RegisterDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, value) in self.regs.as_slice().iter().enumerate() {
            writeln!(f, "V{n:X}: 0x{value:02X}")?;
        }
        writeln!(f, "PC: 0x{:04X}", self.pc)?;
        writeln!(f, "I : 0x{:04X}", self.index)?;
        write!(f, "SP: 0x{:02X}", self.sp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng(u8);

    impl RandomSource for FixedRng {
        fn next_byte(&mut self) -> u8 {
            self.0
        }
    }

    fn emu_with(program: &[u8]) -> Emulator {
        let mut emu = Emulator::new(0);
        emu.load(&Rom::from_bytes(program.to_vec()).unwrap());
        emu
    }

    fn exec(emu: &mut Emulator<impl RandomSource>, code: u16) -> StepOutcome {
        let ins = decode(code, emu.pc.0).unwrap();
        emu.execute_ins(ins, &KeyState::new()).unwrap()
    }

    #[test]
    fn test_fresh_state() {
        let emu = Emulator::new(0);
        assert_eq!(emu.pc.0, 0x200);
        assert_eq!(emu.index.0, 0);
        assert_eq!(emu.stack.sp(), 0);
        assert_eq!(emu.regs, Registers::new());
        assert_eq!(emu.framebuffer(), &FrameBuffer::new());
        assert!(!emu.sound_active());
    }

    #[test]
    fn test_step_fetches_from_pc() {
        let mut emu = emu_with(&[0x6A, 0x42, 0x6B, 0x43]);
        let keys = KeyState::new();
        assert_eq!(emu.step(&keys).unwrap(), StepOutcome::Executed);
        assert_eq!(emu.step(&keys).unwrap(), StepOutcome::Executed);
        assert_eq!(emu.regs.get(0xA), 0x42);
        assert_eq!(emu.regs.get(0xB), 0x43);
        assert_eq!(emu.pc.0, 0x204);
    }

    #[test]
    fn test_jump() {
        let mut emu = Emulator::new(0);
        exec(&mut emu, 0x1ABC);
        assert_eq!(emu.pc.0, 0xABC);
    }

    #[test]
    fn test_jump_with_offset() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0, 0x10);
        exec(&mut emu, 0xB300);
        assert_eq!(emu.pc.0, 0x310);
    }

    #[test]
    fn test_skips() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(1, 0x33);
        emu.regs.set_register(2, 0x33);

        exec(&mut emu, 0x3133);
        assert_eq!(emu.pc.0, 0x204);
        exec(&mut emu, 0x3134);
        assert_eq!(emu.pc.0, 0x206);
        exec(&mut emu, 0x4134);
        assert_eq!(emu.pc.0, 0x20A);
        exec(&mut emu, 0x4133);
        assert_eq!(emu.pc.0, 0x20C);
        exec(&mut emu, 0x5120);
        assert_eq!(emu.pc.0, 0x210);
        exec(&mut emu, 0x9120);
        assert_eq!(emu.pc.0, 0x212);
        emu.regs.set_register(2, 0);
        exec(&mut emu, 0x9120);
        assert_eq!(emu.pc.0, 0x216);
    }

    #[test]
    fn test_add_constant_no_flag() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0xF, 0x7);
        emu.regs.set_register(3, 0xFF);
        exec(&mut emu, 0x7302);
        assert_eq!(emu.regs.get(3), 0x01);
        assert_eq!(emu.regs.get(0xF), 0x7);
    }

    #[test]
    fn test_logic_ops_leave_flag() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0xF, 0x5);
        emu.regs.set_register(0, 0b1100);
        emu.regs.set_register(1, 0b1010);
        exec(&mut emu, 0x8011);
        assert_eq!(emu.regs.get(0), 0b1110);
        exec(&mut emu, 0x8012);
        assert_eq!(emu.regs.get(0), 0b1010);
        exec(&mut emu, 0x8013);
        assert_eq!(emu.regs.get(0), 0);
        exec(&mut emu, 0x8010);
        assert_eq!(emu.regs.get(0), 0b1010);
        assert_eq!(emu.regs.get(0xF), 0x5);
    }

    #[test]
    fn test_add_carry() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0, 0x10);
        emu.regs.set_register(1, 0x20);
        exec(&mut emu, 0x8014);
        assert_eq!(emu.regs.get(0), 0x30);
        assert_eq!(emu.regs.get(0xF), 0);

        emu.regs.set_register(0, 0xF0);
        exec(&mut emu, 0x8014);
        assert_eq!(emu.regs.get(0), 0x10);
        assert_eq!(emu.regs.get(0xF), 1);
    }

    #[test]
    fn test_subtract_forward() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0, 0x05);
        emu.regs.set_register(1, 0x05);
        exec(&mut emu, 0x8015);
        assert_eq!(emu.regs.get(0), 0);
        assert_eq!(emu.regs.get(0xF), 1);

        exec(&mut emu, 0x8015);
        assert_eq!(emu.regs.get(0), 0xFB);
        assert_eq!(emu.regs.get(0xF), 0);
    }

    #[test]
    fn test_subtract_backward_borrow() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0, 0x03);
        emu.regs.set_register(1, 0x02);
        exec(&mut emu, 0x8017);
        assert_eq!(emu.regs.get(0), 0xFF);
        assert_eq!(emu.regs.get(0xF), 0);
    }

    #[test]
    fn test_shifts() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(2, 0b1000_0011);
        exec(&mut emu, 0x8206);
        assert_eq!(emu.regs.get(2), 0b0100_0001);
        assert_eq!(emu.regs.get(0xF), 1);
        exec(&mut emu, 0x820E);
        assert_eq!(emu.regs.get(2), 0b1000_0010);
        assert_eq!(emu.regs.get(0xF), 0);
        exec(&mut emu, 0x820E);
        assert_eq!(emu.regs.get(2), 0b0000_0100);
        assert_eq!(emu.regs.get(0xF), 1);
    }

    #[test]
    fn test_flag_register_as_target() {
        // the flag write lands after the result
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0xF, 0xFF);
        emu.regs.set_register(1, 0x01);
        exec(&mut emu, 0x8F14);
        assert_eq!(emu.regs.get(0xF), 1);

        // result 0x0F, no borrow
        emu.regs.set_register(0xF, 0x10);
        exec(&mut emu, 0x8F15);
        assert_eq!(emu.regs.get(0xF), 1);

        // result 0x01, shifted out 0
        emu.regs.set_register(0xF, 0x02);
        exec(&mut emu, 0x8F16);
        assert_eq!(emu.regs.get(0xF), 0);

        // result 0xFF, borrow
        emu.regs.set_register(0xF, 0x01);
        emu.regs.set_register(1, 0x00);
        exec(&mut emu, 0x8F17);
        assert_eq!(emu.regs.get(0xF), 0);

        // result 0x02, shifted out 1
        emu.regs.set_register(0xF, 0x81);
        exec(&mut emu, 0x8F1E);
        assert_eq!(emu.regs.get(0xF), 1);
    }

    #[test]
    fn test_store_all_registers() {
        let mut emu = Emulator::new(0);
        for r in 0..16 {
            emu.regs.set_register(r, 0xF0 | r);
        }
        emu.index.set_addr(0x500);
        exec(&mut emu, 0xFF55);
        let expected: Vec<u8> = (0..16).map(|r| 0xF0 | r).collect();
        assert_eq!(emu.mem.slice(0x500, 16).unwrap(), &expected[..]);
        assert_eq!(emu.mem.get(0x510).unwrap(), 0);
    }

    #[test]
    fn test_load_all_registers_including_flag() {
        let program: Vec<u8> = (0..16).map(|n| n * 3 + 1).collect();
        let mut emu = emu_with(&program);
        emu.index.set_addr(0x200);
        exec(&mut emu, 0xFF65);
        assert_eq!(emu.regs.as_slice(), &program[..]);
        assert_eq!(emu.regs.get(0xF), 46);
    }

    #[test]
    fn test_random_masks() {
        let mut emu = Emulator::with_rng(FixedRng(0b1011_0110));
        exec(&mut emu, 0xC40F);
        assert_eq!(emu.regs.get(4), 0b0000_0110);
        exec(&mut emu, 0xC400);
        assert_eq!(emu.regs.get(4), 0);
    }

    #[test]
    fn test_random_is_seeded() {
        let run = |seed| {
            let mut emu = Emulator::new(seed);
            (0..8)
                .map(|_| {
                    exec(&mut emu, 0xC0FF);
                    emu.regs.get(0)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_draw_font_glyph() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0, 0x0);
        exec(&mut emu, 0xF029);
        assert_eq!(emu.index.0, 0);
        exec(&mut emu, 0xD005);
        assert_eq!(emu.regs.get(0xF), 0);
        // "0" glyph: F0 90 90 90 F0
        let fb = emu.framebuffer();
        assert!((0..4).all(|x| fb.is_on(x, 0) && fb.is_on(x, 4)));
        assert!(fb.is_on(0, 2) && !fb.is_on(1, 2) && !fb.is_on(2, 2) && fb.is_on(3, 2));
        assert!(!fb.is_on(4, 0));
    }

    #[test]
    fn test_draw_zero_rows() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0xF, 1);
        exec(&mut emu, 0xD000);
        assert_eq!(emu.regs.get(0xF), 0);
        assert_eq!(emu.framebuffer(), &FrameBuffer::new());
    }

    #[test]
    fn test_clear_screen() {
        let mut emu = Emulator::new(0);
        exec(&mut emu, 0xD005);
        assert_ne!(emu.framebuffer(), &FrameBuffer::new());
        exec(&mut emu, 0x00E0);
        assert_eq!(emu.framebuffer(), &FrameBuffer::new());
    }

    #[test]
    fn test_point_char() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(7, 0xA);
        exec(&mut emu, 0xF729);
        assert_eq!(emu.index.0, 50);
    }

    #[test]
    fn test_to_decimal() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(3, 254);
        emu.index.set_addr(0x300);
        exec(&mut emu, 0xF333);
        assert_eq!(emu.mem.slice(0x300, 3).unwrap(), &[2, 5, 4]);
        emu.regs.set_register(3, 7);
        exec(&mut emu, 0xF333);
        assert_eq!(emu.mem.slice(0x300, 3).unwrap(), &[0, 0, 7]);
    }

    #[test]
    fn test_store_inclusive() {
        let mut emu = Emulator::new(0);
        for r in 0..16 {
            emu.regs.set_register(r, r + 1);
        }
        emu.index.set_addr(0x400);
        exec(&mut emu, 0xF355);
        assert_eq!(emu.mem.slice(0x400, 5).unwrap(), &[1, 2, 3, 4, 0]);
        assert_eq!(emu.index.0, 0x400);
    }

    #[test]
    fn test_load_inclusive() {
        let mut emu = emu_with(&[0x00, 0xE0, 9, 8, 7, 6]);
        emu.index.set_addr(0x202);
        exec(&mut emu, 0xF265);
        assert_eq!(&emu.regs.as_slice()[..4], &[9, 8, 7, 0]);
    }

    #[test]
    fn test_load_exclusive_quirk() {
        let mut emu = emu_with(&[0x00, 0xE0, 9, 8, 7, 6]).with_quirks(Quirks {
            load_store_exclusive: true,
        });
        emu.index.set_addr(0x202);
        exec(&mut emu, 0xF265);
        assert_eq!(&emu.regs.as_slice()[..4], &[9, 8, 0, 0]);
    }

    #[test]
    fn test_add_to_index() {
        let mut emu = Emulator::new(0);
        emu.index.set_addr(0xFFFF);
        emu.regs.set_register(1, 3);
        exec(&mut emu, 0xF11E);
        assert_eq!(emu.index.0, 0x0002);
    }

    #[test]
    fn test_timer_moves() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(5, 30);
        exec(&mut emu, 0xF515);
        exec(&mut emu, 0xF518);
        assert_eq!(emu.delay_timer.count, 30);
        assert_eq!(emu.sound_timer.count, 30);
        assert!(emu.sound_active());
        emu.tick();
        exec(&mut emu, 0xF607);
        assert_eq!(emu.regs.get(6), 29);
    }

    #[test]
    fn test_key_skips() {
        let mut emu = Emulator::new(0);
        let mut keys = KeyState::new();
        keys.press(0xB);
        emu.regs.set_register(1, 0xB);
        emu.regs.set_register(2, 0x3);

        let skp = |emu: &mut Emulator, code, keys: &KeyState| {
            emu.execute_ins(decode(code, 0).unwrap(), keys).unwrap();
        };
        skp(&mut emu, 0xE19E, &keys);
        assert_eq!(emu.pc.0, 0x204);
        skp(&mut emu, 0xE29E, &keys);
        assert_eq!(emu.pc.0, 0x206);
        skp(&mut emu, 0xE1A1, &keys);
        assert_eq!(emu.pc.0, 0x208);
        skp(&mut emu, 0xE2A1, &keys);
        assert_eq!(emu.pc.0, 0x20C);
    }

    #[test]
    fn test_key_out_of_range_not_held() {
        let mut emu = Emulator::new(0);
        let mut keys = KeyState::new();
        keys.press(0x0);
        emu.regs.set_register(1, 0x10);
        emu.execute_ins(decode(0xE1A1, 0).unwrap(), &keys).unwrap();
        assert_eq!(emu.pc.0, 0x204);
    }

    #[test]
    fn test_get_key_waits() {
        let mut emu = emu_with(&[0xF3, 0x0A]);
        let mut keys = KeyState::new();
        assert_eq!(emu.step(&keys).unwrap(), StepOutcome::AwaitingKey);
        assert!(emu.is_awaiting_key());
        assert_eq!(emu.pc.0, 0x200);

        keys.press(0x7);
        assert_eq!(emu.step(&keys).unwrap(), StepOutcome::KeyTaken(0x7));
        assert!(!emu.is_awaiting_key());
        assert_eq!(emu.regs.get(3), 0x7);
        assert_eq!(emu.pc.0, 0x202);
    }

    #[test]
    fn test_one_press_feeds_one_key_wait() {
        // LD V0, K; LD V1, K
        let mut emu = emu_with(&[0xF0, 0x0A, 0xF1, 0x0A]);
        let mut keys = KeyState::new();
        keys.press(0x7);

        assert_eq!(emu.run(12, &mut keys).unwrap(), 1);
        assert_eq!(emu.regs.get(0), 0x7);
        assert_eq!(emu.regs.get(1), 0);
        assert_eq!(emu.pc.0, 0x202);
        assert!(emu.is_awaiting_key());
        assert_eq!(keys.last_pressed(), None);
        // still held, but holding is not a new press
        assert!(keys.is_down(0x7));
        assert_eq!(emu.step(&keys).unwrap(), StepOutcome::AwaitingKey);

        keys.press(0x9);
        assert_eq!(emu.run(1, &mut keys).unwrap(), 1);
        assert_eq!(emu.regs.get(1), 0x9);
        assert_eq!(emu.pc.0, 0x204);
    }

    #[test]
    fn test_run_stops_at_budget() {
        // LD V0, 1; ADD V0, 1; JP 0x202
        let mut emu = emu_with(&[0x60, 0x01, 0x70, 0x01, 0x12, 0x02]);
        let mut keys = KeyState::new();
        assert_eq!(emu.run(5, &mut keys).unwrap(), 5);
        assert_eq!(emu.regs.get(0), 3);
        assert_eq!(emu.run(0, &mut keys).unwrap(), 0);
    }

    #[test]
    fn test_unknown_instruction_leaves_pc() {
        let mut emu = emu_with(&[0x6A, 0x01, 0xFF, 0xFF]);
        let keys = KeyState::new();
        emu.step(&keys).unwrap();
        match emu.step(&keys) {
            Err(VmError::UnknownInstruction { opcode, pc }) => {
                assert_eq!(opcode, 0xFFFF);
                assert_eq!(pc, 0x202);
            }
            other => panic!("expected UnknownInstruction, got {other:?}"),
        }
        assert_eq!(emu.pc.0, 0x202);
    }

    #[test]
    fn test_fetch_past_end_faults() {
        let mut emu = Emulator::new(0);
        emu.pc.set_addr(0xFFF);
        assert!(matches!(
            emu.step(&KeyState::new()),
            Err(VmError::MemoryFault { addr: 0x1000 })
        ));
    }

    #[test]
    fn test_index_faults_leave_state() {
        let mut emu = Emulator::new(0);
        emu.index.set_addr(0xFFE);
        emu.regs.set_register(0xF, 0x9);
        let keys = KeyState::new();
        for code in [0xD005, 0xF033, 0xF255, 0xF265] {
            let err = emu.execute_ins(decode(code, 0x200).unwrap(), &keys);
            assert!(matches!(err, Err(VmError::MemoryFault { .. })), "{code:#06X}");
        }
        assert_eq!(emu.pc.0, 0x200);
        assert_eq!(emu.regs.get(0xF), 0x9);
        assert_eq!(emu.framebuffer(), &FrameBuffer::new());
        assert_eq!(emu.mem.get(0xFFE).unwrap(), 0);
    }

    #[test]
    fn test_call_depth_faults() {
        let mut emu = Emulator::new(0);
        for _ in 0..16 {
            exec(&mut emu, 0x2200);
        }
        assert_eq!(emu.stack.sp(), 16);
        let err = emu.execute_ins(decode(0x2200, 0x200).unwrap(), &KeyState::new());
        assert!(matches!(err, Err(VmError::StackOverflow { pc: 0x200 })));
        assert_eq!(emu.stack.sp(), 16);
    }

    #[test]
    fn test_return_empty_faults() {
        let mut emu = Emulator::new(0);
        let err = emu.execute_ins(decode(0x00EE, 0x200).unwrap(), &KeyState::new());
        assert!(matches!(err, Err(VmError::StackUnderflow { pc: 0x200 })));
        assert_eq!(emu.pc.0, 0x200);
    }

    #[test]
    fn test_dump_format() {
        let mut emu = Emulator::new(0);
        emu.regs.set_register(0xA, 0x3C);
        emu.index.set_addr(0x123);
        exec(&mut emu, 0x2456);
        let dump = emu.dump().to_string();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 19);
        assert_eq!(lines[0], "V0: 0x00");
        assert_eq!(lines[10], "VA: 0x3C");
        assert_eq!(lines[15], "VF: 0x00");
        assert_eq!(lines[16], "PC: 0x0456");
        assert_eq!(lines[17], "I : 0x0123");
        assert_eq!(lines[18], "SP: 0x01");
    }
}
