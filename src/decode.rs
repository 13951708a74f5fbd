use std::fmt;

use crate::{error::VmError, memory::TypeAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInstruction {
    code: u16,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction { code }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    // n is starting digit, m is length
    pub fn nth_m_digits(&self, n: u8, m: u8) -> u16 {
        // 0110 1100 1111 0001
        // -------------------
        // 1111 1111 1111 1111
        //      1111 1111 1111
        //           1111 1111
        //                1111
        let shift_places = (4 - m - (n - 1)) * 4;
        let mask = (1u32 << (m * 4)) - 1;
        (self.code >> shift_places) & mask as u16
    }

    /// NNN
    pub fn addr(&self) -> TypeAddr {
        self.nth_m_digits(2, 3)
    }

    /// X
    pub fn x(&self) -> u8 {
        self.nth_m_digits(2, 1) as u8
    }

    /// Y
    pub fn y(&self) -> u8 {
        self.nth_m_digits(3, 1) as u8
    }

    /// NN
    pub fn kk(&self) -> u8 {
        self.nth_m_digits(3, 2) as u8
    }

    /// N, sprite height
    pub fn n(&self) -> u8 {
        self.nth_m_digits(4, 1) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // 00E0
    // turn all pixels off
    ClearScreen,
    // 00EE
    PopSubroutine,
    // 1NNN
    // set PC to address NNN, "jump" to memory location
    Jump,
    // 2NNN
    PushSubroutine,
    // 3XNN
    SkipEqualConstant,
    // 4XNN
    SkipNotEqualConstant,
    // 5XY0, low nibble ignored
    SkipEqualRegister,
    // 6XNN
    // set register VX to value NN
    SetRegister,
    // 7XNN
    // add value NN to VX, no carry flag
    AddToRegister,

    // 8XY0
    CopyRegister,
    // 8XY1
    Or,
    // 8XY2
    And,
    // 8XY3
    XOr,
    // 8XY4
    Add,
    // 8XY5
    SubtractForward,
    // 8XY6
    RightShift,
    // 8XY7
    SubtractBackward,
    // 8XYE
    LeftShift,

    // 9XY0, low nibble ignored
    SkipNotEqualRegister,
    // ANNN
    // set index register I to address NNN
    SetIndexRegister,
    // BNNN
    JumpWithOffset,
    // CXNN
    Random,
    // DXYN
    // draw an N pixel tall sprite starting at I at (VX, VY)
    // XOR pixels on screen using sprite data
    // if a lit pixel is switched off: VF set to 1
    Display,

    // EX9E
    SkipIfPressed,
    // EXA1
    SkipIfNotPressed,

    // FX07
    CopyDelayToRegister,
    // FX0A
    GetKey,
    // FX15
    CopyRegisterToDelay,
    // FX18
    CopyRegisterToSound,
    // FX1E
    AddToIndex,
    // FX29
    PointChar,
    // FX33
    ToDecimal,
    // FX55
    StoreRegisterToMemory,
    // FX65
    LoadRegisterFromMemory,
}

/// First entry whose `opcode & mask == value` wins.
pub const DECODE_TABLE: [(u16, u16, Op); 34] = [
    (0xFFFF, 0x00E0, Op::ClearScreen),
    (0xFFFF, 0x00EE, Op::PopSubroutine),
    (0xF000, 0x1000, Op::Jump),
    (0xF000, 0x2000, Op::PushSubroutine),
    (0xF000, 0x3000, Op::SkipEqualConstant),
    (0xF000, 0x4000, Op::SkipNotEqualConstant),
    (0xF000, 0x5000, Op::SkipEqualRegister),
    (0xF000, 0x6000, Op::SetRegister),
    (0xF000, 0x7000, Op::AddToRegister),
    (0xF00F, 0x8000, Op::CopyRegister),
    (0xF00F, 0x8001, Op::Or),
    (0xF00F, 0x8002, Op::And),
    (0xF00F, 0x8003, Op::XOr),
    (0xF00F, 0x8004, Op::Add),
    (0xF00F, 0x8005, Op::SubtractForward),
    (0xF00F, 0x8006, Op::RightShift),
    (0xF00F, 0x8007, Op::SubtractBackward),
    (0xF00F, 0x800E, Op::LeftShift),
    (0xF000, 0x9000, Op::SkipNotEqualRegister),
    (0xF000, 0xA000, Op::SetIndexRegister),
    (0xF000, 0xB000, Op::JumpWithOffset),
    (0xF000, 0xC000, Op::Random),
    (0xF000, 0xD000, Op::Display),
    (0xF0FF, 0xE09E, Op::SkipIfPressed),
    (0xF0FF, 0xE0A1, Op::SkipIfNotPressed),
    (0xF0FF, 0xF007, Op::CopyDelayToRegister),
    (0xF0FF, 0xF00A, Op::GetKey),
    (0xF0FF, 0xF015, Op::CopyRegisterToDelay),
    (0xF0FF, 0xF018, Op::CopyRegisterToSound),
    (0xF0FF, 0xF01E, Op::AddToIndex),
    (0xF0FF, 0xF029, Op::PointChar),
    (0xF0FF, 0xF033, Op::ToDecimal),
    (0xF0FF, 0xF055, Op::StoreRegisterToMemory),
    (0xF0FF, 0xF065, Op::LoadRegisterFromMemory),
];

/// A decoded instruction: what to do, plus the raw word its operands come
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub raw: RawInstruction,
}

impl Instruction {
    pub fn addr(&self) -> TypeAddr {
        self.raw.addr()
    }

    pub fn x(&self) -> u8 {
        self.raw.x()
    }

    pub fn y(&self) -> u8 {
        self.raw.y()
    }

    pub fn kk(&self) -> u8 {
        self.raw.kk()
    }

    pub fn n(&self) -> u8 {
        self.raw.n()
    }
}

/// Decode a fetched word. `pc` is only used to report where an unknown
/// instruction was found.
pub fn decode(code: u16, pc: TypeAddr) -> Result<Instruction, VmError> {
    DECODE_TABLE
        .iter()
        .find(|(mask, value, _)| code & mask == *value)
        .map(|&(_, _, op)| Instruction {
            op,
            raw: RawInstruction::new(code),
        })
        .ok_or(VmError::UnknownInstruction { opcode: code, pc })
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, kk, addr) = (self.x(), self.y(), self.kk(), self.addr());
        match self.op {
            Op::ClearScreen => write!(f, "CLS"),
            Op::PopSubroutine => write!(f, "RET"),
            Op::Jump => write!(f, "JP {addr:#05X}"),
            Op::PushSubroutine => write!(f, "CALL {addr:#05X}"),
            Op::SkipEqualConstant => write!(f, "SE V{x:X}, {kk:#04X}"),
            Op::SkipNotEqualConstant => write!(f, "SNE V{x:X}, {kk:#04X}"),
            Op::SkipEqualRegister => write!(f, "SE V{x:X}, V{y:X}"),
            Op::SetRegister => write!(f, "LD V{x:X}, {kk:#04X}"),
            Op::AddToRegister => write!(f, "ADD V{x:X}, {kk:#04X}"),
            Op::CopyRegister => write!(f, "LD V{x:X}, V{y:X}"),
            Op::Or => write!(f, "OR V{x:X}, V{y:X}"),
            Op::And => write!(f, "AND V{x:X}, V{y:X}"),
            Op::XOr => write!(f, "XOR V{x:X}, V{y:X}"),
            Op::Add => write!(f, "ADD V{x:X}, V{y:X}"),
            Op::SubtractForward => write!(f, "SUB V{x:X}, V{y:X}"),
            Op::RightShift => write!(f, "SHR V{x:X}"),
            Op::SubtractBackward => write!(f, "SUBN V{x:X}, V{y:X}"),
            Op::LeftShift => write!(f, "SHL V{x:X}"),
            Op::SkipNotEqualRegister => write!(f, "SNE V{x:X}, V{y:X}"),
            Op::SetIndexRegister => write!(f, "LD I, {addr:#05X}"),
            Op::JumpWithOffset => write!(f, "JP V0, {addr:#05X}"),
            Op::Random => write!(f, "RND V{x:X}, {kk:#04X}"),
            Op::Display => write!(f, "DRW V{x:X}, V{y:X}, {}", self.n()),
            Op::SkipIfPressed => write!(f, "SKP V{x:X}"),
            Op::SkipIfNotPressed => write!(f, "SKNP V{x:X}"),
            Op::CopyDelayToRegister => write!(f, "LD V{x:X}, DT"),
            Op::GetKey => write!(f, "LD V{x:X}, K"),
            Op::CopyRegisterToDelay => write!(f, "LD DT, V{x:X}"),
            Op::CopyRegisterToSound => write!(f, "LD ST, V{x:X}"),
            Op::AddToIndex => write!(f, "ADD I, V{x:X}"),
            Op::PointChar => write!(f, "LD F, V{x:X}"),
            Op::ToDecimal => write!(f, "LD B, V{x:X}"),
            Op::StoreRegisterToMemory => write!(f, "LD [I], V{x:X}"),
            Op::LoadRegisterFromMemory => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[test]
fn test_bit_manip() {
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(2, 1), 0xC);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(3, 1), 0xE);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(1, 1), 0x4);

    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(1, 2), 0x4C);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(2, 2), 0xCE);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(1, 4), 0x4CEE);
}

#[test]
fn test_fields() {
    let raw = RawInstruction::new(0xD12F);
    assert_eq!(raw.x(), 0x1);
    assert_eq!(raw.y(), 0x2);
    assert_eq!(raw.n(), 0xF);
    assert_eq!(raw.kk(), 0x2F);
    assert_eq!(raw.addr(), 0x12F);
    assert_eq!(raw.code(), 0xD12F);
}

#[test]
fn test_decode_families() {
    let cases = [
        (0x00E0, Op::ClearScreen),
        (0x00EE, Op::PopSubroutine),
        (0x1ABC, Op::Jump),
        (0x2ABC, Op::PushSubroutine),
        (0x3A12, Op::SkipEqualConstant),
        (0x4A12, Op::SkipNotEqualConstant),
        (0x5AB0, Op::SkipEqualRegister),
        (0x6A12, Op::SetRegister),
        (0x7A12, Op::AddToRegister),
        (0x8AB0, Op::CopyRegister),
        (0x8AB1, Op::Or),
        (0x8AB2, Op::And),
        (0x8AB3, Op::XOr),
        (0x8AB4, Op::Add),
        (0x8AB5, Op::SubtractForward),
        (0x8AB6, Op::RightShift),
        (0x8AB7, Op::SubtractBackward),
        (0x8ABE, Op::LeftShift),
        (0x9AB0, Op::SkipNotEqualRegister),
        (0xAABC, Op::SetIndexRegister),
        (0xBABC, Op::JumpWithOffset),
        (0xCA12, Op::Random),
        (0xDAB5, Op::Display),
        (0xEA9E, Op::SkipIfPressed),
        (0xEAA1, Op::SkipIfNotPressed),
        (0xFA07, Op::CopyDelayToRegister),
        (0xFA0A, Op::GetKey),
        (0xFA15, Op::CopyRegisterToDelay),
        (0xFA18, Op::CopyRegisterToSound),
        (0xFA1E, Op::AddToIndex),
        (0xFA29, Op::PointChar),
        (0xFA33, Op::ToDecimal),
        (0xFA55, Op::StoreRegisterToMemory),
        (0xFA65, Op::LoadRegisterFromMemory),
    ];
    for (code, op) in cases {
        assert_eq!(decode(code, 0x200).unwrap().op, op, "{code:#06X}");
    }
}

#[test]
fn test_low_nibble_ignored_in_5_and_9() {
    assert_eq!(decode(0x5AB1, 0x200).unwrap().op, Op::SkipEqualRegister);
    assert_eq!(decode(0x5ABF, 0x200).unwrap().op, Op::SkipEqualRegister);
    assert_eq!(decode(0x9AB7, 0x200).unwrap().op, Op::SkipNotEqualRegister);
}

#[test]
fn test_decode_unknown() {
    // unmatched sub-selectors in 0/8/E/F, including SYS calls
    for code in [
        0x0000, 0x00E1, 0x0123, 0x8AB8, 0x8ABF, 0xEA9F, 0xE000, 0xFA00, 0xFA66,
    ] {
        match decode(code, 0x234) {
            Err(VmError::UnknownInstruction { opcode, pc }) => {
                assert_eq!(opcode, code);
                assert_eq!(pc, 0x234);
            }
            other => panic!("{code:#06X} decoded to {other:?}"),
        }
    }
}

#[test]
fn test_disassembly() {
    let text = |code| decode(code, 0x200).unwrap().to_string();
    assert_eq!(text(0x00E0), "CLS");
    assert_eq!(text(0x2300), "CALL 0x300");
    assert_eq!(text(0x6A2F), "LD VA, 0x2F");
    assert_eq!(text(0x8017), "SUBN V0, V1");
    assert_eq!(text(0xD125), "DRW V1, V2, 5");
    assert_eq!(text(0xF365), "LD V3, [I]");
    assert_eq!(text(0xB010), "JP V0, 0x010");
}
