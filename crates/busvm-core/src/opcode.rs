//! Expression opcodes and operand encoding.
//!
//! An expression is a prefix tree of bytes. Each node is one of:
//! - a compact small-int literal: byte `>= 0x80`, value `byte - 0x80 - 16`
//! - an opcode byte `< 0x80`, followed by its immediate operands (if any)
//!   and then its sub-expressions, left to right
//!
//! Immediate operands use a variable-length integer: a byte below
//! [`FIRST_MULTIBYTE_INT`] is the value itself; otherwise the low two bits give
//! the number of big-endian bytes that follow (minus one) and bit 2 negates.

use num_enum::TryFromPrimitive;

/// First byte that encodes a compact small-int literal.
pub const SMALL_INT_BASE: u8 = 0x80;
/// Bias applied to compact literals.
pub const SMALL_INT_BIAS: i32 = 16;
pub const SMALL_INT_MIN: i32 = -SMALL_INT_BIAS;
pub const SMALL_INT_MAX: i32 = 0x7F - SMALL_INT_BIAS;

/// First operand byte that starts a multi-byte integer.
pub const FIRST_MULTIBYTE_INT: u8 = 0xF8;
pub const MULTIBYTE_NEGATE: u8 = 0x04;

/// Value of a compact literal byte. Only meaningful for bytes at or above
/// [`SMALL_INT_BASE`]; lower bytes wrap instead of panicking.
#[inline]
pub const fn small_int(byte: u8) -> i32 {
    byte.wrapping_sub(SMALL_INT_BASE) as i32 - SMALL_INT_BIAS
}

/// Compact literal byte for `v`, if it is in range.
#[inline]
pub fn small_int_byte(v: i32) -> Option<u8> {
    if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(&v) {
        Some(SMALL_INT_BASE + (v + SMALL_INT_BIAS) as u8)
    } else {
        None
    }
}

/// Expression opcodes.
///
/// Name prefixes in the comments give the shape: `x` takes an immediate
/// operand, the digit is the number of sub-expressions.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum ExprOp {
    /// Reserved; always faults.
    Invalid = 0,

    // === LOAD ===
    LoadLocal,  // x
    LoadParam,  // x
    LoadGlobal, // x
    LoadBuffer, // 3: buffer, numfmt, offset
    Literal,    // x
    LiteralF64, // x: float pool index
    RetVal,     // 0
    NowMs,      // 0

    // === PACKET ===
    Str0Eq,         // 2: buffer, offset
    PktSize,        // 0
    PktEvCode,      // 0
    PktRegGetCode,  // 0
    PktCommandCode, // 0
    PktReportCode,  // 0
    PktBuffer,      // 0

    // === HANDLE ===
    RoleIsConnected, // 1
    GetFiberHandle,  // 1
    StaticRole,      // x
    StaticBuffer,    // x

    // === OBJECT ===
    GetField,     // x, 1
    Index,        // 2
    ObjectLength, // 1
    KeysLength,   // 1
    TypeOf,       // 1
    IsNull,       // 1

    // === CONST ===
    Null,
    True,
    False,
    Nan,

    // === UNARY ===
    Abs,
    BitNot,
    Ceil,
    Floor,
    Round,
    Id,
    IsNan,
    LogE,
    Neg,
    Not,
    Random,
    RandomInt,
    ToBool,

    // === BINARY ===
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
    Idiv,
    Imul,
    Eq,
    Le,
    Lt,
    Ne,
    Max,
    Min,
}

impl ExprOp {
    pub const PAST_LAST: u8 = Self::Min as u8 + 1;

    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Number of sub-expressions the opcode evaluates.
    pub fn arity(self) -> u8 {
        use ExprOp::*;
        match self {
            Invalid | LoadLocal | LoadParam | LoadGlobal | Literal | LiteralF64 | RetVal
            | NowMs | PktSize | PktEvCode | PktRegGetCode | PktCommandCode | PktReportCode
            | PktBuffer | StaticRole | StaticBuffer | Null | True | False | Nan => 0,
            RoleIsConnected | GetFiberHandle | GetField | ObjectLength | KeysLength | TypeOf
            | IsNull | Abs | BitNot | Ceil | Floor | Round | Id | IsNan | LogE | Neg | Not
            | Random | RandomInt | ToBool => 1,
            LoadBuffer => 3,
            _ => 2,
        }
    }

    /// Whether the opcode is followed by an immediate integer operand.
    pub fn has_immediate(self) -> bool {
        use ExprOp::*;
        matches!(
            self,
            LoadLocal | LoadParam | LoadGlobal | Literal | LiteralF64 | StaticRole | StaticBuffer
                | GetField
        )
    }
}
