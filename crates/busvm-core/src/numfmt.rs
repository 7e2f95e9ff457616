//! Packed number formats.
//!
//! A format byte `fmt0` holds the storage kind in its low nibble and a binary
//! shift in its high nibble. A value stored with shift `s` reads back as
//! `raw / 2^s`. All multi-byte kinds are little-endian.

use core::fmt;

use num_enum::TryFromPrimitive;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum NumKind {
    U8 = 0b0000,
    U16 = 0b0001,
    U32 = 0b0010,
    U64 = 0b0011,
    I8 = 0b0100,
    I16 = 0b0101,
    I32 = 0b0110,
    I64 = 0b0111,
    F8 = 0b1000,
    F16 = 0b1001,
    F32 = 0b1010,
    F64 = 0b1011,
}

impl NumKind {
    #[inline]
    pub fn bytes(self) -> usize {
        1 << (self as u8 & 0b11)
    }

    #[inline]
    pub fn is_plain_int(self) -> bool {
        (self as u8) >> 3 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumFmtError {
    /// Kind nibble not backed by a reader (F8, F16 and `0b11xx`).
    UnsupportedKind(u8),
    /// Shift larger than the storage width in bits.
    ShiftTooLarge { kind: NumKind, shift: u8 },
    /// Format operand does not fit in a byte.
    OutOfRange(u32),
}

impl fmt::Display for NumFmtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumFmtError::UnsupportedKind(k) => write!(f, "unsupported number kind: {:#06b}", k),
            NumFmtError::ShiftTooLarge { kind, shift } => {
                write!(f, "shift {} too large for {:?}", shift, kind)
            }
            NumFmtError::OutOfRange(v) => write!(f, "number format out of range: {}", v),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NumFmtError {}

/// A validated number format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumFmt {
    kind: NumKind,
    shift: u8,
}

impl NumFmt {
    pub fn new(kind: NumKind, shift: u8) -> Result<Self, NumFmtError> {
        if matches!(kind, NumKind::F8 | NumKind::F16) {
            return Err(NumFmtError::UnsupportedKind(kind as u8));
        }
        if shift as usize > kind.bytes() * 8 || shift > 0x0F {
            return Err(NumFmtError::ShiftTooLarge { kind, shift });
        }
        Ok(Self { kind, shift })
    }

    pub fn from_u8(fmt0: u8) -> Result<Self, NumFmtError> {
        let kind = NumKind::try_from(fmt0 & 0x0F)
            .map_err(|_| NumFmtError::UnsupportedKind(fmt0 & 0x0F))?;
        Self::new(kind, fmt0 >> 4)
    }

    pub fn from_u32(fmt0: u32) -> Result<Self, NumFmtError> {
        let byte = u8::try_from(fmt0).map_err(|_| NumFmtError::OutOfRange(fmt0))?;
        Self::from_u8(byte)
    }

    #[inline]
    pub fn to_u8(self) -> u8 {
        self.kind as u8 | self.shift << 4
    }

    #[inline]
    pub fn kind(self) -> NumKind {
        self.kind
    }

    #[inline]
    pub fn shift(self) -> u8 {
        self.shift
    }

    #[inline]
    pub fn bytes(self) -> usize {
        self.kind.bytes()
    }

    /// Read the number stored at `offset`. Reads that run past the end of
    /// `data` produce `Nan`.
    pub fn read(self, data: &[u8], offset: usize) -> Value {
        let end = match offset.checked_add(self.bytes()) {
            Some(end) if end <= data.len() => end,
            _ => return Value::Nan,
        };
        let src = &data[offset..end];

        if self.shift == 0 {
            match self.kind {
                NumKind::U8 => return Value::Int(src[0] as i32),
                NumKind::I8 => return Value::Int(src[0] as i8 as i32),
                NumKind::U16 => return Value::Int(u16::from_le_bytes([src[0], src[1]]) as i32),
                NumKind::I16 => return Value::Int(i16::from_le_bytes([src[0], src[1]]) as i32),
                NumKind::I32 => return Value::Int(i32::from_le_bytes(le4(src))),
                _ => {}
            }
        }

        let raw = match self.kind {
            NumKind::U8 => src[0] as f64,
            NumKind::I8 => src[0] as i8 as f64,
            NumKind::U16 => u16::from_le_bytes([src[0], src[1]]) as f64,
            NumKind::I16 => i16::from_le_bytes([src[0], src[1]]) as f64,
            NumKind::U32 => u32::from_le_bytes(le4(src)) as f64,
            NumKind::I32 => i32::from_le_bytes(le4(src)) as f64,
            NumKind::U64 => u64::from_le_bytes(le8(src)) as f64,
            NumKind::I64 => i64::from_le_bytes(le8(src)) as f64,
            NumKind::F32 => f32::from_le_bytes(le4(src)) as f64,
            NumKind::F64 => f64::from_le_bytes(le8(src)),
            // rejected by the constructor
            NumKind::F8 | NumKind::F16 => return Value::Nan,
        };

        if self.shift == 0 {
            Value::from_f64(raw)
        } else {
            Value::from_f64(raw * shift_multiplier(-(self.shift as i32)))
        }
    }
}

/// `2^shift` built directly from the exponent bits.
#[inline]
pub fn shift_multiplier(shift: i32) -> f64 {
    f64::from_bits(((0x3FF + shift) as u64) << 52)
}

#[inline]
fn le4(src: &[u8]) -> [u8; 4] {
    [src[0], src[1], src[2], src[3]]
}

#[inline]
fn le8(src: &[u8]) -> [u8; 8] {
    [src[0], src[1], src[2], src[3], src[4], src[5], src[6], src[7]]
}
