//! Dynamic values and their packed 64-bit representation.
//!
//! Script values travel through the engine as [`Value`]. Globals, locals and
//! host-side storage may keep them packed as a [`RawValue`], a single `u64`
//! that is either a plain IEEE-754 double or a pattern from a reserved NaN
//! payload range:
//!
//! ```text
//! 0xFFFF_xxxx_iiii_iiii   tagged int (low 32 bits)
//! 0xFFFE_0000_0000_00ss   special (null, undefined, false, true, packet buffer)
//! 0xFFFD_00kk_iiii_iiii   handle (kind k, index i)
//! 0x7FF8_0000_0000_0000   canonical NaN
//! ```
//!
//! Finite and infinite doubles never have an all-ones exponent, and the
//! canonical NaN has a clear sign bit, so the reserved range cannot collide
//! with any of them. Any other NaN bit pattern decodes to [`Value::Nan`].

use num_enum::{IntoPrimitive, TryFromPrimitive};

const TAG_MASK: u64 = 0xFFFF_0000_0000_0000;
const TAG_INT: u64 = 0xFFFF_0000_0000_0000;
const TAG_SPECIAL: u64 = 0xFFFE_0000_0000_0000;
const TAG_HANDLE: u64 = 0xFFFD_0000_0000_0000;
const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

const SPECIAL_NULL: u64 = 0;
const SPECIAL_UNDEFINED: u64 = 1;
const SPECIAL_FALSE: u64 = 2;
const SPECIAL_TRUE: u64 = 3;
const SPECIAL_PKT_BUFFER: u64 = 4;

/// `-(i32::MIN)` as a double; the result of negating the most negative int.
pub const MAX_INT_PLUS_ONE: f64 = 2147483648.0;

/// External table a handle indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HandleKind {
    Fiber = 1,
    Role = 2,
    ImageBuffer = 3,
    GcObject = 4,
}

/// Reference to an entity outside the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub kind: HandleKind,
    pub index: u32,
}

impl Handle {
    #[inline]
    pub const fn new(kind: HandleKind, index: u32) -> Self {
        Self { kind, index }
    }
}

/// Object type codes reported by the `typeof` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ObjectType {
    Undefined = 0,
    Number = 1,
    Map = 2,
    Array = 3,
    Buffer = 4,
    Role = 5,
    Bool = 6,
    Fiber = 7,
    Null = 8,
}

/// A dynamic script value.
///
/// `Double` never holds a NaN; use [`Value::from_f64`] to build values from
/// arithmetic results so that NaN is normalized to [`Value::Nan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Double(f64),
    Int(i32),
    Bool(bool),
    Null,
    Undefined,
    Nan,
    /// Payload of the packet currently being dispatched.
    PacketBuffer,
    Handle(Handle),
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::from_f64(v)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Handle(h)
    }
}

impl Value {
    pub const ZERO: Value = Value::Int(0);
    pub const MAX_INT_1: Value = Value::Double(MAX_INT_PLUS_ONE);

    /// Wrap a double, collapsing every NaN into the `Nan` sentinel.
    #[inline]
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            Value::Nan
        } else {
            Value::Double(v)
        }
    }

    #[inline]
    pub const fn handle(kind: HandleKind, index: u32) -> Self {
        Value::Handle(Handle::new(kind, index))
    }

    #[inline]
    pub fn is_tagged_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// Collapse a NaN `Double` into the `Nan` sentinel; other values pass through.
    #[inline]
    pub fn normalized(self) -> Self {
        match self {
            Value::Double(v) => Value::from_f64(v),
            other => other,
        }
    }

    #[inline]
    pub fn is_nan(self) -> bool {
        match self {
            Value::Nan => true,
            Value::Double(v) => v.is_nan(),
            _ => false,
        }
    }

    #[inline]
    pub fn as_handle(self) -> Option<Handle> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Index of a handle of the given kind.
    #[inline]
    pub fn handle_index(self, kind: HandleKind) -> Option<u32> {
        match self {
            Value::Handle(h) if h.kind == kind => Some(h.index),
            _ => None,
        }
    }

    pub fn to_bool(self) -> bool {
        match self {
            Value::Int(v) => v != 0,
            Value::Double(v) => v != 0.0 && !v.is_nan(),
            Value::Bool(b) => b,
            Value::Null | Value::Undefined | Value::Nan => false,
            Value::PacketBuffer | Value::Handle(_) => true,
        }
    }

    /// Convert to a 32-bit integer.
    ///
    /// Doubles truncate toward zero and saturate at the `i32` bounds; NaN and
    /// non-numeric values convert to 0.
    pub fn to_int(self) -> i32 {
        match self {
            Value::Int(v) => v,
            Value::Double(v) => v as i32,
            Value::Bool(b) => b as i32,
            _ => 0,
        }
    }

    pub fn to_double(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Double(v) => v,
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        }
    }

    /// Classify the value. `gc_type` resolves heap objects, which only the
    /// owner of the heap can tell apart.
    pub fn type_of<F>(self, gc_type: F) -> ObjectType
    where
        F: FnOnce(u32) -> Option<ObjectType>,
    {
        match self {
            Value::Int(_) | Value::Double(_) | Value::Nan => ObjectType::Number,
            Value::Bool(_) => ObjectType::Bool,
            Value::Null => ObjectType::Null,
            Value::Undefined => ObjectType::Undefined,
            Value::PacketBuffer => ObjectType::Buffer,
            Value::Handle(h) => match h.kind {
                HandleKind::Fiber => ObjectType::Fiber,
                HandleKind::Role => ObjectType::Role,
                HandleKind::ImageBuffer => ObjectType::Buffer,
                HandleKind::GcObject => gc_type(h.index).unwrap_or(ObjectType::Undefined),
            },
        }
    }

    pub fn encode(self) -> RawValue {
        let bits = match self {
            Value::Double(v) if v.is_nan() => CANONICAL_NAN,
            Value::Double(v) => v.to_bits(),
            Value::Int(v) => TAG_INT | v as u32 as u64,
            Value::Null => TAG_SPECIAL | SPECIAL_NULL,
            Value::Undefined => TAG_SPECIAL | SPECIAL_UNDEFINED,
            Value::Bool(false) => TAG_SPECIAL | SPECIAL_FALSE,
            Value::Bool(true) => TAG_SPECIAL | SPECIAL_TRUE,
            Value::PacketBuffer => TAG_SPECIAL | SPECIAL_PKT_BUFFER,
            Value::Nan => CANONICAL_NAN,
            Value::Handle(h) => TAG_HANDLE | (u8::from(h.kind) as u64) << 32 | h.index as u64,
        };
        RawValue(bits)
    }
}

/// A value packed into one 64-bit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawValue(u64);

impl RawValue {
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Unpack the slot. Returns `None` for patterns inside the reserved range
    /// that no value encodes to (unknown special or handle kind).
    pub fn decode(self) -> Option<Value> {
        let bits = self.0;
        match bits & TAG_MASK {
            TAG_INT => Some(Value::Int(bits as u32 as i32)),
            TAG_SPECIAL => match bits & !TAG_MASK {
                SPECIAL_NULL => Some(Value::Null),
                SPECIAL_UNDEFINED => Some(Value::Undefined),
                SPECIAL_FALSE => Some(Value::Bool(false)),
                SPECIAL_TRUE => Some(Value::Bool(true)),
                SPECIAL_PKT_BUFFER => Some(Value::PacketBuffer),
                _ => None,
            },
            TAG_HANDLE => {
                if bits & 0x0000_FF00_0000_0000 != 0 {
                    return None;
                }
                let kind = HandleKind::try_from((bits >> 32) as u8).ok()?;
                Some(Value::handle(kind, bits as u32))
            }
            _ => Some(Value::from_f64(f64::from_bits(bits))),
        }
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        v.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(v: Value) -> Value {
        v.encode().decode().expect("decodable")
    }

    #[test]
    fn test_int_roundtrip() {
        for v in [0, 1, -1, 111, -16, i32::MAX, i32::MIN, 0x1234_5678] {
            assert_eq!(roundtrip(Value::Int(v)), Value::Int(v));
        }
    }

    #[test]
    fn test_double_roundtrip_bit_identical() {
        for v in [0.0, -0.0, 1.5, -2.25e300, f64::MIN_POSITIVE, f64::INFINITY, f64::NEG_INFINITY] {
            match roundtrip(Value::Double(v)) {
                Value::Double(d) => assert_eq!(d.to_bits(), v.to_bits()),
                other => panic!("expected double, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_specials_distinct() {
        let specials = [
            Value::Nan,
            Value::Null,
            Value::Undefined,
            Value::Bool(true),
            Value::Bool(false),
            Value::PacketBuffer,
            Value::handle(HandleKind::Fiber, 0),
            Value::handle(HandleKind::Role, 0),
            Value::handle(HandleKind::ImageBuffer, 0),
            Value::handle(HandleKind::GcObject, 0),
        ];
        for (i, a) in specials.iter().enumerate() {
            assert_eq!(roundtrip(*a), *a);
            for b in &specials[i + 1..] {
                assert_ne!(a.encode(), b.encode(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_arithmetic_nan_is_sentinel() {
        let zero = 0.0f64;
        assert_eq!(Value::from_f64(zero / zero), Value::Nan);
        // x86 produces a negative NaN here; it must not land in the tag space
        let neg_nan = f64::from_bits(0xFFF8_0000_0000_0000);
        assert_eq!(RawValue::from_bits(neg_nan.to_bits()).decode(), Some(Value::Nan));
        assert_eq!(Value::Double(f64::NAN).encode(), Value::Nan.encode());
    }

    #[test]
    fn test_nan_double_reads_as_nan() {
        let raw = Value::Double(f64::NAN);
        assert!(raw.is_nan());
        assert!(!raw.to_bool());
        assert_eq!(raw.normalized(), Value::Nan);
        assert_eq!(roundtrip(raw), Value::Nan);
        assert_eq!(Value::Double(1.5).normalized(), Value::Double(1.5));
        assert_eq!(Value::Int(7).normalized(), Value::Int(7));
        assert!(!Value::Double(f64::INFINITY).is_nan());
    }

    #[test]
    fn test_handle_index_roundtrip() {
        let v = Value::handle(HandleKind::ImageBuffer, u32::MAX);
        assert_eq!(roundtrip(v), v);
        assert_eq!(v.handle_index(HandleKind::ImageBuffer), Some(u32::MAX));
        assert_eq!(v.handle_index(HandleKind::Role), None);
    }

    #[test]
    fn test_reserved_garbage_rejected() {
        assert_eq!(RawValue::from_bits(TAG_SPECIAL | 99).decode(), None);
        assert_eq!(RawValue::from_bits(TAG_HANDLE | 9 << 32).decode(), None);
    }

    #[test]
    fn test_to_int() {
        assert_eq!(Value::Double(3.9).to_int(), 3);
        assert_eq!(Value::Double(-3.9).to_int(), -3);
        assert_eq!(Value::Double(1e20).to_int(), i32::MAX);
        assert_eq!(Value::Double(-1e20).to_int(), i32::MIN);
        assert_eq!(Value::Nan.to_int(), 0);
        assert_eq!(Value::Undefined.to_int(), 0);
        assert_eq!(Value::Bool(true).to_int(), 1);
    }

    #[test]
    fn test_to_bool() {
        assert!(!Value::Int(0).to_bool());
        assert!(Value::Int(-3).to_bool());
        assert!(!Value::Double(0.0).to_bool());
        assert!(!Value::Nan.to_bool());
        assert!(!Value::Null.to_bool());
        assert!(Value::handle(HandleKind::Role, 0).to_bool());
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Int(1).type_of(|_| None), ObjectType::Number);
        assert_eq!(Value::Nan.type_of(|_| None), ObjectType::Number);
        assert_eq!(Value::PacketBuffer.type_of(|_| None), ObjectType::Buffer);
        let obj = Value::handle(HandleKind::GcObject, 3);
        assert_eq!(obj.type_of(|_| Some(ObjectType::Array)), ObjectType::Array);
        assert_eq!(obj.type_of(|_| None), ObjectType::Undefined);
        assert_eq!(u8::from(ObjectType::Null), 8);
    }
}
