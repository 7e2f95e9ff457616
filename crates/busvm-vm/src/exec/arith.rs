//! Arithmetic, bitwise and comparison operators.
//!
//! The operators are plain functions over already-evaluated operands. Where
//! both operands are tagged ints an integer fast path is tried first; on
//! overflow or mixed operands the result is recomputed in double precision.

use busvm_core::Value;

use super::handle::{eval_f64, eval_i32};
use crate::context::Context;
use crate::fault::VmResult;
use crate::frame::Activation;

#[inline]
fn doubles(a: Value, b: Value) -> (f64, f64) {
    (a.to_double(), b.to_double())
}

#[inline]
fn ints(a: Value, b: Value) -> Option<(i32, i32)> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Some((a, b)),
        _ => None,
    }
}

pub fn add(a: Value, b: Value) -> Value {
    if let Some(r) = ints(a, b).and_then(|(x, y)| x.checked_add(y)) {
        return Value::Int(r);
    }
    let (af, bf) = doubles(a, b);
    Value::from_f64(af + bf)
}

pub fn sub(a: Value, b: Value) -> Value {
    if let Some(r) = ints(a, b).and_then(|(x, y)| x.checked_sub(y)) {
        return Value::Int(r);
    }
    let (af, bf) = doubles(a, b);
    Value::from_f64(af - bf)
}

pub fn mul(a: Value, b: Value) -> Value {
    if let Some(r) = ints(a, b).and_then(|(x, y)| x.checked_mul(y)) {
        return Value::Int(r);
    }
    let (af, bf) = doubles(a, b);
    Value::from_f64(af * bf)
}

/// Integer result only for exact division; everything else goes through
/// doubles, so `1 / 0` is infinity and `0 / 0` is NaN.
pub fn div(a: Value, b: Value) -> Value {
    if let Some((x, y)) = ints(a, b) {
        // checked_rem is None for y == 0 and for MIN / -1
        if x.checked_rem(y) == Some(0) {
            return Value::Int(x / y);
        }
    }
    let (af, bf) = doubles(a, b);
    Value::from_f64(af / bf)
}

pub fn pow(a: Value, b: Value) -> Value {
    let (af, bf) = doubles(a, b);
    Value::from_f64(af.powf(bf))
}

pub fn bit_and(a: Value, b: Value) -> Value {
    Value::Int(a.to_int() & b.to_int())
}

pub fn bit_or(a: Value, b: Value) -> Value {
    Value::Int(a.to_int() | b.to_int())
}

pub fn bit_xor(a: Value, b: Value) -> Value {
    Value::Int(a.to_int() ^ b.to_int())
}

pub fn shift_left(a: Value, b: Value) -> Value {
    Value::Int(a.to_int().wrapping_shl((b.to_int() & 31) as u32))
}

pub fn shift_right(a: Value, b: Value) -> Value {
    Value::Int(a.to_int() >> (b.to_int() & 31))
}

/// Results with the top bit set do not fit a tagged int and become doubles.
pub fn shift_right_unsigned(a: Value, b: Value) -> Value {
    let r = (a.to_int() as u32) >> (b.to_int() & 31);
    if r >> 31 != 0 {
        Value::Double(r as f64)
    } else {
        Value::Int(r as i32)
    }
}

/// Truncating integer division. Division by zero yields 0.
pub fn idiv(a: Value, b: Value) -> Value {
    let (x, y) = (a.to_int(), b.to_int());
    if y == 0 {
        return Value::ZERO;
    }
    Value::Int(x.wrapping_div(y))
}

pub fn imul(a: Value, b: Value) -> Value {
    Value::Int((a.to_int() as u32).wrapping_mul(b.to_int() as u32) as i32)
}

pub fn eq(a: Value, b: Value) -> Value {
    Value::Bool(match ints(a, b) {
        Some((x, y)) => x == y,
        None => a.to_double() == b.to_double(),
    })
}

pub fn ne(a: Value, b: Value) -> Value {
    Value::Bool(match ints(a, b) {
        Some((x, y)) => x != y,
        None => a.to_double() != b.to_double(),
    })
}

pub fn lt(a: Value, b: Value) -> Value {
    Value::Bool(match ints(a, b) {
        Some((x, y)) => x < y,
        None => a.to_double() < b.to_double(),
    })
}

pub fn le(a: Value, b: Value) -> Value {
    Value::Bool(match ints(a, b) {
        Some((x, y)) => x <= y,
        None => a.to_double() <= b.to_double(),
    })
}

/// `Some(a < b)`, or `None` if either side is NaN as a double.
fn less(a: Value, b: Value) -> Option<bool> {
    if let Some((x, y)) = ints(a, b) {
        return Some(x < y);
    }
    let (af, bf) = doubles(a, b);
    if af.is_nan() || bf.is_nan() {
        None
    } else {
        Some(af < bf)
    }
}

/// Larger operand, returned as given; `Nan` if either is NaN.
pub fn max(a: Value, b: Value) -> Value {
    match less(a, b) {
        Some(true) => b,
        Some(false) => a,
        None => Value::Nan,
    }
}

/// Smaller operand, returned as given; `Nan` if either is NaN.
pub fn min(a: Value, b: Value) -> Value {
    match less(a, b) {
        Some(true) => a,
        Some(false) => b,
        None => Value::Nan,
    }
}

pub fn neg(v: Value) -> Value {
    match v {
        Value::Int(i32::MIN) => Value::MAX_INT_1,
        Value::Int(x) => Value::Int(-x),
        _ => Value::from_f64(-v.to_double()),
    }
}

/// Non-numeric operands that are not negative as doubles come back unchanged.
pub fn abs(v: Value) -> Value {
    match v {
        Value::Int(i32::MIN) => Value::MAX_INT_1,
        Value::Int(x) => Value::Int(x.abs()),
        _ => {
            let f = v.to_double();
            if f < 0.0 {
                Value::from_f64(-f)
            } else {
                v
            }
        }
    }
}

pub fn bit_not(v: Value) -> Value {
    Value::Int(!v.to_int())
}

pub fn ceil(v: Value) -> Value {
    match v {
        Value::Int(_) => v,
        _ => Value::from_f64(v.to_double().ceil()),
    }
}

pub fn floor(v: Value) -> Value {
    match v {
        Value::Int(_) => v,
        _ => Value::from_f64(v.to_double().floor()),
    }
}

/// Half-way cases round away from zero.
pub fn round(v: Value) -> Value {
    match v {
        Value::Int(_) => v,
        _ => Value::from_f64(v.to_double().round()),
    }
}

pub fn not(v: Value) -> Value {
    Value::Int(!v.to_bool() as i32)
}

pub fn log_e(v: Value) -> Value {
    Value::from_f64(v.to_double().ln())
}

/// Uniform double in `[0, x)`.
pub(crate) fn exec_random(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let x = eval_f64(frame, ctx)?;
    Ok(Value::from_f64(ctx.rng.f64() * x))
}

/// Uniform int in `[0, n]`, both ends included. Negative bounds give 0.
pub(crate) fn exec_random_int(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let n = eval_i32(frame, ctx)?;
    if n <= 0 {
        return Ok(Value::ZERO);
    }
    Ok(Value::Int(ctx.rng.i32(0..=n)))
}
