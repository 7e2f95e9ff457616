//! Expression evaluation.
//!
//! Expressions are prefix-encoded trees: each opcode is followed by its
//! immediate operand (if any) and then by its sub-expressions, which the
//! handler evaluates recursively in order.

mod arith;
mod handle;
mod load;
mod object;
mod packet;

pub use arith::*;
pub use handle::{
    buffer_data, eval_buffer, eval_buffer_data, eval_f64, eval_i32, eval_map, eval_role,
    eval_string_index, eval_u32,
};

use busvm_core::opcode::{small_int, SMALL_INT_BASE};
use busvm_core::{ExprOp, Value};
use tracing::trace;

use crate::context::Context;
use crate::fault::{Fault, VmResult};
use crate::frame::Activation;

/// Evaluate the expression starting at the frame's pc.
///
/// On return the pc is just past the expression, unless a fault cut it
/// short. The context's depth counter is back where it was either way.
pub fn exec_expr(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let byte = frame.fetch_byte(ctx)?;
    if byte >= SMALL_INT_BASE {
        return Ok(Value::Int(small_int(byte)));
    }

    ctx.expr_depth += 1;
    if ctx.expr_depth > ctx.config.max_expr_depth {
        ctx.expr_depth -= 1;
        return Err(ctx.fail(Fault::ExprTooDeep));
    }

    let r = match ExprOp::from_u8(byte) {
        Some(op) => {
            trace!(?op, pc = frame.pc() - 1, depth = ctx.expr_depth, "expr");
            dispatch(op, frame, ctx)
        }
        None => Err(ctx.fail(Fault::InvalidOpcode)),
    };
    ctx.expr_depth -= 1;
    r
}

/// Evaluate two sub-expressions, left first.
pub fn eval_pair(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<(Value, Value)> {
    let a = exec_expr(frame, ctx)?;
    let b = exec_expr(frame, ctx)?;
    Ok((a, b))
}

#[inline]
fn unary(
    frame: &mut Activation<'_>,
    ctx: &mut Context,
    f: fn(Value) -> Value,
) -> VmResult<Value> {
    exec_expr(frame, ctx).map(f)
}

#[inline]
fn binary(
    frame: &mut Activation<'_>,
    ctx: &mut Context,
    f: fn(Value, Value) -> Value,
) -> VmResult<Value> {
    let (a, b) = eval_pair(frame, ctx)?;
    Ok(f(a, b))
}

fn dispatch(op: ExprOp, frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    match op {
        ExprOp::Invalid => Err(ctx.fail(Fault::InvalidExpr)),

        ExprOp::LoadLocal => load::exec_load_local(frame, ctx),
        ExprOp::LoadParam => load::exec_load_param(frame, ctx),
        ExprOp::LoadGlobal => load::exec_load_global(frame, ctx),
        ExprOp::LoadBuffer => packet::exec_load_buffer(frame, ctx),
        ExprOp::Literal => load::exec_literal(frame, ctx),
        ExprOp::LiteralF64 => load::exec_literal_f64(frame, ctx),
        ExprOp::RetVal => Ok(load::exec_ret_val(frame, ctx)),
        ExprOp::NowMs => Ok(Value::from_f64(ctx.now_ms as f64)),

        ExprOp::Str0Eq => packet::exec_str0eq(frame, ctx),
        ExprOp::PktSize => Ok(Value::Int(ctx.packet.service_size as i32)),
        ExprOp::PktEvCode => Ok(packet::ev_code(&ctx.packet)),
        ExprOp::PktRegGetCode => Ok(packet::reg_get_code(&ctx.packet)),
        ExprOp::PktCommandCode => Ok(packet::command_code(&ctx.packet)),
        ExprOp::PktReportCode => Ok(packet::report_code(&ctx.packet)),
        ExprOp::PktBuffer => Ok(Value::PacketBuffer),

        ExprOp::RoleIsConnected => handle::exec_role_is_connected(frame, ctx),
        ExprOp::GetFiberHandle => handle::exec_get_fiber_handle(frame, ctx),
        ExprOp::StaticRole => handle::exec_static_role(frame, ctx),
        ExprOp::StaticBuffer => handle::exec_static_buffer(frame, ctx),

        ExprOp::GetField => object::exec_get_field(frame, ctx),
        ExprOp::Index => object::exec_index(frame, ctx),
        ExprOp::ObjectLength => object::exec_object_length(frame, ctx),
        ExprOp::KeysLength => object::exec_keys_length(frame, ctx),
        ExprOp::TypeOf => object::exec_typeof(frame, ctx),
        ExprOp::IsNull => unary(frame, ctx, |v| Value::Bool(v == Value::Null)),

        ExprOp::Null => Ok(Value::Null),
        ExprOp::True => Ok(Value::Bool(true)),
        ExprOp::False => Ok(Value::Bool(false)),
        ExprOp::Nan => Ok(Value::Nan),

        ExprOp::Abs => unary(frame, ctx, abs),
        ExprOp::BitNot => unary(frame, ctx, bit_not),
        ExprOp::Ceil => unary(frame, ctx, ceil),
        ExprOp::Floor => unary(frame, ctx, floor),
        ExprOp::Round => unary(frame, ctx, round),
        ExprOp::Id => exec_expr(frame, ctx),
        ExprOp::IsNan => unary(frame, ctx, |v| Value::Bool(v.is_nan())),
        ExprOp::LogE => unary(frame, ctx, log_e),
        ExprOp::Neg => unary(frame, ctx, neg),
        ExprOp::Not => unary(frame, ctx, not),
        ExprOp::Random => arith::exec_random(frame, ctx),
        ExprOp::RandomInt => arith::exec_random_int(frame, ctx),
        ExprOp::ToBool => unary(frame, ctx, |v| Value::Bool(v.to_bool())),

        ExprOp::Add => binary(frame, ctx, add),
        ExprOp::Sub => binary(frame, ctx, sub),
        ExprOp::Mul => binary(frame, ctx, mul),
        ExprOp::Div => binary(frame, ctx, div),
        ExprOp::Pow => binary(frame, ctx, pow),
        ExprOp::BitAnd => binary(frame, ctx, bit_and),
        ExprOp::BitOr => binary(frame, ctx, bit_or),
        ExprOp::BitXor => binary(frame, ctx, bit_xor),
        ExprOp::ShiftLeft => binary(frame, ctx, shift_left),
        ExprOp::ShiftRight => binary(frame, ctx, shift_right),
        ExprOp::ShiftRightUnsigned => binary(frame, ctx, shift_right_unsigned),
        ExprOp::Idiv => binary(frame, ctx, idiv),
        ExprOp::Imul => binary(frame, ctx, imul),
        ExprOp::Eq => binary(frame, ctx, eq),
        ExprOp::Le => binary(frame, ctx, le),
        ExprOp::Lt => binary(frame, ctx, lt),
        ExprOp::Ne => binary(frame, ctx, ne),
        ExprOp::Max => binary(frame, ctx, max),
        ExprOp::Min => binary(frame, ctx, min),
    }
}
