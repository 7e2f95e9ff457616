//! Typed evaluation and handle resolution.
//!
//! A handle is only trusted after its kind and index have been checked
//! here. Values reach these wrappers from literals as well as from locals,
//! globals and parameters, so the check happens on every use.

use busvm_core::{HandleKind, Value};

use super::exec_expr;
use crate::context::Context;
use crate::fault::{Fault, VmResult};
use crate::frame::Activation;

#[inline]
pub fn eval_u32(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<u32> {
    exec_expr(frame, ctx).map(|v| v.to_int() as u32)
}

#[inline]
pub fn eval_i32(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<i32> {
    exec_expr(frame, ctx).map(Value::to_int)
}

#[inline]
pub fn eval_f64(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<f64> {
    exec_expr(frame, ctx).map(Value::to_double)
}

/// Evaluate to the packet buffer or a valid image buffer handle.
pub fn eval_buffer(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let v = exec_expr(frame, ctx)?;
    match v {
        Value::PacketBuffer => Ok(v),
        Value::Handle(h) if h.kind == HandleKind::ImageBuffer => {
            check_string(ctx, h.index)?;
            Ok(v)
        }
        _ => Err(ctx.fail(Fault::ExpectedBuffer)),
    }
}

/// Evaluate a buffer and borrow its bytes.
pub fn eval_buffer_data<'c>(
    frame: &mut Activation<'_>,
    ctx: &'c mut Context,
) -> VmResult<&'c [u8]> {
    let v = eval_buffer(frame, ctx)?;
    Ok(buffer_data(ctx, v).unwrap_or(&[]))
}

/// Bytes behind a buffer value, or `None` if it is not one.
pub fn buffer_data(ctx: &Context, v: Value) -> Option<&[u8]> {
    match v {
        Value::PacketBuffer => Some(ctx.packet.payload()),
        Value::Handle(h) if h.kind == HandleKind::ImageBuffer => ctx.image.string(h.index),
        _ => None,
    }
}

/// Index of an image string constant.
pub fn eval_string_index(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<u32> {
    let v = exec_expr(frame, ctx)?;
    match v.handle_index(HandleKind::ImageBuffer) {
        Some(idx) => check_string(ctx, idx).map(|()| idx),
        None => Err(ctx.fail(Fault::ExpectedString)),
    }
}

/// Index of a declared role.
pub fn eval_role(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<u32> {
    let v = exec_expr(frame, ctx)?;
    match v.handle_index(HandleKind::Role) {
        Some(idx) => check_role(ctx, idx).map(|()| idx),
        None => Err(ctx.fail(Fault::ExpectedRole)),
    }
}

/// Index of a heap object handle.
pub fn eval_map(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<u32> {
    let v = exec_expr(frame, ctx)?;
    match v.handle_index(HandleKind::GcObject) {
        Some(idx) => Ok(idx),
        None => Err(ctx.fail(Fault::ExpectedMap)),
    }
}

fn check_role(ctx: &mut Context, idx: u32) -> VmResult<()> {
    if (idx as usize) < ctx.image.num_roles() {
        Ok(())
    } else {
        Err(ctx.fail(Fault::RoleOutOfRange))
    }
}

fn check_string(ctx: &mut Context, idx: u32) -> VmResult<()> {
    if (idx as usize) < ctx.image.num_strings() {
        Ok(())
    } else {
        Err(ctx.fail(Fault::StringOutOfRange))
    }
}

pub(crate) fn exec_static_role(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let idx = frame.fetch_int(ctx)? as u32;
    check_role(ctx, idx)?;
    Ok(Value::handle(HandleKind::Role, idx))
}

pub(crate) fn exec_static_buffer(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let idx = frame.fetch_int(ctx)? as u32;
    check_string(ctx, idx)?;
    Ok(Value::handle(HandleKind::ImageBuffer, idx))
}

pub(crate) fn exec_role_is_connected(
    frame: &mut Activation<'_>,
    ctx: &mut Context,
) -> VmResult<Value> {
    let role = eval_role(frame, ctx)?;
    Ok(Value::Bool(ctx.is_role_bound(role)))
}

/// Negative indices name the fiber running this frame. Others are table
/// positions; a miss is `Undefined`.
pub(crate) fn exec_get_fiber_handle(
    frame: &mut Activation<'_>,
    ctx: &mut Context,
) -> VmResult<Value> {
    let idx = eval_i32(frame, ctx)?;
    if idx < 0 {
        return Ok(Value::handle(HandleKind::Fiber, frame.fiber()));
    }
    Ok(ctx
        .fibers
        .by_index(idx as usize)
        .map_or(Value::Undefined, |f| f.handle()))
}
