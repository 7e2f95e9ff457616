//! Object introspection.
//!
//! Field and element access on heap objects is not supported yet: once the
//! operand is known to be a heap handle those opcodes fail with
//! `Unimplemented` instead of guessing at the object layout.

use busvm_core::{HandleKind, Value};

use super::exec_expr;
use super::handle::{buffer_data, eval_map, eval_u32};
use crate::context::Context;
use crate::fault::{Fault, VmResult};
use crate::frame::Activation;
use crate::heap::GcObjectKind;

pub(crate) fn exec_get_field(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let _field = frame.fetch_int(ctx)?;
    let _map = eval_map(frame, ctx)?;
    Err(ctx.fail(Fault::Unimplemented))
}

pub(crate) fn exec_index(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let _obj = eval_map(frame, ctx)?;
    let _idx = eval_u32(frame, ctx)?;
    Err(ctx.fail(Fault::Unimplemented))
}

pub(crate) fn exec_keys_length(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let _map = eval_map(frame, ctx)?;
    Err(ctx.fail(Fault::Unimplemented))
}

/// Byte length of a buffer or element count of an array; 0 otherwise.
pub(crate) fn exec_object_length(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let v = exec_expr(frame, ctx)?;
    if let Some(data) = buffer_data(ctx, v) {
        return Ok(Value::Int(data.len() as i32));
    }
    let len = v
        .handle_index(HandleKind::GcObject)
        .filter(|&idx| ctx.heap.object_kind(idx) == Some(GcObjectKind::Array))
        .and_then(|idx| ctx.heap.array_len(idx));
    Ok(len.map_or(Value::ZERO, |n| Value::Int(n as i32)))
}

pub(crate) fn exec_typeof(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let v = exec_expr(frame, ctx)?;
    let ty = v.type_of(|idx| ctx.heap.object_kind(idx).map(Into::into));
    Ok(Value::Int(u8::from(ty) as i32))
}
