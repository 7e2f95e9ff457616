//! Variable loads and literals.

use busvm_core::Value;

use crate::context::Context;
use crate::fault::{Fault, VmResult};
use crate::frame::Activation;

/// Immediate operand as a table index; negative operands never match.
#[inline]
fn fetch_index(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Option<usize>> {
    frame.fetch_int(ctx).map(|v| usize::try_from(v).ok())
}

pub(crate) fn exec_load_local(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let v = fetch_index(frame, ctx)?.and_then(|i| frame.locals.get(i).copied());
    match v {
        Some(v) => Ok(v.normalized()),
        None => Err(ctx.fail(Fault::LocalOutOfRange)),
    }
}

/// Missing parameters read as `Undefined`.
pub(crate) fn exec_load_param(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let idx = fetch_index(frame, ctx)?;
    Ok(idx
        .and_then(|i| frame.params().get(i).copied())
        .map_or(Value::Undefined, Value::normalized))
}

pub(crate) fn exec_load_global(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let v = fetch_index(frame, ctx)?.and_then(|i| ctx.global(i));
    match v {
        Some(v) => Ok(v),
        None => Err(ctx.fail(Fault::GlobalOutOfRange)),
    }
}

#[inline]
pub(crate) fn exec_literal(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    frame.fetch_int(ctx).map(Value::Int)
}

pub(crate) fn exec_literal_f64(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let idx = frame.fetch_int(ctx)? as u32;
    match ctx.image.float(idx) {
        Some(v) => Ok(v),
        None => Err(ctx.fail(Fault::FloatOutOfRange)),
    }
}

/// Return value of the last call completed on this frame's fiber.
pub(crate) fn exec_ret_val(frame: &Activation<'_>, ctx: &Context) -> Value {
    ctx.fibers
        .get(frame.fiber())
        .map_or(Value::Undefined, |f| f.ret_val.normalized())
}

#[cfg(test)]
mod tests {
    use super::super::exec_expr;
    use super::*;
    use busvm_core::{ExprWriter, Function, ImageBuilder};
    use pretty_assertions::assert_eq;

    fn eval_with(w: &ExprWriter, params: &[Value], setup: impl FnOnce(&mut Context)) -> VmResult<Value> {
        let mut b = ImageBuilder::new().globals(2);
        b.add_float(0.125).unwrap();
        b.add_function(Function::with_code("f", 2, 0, w.as_bytes().to_vec())).unwrap();
        let mut ctx = Context::new(b.build());
        setup(&mut ctx);
        let mut frame = Activation::new(&mut ctx, 0, params, 0).unwrap();
        frame.locals[1] = Value::Int(11);
        exec_expr(&mut frame, &mut ctx)
    }

    fn eval(w: &ExprWriter) -> VmResult<Value> {
        eval_with(w, &[], |_| {})
    }

    #[test]
    fn test_locals() {
        let mut w = ExprWriter::new();
        w.local(1);
        assert_eq!(eval(&w), Ok(Value::Int(11)));

        let mut w = ExprWriter::new();
        w.local(2);
        assert_eq!(eval(&w), Err(Fault::LocalOutOfRange));

        let mut w = ExprWriter::new();
        w.local(-1);
        assert_eq!(eval(&w), Err(Fault::LocalOutOfRange));
    }

    #[test]
    fn test_params_miss_is_undefined() {
        let params = [Value::Int(5)];
        let mut w = ExprWriter::new();
        w.param(0);
        assert_eq!(eval_with(&w, &params, |_| {}), Ok(Value::Int(5)));

        let mut w = ExprWriter::new();
        w.param(1);
        assert_eq!(eval_with(&w, &params, |_| {}), Ok(Value::Undefined));

        let mut w = ExprWriter::new();
        w.param(0);
        let params = [Value::Double(f64::NAN)];
        assert_eq!(eval_with(&w, &params, |_| {}), Ok(Value::Nan));
    }

    #[test]
    fn test_globals() {
        let mut w = ExprWriter::new();
        w.global(1);
        let set = |ctx: &mut Context| ctx.set_global(1, Value::Bool(true)).unwrap();
        assert_eq!(eval_with(&w, &[], set), Ok(Value::Bool(true)));

        let mut w = ExprWriter::new();
        w.global(2);
        assert_eq!(eval(&w), Err(Fault::GlobalOutOfRange));
    }

    #[test]
    fn test_literals() {
        let mut w = ExprWriter::new();
        w.int(-100_000);
        assert_eq!(eval(&w), Ok(Value::Int(-100_000)));

        let mut w = ExprWriter::new();
        w.float(0);
        assert_eq!(eval(&w), Ok(Value::Double(0.125)));

        let mut w = ExprWriter::new();
        w.float(1);
        assert_eq!(eval(&w), Err(Fault::FloatOutOfRange));
    }

    #[test]
    fn test_ret_val() {
        let mut w = ExprWriter::new();
        w.op(busvm_core::ExprOp::RetVal);
        assert_eq!(eval(&w), Ok(Value::Undefined));

        let spawn = |ctx: &mut Context| {
            let id = ctx.fibers.spawn();
            ctx.fibers.get_mut(id).unwrap().ret_val = Value::Int(42);
        };
        assert_eq!(eval_with(&w, &[], spawn), Ok(Value::Int(42)));

        let spawn_nan = |ctx: &mut Context| {
            let id = ctx.fibers.spawn();
            ctx.fibers.get_mut(id).unwrap().ret_val = Value::Double(f64::NAN);
        };
        assert_eq!(eval_with(&w, &[], spawn_nan), Ok(Value::Nan));
    }
}
