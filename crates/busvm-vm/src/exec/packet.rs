//! Packet introspection and buffer reads.

use busvm_core::{NumFmt, Value};

use super::handle::{buffer_data, eval_buffer, eval_u32};
use crate::context::Context;
use crate::fault::{Fault, VmResult};
use crate::frame::Activation;
use crate::packet::Packet;

pub(crate) fn ev_code(pkt: &Packet) -> Value {
    if pkt.is_event() {
        Value::Int(pkt.event_code() as i32)
    } else {
        Value::Undefined
    }
}

pub(crate) fn reg_get_code(pkt: &Packet) -> Value {
    if pkt.is_report() && pkt.is_register_get() {
        Value::Int(pkt.reg_code() as i32)
    } else {
        Value::Undefined
    }
}

pub(crate) fn command_code(pkt: &Packet) -> Value {
    if pkt.is_command() {
        Value::Int(pkt.service_command as i32)
    } else {
        Value::Undefined
    }
}

pub(crate) fn report_code(pkt: &Packet) -> Value {
    if pkt.is_report() {
        Value::Int(pkt.service_command as i32)
    } else {
        Value::Undefined
    }
}

/// `str0eq buf offset`: does the packet hold `buf` plus a NUL at `offset`.
pub(crate) fn exec_str0eq(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let buf = eval_buffer(frame, ctx)?;
    let offset = eval_u32(frame, ctx)?;
    let needle = buffer_data(ctx, buf).unwrap_or(&[]);
    Ok(Value::Bool(ctx.packet.str0_eq(offset as usize, needle)))
}

/// `load_buffer buf fmt offset`: decode one number from a buffer.
pub(crate) fn exec_load_buffer(frame: &mut Activation<'_>, ctx: &mut Context) -> VmResult<Value> {
    let buf = eval_buffer(frame, ctx)?;
    let fmt0 = eval_u32(frame, ctx)?;
    let offset = eval_u32(frame, ctx)?;
    let fmt = match NumFmt::from_u32(fmt0) {
        Ok(fmt) => fmt,
        Err(_) => return Err(ctx.fail(Fault::InvalidNumFmt)),
    };
    let data = buffer_data(ctx, buf).unwrap_or(&[]);
    Ok(fmt.read(data, offset as usize))
}

#[cfg(test)]
mod tests {
    use super::super::exec_expr;
    use super::*;
    use crate::packet::{CMD_EVENT_MASK, CMD_GET_REG};
    use busvm_core::{ExprOp, ExprWriter, Function, ImageBuilder, NumKind};
    use pretty_assertions::assert_eq;

    fn eval(w: &ExprWriter, pkt: Packet) -> VmResult<Value> {
        let mut b = ImageBuilder::new();
        b.add_string(&b"ab"[..]).unwrap();
        b.add_string(vec![0x34, 0x12, 0xff, 0xff]).unwrap();
        b.add_function(Function::with_code("f", 0, 0, w.as_bytes().to_vec())).unwrap();
        let mut ctx = Context::new(b.build());
        ctx.set_packet(pkt);
        let mut frame = Activation::new(&mut ctx, 0, &[], 0).unwrap();
        exec_expr(&mut frame, &mut ctx)
    }

    fn op(op: ExprOp) -> ExprWriter {
        let mut w = ExprWriter::new();
        w.op(op);
        w
    }

    fn str0eq(offset: i32) -> ExprWriter {
        let mut w = ExprWriter::new();
        w.op(ExprOp::Str0Eq).buffer(0).int(offset);
        w
    }

    #[test]
    fn test_packet_codes() {
        let ev = Packet::report(CMD_EVENT_MASK | 0x03, vec![]);
        assert_eq!(eval(&op(ExprOp::PktEvCode), ev.clone()), Ok(Value::Int(3)));
        assert_eq!(eval(&op(ExprOp::PktReportCode), ev.clone()), Ok(Value::Int(0x8003)));
        assert_eq!(eval(&op(ExprOp::PktCommandCode), ev), Ok(Value::Undefined));

        let get = Packet::report(CMD_GET_REG | 0x101, vec![0; 4]);
        assert_eq!(eval(&op(ExprOp::PktRegGetCode), get.clone()), Ok(Value::Int(0x101)));
        assert_eq!(eval(&op(ExprOp::PktEvCode), get.clone()), Ok(Value::Undefined));
        assert_eq!(eval(&op(ExprOp::PktSize), get), Ok(Value::Int(4)));

        let cmd = Packet::command(CMD_GET_REG | 0x101, vec![]);
        assert_eq!(eval(&op(ExprOp::PktRegGetCode), cmd.clone()), Ok(Value::Undefined));
        assert_eq!(eval(&op(ExprOp::PktCommandCode), cmd), Ok(Value::Int(0x1101)));
    }

    #[test]
    fn test_str0eq() {
        let pkt = Packet::report(0, b"xxab\0yy".to_vec());
        assert_eq!(eval(&str0eq(2), pkt.clone()), Ok(Value::Bool(true)));
        assert_eq!(eval(&str0eq(1), pkt.clone()), Ok(Value::Bool(false)));
        assert_eq!(eval(&str0eq(100), pkt.clone()), Ok(Value::Bool(false)));
        assert_eq!(eval(&str0eq(-1), pkt.clone()), Ok(Value::Bool(false)));

        let mut short = pkt.clone();
        short.service_size = 4;
        assert_eq!(eval(&str0eq(2), short), Ok(Value::Bool(false)));

        let no_nul = Packet::report(0, b"xxabyyy".to_vec());
        assert_eq!(eval(&str0eq(2), no_nul), Ok(Value::Bool(false)));

        let changed = Packet::report(0, b"xxaB\0yy".to_vec());
        assert_eq!(eval(&str0eq(2), changed), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_str0eq_needs_buffer() {
        let mut w = ExprWriter::new();
        w.op(ExprOp::Str0Eq).int(1).int(0);
        assert_eq!(eval(&w, Packet::default()), Err(Fault::ExpectedBuffer));
    }

    #[test]
    fn test_load_buffer() {
        let u16_fmt = NumFmt::new(NumKind::U16, 0).unwrap().to_u8() as i32;
        let i16_fmt = NumFmt::new(NumKind::I16, 0).unwrap().to_u8() as i32;

        let mut w = ExprWriter::new();
        w.op(ExprOp::LoadBuffer).buffer(1).int(u16_fmt).int(0);
        assert_eq!(eval(&w, Packet::default()), Ok(Value::Int(0x1234)));

        let mut w = ExprWriter::new();
        w.op(ExprOp::LoadBuffer).buffer(1).int(i16_fmt).int(2);
        assert_eq!(eval(&w, Packet::default()), Ok(Value::Int(-1)));

        let mut w = ExprWriter::new();
        w.op(ExprOp::LoadBuffer).buffer(1).int(u16_fmt).int(3);
        assert_eq!(eval(&w, Packet::default()), Ok(Value::Nan));

        let mut w = ExprWriter::new();
        w.op(ExprOp::LoadBuffer).op(ExprOp::PktBuffer).int(u16_fmt).int(1);
        let pkt = Packet::report(0, vec![0, 0x10, 0x00]);
        assert_eq!(eval(&w, pkt), Ok(Value::Int(0x10)));
    }

    #[test]
    fn test_load_buffer_bad_format() {
        let mut w = ExprWriter::new();
        w.op(ExprOp::LoadBuffer).buffer(1).int(NumKind::F16 as i32).int(0);
        assert_eq!(eval(&w, Packet::default()), Err(Fault::InvalidNumFmt));
    }
}
