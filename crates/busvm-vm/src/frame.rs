//! Activation frames.

use busvm_core::opcode::{FIRST_MULTIBYTE_INT, MULTIBYTE_NEGATE};
use busvm_core::Value;

use crate::context::Context;
use crate::fault::{Fault, VmResult};

/// One function invocation being evaluated.
///
/// Parameters are borrowed from the caller; locals are owned and start out
/// `Undefined`.
#[derive(Debug)]
pub struct Activation<'p> {
    func_id: u32,
    pc: usize,
    pub locals: Vec<Value>,
    params: &'p [Value],
    fiber: u32,
}

impl<'p> Activation<'p> {
    pub fn new(ctx: &mut Context, func_id: u32, params: &'p [Value], fiber: u32) -> VmResult<Self> {
        let num_locals = match ctx.image.function(func_id) {
            Some(func) => func.num_locals as usize,
            None => return Err(ctx.fail(Fault::FunctionOutOfRange)),
        };
        Ok(Self {
            func_id,
            pc: 0,
            locals: vec![Value::Undefined; num_locals],
            params,
            fiber,
        })
    }

    #[inline]
    pub fn func_id(&self) -> u32 {
        self.func_id
    }

    #[inline]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Position the frame at the start of an expression.
    #[inline]
    pub fn jump(&mut self, pc: usize) {
        self.pc = pc;
    }

    #[inline]
    pub fn params(&self) -> &'p [Value] {
        self.params
    }

    /// Id of the fiber this frame runs on.
    #[inline]
    pub fn fiber(&self) -> u32 {
        self.fiber
    }

    pub fn fetch_byte(&mut self, ctx: &mut Context) -> VmResult<u8> {
        let byte = ctx
            .image
            .function(self.func_id)
            .and_then(|f| f.code.get(self.pc).copied());
        match byte {
            Some(b) => {
                self.pc += 1;
                Ok(b)
            }
            None => Err(ctx.fail(Fault::CodeOverrun)),
        }
    }

    /// Variable-length immediate operand.
    ///
    /// A byte below `0xF8` is the value itself. Otherwise the low two bits
    /// give the count of big-endian bytes that follow (minus one) and bit 2
    /// negates the result.
    pub fn fetch_int(&mut self, ctx: &mut Context) -> VmResult<i32> {
        let head = self.fetch_byte(ctx)?;
        if head < FIRST_MULTIBYTE_INT {
            return Ok(head as i32);
        }
        let mut r: u32 = 0;
        for _ in 0..=(head & 3) {
            r = (r << 8) | self.fetch_byte(ctx)? as u32;
        }
        let v = r as i32;
        Ok(if head & MULTIBYTE_NEGATE != 0 { v.wrapping_neg() } else { v })
    }
}
