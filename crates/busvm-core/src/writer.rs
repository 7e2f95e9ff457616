//! Expression bytecode assembler.
//!
//! Emits expressions in prefix order, in the encoding the evaluator reads:
//!
//! ```
//! use busvm_core::{ExprOp, ExprWriter};
//!
//! // (x + 1) * 300, where x is local 0
//! let mut w = ExprWriter::new();
//! w.op(ExprOp::Mul).op(ExprOp::Add).local(0).int(1).int(300);
//! assert_eq!(w.len(), 9);
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::opcode::{small_int_byte, ExprOp, FIRST_MULTIBYTE_INT, MULTIBYTE_NEGATE};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprWriter {
    code: Vec<u8>,
}

impl ExprWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn finish(self) -> Vec<u8> {
        self.code
    }

    /// Raw byte, for hand-crafted (including malformed) bytecode.
    pub fn byte(&mut self, b: u8) -> &mut Self {
        self.code.push(b);
        self
    }

    pub fn op(&mut self, op: ExprOp) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    /// Variable-length immediate operand.
    pub fn operand(&mut self, v: i32) -> &mut Self {
        if (0..FIRST_MULTIBYTE_INT as i32).contains(&v) {
            self.code.push(v as u8);
            return self;
        }
        let magnitude = v.unsigned_abs();
        let bytes = magnitude.to_be_bytes();
        let skip = bytes.iter().take(3).take_while(|&&b| b == 0).count();
        let len = 4 - skip;
        let mut head = FIRST_MULTIBYTE_INT | (len - 1) as u8;
        if v < 0 {
            head |= MULTIBYTE_NEGATE;
        }
        self.code.push(head);
        self.code.extend_from_slice(&bytes[skip..]);
        self
    }

    /// Integer literal expression: compact form when in range.
    pub fn int(&mut self, v: i32) -> &mut Self {
        match small_int_byte(v) {
            Some(b) => self.byte(b),
            None => self.op(ExprOp::Literal).operand(v),
        }
    }

    /// Opcode followed by its immediate operand.
    pub fn op_x(&mut self, op: ExprOp, operand: i32) -> &mut Self {
        self.op(op).operand(operand)
    }

    pub fn local(&mut self, idx: i32) -> &mut Self {
        self.op_x(ExprOp::LoadLocal, idx)
    }

    pub fn param(&mut self, idx: i32) -> &mut Self {
        self.op_x(ExprOp::LoadParam, idx)
    }

    pub fn global(&mut self, idx: i32) -> &mut Self {
        self.op_x(ExprOp::LoadGlobal, idx)
    }

    pub fn float(&mut self, pool_idx: i32) -> &mut Self {
        self.op_x(ExprOp::LiteralF64, pool_idx)
    }

    pub fn role(&mut self, idx: i32) -> &mut Self {
        self.op_x(ExprOp::StaticRole, idx)
    }

    pub fn buffer(&mut self, idx: i32) -> &mut Self {
        self.op_x(ExprOp::StaticBuffer, idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_small_operands() {
        let mut w = ExprWriter::new();
        w.operand(0).operand(0xF7);
        assert_eq!(w.as_bytes(), &[0x00, 0xF7]);
    }

    #[test]
    fn test_multibyte_operands() {
        let mut w = ExprWriter::new();
        w.operand(0xF8);
        assert_eq!(w.as_bytes(), &[0xF8, 0xF8]);

        let mut w = ExprWriter::new();
        w.operand(0x1234);
        assert_eq!(w.as_bytes(), &[0xF9, 0x12, 0x34]);

        let mut w = ExprWriter::new();
        w.operand(-1);
        assert_eq!(w.as_bytes(), &[0xFC, 0x01]);

        let mut w = ExprWriter::new();
        w.operand(i32::MIN);
        assert_eq!(w.as_bytes(), &[0xFF, 0x80, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_int_literal_forms() {
        let mut w = ExprWriter::new();
        w.int(5).int(-16).int(112);
        assert_eq!(
            w.finish(),
            vec![0x80 + 21, 0x80, ExprOp::Literal as u8, 112]
        );
    }
}
