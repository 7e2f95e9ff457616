//! # busvm-core
//!
//! Core types for busvm that are `no_std` compatible.
//!
//! This crate provides the leaf types used by the expression engine:
//! - `value` - Packed dynamic value and its 64-bit codec
//! - `opcode` - Expression opcodes and operand encoding
//! - `numfmt` - Packed number formats for buffer reads
//! - `image` - Compiled program image and its builder
//! - `writer` - Expression bytecode assembler

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod value;
pub mod opcode;
pub mod numfmt;
pub mod image;
pub mod writer;

pub use value::{Handle, HandleKind, ObjectType, RawValue, Value};
pub use opcode::ExprOp;
pub use numfmt::{NumFmt, NumFmtError, NumKind};
pub use image::{Function, Image, ImageBuilder, ImageError, RoleDecl};
pub use writer::ExprWriter;
