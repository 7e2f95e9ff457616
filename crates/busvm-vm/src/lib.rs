//! # busvm-vm
//!
//! Expression engine for busvm behavior images.
//!
//! - `context` - Run state: globals, role bindings, current packet, fibers
//! - `frame` - Activation frames and immediate operand decoding
//! - `exec` - Recursive expression evaluator and typed wrappers
//! - `fault` - Runtime fault taxonomy
//! - `config` - Evaluator tuning
//! - `packet` - The bus packet being dispatched
//! - `fiber` - Minimal fiber table
//! - `heap` - Read-only view of the external heap

pub mod config;
pub mod context;
pub mod exec;
pub mod fault;
pub mod fiber;
pub mod frame;
pub mod heap;
pub mod packet;

pub use config::{VmConfig, DEFAULT_MAX_EXPR_DEPTH};
pub use context::Context;
pub use exec::{eval_pair, exec_expr};
pub use fault::{Fault, VmResult};
pub use fiber::{Fiber, FiberStatus, FiberTable};
pub use frame::Activation;
pub use heap::{EmptyHeap, GcObjectKind, HeapView};
pub use packet::Packet;
