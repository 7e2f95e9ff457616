//! Runtime faults.
//!
//! A fault aborts the expression being evaluated and is handed back to the
//! statement layer, which abandons the current fiber step. Faults are never
//! caught inside the evaluator.

use thiserror::Error;

pub type VmResult<T> = Result<T, Fault>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Fault {
    #[error("invalid expression")]
    InvalidExpr,
    #[error("local index out of range")]
    LocalOutOfRange,
    #[error("global index out of range")]
    GlobalOutOfRange,
    #[error("float literal index out of range")]
    FloatOutOfRange,
    #[error("expression nested too deep")]
    ExprTooDeep,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("bytecode overrun")]
    CodeOverrun,
    #[error("role index out of range")]
    RoleOutOfRange,
    #[error("string index out of range")]
    StringOutOfRange,
    #[error("invalid number format")]
    InvalidNumFmt,
    #[error("function index out of range")]
    FunctionOutOfRange,
    #[error("buffer expected")]
    ExpectedBuffer,
    #[error("role expected")]
    ExpectedRole,
    #[error("string expected")]
    ExpectedString,
    #[error("map expected")]
    ExpectedMap,
    #[error("not implemented")]
    Unimplemented,
}

impl Fault {
    pub const ALL: [Fault; 16] = [
        Fault::InvalidExpr,
        Fault::LocalOutOfRange,
        Fault::GlobalOutOfRange,
        Fault::FloatOutOfRange,
        Fault::ExprTooDeep,
        Fault::InvalidOpcode,
        Fault::CodeOverrun,
        Fault::RoleOutOfRange,
        Fault::StringOutOfRange,
        Fault::InvalidNumFmt,
        Fault::FunctionOutOfRange,
        Fault::ExpectedBuffer,
        Fault::ExpectedRole,
        Fault::ExpectedString,
        Fault::ExpectedMap,
        Fault::Unimplemented,
    ];

    /// Stable numeric code reported to the host.
    pub const fn code(self) -> u32 {
        match self {
            Fault::InvalidExpr => 60104,
            Fault::LocalOutOfRange => 60105,
            Fault::GlobalOutOfRange => 60106,
            Fault::FloatOutOfRange => 60107,
            Fault::ExprTooDeep => 60108,
            Fault::InvalidOpcode => 60109,
            Fault::CodeOverrun => 60110,
            Fault::RoleOutOfRange => 60111,
            Fault::StringOutOfRange => 60112,
            Fault::InvalidNumFmt => 60113,
            Fault::FunctionOutOfRange => 60114,
            Fault::ExpectedBuffer => 60125,
            Fault::ExpectedRole => 60126,
            Fault::ExpectedString => 60127,
            Fault::ExpectedMap => 60128,
            Fault::Unimplemented => 60129,
        }
    }

    pub fn from_code(code: u32) -> Option<Fault> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }
}
