//! Runtime errors for the Clear VM.
//!
//! Handlers report a bare [`RuntimeError`]; the dispatch loop wraps the
//! first failure into a [`Fault`] carrying the opcode and code offset, so
//! every diagnostic names the instruction that failed.

use clear_common::{DecodeError, Opcode, ValueTag};
use thiserror::Error;

/// Failure kinds raised by instruction handlers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The code segment ended in the middle of an instruction's operands.
    #[error("truncated instruction")]
    TruncatedInstruction,

    /// Push onto a full stack (512 slots).
    #[error("stack overflow")]
    StackOverflow,

    /// Pop from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// Peek at an offset at or below the stack bottom.
    #[error("peek at offset {offset} with {depth} slots")]
    PeekUnderRange { offset: usize, depth: usize },

    /// `OP_PUSH_CONST` index past the constant pool.
    #[error("constant index {index} out of range ({count} constants)")]
    ConstantIndexOutOfRange { index: u8, count: usize },

    /// `OP_PUSH_GLOBAL` on a slot that was never set.
    #[error("global {index} is not defined")]
    UndefinedGlobal { index: u8 },

    /// Local index at or past the current frame's extent.
    #[error("local {index} out of range ({count} locals)")]
    LocalOutOfRange { index: usize, count: usize },

    /// Struct field index at or past the field count.
    #[error("field {index} out of range ({count} fields)")]
    FieldOutOfRange { index: usize, count: usize },

    /// A jump target left the code segment.
    #[error("jump target {target} outside code of length {end}")]
    JumpOutOfRange { target: i64, end: usize },

    /// Cast applied to a pointer value (Obj, IP, or FP).
    #[error("cannot cast {} value", .from.name())]
    InvalidCast { from: ValueTag },

    /// `OP_STR_CAT` on a non-string operand.
    #[error("concatenation requires two strings")]
    NonStringConcat,

    /// `OP_PRINT` on a non-string value.
    #[error("print requires a string")]
    NonStringPrint,

    /// Field access on a value that is not a struct.
    #[error("field access on a non-struct value")]
    NonStructField,

    /// `OP_LOAD_IP` on a value that is not an IP.
    #[error("load of a non-IP value into ip")]
    NonIpLoad,

    /// `OP_LOAD_FP` on a value that is not an FP.
    #[error("load of a non-FP value into fp")]
    NonFpLoad,

    /// `OP_DEREF` / `OP_SET_REF` on a value that is not an upvalue.
    #[error("dereference of a non-upvalue value")]
    NonUpvalueDeref,

    /// `OP_CALL` on a value that is not an IP.
    #[error("call of a non-function value")]
    NonFunctionCall,

    /// The output stream rejected a `print` write.
    #[error("could not write to the output stream")]
    OutputFailed,

    /// Sentinel for a handler-table slot that was never populated. The
    /// table is filled for every opcode, so this is unreachable through
    /// decoded instructions.
    #[error("unimplemented opcode handler")]
    Unimplemented,
}

/// A halted execution: the dispatch loop's diagnostic for the first
/// handler failure, or for a byte that is not an instruction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    /// The byte at `at` does not decode to an opcode.
    #[error("unknown opcode {byte:#04x} at offset {at}")]
    UnknownOpcode { at: usize, byte: u8 },

    /// The handler for `op` failed.
    #[error("{op} at offset {at}: {kind}")]
    Trap {
        op: Opcode,
        at: usize,
        kind: RuntimeError,
    },
}

/// Any failure from the `run` entry point: the module would not decode,
/// or execution halted on a fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Fault(#[from] Fault),
}
