//! Clear virtual machine — executes compiled `.clr.b` modules.
//!
//! The VM is a stack-based machine with:
//! - A fixed 512-slot evaluation stack under frame-pointer discipline
//! - 256 byte-addressed global slots
//! - A heap of interned strings, structs, and upvalues, released wholesale
//!   at teardown
//! - A handler table mapping each opcode byte to one handler
//!
//! The call convention is synthesized by the compiler out of IP/FP values
//! on the stack; the VM itself has no "return" opcode.
//!
//! # Usage
//!
//! ```
//! // One CONST_STR "hi"; code: PUSH_CONST 0; PRINT.
//! let bytes = [0x01, 0x02, 0x02, b'h', b'i', 0x00, 0x00, 0x0D];
//!
//! let mut out = Vec::new();
//! clear_vm::run(&bytes, &mut out).unwrap();
//! assert_eq!(out, b"hi\n");
//! ```

pub mod error;
pub mod execute;
pub mod heap;
pub mod machine;
pub mod value;

pub use error::{Fault, RuntimeError, VmError};
pub use heap::{Heap, HeapStats, ObjHandle, Object, Upvalue};
pub use machine::{Vm, GLOBALS_MAX, STACK_MAX};
pub use value::Value;

use std::io::Write;

use clear_common::Module;

/// Decode a module and execute it to completion.
///
/// This is the primary entry point. It:
/// 1. Decodes the constant header and code segment
/// 2. Builds a VM, interning string constants into the heap
/// 3. Runs the dispatch loop until the code ends or a handler faults
///
/// `print` output goes to `out` and is kept even when execution halts on
/// an error.
///
/// # Errors
///
/// Returns [`VmError::Decode`] if the module would not decode and
/// [`VmError::Fault`] if execution halted; the fault names the failing
/// opcode and code offset.
pub fn run(bytes: &[u8], out: &mut dyn Write) -> Result<(), VmError> {
    let module = Module::decode(bytes)?;
    let mut vm = Vm::new(&module, out);
    vm.execute()?;
    Ok(())
}
