//! Clear common types and module encoding.
//!
//! This crate provides the wire-level foundation shared by the VM, the
//! disassembler, and the CLI:
//!
//! - [`Opcode`] — the 53-entry instruction set, one byte per opcode
//! - [`ValueTag`] / [`ObjTag`] — the tag bytes used by the type-test opcodes
//! - [`Reader`] — a bounds-checked byte cursor
//! - [`Module`] / [`Constant`] — the constant pool plus code segment
//! - [`DecodeError`] — errors from decoding byte streams
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod error;
pub mod module;
pub mod opcode;
pub mod reader;
pub mod tag;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use module::{Constant, Module};
pub use opcode::{Opcode, ALL_OPCODES, OP_COUNT};
pub use reader::Reader;
pub use tag::{ObjTag, ValueTag};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy that generates a random valid constant (wire-sized string).
    fn arb_constant() -> impl Strategy<Value = Constant> {
        prop_oneof![
            any::<i32>().prop_map(Constant::Int),
            any::<f64>()
                .prop_filter("NaN never decodes equal", |f| !f.is_nan())
                .prop_map(Constant::Num),
            "[ -~]{0,255}".prop_map(Constant::Str),
        ]
    }

    proptest! {
        /// For any wire-sized module, encode then decode is the identity.
        #[test]
        fn module_roundtrip(
            constants in prop::collection::vec(arb_constant(), 0..16),
            code in prop::collection::vec(any::<u8>(), 0..128),
        ) {
            let module = Module { constants, code };
            let decoded = Module::decode(&module.encode()).unwrap();
            prop_assert_eq!(module, decoded);
        }

        /// For any random bytes, decode either succeeds or returns a
        /// specific DecodeError — never panics.
        #[test]
        fn random_bytes_decode(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            match Module::decode(&bytes) {
                Ok(module) => {
                    // The code segment is whatever followed the header.
                    prop_assert!(module.code.len() <= bytes.len());
                }
                Err(
                    DecodeError::TruncatedHeader { .. }
                    | DecodeError::UnknownConstantTag { .. },
                ) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }

        /// Every opcode byte either decodes or is reported unknown.
        #[test]
        fn opcode_bytes_never_panic(byte in any::<u8>()) {
            let _ = Opcode::try_from(byte);
        }
    }
}
