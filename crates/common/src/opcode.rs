//! Opcode definitions for the Clear instruction set.
//!
//! Every instruction is a one-byte opcode followed by zero, one, or two
//! inline u8 operands.

use std::fmt;

use crate::error::DecodeError;

/// Number of defined opcodes. Bytes `0x35..=0xFF` are not instructions.
pub const OP_COUNT: usize = 0x35;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute ensures each variant has a stable byte
/// value, which doubles as the index into the VM's handler table.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Constants and literals
    /// Push `const[i]` from the constant pool.
    PushConst = 0x00,
    /// Push boolean true.
    PushTrue = 0x01,
    /// Push boolean false.
    PushFalse = 0x02,
    /// Push nil.
    PushNil = 0x03,

    // Variables
    /// Pop a value into global slot `i`.
    SetGlobal = 0x04,
    /// Push global slot `i`. Error if never set.
    PushGlobal = 0x05,
    /// Pop a value into local `fp[i]`.
    SetLocal = 0x06,
    /// Push local `fp[i]`.
    PushLocal = 0x07,

    // Casts (in place on the top slot)
    /// Cast top of stack to an Int.
    Int = 0x08,
    /// Cast top of stack to a Bool.
    Bool = 0x09,
    /// Cast top of stack to a Num.
    Num = 0x0A,
    /// Cast top of stack to an interned String.
    Str = 0x0B,

    // Built-ins
    /// Push seconds since VM start as a Num.
    Clock = 0x0C,
    /// Pop a String and write it, newline-terminated, to the output stream.
    Print = 0x0D,
    /// Pop the top slot, closing any upvalues that reference it.
    Pop = 0x0E,
    /// Remove the slot below the top: `a, b -> b`.
    Squash = 0x0F,

    // Arithmetic (dedicated Int and Num variants)
    /// Negate the top Int in place.
    IntNeg = 0x10,
    /// Negate the top Num in place.
    NumNeg = 0x11,
    IntAdd = 0x12,
    NumAdd = 0x13,
    IntSub = 0x14,
    NumSub = 0x15,
    IntMul = 0x16,
    NumMul = 0x17,
    IntDiv = 0x18,
    NumDiv = 0x19,
    /// Concatenate two Strings into a new interned String.
    StrCat = 0x1A,
    /// Boolean negation of the top slot in place.
    Not = 0x1B,

    // Comparison
    IntLess = 0x1C,
    NumLess = 0x1D,
    IntGreater = 0x1E,
    NumGreater = 0x1F,
    /// Pop two values, push whether they are equal.
    Equal = 0x20,

    // Control flow (one-byte offsets: spans above 255 bytes are not
    // representable in the wire format)
    /// Advance `ip` by the operand.
    Jump = 0x21,
    /// Pop a value; advance `ip` by the operand if it is Bool false.
    JumpIfFalse = 0x22,
    /// Retreat `ip` by the operand.
    Loop = 0x23,

    // Functions
    /// Push the current `ip` as an IP value, then skip the operand bytes.
    Function = 0x24,
    /// Call the IP on top with `n` arguments; see the call convention.
    Call = 0x25,
    /// Pop an IP value into `ip`.
    LoadIp = 0x26,
    /// Pop an FP value into `fp`.
    LoadFp = 0x27,
    /// Pop a value into the return store.
    SetReturn = 0x28,
    /// Push the return store.
    PushReturn = 0x29,

    // Structs
    /// Pop `n` fields (push order) into a new struct and push it.
    Struct = 0x2A,
    /// Pop a struct and push its fields `d..`.
    Destruct = 0x2B,
    /// Pop a struct and push field `i`.
    GetField = 0x2C,
    /// Peek the struct at stack offset `off` and push its field `i`.
    ExtractField = 0x2D,
    /// Pop a value into field `i` of the struct then on top.
    SetField = 0x2E,
    /// Pop a value into field `i` of the struct at stack offset `off`.
    InsertField = 0x2F,

    // Upvalues
    /// Push a new open upvalue referencing `fp[i]`.
    RefLocal = 0x30,
    /// Replace the upvalue on top with its referenced value.
    Deref = 0x31,
    /// Pop (value, upvalue) and write the value through the upvalue.
    SetRef = 0x32,

    // Type tests (non-destructive)
    /// Push whether the top value's tag equals the operand byte.
    IsValType = 0x33,
    /// Push whether the top value is an object whose tag equals the operand.
    IsObjType = 0x34,
}

/// All valid opcodes, in byte order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; OP_COUNT] = [
    Opcode::PushConst,
    Opcode::PushTrue,
    Opcode::PushFalse,
    Opcode::PushNil,
    Opcode::SetGlobal,
    Opcode::PushGlobal,
    Opcode::SetLocal,
    Opcode::PushLocal,
    Opcode::Int,
    Opcode::Bool,
    Opcode::Num,
    Opcode::Str,
    Opcode::Clock,
    Opcode::Print,
    Opcode::Pop,
    Opcode::Squash,
    Opcode::IntNeg,
    Opcode::NumNeg,
    Opcode::IntAdd,
    Opcode::NumAdd,
    Opcode::IntSub,
    Opcode::NumSub,
    Opcode::IntMul,
    Opcode::NumMul,
    Opcode::IntDiv,
    Opcode::NumDiv,
    Opcode::StrCat,
    Opcode::Not,
    Opcode::IntLess,
    Opcode::NumLess,
    Opcode::IntGreater,
    Opcode::NumGreater,
    Opcode::Equal,
    Opcode::Jump,
    Opcode::JumpIfFalse,
    Opcode::Loop,
    Opcode::Function,
    Opcode::Call,
    Opcode::LoadIp,
    Opcode::LoadFp,
    Opcode::SetReturn,
    Opcode::PushReturn,
    Opcode::Struct,
    Opcode::Destruct,
    Opcode::GetField,
    Opcode::ExtractField,
    Opcode::SetField,
    Opcode::InsertField,
    Opcode::RefLocal,
    Opcode::Deref,
    Opcode::SetRef,
    Opcode::IsValType,
    Opcode::IsObjType,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Opcode::PushConst),
            0x01 => Ok(Opcode::PushTrue),
            0x02 => Ok(Opcode::PushFalse),
            0x03 => Ok(Opcode::PushNil),
            0x04 => Ok(Opcode::SetGlobal),
            0x05 => Ok(Opcode::PushGlobal),
            0x06 => Ok(Opcode::SetLocal),
            0x07 => Ok(Opcode::PushLocal),
            0x08 => Ok(Opcode::Int),
            0x09 => Ok(Opcode::Bool),
            0x0A => Ok(Opcode::Num),
            0x0B => Ok(Opcode::Str),
            0x0C => Ok(Opcode::Clock),
            0x0D => Ok(Opcode::Print),
            0x0E => Ok(Opcode::Pop),
            0x0F => Ok(Opcode::Squash),
            0x10 => Ok(Opcode::IntNeg),
            0x11 => Ok(Opcode::NumNeg),
            0x12 => Ok(Opcode::IntAdd),
            0x13 => Ok(Opcode::NumAdd),
            0x14 => Ok(Opcode::IntSub),
            0x15 => Ok(Opcode::NumSub),
            0x16 => Ok(Opcode::IntMul),
            0x17 => Ok(Opcode::NumMul),
            0x18 => Ok(Opcode::IntDiv),
            0x19 => Ok(Opcode::NumDiv),
            0x1A => Ok(Opcode::StrCat),
            0x1B => Ok(Opcode::Not),
            0x1C => Ok(Opcode::IntLess),
            0x1D => Ok(Opcode::NumLess),
            0x1E => Ok(Opcode::IntGreater),
            0x1F => Ok(Opcode::NumGreater),
            0x20 => Ok(Opcode::Equal),
            0x21 => Ok(Opcode::Jump),
            0x22 => Ok(Opcode::JumpIfFalse),
            0x23 => Ok(Opcode::Loop),
            0x24 => Ok(Opcode::Function),
            0x25 => Ok(Opcode::Call),
            0x26 => Ok(Opcode::LoadIp),
            0x27 => Ok(Opcode::LoadFp),
            0x28 => Ok(Opcode::SetReturn),
            0x29 => Ok(Opcode::PushReturn),
            0x2A => Ok(Opcode::Struct),
            0x2B => Ok(Opcode::Destruct),
            0x2C => Ok(Opcode::GetField),
            0x2D => Ok(Opcode::ExtractField),
            0x2E => Ok(Opcode::SetField),
            0x2F => Ok(Opcode::InsertField),
            0x30 => Ok(Opcode::RefLocal),
            0x31 => Ok(Opcode::Deref),
            0x32 => Ok(Opcode::SetRef),
            0x33 => Ok(Opcode::IsValType),
            0x34 => Ok(Opcode::IsObjType),
            _ => Err(DecodeError::UnknownOpcode(value)),
        }
    }
}

impl Opcode {
    /// Returns the mnemonic for this opcode, as the diagnostics print it.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::PushConst => "OP_PUSH_CONST",
            Opcode::PushTrue => "OP_PUSH_TRUE",
            Opcode::PushFalse => "OP_PUSH_FALSE",
            Opcode::PushNil => "OP_PUSH_NIL",
            Opcode::SetGlobal => "OP_SET_GLOBAL",
            Opcode::PushGlobal => "OP_PUSH_GLOBAL",
            Opcode::SetLocal => "OP_SET_LOCAL",
            Opcode::PushLocal => "OP_PUSH_LOCAL",
            Opcode::Int => "OP_INT",
            Opcode::Bool => "OP_BOOL",
            Opcode::Num => "OP_NUM",
            Opcode::Str => "OP_STR",
            Opcode::Clock => "OP_CLOCK",
            Opcode::Print => "OP_PRINT",
            Opcode::Pop => "OP_POP",
            Opcode::Squash => "OP_SQUASH",
            Opcode::IntNeg => "OP_INT_NEG",
            Opcode::NumNeg => "OP_NUM_NEG",
            Opcode::IntAdd => "OP_INT_ADD",
            Opcode::NumAdd => "OP_NUM_ADD",
            Opcode::IntSub => "OP_INT_SUB",
            Opcode::NumSub => "OP_NUM_SUB",
            Opcode::IntMul => "OP_INT_MUL",
            Opcode::NumMul => "OP_NUM_MUL",
            Opcode::IntDiv => "OP_INT_DIV",
            Opcode::NumDiv => "OP_NUM_DIV",
            Opcode::StrCat => "OP_STR_CAT",
            Opcode::Not => "OP_NOT",
            Opcode::IntLess => "OP_INT_LESS",
            Opcode::NumLess => "OP_NUM_LESS",
            Opcode::IntGreater => "OP_INT_GREATER",
            Opcode::NumGreater => "OP_NUM_GREATER",
            Opcode::Equal => "OP_EQUAL",
            Opcode::Jump => "OP_JUMP",
            Opcode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            Opcode::Loop => "OP_LOOP",
            Opcode::Function => "OP_FUNCTION",
            Opcode::Call => "OP_CALL",
            Opcode::LoadIp => "OP_LOAD_IP",
            Opcode::LoadFp => "OP_LOAD_FP",
            Opcode::SetReturn => "OP_SET_RETURN",
            Opcode::PushReturn => "OP_PUSH_RETURN",
            Opcode::Struct => "OP_STRUCT",
            Opcode::Destruct => "OP_DESTRUCT",
            Opcode::GetField => "OP_GET_FIELD",
            Opcode::ExtractField => "OP_EXTRACT_FIELD",
            Opcode::SetField => "OP_SET_FIELD",
            Opcode::InsertField => "OP_INSERT_FIELD",
            Opcode::RefLocal => "OP_REF_LOCAL",
            Opcode::Deref => "OP_DEREF",
            Opcode::SetRef => "OP_SET_REF",
            Opcode::IsValType => "OP_IS_VAL_TYPE",
            Opcode::IsObjType => "OP_IS_OBJ_TYPE",
        }
    }

    /// Number of inline u8 operands following the opcode byte.
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::PushConst
            | Opcode::SetGlobal
            | Opcode::PushGlobal
            | Opcode::SetLocal
            | Opcode::PushLocal
            | Opcode::Jump
            | Opcode::JumpIfFalse
            | Opcode::Loop
            | Opcode::Function
            | Opcode::Call
            | Opcode::Struct
            | Opcode::Destruct
            | Opcode::GetField
            | Opcode::SetField
            | Opcode::RefLocal
            | Opcode::IsValType
            | Opcode::IsObjType => 1,
            Opcode::ExtractField | Opcode::InsertField => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_count() {
        assert_eq!(ALL_OPCODES.len(), 53);
        assert_eq!(ALL_OPCODES.len(), OP_COUNT);
    }

    #[test]
    fn byte_values_are_contiguous() {
        for (i, &opcode) in ALL_OPCODES.iter().enumerate() {
            assert_eq!(opcode as usize, i, "gap at {opcode:?}");
        }
    }

    #[test]
    fn roundtrip_all_valid_opcodes() {
        for &opcode in &ALL_OPCODES {
            let byte = opcode as u8;
            let decoded = Opcode::try_from(byte).unwrap();
            assert_eq!(
                opcode, decoded,
                "roundtrip failed for {opcode:?} ({byte:#04x})"
            );
        }
    }

    #[test]
    fn bytes_past_the_table_are_rejected() {
        for byte in 0x35..=0xFFu8 {
            assert_eq!(
                Opcode::try_from(byte),
                Err(DecodeError::UnknownOpcode(byte)),
                "byte {byte:#04x} should not decode"
            );
        }
    }

    #[test]
    fn every_byte_value_resolves() {
        // Every u8 value must produce either Ok or a specific Err — never panic.
        for byte in 0..=255u8 {
            match Opcode::try_from(byte) {
                Ok(_) | Err(DecodeError::UnknownOpcode(_)) => {}
                other => panic!("unexpected result for byte {byte:#04x}: {other:?}"),
            }
        }
    }

    #[test]
    fn mnemonics_are_prefixed_and_uppercase() {
        for &opcode in &ALL_OPCODES {
            let m = opcode.mnemonic();
            assert!(m.starts_with("OP_"), "bad prefix for {opcode:?}: {m}");
            assert_eq!(m, m.to_uppercase(), "mnemonic should be uppercase: {m}");
        }
    }

    #[test]
    fn operand_counts() {
        assert_eq!(Opcode::Print.operand_count(), 0);
        assert_eq!(Opcode::PushConst.operand_count(), 1);
        assert_eq!(Opcode::ExtractField.operand_count(), 2);
        assert_eq!(Opcode::InsertField.operand_count(), 2);
        for &opcode in &ALL_OPCODES {
            assert!(opcode.operand_count() <= 2);
        }
    }
}
