//! Disassembler: decoded module → flat listing.
//!
//! Output is one line per constant, then one line per instruction with
//! its byte offset. Offsets are what jump operands are relative to, so
//! the listing is the reference when reading trace output.

use std::fmt::Write;

use clear_common::{Constant, Module, ObjTag, Opcode, Reader, ValueTag};

/// Disassemble a module into a printable listing.
///
/// The code segment is decoded instruction by instruction; a byte that is
/// not an opcode or an instruction cut short by the end of the segment is
/// rendered in place rather than reported as an error, so partial and
/// malformed modules still produce a readable listing.
pub fn disassemble(module: &Module) -> String {
    let mut text = String::new();

    for (index, constant) in module.constants.iter().enumerate() {
        let line = match constant {
            Constant::Int(v) => format!(".const {index} int {v}"),
            Constant::Num(v) => format!(".const {index} num {v:.7}"),
            Constant::Str(s) => format!(".const {index} str {s:?}"),
        };
        text.push_str(&line);
        text.push('\n');
    }

    let mut r = Reader::new(&module.code);
    while !r.is_at_end() {
        let at = r.pos();
        let byte = r.read_u8().expect("not at end");

        let line = match Opcode::try_from(byte) {
            Ok(op) => {
                let mut line = format!("{at:04x} {}", op.mnemonic());
                match op {
                    // Type-test operands are tag bytes; show their names.
                    Opcode::IsValType => {
                        push_tag_operand(&mut line, &mut r, |b| {
                            ValueTag::try_from(b).ok().map(|t| t.name())
                        });
                    }
                    Opcode::IsObjType => {
                        push_tag_operand(&mut line, &mut r, |b| {
                            ObjTag::try_from(b).ok().map(|t| t.name())
                        });
                    }
                    _ => {
                        for _ in 0..op.operand_count() {
                            match r.read_u8() {
                                Some(operand) => {
                                    let _ = write!(line, " {operand}");
                                }
                                None => {
                                    line.push_str(" <truncated>");
                                    break;
                                }
                            }
                        }
                    }
                }
                line
            }
            Err(_) => format!("{at:04x} .byte {byte:#04x}"),
        };

        text.push_str(&line);
        text.push('\n');
    }

    text
}

/// Render a tag operand by name, falling back to the raw byte when it
/// names no tag.
fn push_tag_operand(line: &mut String, r: &mut Reader<'_>, name_of: fn(u8) -> Option<&'static str>) {
    match r.read_u8() {
        Some(byte) => match name_of(byte) {
            Some(name) => {
                let _ = write!(line, " {name}");
            }
            None => {
                let _ = write!(line, " {byte}");
            }
        },
        None => line.push_str(" <truncated>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(constants: Vec<Constant>, code: Vec<u8>) -> Module {
        Module { constants, code }
    }

    #[test]
    fn empty_module() {
        assert_eq!(disassemble(&module(vec![], vec![])), "");
    }

    #[test]
    fn constants_are_listed_first() {
        let m = module(
            vec![
                Constant::Int(-2),
                Constant::Num(1.5),
                Constant::Str("hi".into()),
            ],
            vec![],
        );
        assert_eq!(
            disassemble(&m),
            ".const 0 int -2\n.const 1 num 1.5000000\n.const 2 str \"hi\"\n"
        );
    }

    #[test]
    fn operandless_instruction() {
        let m = module(vec![], vec![0x0D]);
        assert_eq!(disassemble(&m), "0000 OP_PRINT\n");
    }

    #[test]
    fn single_operand_instruction() {
        let m = module(vec![], vec![0x00, 0x03]);
        assert_eq!(disassemble(&m), "0000 OP_PUSH_CONST 3\n");
    }

    #[test]
    fn two_operand_instruction() {
        let m = module(vec![], vec![0x2D, 0x01, 0x00]);
        assert_eq!(disassemble(&m), "0000 OP_EXTRACT_FIELD 1 0\n");
    }

    #[test]
    fn offsets_count_operand_bytes() {
        let m = module(vec![], vec![0x00, 0x00, 0x0B, 0x0D]);
        assert_eq!(
            disassemble(&m),
            "0000 OP_PUSH_CONST 0\n0002 OP_STR\n0003 OP_PRINT\n"
        );
    }

    #[test]
    fn is_val_type_operand_prints_the_tag_name() {
        let m = module(vec![], vec![0x33, ValueTag::Num as u8]);
        assert_eq!(disassemble(&m), "0000 OP_IS_VAL_TYPE NUM\n");
    }

    #[test]
    fn is_obj_type_operand_prints_the_tag_name() {
        let m = module(vec![], vec![0x34, ObjTag::Struct as u8]);
        assert_eq!(disassemble(&m), "0000 OP_IS_OBJ_TYPE STRUCT\n");
    }

    #[test]
    fn unassigned_tag_byte_falls_back_to_decimal() {
        let m = module(vec![], vec![0x33, 0x63]);
        assert_eq!(disassemble(&m), "0000 OP_IS_VAL_TYPE 99\n");
    }

    #[test]
    fn truncated_tag_operand_is_marked() {
        let m = module(vec![], vec![0x34]);
        assert_eq!(disassemble(&m), "0000 OP_IS_OBJ_TYPE <truncated>\n");
    }

    #[test]
    fn unknown_byte_is_rendered_in_place() {
        let m = module(vec![], vec![0x0D, 0xFF, 0x0D]);
        assert_eq!(
            disassemble(&m),
            "0000 OP_PRINT\n0001 .byte 0xff\n0002 OP_PRINT\n"
        );
    }

    #[test]
    fn truncated_operand_is_marked() {
        let m = module(vec![], vec![0x00]);
        assert_eq!(disassemble(&m), "0000 OP_PUSH_CONST <truncated>\n");
    }

    #[test]
    fn scenario_listing() {
        // The print-constant scenario: PUSH_CONST 0; PRINT.
        let m = module(vec![Constant::Str("hello".into())], vec![0x00, 0x00, 0x0D]);
        assert_eq!(
            disassemble(&m),
            ".const 0 str \"hello\"\n0000 OP_PUSH_CONST 0\n0002 OP_PRINT\n"
        );
    }
}
