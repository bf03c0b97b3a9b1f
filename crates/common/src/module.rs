//! Module representation for Clear binaries.
//!
//! A `.clr.b` file is a constant header followed by a raw code segment:
//!
//! ```text
//! N:u8                         constant count
//! N records, each:
//!   0x00  i32 (little-endian)      CONST_INT
//!   0x01  f64 (little-endian)      CONST_NUM
//!   0x02  L:u8 then L bytes        CONST_STR (no terminator)
//! code bytes                   until end of file
//! ```

use crate::error::DecodeError;
use crate::reader::Reader;

/// Constant record tags in the module header.
pub const CONST_INT: u8 = 0x00;
pub const CONST_NUM: u8 = 0x01;
pub const CONST_STR: u8 = 0x02;

/// A constant as it appears in the module header.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Signed 32-bit integer.
    Int(i32),
    /// IEEE 754 64-bit float.
    Num(f64),
    /// UTF-8 string, at most 255 bytes on the wire.
    Str(String),
}

/// A decoded Clear module: constant pool plus code segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Constants in header order, addressed by `OP_PUSH_CONST`.
    pub constants: Vec<Constant>,
    /// The code segment. Instruction pointers are offsets into this.
    pub code: Vec<u8>,
}

impl Module {
    /// Decode a byte buffer into a module.
    ///
    /// Fails with [`DecodeError::TruncatedHeader`] on any short read inside
    /// the header and [`DecodeError::UnknownConstantTag`] on an
    /// unrecognized record kind. The code segment is not validated here;
    /// opcode decoding happens instruction by instruction at run time.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);

        let count = r.read_u8().ok_or(DecodeError::TruncatedHeader { at: 0 })?;
        let mut constants = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let at = r.pos();
            let tag = r.read_u8().ok_or(DecodeError::TruncatedHeader { at })?;
            let constant = match tag {
                CONST_INT => {
                    let v = r.read_i32().ok_or(DecodeError::TruncatedHeader { at })?;
                    Constant::Int(v)
                }
                CONST_NUM => {
                    let v = r.read_f64().ok_or(DecodeError::TruncatedHeader { at })?;
                    Constant::Num(v)
                }
                CONST_STR => {
                    let len = r.read_u8().ok_or(DecodeError::TruncatedHeader { at })?;
                    let raw = r
                        .read_bytes(len as usize)
                        .ok_or(DecodeError::TruncatedHeader { at })?;
                    Constant::Str(String::from_utf8_lossy(raw).into_owned())
                }
                _ => return Err(DecodeError::UnknownConstantTag { tag, at }),
            };
            constants.push(constant);
        }

        Ok(Self {
            constants,
            code: r.rest().to_vec(),
        })
    }

    /// Encode this module back to wire bytes.
    ///
    /// The writer half of the format; `decode(encode(m)) == m` for any
    /// module whose strings fit in 255 bytes and whose pool holds at most
    /// 255 constants. Longer inputs are truncated at the wire limits.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.code.len());
        let count = self.constants.len().min(255);
        bytes.push(count as u8);

        for constant in self.constants.iter().take(count) {
            match constant {
                Constant::Int(v) => {
                    bytes.push(CONST_INT);
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
                Constant::Num(v) => {
                    bytes.push(CONST_NUM);
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
                Constant::Str(s) => {
                    bytes.push(CONST_STR);
                    let len = s.len().min(255);
                    bytes.push(len as u8);
                    bytes.extend_from_slice(&s.as_bytes()[..len]);
                }
            }
        }

        bytes.extend_from_slice(&self.code);
        bytes
    }
}
