//! Dispatch loop and opcode handlers for the Clear VM.
//!
//! One opcode maps to one handler through a fixed-size table indexed by
//! the opcode byte. The table starts out filled with an "unimplemented"
//! sentinel and is then populated entry by entry, which keeps tracing
//! instrumentation uniform: the loop latches the opcode offset, logs,
//! and calls through the table.

use clear_common::{Opcode, OP_COUNT};

use crate::error::{Fault, RuntimeError};
use crate::heap::{ObjHandle, Upvalue};
use crate::machine::Vm;
use crate::value::Value;

/// Num equality tolerance for `OP_EQUAL`.
const NUM_PRECISION: f64 = 0.0000001;

/// An opcode handler: performs the operation and reports the outcome.
pub(crate) type Handler<'m> = fn(&mut Vm<'m>) -> Result<(), RuntimeError>;

/// Build the handler table: sentinel first, then one entry per opcode.
pub(crate) fn dispatch_table<'m>() -> [Handler<'m>; OP_COUNT] {
    let mut table: [Handler<'m>; OP_COUNT] = [Vm::op_unimplemented; OP_COUNT];
    table[Opcode::PushConst as usize] = Vm::op_push_const;
    table[Opcode::PushTrue as usize] = Vm::op_push_true;
    table[Opcode::PushFalse as usize] = Vm::op_push_false;
    table[Opcode::PushNil as usize] = Vm::op_push_nil;
    table[Opcode::SetGlobal as usize] = Vm::op_set_global;
    table[Opcode::PushGlobal as usize] = Vm::op_push_global;
    table[Opcode::SetLocal as usize] = Vm::op_set_local;
    table[Opcode::PushLocal as usize] = Vm::op_push_local;
    table[Opcode::Int as usize] = Vm::op_int;
    table[Opcode::Bool as usize] = Vm::op_bool;
    table[Opcode::Num as usize] = Vm::op_num;
    table[Opcode::Str as usize] = Vm::op_str;
    table[Opcode::Clock as usize] = Vm::op_clock;
    table[Opcode::Print as usize] = Vm::op_print;
    table[Opcode::Pop as usize] = Vm::op_pop;
    table[Opcode::Squash as usize] = Vm::op_squash;
    table[Opcode::IntNeg as usize] = Vm::op_int_neg;
    table[Opcode::NumNeg as usize] = Vm::op_num_neg;
    table[Opcode::IntAdd as usize] = Vm::op_int_add;
    table[Opcode::NumAdd as usize] = Vm::op_num_add;
    table[Opcode::IntSub as usize] = Vm::op_int_sub;
    table[Opcode::NumSub as usize] = Vm::op_num_sub;
    table[Opcode::IntMul as usize] = Vm::op_int_mul;
    table[Opcode::NumMul as usize] = Vm::op_num_mul;
    table[Opcode::IntDiv as usize] = Vm::op_int_div;
    table[Opcode::NumDiv as usize] = Vm::op_num_div;
    table[Opcode::StrCat as usize] = Vm::op_str_cat;
    table[Opcode::Not as usize] = Vm::op_not;
    table[Opcode::IntLess as usize] = Vm::op_int_less;
    table[Opcode::NumLess as usize] = Vm::op_num_less;
    table[Opcode::IntGreater as usize] = Vm::op_int_greater;
    table[Opcode::NumGreater as usize] = Vm::op_num_greater;
    table[Opcode::Equal as usize] = Vm::op_equal;
    table[Opcode::Jump as usize] = Vm::op_jump;
    table[Opcode::JumpIfFalse as usize] = Vm::op_jump_if_false;
    table[Opcode::Loop as usize] = Vm::op_loop;
    table[Opcode::Function as usize] = Vm::op_function;
    table[Opcode::Call as usize] = Vm::op_call;
    table[Opcode::LoadIp as usize] = Vm::op_load_ip;
    table[Opcode::LoadFp as usize] = Vm::op_load_fp;
    table[Opcode::SetReturn as usize] = Vm::op_set_return;
    table[Opcode::PushReturn as usize] = Vm::op_push_return;
    table[Opcode::Struct as usize] = Vm::op_struct;
    table[Opcode::Destruct as usize] = Vm::op_destruct;
    table[Opcode::GetField as usize] = Vm::op_get_field;
    table[Opcode::ExtractField as usize] = Vm::op_extract_field;
    table[Opcode::SetField as usize] = Vm::op_set_field;
    table[Opcode::InsertField as usize] = Vm::op_insert_field;
    table[Opcode::RefLocal as usize] = Vm::op_ref_local;
    table[Opcode::Deref as usize] = Vm::op_deref;
    table[Opcode::SetRef as usize] = Vm::op_set_ref;
    table[Opcode::IsValType as usize] = Vm::op_is_val_type;
    table[Opcode::IsObjType as usize] = Vm::op_is_obj_type;
    table
}

/// Lenient operand reads for the typed arithmetic and comparison
/// handlers: the compiler is responsible for operand types, so these skip
/// tag checks and read mis-typed operands as zero rather than trapping.
fn int_of(value: Value) -> i32 {
    match value {
        Value::Int(i) => i,
        _ => 0,
    }
}

fn num_of(value: Value) -> f64 {
    match value {
        Value::Num(n) => n,
        _ => 0.0,
    }
}

fn bool_of(value: Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// `OP_EQUAL` semantics: by value for Bool/Nil/Int, within
/// [`NUM_PRECISION`] for Num, by identity for objects (interning makes
/// this byte equality for strings), by payload for IP/FP. Different tags
/// are never equal.
fn values_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Num(x), Value::Num(y)) => (x - y).abs() < NUM_PRECISION,
        (Value::Obj(x), Value::Obj(y)) => x == y,
        (Value::Ip(x), Value::Ip(y)) => x == y,
        (Value::Fp(x), Value::Fp(y)) => x == y,
        _ => false,
    }
}

impl<'m> Vm<'m> {
    /// Run the dispatch loop until `ip` reaches the end of the code
    /// segment or a handler fails.
    pub fn execute(&mut self) -> Result<(), Fault> {
        while self.ip < self.end() {
            self.op_at = self.ip;
            let byte = self.module.code[self.ip];
            self.ip += 1;

            let op = Opcode::try_from(byte).map_err(|_| Fault::UnknownOpcode {
                at: self.op_at,
                byte,
            })?;

            #[cfg(feature = "trace")]
            log::trace!("{:04x} {} {:?}", self.op_at, op, self.stack);

            let handler = self.handlers[op as usize];
            handler(self).map_err(|kind| Fault::Trap {
                op,
                at: self.op_at,
                kind,
            })?;
        }
        Ok(())
    }

    /// Sentinel for table slots that were never populated.
    fn op_unimplemented(&mut self) -> Result<(), RuntimeError> {
        Err(RuntimeError::Unimplemented)
    }

    // ---- Constants and literals ----

    fn op_push_const(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()?;
        let value = self.constants.get(index as usize).copied().ok_or(
            RuntimeError::ConstantIndexOutOfRange {
                index,
                count: self.constants.len(),
            },
        )?;
        self.push(value)
    }

    fn op_push_true(&mut self) -> Result<(), RuntimeError> {
        self.push(Value::Bool(true))
    }

    fn op_push_false(&mut self) -> Result<(), RuntimeError> {
        self.push(Value::Bool(false))
    }

    fn op_push_nil(&mut self) -> Result<(), RuntimeError> {
        self.push(Value::Nil)
    }

    // ---- Variables ----

    fn op_set_global(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()?;
        let value = self.pop()?;
        self.globals[index as usize] = Some(value);
        Ok(())
    }

    fn op_push_global(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()?;
        let value = self.globals[index as usize].ok_or(RuntimeError::UndefinedGlobal { index })?;
        self.push(value)
    }

    fn op_set_local(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()? as usize;
        let value = self.pop()?;
        let slot = self.local_slot(index)?;
        // The slot's upvalue-reference chain is keyed by the slot index,
        // so captures observe the new value without any rewiring.
        self.stack[slot] = value;
        Ok(())
    }

    fn op_push_local(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()? as usize;
        let slot = self.local_slot(index)?;
        self.push(self.stack[slot])
    }

    // ---- Casts (in place on the top slot) ----

    fn op_int(&mut self) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        let cast = match value {
            Value::Nil => Value::Int(0),
            Value::Bool(b) => Value::Int(b as i32),
            Value::Int(i) => Value::Int(i),
            // Saturating truncation toward zero; NaN maps to 0.
            Value::Num(n) => Value::Int(n as i32),
            other => return Err(RuntimeError::InvalidCast { from: other.tag() }),
        };
        *self.top_mut()? = cast;
        Ok(())
    }

    fn op_bool(&mut self) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        let cast = match value {
            Value::Nil => Value::Bool(false),
            Value::Bool(b) => Value::Bool(b),
            Value::Int(i) => Value::Bool(i != 0),
            Value::Num(n) => Value::Bool(n != 0.0),
            other => return Err(RuntimeError::InvalidCast { from: other.tag() }),
        };
        *self.top_mut()? = cast;
        Ok(())
    }

    fn op_num(&mut self) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        let cast = match value {
            Value::Nil => Value::Num(0.0),
            Value::Bool(b) => Value::Num(b as u8 as f64),
            Value::Int(i) => Value::Num(i as f64),
            Value::Num(n) => Value::Num(n),
            other => return Err(RuntimeError::InvalidCast { from: other.tag() }),
        };
        *self.top_mut()? = cast;
        Ok(())
    }

    fn op_str(&mut self) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        let text = match value {
            Value::Nil => "nil".to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Int(i) => i.to_string(),
            // Exactly seven fractional digits.
            Value::Num(n) => format!("{n:.7}"),
            other => return Err(RuntimeError::InvalidCast { from: other.tag() }),
        };
        let handle = self.heap.intern(&text);
        *self.top_mut()? = Value::Obj(handle);
        Ok(())
    }

    // ---- Built-ins ----

    fn op_clock(&mut self) -> Result<(), RuntimeError> {
        let seconds = self.clock_seconds();
        self.push(Value::Num(seconds))
    }

    fn op_print(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let text = match value {
            Value::Obj(handle) => self
                .heap
                .string(handle)
                .ok_or(RuntimeError::NonStringPrint)?,
            _ => return Err(RuntimeError::NonStringPrint),
        };
        writeln!(self.out, "{text}").map_err(|_| RuntimeError::OutputFailed)
    }

    fn op_pop(&mut self) -> Result<(), RuntimeError> {
        if self.stack.is_empty() {
            return Err(RuntimeError::StackUnderflow);
        }
        // Captures of the dying slot keep observing its final value.
        self.close_slot(self.stack.len() - 1);
        self.stack.pop();
        Ok(())
    }

    fn op_squash(&mut self) -> Result<(), RuntimeError> {
        let top = self.pop()?;
        if self.stack.is_empty() {
            return Err(RuntimeError::StackUnderflow);
        }
        self.close_slot(self.stack.len() - 1);
        self.stack.pop();
        self.push(top)
    }

    // ---- Arithmetic ----

    fn int_unop(&mut self, op: fn(i32) -> i32) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        *self.top_mut()? = Value::Int(op(int_of(value)));
        Ok(())
    }

    fn num_unop(&mut self, op: fn(f64) -> f64) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        *self.top_mut()? = Value::Num(op(num_of(value)));
        Ok(())
    }

    fn int_binop(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Int(op(int_of(a), int_of(b))))
    }

    fn num_binop(&mut self, op: fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Num(op(num_of(a), num_of(b))))
    }

    fn op_int_neg(&mut self) -> Result<(), RuntimeError> {
        self.int_unop(i32::wrapping_neg)
    }

    fn op_num_neg(&mut self) -> Result<(), RuntimeError> {
        self.num_unop(|n| -n)
    }

    fn op_int_add(&mut self) -> Result<(), RuntimeError> {
        self.int_binop(i32::wrapping_add)
    }

    fn op_num_add(&mut self) -> Result<(), RuntimeError> {
        self.num_binop(|a, b| a + b)
    }

    fn op_int_sub(&mut self) -> Result<(), RuntimeError> {
        self.int_binop(i32::wrapping_sub)
    }

    fn op_num_sub(&mut self) -> Result<(), RuntimeError> {
        self.num_binop(|a, b| a - b)
    }

    fn op_int_mul(&mut self) -> Result<(), RuntimeError> {
        self.int_binop(i32::wrapping_mul)
    }

    fn op_num_mul(&mut self) -> Result<(), RuntimeError> {
        self.num_binop(|a, b| a * b)
    }

    fn op_int_div(&mut self) -> Result<(), RuntimeError> {
        // Division by zero yields 0 rather than trapping; Num division
        // follows IEEE 754.
        self.int_binop(|a, b| if b == 0 { 0 } else { a.wrapping_div(b) })
    }

    fn op_num_div(&mut self) -> Result<(), RuntimeError> {
        self.num_binop(|a, b| a / b)
    }

    fn op_str_cat(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let text = match (a, b) {
            (Value::Obj(ha), Value::Obj(hb)) => {
                match (self.heap.string(ha), self.heap.string(hb)) {
                    (Some(sa), Some(sb)) => format!("{sa}{sb}"),
                    _ => return Err(RuntimeError::NonStringConcat),
                }
            }
            _ => return Err(RuntimeError::NonStringConcat),
        };
        let handle = self.heap.intern(&text);
        self.push(Value::Obj(handle))
    }

    fn op_not(&mut self) -> Result<(), RuntimeError> {
        let value = self.peek(0)?;
        *self.top_mut()? = Value::Bool(!bool_of(value));
        Ok(())
    }

    // ---- Comparison ----

    fn int_cmp(&mut self, op: fn(i32, i32) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(op(int_of(a), int_of(b))))
    }

    fn num_cmp(&mut self, op: fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(op(num_of(a), num_of(b))))
    }

    fn op_int_less(&mut self) -> Result<(), RuntimeError> {
        self.int_cmp(|a, b| a < b)
    }

    fn op_num_less(&mut self) -> Result<(), RuntimeError> {
        self.num_cmp(|a, b| a < b)
    }

    fn op_int_greater(&mut self) -> Result<(), RuntimeError> {
        self.int_cmp(|a, b| a > b)
    }

    fn op_num_greater(&mut self) -> Result<(), RuntimeError> {
        self.num_cmp(|a, b| a > b)
    }

    fn op_equal(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(values_equal(a, b)))
    }

    // ---- Control flow ----

    /// Move `ip` to `target`, which must stay within `[0, end]`.
    fn jump_to(&mut self, target: i64) -> Result<(), RuntimeError> {
        let end = self.end();
        if target < 0 || target as usize > end {
            return Err(RuntimeError::JumpOutOfRange { target, end });
        }
        self.ip = target as usize;
        Ok(())
    }

    fn op_jump(&mut self) -> Result<(), RuntimeError> {
        let off = self.fetch_u8()?;
        self.jump_to(self.ip as i64 + off as i64)
    }

    fn op_jump_if_false(&mut self) -> Result<(), RuntimeError> {
        let off = self.fetch_u8()?;
        let value = self.pop()?;
        if value == Value::Bool(false) {
            self.jump_to(self.ip as i64 + off as i64)?;
        }
        Ok(())
    }

    fn op_loop(&mut self) -> Result<(), RuntimeError> {
        let off = self.fetch_u8()?;
        self.jump_to(self.ip as i64 - off as i64)
    }

    // ---- Functions ----

    fn op_function(&mut self) -> Result<(), RuntimeError> {
        let off = self.fetch_u8()?;
        let entry = self.ip;
        self.push(Value::Ip(entry as u32))?;
        // Skip the function body; the IP value is its entry point.
        self.jump_to(entry as i64 + off as i64)
    }

    fn op_call(&mut self) -> Result<(), RuntimeError> {
        let arity = self.fetch_u8()? as usize;
        let target = match self.pop()? {
            Value::Ip(target) => target,
            _ => return Err(RuntimeError::NonFunctionCall),
        };
        let args = self.pop_n(arity)?;

        self.push(Value::Ip(self.ip as u32))?;
        self.push(Value::Fp(self.fp as u16))?;
        self.fp = self.stack.len();
        self.jump_to(target as i64)?;
        // The callee sees its arguments as fp[0..arity).
        self.push_n(&args)
    }

    fn op_load_ip(&mut self) -> Result<(), RuntimeError> {
        match self.pop()? {
            Value::Ip(target) => self.jump_to(target as i64),
            _ => Err(RuntimeError::NonIpLoad),
        }
    }

    fn op_load_fp(&mut self) -> Result<(), RuntimeError> {
        match self.pop()? {
            Value::Fp(fp) => {
                self.fp = fp as usize;
                Ok(())
            }
            _ => Err(RuntimeError::NonFpLoad),
        }
    }

    fn op_set_return(&mut self) -> Result<(), RuntimeError> {
        self.return_store = self.pop()?;
        Ok(())
    }

    fn op_push_return(&mut self) -> Result<(), RuntimeError> {
        self.push(self.return_store)
    }

    // ---- Structs ----

    fn op_struct(&mut self) -> Result<(), RuntimeError> {
        let count = self.fetch_u8()? as usize;
        // Fields in push order; the arity is fixed from here on.
        let fields = self.pop_n(count)?;
        let handle = self.heap.alloc_struct(fields);
        self.push(Value::Obj(handle))
    }

    /// The struct behind `value`, or `NonStructField`.
    fn struct_of(&self, value: Value) -> Result<(ObjHandle, &[Value]), RuntimeError> {
        match value {
            Value::Obj(handle) => self
                .heap
                .struct_fields(handle)
                .map(|fields| (handle, fields))
                .ok_or(RuntimeError::NonStructField),
            _ => Err(RuntimeError::NonStructField),
        }
    }

    fn op_destruct(&mut self) -> Result<(), RuntimeError> {
        let from = self.fetch_u8()? as usize;
        let value = self.pop()?;
        let (_, fields) = self.struct_of(value)?;
        if from > fields.len() {
            return Err(RuntimeError::FieldOutOfRange {
                index: from,
                count: fields.len(),
            });
        }
        let tail = fields[from..].to_vec();
        self.push_n(&tail)
    }

    fn op_get_field(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()? as usize;
        let value = self.pop()?;
        let (_, fields) = self.struct_of(value)?;
        let field = *fields.get(index).ok_or(RuntimeError::FieldOutOfRange {
            index,
            count: fields.len(),
        })?;
        self.push(field)
    }

    fn op_extract_field(&mut self) -> Result<(), RuntimeError> {
        let off = self.fetch_u8()? as usize;
        let index = self.fetch_u8()? as usize;
        let value = self.peek(off)?;
        let (_, fields) = self.struct_of(value)?;
        let field = *fields.get(index).ok_or(RuntimeError::FieldOutOfRange {
            index,
            count: fields.len(),
        })?;
        self.push(field)
    }

    fn op_set_field(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()? as usize;
        let value = self.pop()?;
        let (handle, fields) = self.struct_of(self.peek(0)?)?;
        let count = fields.len();
        if index >= count {
            return Err(RuntimeError::FieldOutOfRange { index, count });
        }
        self.heap.struct_fields_mut(handle).expect("checked above")[index] = value;
        Ok(())
    }

    fn op_insert_field(&mut self) -> Result<(), RuntimeError> {
        let off = self.fetch_u8()? as usize;
        let index = self.fetch_u8()? as usize;
        let value = self.pop()?;
        let (handle, fields) = self.struct_of(self.peek(off)?)?;
        let count = fields.len();
        if index >= count {
            return Err(RuntimeError::FieldOutOfRange { index, count });
        }
        self.heap.struct_fields_mut(handle).expect("checked above")[index] = value;
        Ok(())
    }

    // ---- Upvalues ----

    fn op_ref_local(&mut self) -> Result<(), RuntimeError> {
        let index = self.fetch_u8()? as usize;
        let slot = self.local_slot(index)?;
        let handle = self.heap.alloc_upvalue(slot);
        self.open_upvalues.entry(slot).or_default().push(handle);
        self.push(Value::Obj(handle))
    }

    /// The upvalue behind `value`, or `NonUpvalueDeref`.
    fn upvalue_of(&self, value: Value) -> Result<ObjHandle, RuntimeError> {
        match value {
            Value::Obj(handle) if self.heap.upvalue(handle).is_some() => Ok(handle),
            _ => Err(RuntimeError::NonUpvalueDeref),
        }
    }

    fn op_deref(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let handle = self.upvalue_of(value)?;
        let referenced = match self.heap.upvalue(handle).expect("checked above") {
            Upvalue::Open { slot } => {
                let slot = *slot;
                let depth = self.stack.len();
                if slot >= depth {
                    return Err(RuntimeError::PeekUnderRange { offset: slot, depth });
                }
                self.stack[slot]
            }
            Upvalue::Closed(captured) => *captured,
        };
        self.push(referenced)
    }

    fn op_set_ref(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let target = self.pop()?;
        let handle = self.upvalue_of(target)?;
        let open_slot = match self.heap.upvalue(handle).expect("checked above") {
            Upvalue::Open { slot } => Some(*slot),
            Upvalue::Closed(_) => None,
        };
        match open_slot {
            Some(slot) => {
                let depth = self.stack.len();
                if slot >= depth {
                    return Err(RuntimeError::PeekUnderRange { offset: slot, depth });
                }
                self.stack[slot] = value;
            }
            None => self.heap.set_closed(handle, value),
        }
        Ok(())
    }

    // ---- Type tests ----

    fn op_is_val_type(&mut self) -> Result<(), RuntimeError> {
        let tag = self.fetch_u8()?;
        let value = self.peek(0)?;
        self.push(Value::Bool(value.tag() as u8 == tag))
    }

    fn op_is_obj_type(&mut self) -> Result<(), RuntimeError> {
        let tag = self.fetch_u8()?;
        let value = self.peek(0)?;
        let matches = match value {
            Value::Obj(handle) => self.heap.get(handle).tag() as u8 == tag,
            // Gated on the value tag: a non-object never matches.
            _ => false,
        };
        self.push(Value::Bool(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clear_common::ALL_OPCODES;

    #[test]
    fn table_covers_every_opcode() {
        let table = dispatch_table();
        assert_eq!(table.len(), OP_COUNT);
        for &op in &ALL_OPCODES {
            assert!((op as usize) < table.len());
        }
    }

    #[test]
    fn lenient_reads_default_to_zero() {
        assert_eq!(int_of(Value::Nil), 0);
        assert_eq!(int_of(Value::Int(7)), 7);
        assert_eq!(num_of(Value::Bool(true)), 0.0);
        assert_eq!(num_of(Value::Num(2.5)), 2.5);
        assert!(!bool_of(Value::Int(1)));
        assert!(bool_of(Value::Bool(true)));
    }

    #[test]
    fn equality_follows_tags() {
        assert!(values_equal(Value::Nil, Value::Nil));
        assert!(values_equal(Value::Int(3), Value::Int(3)));
        assert!(!values_equal(Value::Int(3), Value::Num(3.0)));
        assert!(values_equal(Value::Num(1.0), Value::Num(1.0 + 1e-9)));
        assert!(!values_equal(Value::Num(1.0), Value::Num(1.001)));
        assert!(values_equal(Value::Ip(4), Value::Ip(4)));
        assert!(!values_equal(Value::Ip(4), Value::Fp(4)));
    }
}
