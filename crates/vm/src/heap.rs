//! Object heap: allocation, string interning, and the upvalue lifecycle.
//!
//! Objects are records in a flat vector addressed by [`ObjHandle`]; there
//! is no reclamation while the VM runs, and the whole heap is released
//! when the VM is dropped. Strings are interned: allocating byte-equal
//! text twice yields the same handle, so string equality is handle
//! equality.

use std::collections::HashMap;

use clear_common::ObjTag;

use crate::value::Value;

/// Index of an object record in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjHandle(u32);

impl ObjHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A heap object record.
#[derive(Debug)]
pub enum Object {
    /// Immutable interned UTF-8 text.
    String(Box<str>),
    /// Fixed-arity mutable tuple. The field count never changes after
    /// allocation.
    Struct(Vec<Value>),
    /// Capture cell for a local.
    Upvalue(Upvalue),
}

/// An upvalue is OPEN while its local's stack slot is live, CLOSED after.
/// The transition happens at most once.
#[derive(Debug)]
pub enum Upvalue {
    /// References an absolute slot index on the evaluation stack.
    Open { slot: usize },
    /// Owns the captured value.
    Closed(Value),
}

impl Object {
    /// Returns the wire tag for this object.
    pub fn tag(&self) -> ObjTag {
        match self {
            Object::String(_) => ObjTag::String,
            Object::Struct(_) => ObjTag::Struct,
            Object::Upvalue(_) => ObjTag::Upvalue,
        }
    }
}

/// Heap allocation totals, for the memory-accounting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Number of live object records.
    pub objects: usize,
    /// Payload bytes across all records.
    pub payload_bytes: usize,
}

/// The VM's object heap.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
    // Intern table: byte content -> existing handle.
    strings: HashMap<Box<str>, ObjHandle>,
    payload_bytes: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, object: Object) -> ObjHandle {
        let handle = ObjHandle::new(self.objects.len());
        self.objects.push(object);
        handle
    }

    /// Intern a string, returning the existing handle when byte-equal
    /// text was allocated before.
    pub fn intern(&mut self, text: &str) -> ObjHandle {
        if let Some(&handle) = self.strings.get(text) {
            return handle;
        }
        let boxed: Box<str> = text.into();
        self.payload_bytes += boxed.len();
        let handle = self.alloc(Object::String(boxed.clone()));
        self.strings.insert(boxed, handle);
        handle
    }

    /// Allocate a struct with the given fields. The arity is fixed from
    /// here on.
    pub fn alloc_struct(&mut self, fields: Vec<Value>) -> ObjHandle {
        self.payload_bytes += fields.len() * std::mem::size_of::<Value>();
        self.alloc(Object::Struct(fields))
    }

    /// Allocate an open upvalue referencing an absolute stack slot.
    pub fn alloc_upvalue(&mut self, slot: usize) -> ObjHandle {
        self.payload_bytes += std::mem::size_of::<Upvalue>();
        self.alloc(Object::Upvalue(Upvalue::Open { slot }))
    }

    /// Look up an object. Handles are only minted by this heap, so a
    /// lookup cannot fail for values produced by the running program.
    pub fn get(&self, handle: ObjHandle) -> &Object {
        &self.objects[handle.index()]
    }

    /// The interned text behind `handle`, if it is a string.
    pub fn string(&self, handle: ObjHandle) -> Option<&str> {
        match self.get(handle) {
            Object::String(text) => Some(text),
            _ => None,
        }
    }

    /// The field slots behind `handle`, if it is a struct.
    pub fn struct_fields(&self, handle: ObjHandle) -> Option<&[Value]> {
        match self.get(handle) {
            Object::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Mutable field slots behind `handle`, if it is a struct.
    pub fn struct_fields_mut(&mut self, handle: ObjHandle) -> Option<&mut [Value]> {
        match &mut self.objects[handle.index()] {
            Object::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// The upvalue record behind `handle`, if it is one.
    pub fn upvalue(&self, handle: ObjHandle) -> Option<&Upvalue> {
        match self.get(handle) {
            Object::Upvalue(upvalue) => Some(upvalue),
            _ => None,
        }
    }

    /// Close an open upvalue over `value`. Reads and writes through the
    /// upvalue touch the internal copy from now on. Closing an already
    /// closed upvalue is a no-op; the transition happens at most once.
    pub fn close_upvalue(&mut self, handle: ObjHandle, value: Value) {
        if let Object::Upvalue(upvalue) = &mut self.objects[handle.index()] {
            if matches!(upvalue, Upvalue::Open { .. }) {
                *upvalue = Upvalue::Closed(value);
            }
        }
    }

    /// Write through an upvalue that is already closed.
    pub fn set_closed(&mut self, handle: ObjHandle, value: Value) {
        if let Object::Upvalue(upvalue) = &mut self.objects[handle.index()] {
            *upvalue = Upvalue::Closed(value);
        }
    }

    /// Allocation totals.
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            objects: self.objects.len(),
            payload_bytes: self.payload_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedupes_by_bytes() {
        let mut heap = Heap::new();
        let a = heap.intern("hello");
        let b = heap.intern("hello");
        let c = heap.intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(heap.stats().objects, 2);
    }

    #[test]
    fn intern_empty_string() {
        let mut heap = Heap::new();
        let a = heap.intern("");
        let b = heap.intern("");
        assert_eq!(a, b);
        assert_eq!(heap.string(a), Some(""));
    }

    #[test]
    fn struct_fields_are_mutable_but_fixed_arity() {
        let mut heap = Heap::new();
        let handle = heap.alloc_struct(vec![Value::Int(1), Value::Int(2)]);
        heap.struct_fields_mut(handle).unwrap()[1] = Value::Int(20);
        assert_eq!(
            heap.struct_fields(handle).unwrap(),
            &[Value::Int(1), Value::Int(20)]
        );
        assert_eq!(heap.struct_fields(handle).unwrap().len(), 2);
    }

    #[test]
    fn object_tags() {
        let mut heap = Heap::new();
        let s = heap.intern("x");
        let t = heap.alloc_struct(vec![]);
        let u = heap.alloc_upvalue(0);
        assert_eq!(heap.get(s).tag(), ObjTag::String);
        assert_eq!(heap.get(t).tag(), ObjTag::Struct);
        assert_eq!(heap.get(u).tag(), ObjTag::Upvalue);
    }

    #[test]
    fn upvalue_closes_once() {
        let mut heap = Heap::new();
        let handle = heap.alloc_upvalue(3);
        assert!(matches!(
            heap.upvalue(handle),
            Some(Upvalue::Open { slot: 3 })
        ));

        heap.close_upvalue(handle, Value::Int(5));
        assert!(matches!(
            heap.upvalue(handle),
            Some(Upvalue::Closed(Value::Int(5)))
        ));

        // A second close does not clobber the captured value.
        heap.close_upvalue(handle, Value::Int(9));
        assert!(matches!(
            heap.upvalue(handle),
            Some(Upvalue::Closed(Value::Int(5)))
        ));
    }

    #[test]
    fn set_closed_overwrites() {
        let mut heap = Heap::new();
        let handle = heap.alloc_upvalue(0);
        heap.close_upvalue(handle, Value::Int(1));
        heap.set_closed(handle, Value::Int(2));
        assert!(matches!(
            heap.upvalue(handle),
            Some(Upvalue::Closed(Value::Int(2)))
        ));
    }

    #[test]
    fn stats_track_payloads() {
        let mut heap = Heap::new();
        heap.intern("abcd");
        heap.intern("abcd"); // hit: no new payload
        heap.alloc_struct(vec![Value::Nil; 3]);
        let stats = heap.stats();
        assert_eq!(stats.objects, 2);
        assert!(stats.payload_bytes >= 4);
    }
}
