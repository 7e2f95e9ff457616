//! Read-only view of the garbage-collected heap.
//!
//! The collector is external. The evaluator only asks what kind of object a
//! `GcObject` handle points at and how long an array is.

use busvm_core::ObjectType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcObjectKind {
    Map,
    Array,
}

impl From<GcObjectKind> for ObjectType {
    fn from(kind: GcObjectKind) -> Self {
        match kind {
            GcObjectKind::Map => ObjectType::Map,
            GcObjectKind::Array => ObjectType::Array,
        }
    }
}

pub trait HeapView {
    /// Kind of the live object at `index`, or `None` if there is none.
    fn object_kind(&self, index: u32) -> Option<GcObjectKind>;

    /// Element count of the array at `index`.
    fn array_len(&self, index: u32) -> Option<usize>;
}

/// A heap with no objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyHeap;

impl HeapView for EmptyHeap {
    fn object_kind(&self, _index: u32) -> Option<GcObjectKind> {
        None
    }

    fn array_len(&self, _index: u32) -> Option<usize> {
        None
    }
}
