//! Fibers as seen by the expression engine.
//!
//! Scheduling lives outside this crate; the evaluator only needs to find a
//! fiber by its table position and read its return value.

use busvm_core::{HandleKind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberStatus {
    Running,
    Suspended,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Fiber {
    /// Stable id; this is what fiber handles carry.
    pub id: u32,
    pub status: FiberStatus,
    /// Value returned by the last call this fiber completed.
    pub ret_val: Value,
}

impl Fiber {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            status: FiberStatus::Suspended,
            ret_val: Value::Undefined,
        }
    }

    #[inline]
    pub fn handle(&self) -> Value {
        Value::handle(HandleKind::Fiber, self.id)
    }
}

#[derive(Debug, Default)]
pub struct FiberTable {
    fibers: Vec<Fiber>,
    next_id: u32,
}

impl FiberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fiber and return its id.
    pub fn spawn(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.fibers.push(Fiber::new(id));
        id
    }

    pub fn get(&self, id: u32) -> Option<&Fiber> {
        self.fibers.iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Fiber> {
        self.fibers.iter_mut().find(|f| f.id == id)
    }

    /// Fiber at table position `idx`.
    #[inline]
    pub fn by_index(&self, idx: usize) -> Option<&Fiber> {
        self.fibers.get(idx)
    }

    pub fn kill(&mut self, id: u32) -> Option<Fiber> {
        let pos = self.fibers.iter().position(|f| f.id == id)?;
        let mut fiber = self.fibers.remove(pos);
        fiber.status = FiberStatus::Dead;
        Some(fiber)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }
}
