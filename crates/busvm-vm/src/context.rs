//! Run state shared by every evaluation against one image.

use busvm_core::{Image, Value};
use tracing::{debug, warn};

use crate::config::VmConfig;
use crate::fault::{Fault, VmResult};
use crate::fiber::FiberTable;
use crate::heap::{EmptyHeap, HeapView};
use crate::packet::Packet;

pub struct Context {
    pub(crate) image: Image,
    pub(crate) globals: Vec<Value>,
    /// One slot per declared role: the bound service id, if any.
    pub(crate) roles: Vec<Option<u32>>,
    /// Number of opcode handlers currently on the host stack.
    pub(crate) expr_depth: usize,
    pub(crate) config: VmConfig,
    pub(crate) packet: Packet,
    pub(crate) now_ms: u64,
    pub(crate) rng: fastrand::Rng,
    pub fibers: FiberTable,
    pub(crate) heap: Box<dyn HeapView>,
    last_fault: Option<Fault>,
}

impl Context {
    pub fn new(image: Image) -> Self {
        Self::with_config(image, VmConfig::default())
    }

    pub fn with_config(image: Image, config: VmConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        debug!(
            globals = image.num_globals(),
            roles = image.num_roles(),
            functions = image.num_functions(),
            max_expr_depth = config.max_expr_depth,
            "context created"
        );
        Self {
            globals: vec![Value::Undefined; image.num_globals()],
            roles: vec![None; image.num_roles()],
            image,
            expr_depth: 0,
            config,
            packet: Packet::default(),
            now_ms: 0,
            rng,
            fibers: FiberTable::new(),
            heap: Box::new(EmptyHeap),
            last_fault: None,
        }
    }

    #[inline]
    pub fn image(&self) -> &Image {
        &self.image
    }

    #[inline]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn global(&self, idx: usize) -> Option<Value> {
        self.globals.get(idx).copied()
    }

    pub fn set_global(&mut self, idx: usize, v: Value) -> VmResult<()> {
        match self.globals.get_mut(idx) {
            Some(slot) => {
                *slot = v.normalized();
                Ok(())
            }
            None => Err(self.fail(Fault::GlobalOutOfRange)),
        }
    }

    /// Attach role `idx` to an external service.
    pub fn bind_role(&mut self, idx: u32, service_id: u32) -> VmResult<()> {
        match self.roles.get_mut(idx as usize) {
            Some(slot) => {
                *slot = Some(service_id);
                debug!(role = idx, service_id, "role bound");
                Ok(())
            }
            None => Err(self.fail(Fault::RoleOutOfRange)),
        }
    }

    pub fn unbind_role(&mut self, idx: u32) -> VmResult<()> {
        match self.roles.get_mut(idx as usize) {
            Some(slot) => {
                *slot = None;
                debug!(role = idx, "role unbound");
                Ok(())
            }
            None => Err(self.fail(Fault::RoleOutOfRange)),
        }
    }

    pub fn role_service(&self, idx: u32) -> Option<u32> {
        self.roles.get(idx as usize).copied().flatten()
    }

    #[inline]
    pub fn is_role_bound(&self, idx: u32) -> bool {
        self.role_service(idx).is_some()
    }

    pub fn set_packet(&mut self, packet: Packet) {
        self.packet = packet;
    }

    #[inline]
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    pub fn set_now_ms(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn set_heap(&mut self, heap: Box<dyn HeapView>) {
        self.heap = heap;
    }

    /// Record `fault` as the most recent failure and hand it back for
    /// propagation.
    pub fn fail(&mut self, fault: Fault) -> Fault {
        warn!(code = fault.code(), %fault, depth = self.expr_depth, "runtime failure");
        self.last_fault = Some(fault);
        fault
    }

    #[inline]
    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }

    pub fn take_fault(&mut self) -> Option<Fault> {
        self.last_fault.take()
    }

    /// Current expression nesting; zero between top-level evaluations.
    #[inline]
    pub fn expr_depth(&self) -> usize {
        self.expr_depth
    }
}
