//! # Container Pool
//!
//! Reusable pool of write-side containers so document construction does not
//! allocate per nesting level. A container's entry list keeps its capacity
//! across reuse, so after warm-up a writer builds documents without heap
//! churn.
//!
//! The pool is shared: cloning it yields a handle to the same free list, so
//! several writer threads may draw reusable containers from one pool. A
//! single in-progress document still confines its containers to the writer
//! that acquired them.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::document::container::Container;
use crate::document::types::ValueType;

const DEFAULT_POOL_CAPACITY: usize = 16;

/// Shared pool of reusable containers.
///
/// Containers are handed out reset and returned explicitly when a nesting
/// level closes.
pub struct ContainerPool {
    free: Arc<Mutex<Vec<Container>>>,
}

impl ContainerPool {
    /// Create a pool with `initial_capacity` pre-allocated containers.
    pub fn new(initial_capacity: usize) -> Self {
        let mut free = Vec::with_capacity(initial_capacity);
        for _ in 0..initial_capacity {
            free.push(Container::new());
        }
        Self {
            free: Arc::new(Mutex::new(free)),
        }
    }

    /// Acquire a reset container. Allocates only when the pool is empty.
    pub(crate) fn acquire(
        &self,
        container_type: ValueType,
        parent_property_id: Option<u32>,
    ) -> Container {
        let mut container = self.free.lock().pop().unwrap_or_else(Container::new);
        container.reset(container_type, parent_property_id);
        container
    }

    pub(crate) fn release(&self, container: Container) {
        self.free.lock().push(container);
    }

    /// Number of containers currently available for reuse.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }
}

impl Clone for ContainerPool {
    fn clone(&self) -> Self {
        Self {
            free: Arc::clone(&self.free),
        }
    }
}

impl Default for ContainerPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
