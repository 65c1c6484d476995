//! Process-wide pool of display-list op buffers.
//!
//! Each plane borrows a buffer on construction and returns it on drop, so a
//! steady-state frame loop reuses allocations instead of churning them. This
//! pool is the only process-wide state in the core: initialized on first use,
//! valid until process exit.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::display_list::ops::Op;

// Buffers beyond this are dropped instead of pooled.
const MAX_POOLED_BUFFERS: usize = 32;

static OP_BUFFER_POOL: Lazy<Mutex<Vec<Vec<Op>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A `Vec<Op>` checked out of the global pool. Cleared (dropping all retained
/// references) and returned on drop.
#[derive(Debug, Default)]
pub(crate) struct PooledOpBuffer {
    ops: Vec<Op>,
}

impl PooledOpBuffer {
    pub(crate) fn acquire() -> Self {
        let ops = OP_BUFFER_POOL.lock().pop().unwrap_or_default();
        Self { ops }
    }
}

impl std::ops::Deref for PooledOpBuffer {
    type Target = Vec<Op>;

    fn deref(&self) -> &Self::Target {
        &self.ops
    }
}

impl std::ops::DerefMut for PooledOpBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ops
    }
}

impl Drop for PooledOpBuffer {
    fn drop(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        ops.clear();

        let mut pool = OP_BUFFER_POOL.lock();
        if pool.len() < MAX_POOLED_BUFFERS {
            pool.push(ops);
        }
    }
}
