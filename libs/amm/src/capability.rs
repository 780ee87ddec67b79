//! Admin capability for privileged pool operations
//!
//! A pool remembers the scope it was built under. Only a capability with
//! the same scope may initialize it, change its parameters or withdraw its
//! collected fees. Capabilities are neither `Clone` nor constructible with
//! a chosen scope, so holding one is the only way to act on those pools.

use uuid::Uuid;

#[derive(Debug)]
pub struct AdminCapability {
    scope: Uuid,
}

impl AdminCapability {
    /// Issue a capability for a fresh scope
    pub fn issue() -> Self {
        Self {
            scope: Uuid::new_v4(),
        }
    }

    pub(crate) fn scope(&self) -> Uuid {
        self.scope
    }

    pub(crate) fn grants(&self, scope: Uuid) -> bool {
        self.scope == scope
    }
}
