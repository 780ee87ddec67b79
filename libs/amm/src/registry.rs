//! Pool registry
//!
//! Owns every pool created by a hosting process, keyed by pool id. Each pool
//! sits behind its own mutex; [`PoolRegistry::with_pool`] holds that mutex
//! for the whole closure, so an operation's read-modify-write cycle never
//! interleaves with another operation on the same pool. Operations on
//! different pools run concurrently.

use crate::capability::AdminCapability;
use crate::collaborators::{AssetCustody, AssetId, LiquidityLedger};
use crate::error::{PoolError, PoolResult};
use crate::pool::{PoolBuilder, PoolSnapshot, StablePool};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use stablepool_config::PoolSettings;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct PoolRegistry {
    scope: Uuid,
    pools: DashMap<String, Arc<Mutex<StablePool>>>,
}

impl PoolRegistry {
    /// Create an empty registry and the capability that administers
    /// every pool it creates
    pub fn new() -> (Self, AdminCapability) {
        let capability = AdminCapability::issue();
        let registry = Self {
            scope: capability.scope(),
            pools: DashMap::new(),
        };
        (registry, capability)
    }

    /// Validate `builder` and register the resulting pool
    pub fn create_pool(&self, builder: PoolBuilder) -> PoolResult<String> {
        let id = builder.id().to_string();
        match self.pools.entry(id.clone()) {
            Entry::Occupied(_) => Err(PoolError::DuplicatePool(id)),
            Entry::Vacant(slot) => {
                let pool = builder.build_scoped(self.scope)?;
                info!(
                    pool = %id,
                    assets = ?pool.assets(),
                    amplification = pool.parameters().amplification,
                    "pool created"
                );
                slot.insert(Arc::new(Mutex::new(pool)));
                Ok(id)
            }
        }
    }

    /// Create a pool from a configuration entry
    pub fn create_from_settings(
        &self,
        settings: &PoolSettings,
        custody: Arc<dyn AssetCustody>,
        ledger: Arc<dyn LiquidityLedger>,
    ) -> PoolResult<String> {
        let builder = PoolBuilder::new(settings.id.clone())
            .assets(settings.assets.iter().cloned().map(AssetId))
            .amplification(u128::from(settings.amplification))
            .swap_fee_bps(settings.swap_fee_bps)
            .admin_fee_bps(settings.admin_fee_bps)
            .custody(custody)
            .ledger(ledger);
        self.create_pool(builder)
    }

    /// Run `f` with exclusive access to pool `id`
    pub fn with_pool<R, F>(&self, id: &str, f: F) -> PoolResult<R>
    where
        F: FnOnce(&mut StablePool) -> PoolResult<R>,
    {
        // Clone the handle so the shard lock is released before the pool
        // mutex is taken
        let handle = self
            .pools
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| PoolError::PoolNotFound(id.to_string()))?;
        let mut pool = handle.lock();
        f(&mut *pool)
    }

    pub fn snapshot(&self, id: &str) -> PoolResult<PoolSnapshot> {
        self.with_pool(id, |pool| Ok(pool.snapshot()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pools.contains_key(id)
    }

    /// Sorted ids of all registered pools
    pub fn pool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
