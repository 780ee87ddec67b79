//! Concurrent access through the pool registry
//!
//! Many threads trade against the same pool while others work on a second
//! pool. Because each operation runs under the pool's mutex, every asset
//! unit must be accounted for once all threads finish.

use stablepool_amm::{
    AccountId, AssetId, InMemoryCustody, InMemoryLedger, PoolBuilder, PoolRegistry,
};
use stablepool_config::{init_logging, LoggingConfig};
use std::sync::Arc;
use std::thread;

const E18: u128 = 1_000_000_000_000_000_000;
const TRADERS: usize = 8;
const ROUNDS: usize = 25;

fn setup_registry(pool_ids: &[&str]) -> (PoolRegistry, Arc<InMemoryCustody>, Vec<AssetId>) {
    // Another test may have installed the subscriber already
    let _ = init_logging(&LoggingConfig::default());

    let (registry, cap) = PoolRegistry::new();
    let custody = Arc::new(InMemoryCustody::new());
    let assets = vec![
        AssetId::new("USDC.eth"),
        AssetId::new("USDC.arb"),
        AssetId::new("USDC.base"),
    ];
    let provider = AccountId::new("provider");

    for id in pool_ids {
        let builder = PoolBuilder::new(*id)
            .assets(assets.iter().cloned())
            .amplification(5000)
            .swap_fee_bps(4)
            .admin_fee_bps(5000)
            .custody(custody.clone())
            .ledger(Arc::new(InMemoryLedger::new()));
        registry.create_pool(builder).unwrap();

        for asset in &assets {
            custody.deposit(&provider, asset, 1_000 * E18);
        }
        registry
            .with_pool(id, |pool| {
                pool.initialize(&cap)?;
                pool.add_liquidity(&provider, &[1_000 * E18, 1_000 * E18, 1_000 * E18], 0)
            })
            .unwrap();
    }
    (registry, custody, assets)
}

#[test]
fn test_concurrent_swaps_conserve_assets() {
    let (registry, custody, assets) = setup_registry(&["main"]);
    let traders: Vec<AccountId> = (0..TRADERS)
        .map(|t| AccountId::new(format!("trader-{}", t)))
        .collect();
    for trader in &traders {
        for asset in &assets {
            custody.deposit(trader, asset, 10 * E18);
        }
    }

    thread::scope(|scope| {
        for trader in &traders {
            let registry = &registry;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let (token_in, token_out) = (round % 3, (round + 1) % 3);
                    registry
                        .with_pool("main", |pool| pool.swap(trader, token_in, token_out, E18 / 10, 0))
                        .unwrap();
                }
            });
        }
    });

    let snapshot = registry.snapshot("main").unwrap();
    for (i, asset) in assets.iter().enumerate() {
        let held_by_traders: u128 = traders
            .iter()
            .map(|trader| custody.balance_of(trader, asset))
            .sum();
        let vault = custody.vault_balance(asset);

        assert_eq!(vault, snapshot.balances[i] + snapshot.collected_fees[i]);
        let funded = 1_000 * E18 + TRADERS as u128 * 10 * E18;
        assert_eq!(vault + held_by_traders, funded, "asset {} leaked", asset);
    }
    assert!(registry
        .with_pool("main", |pool| pool.virtual_price())
        .unwrap() >= E18);
}

#[test]
fn test_independent_pools_progress_in_parallel() {
    let (registry, custody, assets) = setup_registry(&["alpha", "beta"]);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    custody.deposit(&alice, &assets[0], 50 * E18);
    custody.deposit(&bob, &assets[1], 50 * E18);

    thread::scope(|scope| {
        let registry = &registry;
        let (alice, bob) = (&alice, &bob);
        scope.spawn(move || {
            for _ in 0..10 {
                registry
                    .with_pool("alpha", |pool| pool.swap(alice, 0, 2, 5 * E18, 0))
                    .unwrap();
            }
        });
        scope.spawn(move || {
            for _ in 0..10 {
                registry
                    .with_pool("beta", |pool| pool.swap(bob, 1, 2, 5 * E18, 0))
                    .unwrap();
            }
        });
    });

    let alpha = registry.snapshot("alpha").unwrap();
    let beta = registry.snapshot("beta").unwrap();
    assert_eq!(alpha.balances[0], 1_050 * E18);
    assert_eq!(alpha.balances[1], 1_000 * E18);
    assert_eq!(beta.balances[0], 1_000 * E18);
    assert_eq!(beta.balances[1], 1_050 * E18);
    assert_eq!(registry.pool_ids(), vec!["alpha".to_string(), "beta".to_string()]);
}

#[test]
fn test_concurrent_creation_registers_once() {
    let (registry, _cap) = PoolRegistry::new();
    let custody = Arc::new(InMemoryCustody::new());

    let created: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..TRADERS)
            .map(|_| {
                let registry = &registry;
                let custody = custody.clone();
                scope.spawn(move || {
                    let builder = PoolBuilder::new("shared")
                        .asset(AssetId::new("USDT.eth"))
                        .asset(AssetId::new("USDT.tron"))
                        .amplification(2000)
                        .custody(custody)
                        .ledger(Arc::new(InMemoryLedger::new()));
                    registry.create_pool(builder)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|result| result.is_ok())
            .count()
    });

    assert_eq!(created, 1);
    assert_eq!(registry.len(), 1);
}
