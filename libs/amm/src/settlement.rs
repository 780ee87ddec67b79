//! Collaborator call sequencing with compensation
//!
//! A pool operation may need several custody transfers and a ledger update.
//! [`Settlement`] records each completed step; if a later step fails,
//! [`Settlement::unwind`] reverses the completed steps newest first so the
//! collaborators end where they started. The pool commits its own state
//! only after every step has succeeded.

use crate::collaborators::{AccountId, AssetCustody, AssetId, LiquidityLedger};
use crate::error::PoolResult;
use tracing::{error, warn};

#[derive(Debug, Clone)]
enum Step {
    Pulled { payer: AccountId, asset: AssetId, amount: u128 },
    Pushed { recipient: AccountId, asset: AssetId, amount: u128 },
    Minted { recipient: AccountId, amount: u128 },
    Burned { holder: AccountId, amount: u128 },
}

pub struct Settlement<'a> {
    custody: &'a dyn AssetCustody,
    ledger: &'a dyn LiquidityLedger,
    completed: Vec<Step>,
}

impl<'a> Settlement<'a> {
    pub fn new(custody: &'a dyn AssetCustody, ledger: &'a dyn LiquidityLedger) -> Self {
        Self {
            custody,
            ledger,
            completed: Vec::new(),
        }
    }

    /// Run `steps` against a fresh settlement, unwinding on failure
    pub fn run<F>(
        custody: &'a dyn AssetCustody,
        ledger: &'a dyn LiquidityLedger,
        steps: F,
    ) -> PoolResult<()>
    where
        F: FnOnce(&mut Settlement<'a>) -> PoolResult<()>,
    {
        let mut settlement = Settlement::new(custody, ledger);
        match steps(&mut settlement) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, steps = settlement.completed.len(), "unwinding settlement");
                settlement.unwind();
                Err(e)
            }
        }
    }

    pub fn pull(&mut self, payer: &AccountId, asset: &AssetId, amount: u128) -> PoolResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.custody.pull_from(payer, asset, amount)?;
        self.completed.push(Step::Pulled {
            payer: payer.clone(),
            asset: asset.clone(),
            amount,
        });
        Ok(())
    }

    pub fn push(&mut self, recipient: &AccountId, asset: &AssetId, amount: u128) -> PoolResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.custody.push_to(recipient, asset, amount)?;
        self.completed.push(Step::Pushed {
            recipient: recipient.clone(),
            asset: asset.clone(),
            amount,
        });
        Ok(())
    }

    pub fn mint(&mut self, recipient: &AccountId, amount: u128) -> PoolResult<()> {
        self.ledger.mint(recipient, amount)?;
        self.completed.push(Step::Minted {
            recipient: recipient.clone(),
            amount,
        });
        Ok(())
    }

    pub fn burn(&mut self, holder: &AccountId, amount: u128) -> PoolResult<()> {
        self.ledger.burn_from(holder, amount)?;
        self.completed.push(Step::Burned {
            holder: holder.clone(),
            amount,
        });
        Ok(())
    }

    /// Reverse completed steps, newest first
    pub fn unwind(mut self) {
        while let Some(step) = self.completed.pop() {
            let result = match &step {
                Step::Pulled { payer, asset, amount } => self
                    .custody
                    .push_to(payer, asset, *amount)
                    .map_err(|e| e.to_string()),
                Step::Pushed { recipient, asset, amount } => self
                    .custody
                    .pull_from(recipient, asset, *amount)
                    .map_err(|e| e.to_string()),
                Step::Minted { recipient, amount } => self
                    .ledger
                    .burn_from(recipient, *amount)
                    .map_err(|e| e.to_string()),
                Step::Burned { holder, amount } => self
                    .ledger
                    .mint(holder, *amount)
                    .map_err(|e| e.to_string()),
            };
            if let Err(e) = result {
                error!(?step, error = %e, "compensating step failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolError;
    use crate::memory::{InMemoryCustody, InMemoryLedger};

    #[test]
    fn test_failed_step_unwinds_earlier_steps() {
        let custody = InMemoryCustody::new();
        let ledger = InMemoryLedger::new();
        let alice = AccountId::new("alice");
        let a = AssetId::new("A");
        let b = AssetId::new("B");
        custody.authorize(&a).unwrap();
        custody.authorize(&b).unwrap();
        custody.deposit(&alice, &a, 100);
        custody.deposit(&alice, &b, 100);
        custody.fail_pulls_of(&b);

        let result = Settlement::run(&custody, &ledger, |s| {
            s.pull(&alice, &a, 40)?;
            s.mint(&alice, 40)?;
            s.pull(&alice, &b, 40)?;
            Ok(())
        });

        assert!(matches!(result, Err(PoolError::CustodyTransferFailed(_))));
        assert_eq!(custody.balance_of(&alice, &a), 100);
        assert_eq!(custody.vault_balance(&a), 0);
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_successful_run_keeps_steps() {
        let custody = InMemoryCustody::new();
        let ledger = InMemoryLedger::new();
        let alice = AccountId::new("alice");
        let a = AssetId::new("A");
        custody.authorize(&a).unwrap();
        custody.deposit(&alice, &a, 10);

        Settlement::run(&custody, &ledger, |s| {
            s.pull(&alice, &a, 10)?;
            s.mint(&alice, 10)
        })
        .unwrap();

        assert_eq!(custody.vault_balance(&a), 10);
        assert_eq!(ledger.balance_of(&alice), 10);
    }
}
