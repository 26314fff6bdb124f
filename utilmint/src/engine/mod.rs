// Copyright (c) 2024 Botho Foundation

//! The resource engine: request dispatch over an explicit state value.
//!
//! # Epoch lifecycle
//!
//! ```text
//!            submit_report                 close_period
//!   Open ────────────────────▶ Reported ────────────────────▶ Open
//!     │                          │   ▲                         │
//!     │ claim                    └───┘ allocate                │ claim
//! ```
//!
//! Every operation validates and computes against the current state before
//! mutating anything. The only external side effect, a currency batch, is
//! issued after validation and before the state changes, so a rejected
//! request leaves both the state and the currency ledger as they were.

mod distribution;
mod report;

use serde::{Deserialize, Serialize};
use tracing::info;
use um_inflation_curve::{Capacity, CurveParams, PoolAmounts};

use crate::claims::DistributionLedger;
use crate::currency::CurrencyLedger;
use crate::error::ResourceError;
use crate::history::UsageLedger;
use crate::period::CollectionPeriodState;
use crate::request::{Outcome, Request};
use crate::sources::SourceRegistry;
use crate::types::AccountName;

pub use distribution::{accrued_rebate, blended_share};

/// Everything the engine persists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub sources: SourceRegistry,
    pub history: UsageLedger,
    pub claims: DistributionLedger,
    pub period: CollectionPeriodState,
}

/// Accounts that take part in each epoch's emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingAccounts {
    /// Receives the minted total before it is split.
    pub issuer: AccountName,
    /// Network operator pool.
    pub operator: AccountName,
    /// Base reserve pool.
    pub reserve: AccountName,
    /// Rebate pool; participants claim from here.
    pub rebate: AccountName,
}

/// Static engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Holder of administrative authority.
    pub admin: AccountName,
    pub accounts: HoldingAccounts,
    pub capacity: Capacity,
    pub curve: CurveParams,
}

pub struct ResourceEngine {
    config: EngineConfig,
}

impl ResourceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one request on behalf of `caller`.
    ///
    /// Requests that name a source or participant must be sent by that
    /// account; administrative requests must be sent by the admin.
    pub fn execute<C: CurrencyLedger + ?Sized>(
        &self,
        state: &mut EngineState,
        currency: &mut C,
        caller: &AccountName,
        request: &Request,
        now: u32,
    ) -> Result<Outcome, ResourceError> {
        match request {
            Request::SubmitReport(report) => {
                ensure_caller(caller, &report.source, "report on behalf of another source")?;
                let snapshot = self.submit_report(state, currency, report, now)?;
                Ok(Outcome::ReportAccepted {
                    sequence: snapshot.sequence,
                    timestamp: snapshot.timestamp,
                    inflation_rate: snapshot.inflation_rate,
                    pools: PoolAmounts {
                        operator: snapshot.pool_operator_amount,
                        reserve: snapshot.pool_reserve_amount,
                        rebate: snapshot.pool_rebate_amount,
                    },
                })
            }
            Request::Allocate(allocation) => {
                ensure_caller(caller, &allocation.source, "allocate on behalf of another source")?;
                let claim = self.allocate(state, allocation)?;
                Ok(Outcome::Allocated {
                    participant: claim.participant,
                    accrued_rebate: claim.accrued_rebate,
                    allocated_percent_total: state.period.allocated_percent_total,
                })
            }
            Request::ClosePeriod { source, timestamp } => {
                ensure_caller(caller, source, "close on behalf of another source")?;
                let minted = self.close_period(state, currency, source, *timestamp)?;
                Ok(Outcome::PeriodClosed {
                    timestamp: *timestamp,
                    minted,
                })
            }
            Request::Claim { participant } => {
                ensure_caller(caller, participant, "claim on behalf of another participant")?;
                let amount = self.claim(state, currency, participant)?;
                Ok(Outcome::Claimed {
                    participant: participant.clone(),
                    amount,
                })
            }
            Request::SetConfig { paused, drag_limit } => {
                self.set_config(state, caller, *paused, *drag_limit)?;
                Ok(Outcome::ConfigUpdated {
                    paused: *paused,
                    drag_limit: *drag_limit,
                })
            }
            Request::Initialize { start } => {
                self.initialize(state, caller, *start)?;
                Ok(Outcome::Initialized { start: *start })
            }
            Request::AddSource { account } => {
                self.add_source(state, caller, account)?;
                Ok(Outcome::SourceAdded {
                    account: account.clone(),
                })
            }
            Request::RemoveSource { account } => {
                self.remove_source(state, caller, account)?;
                Ok(Outcome::SourceRemoved {
                    account: account.clone(),
                })
            }
        }
    }

    /// Write the epoch-0 row starting at `start`.
    pub fn initialize(
        &self,
        state: &mut EngineState,
        caller: &AccountName,
        start: u32,
    ) -> Result<(), ResourceError> {
        self.ensure_admin(caller, "initialize")?;
        state.history.initialize(start)?;
        info!(start, "Usage history initialized");
        Ok(())
    }

    pub fn add_source(
        &self,
        state: &mut EngineState,
        caller: &AccountName,
        account: &AccountName,
    ) -> Result<(), ResourceError> {
        self.ensure_admin(caller, "add sources")?;
        state.sources.add_source(account.clone())?;
        info!(source = %account, "Source authorized");
        Ok(())
    }

    pub fn remove_source(
        &self,
        state: &mut EngineState,
        caller: &AccountName,
        account: &AccountName,
    ) -> Result<(), ResourceError> {
        self.ensure_admin(caller, "remove sources")?;
        state.sources.remove_source(account)?;
        info!(source = %account, "Source removed");
        Ok(())
    }

    /// Whether `account` may submit reports. Administrative lookup.
    pub fn is_source(
        &self,
        state: &EngineState,
        caller: &AccountName,
        account: &AccountName,
    ) -> Result<bool, ResourceError> {
        self.ensure_admin(caller, "inspect sources")?;
        Ok(state.sources.is_source(account))
    }

    pub fn set_config(
        &self,
        state: &mut EngineState,
        caller: &AccountName,
        paused: bool,
        drag_limit: u32,
    ) -> Result<(), ResourceError> {
        self.ensure_admin(caller, "change configuration")?;
        state.period.configure(paused, drag_limit)?;
        info!(paused, drag_limit, "Configuration updated");
        Ok(())
    }

    fn ensure_admin(&self, caller: &AccountName, action: &'static str) -> Result<(), ResourceError> {
        if caller != &self.config.admin {
            return Err(ResourceError::Unauthorized {
                caller: caller.clone(),
                action,
            });
        }
        Ok(())
    }

    fn ensure_source(
        &self,
        state: &EngineState,
        source: &AccountName,
        action: &'static str,
    ) -> Result<(), ResourceError> {
        if !state.sources.is_source(source) {
            return Err(ResourceError::Unauthorized {
                caller: source.clone(),
                action,
            });
        }
        Ok(())
    }
}

fn ensure_caller(
    caller: &AccountName,
    named: &AccountName,
    action: &'static str,
) -> Result<(), ResourceError> {
    if caller != named {
        return Err(ResourceError::Unauthorized {
            caller: caller.clone(),
            action,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::currency::LocalCurrency;

    pub const START: u32 = 1_700_000_000;
    pub const SUPPLY: u64 = 10_000_000_000_000;

    pub fn name(s: &str) -> AccountName {
        AccountName::new(s).unwrap()
    }

    pub fn engine() -> ResourceEngine {
        ResourceEngine::new(EngineConfig {
            admin: name("admin"),
            accounts: HoldingAccounts {
                issuer: name("issuer"),
                operator: name("operators"),
                reserve: name("reserve"),
                rebate: name("rebates"),
            },
            capacity: Capacity::default(),
            curve: CurveParams::default(),
        })
    }

    pub fn currency() -> LocalCurrency {
        LocalCurrency::with_supply(name("treasury"), SUPPLY)
    }

    /// Initialized state with `oracle` authorized.
    pub fn ready_state(engine: &ResourceEngine) -> EngineState {
        let mut state = EngineState::default();
        engine.initialize(&mut state, &name("admin"), START).unwrap();
        engine
            .add_source(&mut state, &name("admin"), &name("oracle"))
            .unwrap();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;
    use crate::request::UsageReport;

    #[test]
    fn test_admin_operations_require_admin() {
        let engine = engine();
        let mut state = EngineState::default();

        let err = engine.initialize(&mut state, &name("mallory"), START).unwrap_err();
        assert!(matches!(err, ResourceError::Unauthorized { .. }));
        assert!(state.history.is_empty());

        let err = engine
            .add_source(&mut state, &name("mallory"), &name("oracle"))
            .unwrap_err();
        assert!(matches!(err, ResourceError::Unauthorized { .. }));

        let err = engine
            .set_config(&mut state, &name("mallory"), true, 3)
            .unwrap_err();
        assert!(matches!(err, ResourceError::Unauthorized { .. }));
        assert!(!state.period.paused);

        let err = engine
            .is_source(&state, &name("mallory"), &name("oracle"))
            .unwrap_err();
        assert!(matches!(err, ResourceError::Unauthorized { .. }));
    }

    #[test]
    fn test_source_management() {
        let engine = engine();
        let mut state = EngineState::default();
        let admin = name("admin");

        engine.add_source(&mut state, &admin, &name("oracle")).unwrap();
        assert!(engine.is_source(&state, &admin, &name("oracle")).unwrap());

        let err = engine.add_source(&mut state, &admin, &name("oracle")).unwrap_err();
        assert!(matches!(err, ResourceError::SourceAlreadyAuthorized(_)));

        engine.remove_source(&mut state, &admin, &name("oracle")).unwrap();
        let err = engine
            .remove_source(&mut state, &admin, &name("oracle"))
            .unwrap_err();
        assert!(matches!(err, ResourceError::SourceNotFound(_)));
    }

    #[test]
    fn test_execute_checks_caller_identity() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let mut currency = currency();

        let request = Request::SubmitReport(UsageReport {
            source: name("oracle"),
            processing_units: 1,
            bandwidth_units: 1,
            timestamp: START + 86_400,
        });
        let err = engine
            .execute(&mut state, &mut currency, &name("impostor"), &request, u32::MAX)
            .unwrap_err();
        assert!(matches!(err, ResourceError::Unauthorized { .. }));
        assert_eq!(state.history.len(), 1);

        let outcome = engine
            .execute(&mut state, &mut currency, &name("oracle"), &request, u32::MAX)
            .unwrap();
        assert!(matches!(outcome, Outcome::ReportAccepted { sequence: 1, .. }));
    }

    #[test]
    fn test_execute_set_config() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let mut currency = currency();

        let request = Request::SetConfig {
            paused: false,
            drag_limit: 20,
        };
        let err = engine
            .execute(&mut state, &mut currency, &name("admin"), &request, 0)
            .unwrap_err();
        assert!(matches!(err, ResourceError::ConfigOutOfRange(20)));

        let request = Request::SetConfig {
            paused: true,
            drag_limit: 5,
        };
        engine
            .execute(&mut state, &mut currency, &name("admin"), &request, 0)
            .unwrap();
        assert!(state.period.paused);
        assert_eq!(state.period.drag_limit, 5);
    }
}
