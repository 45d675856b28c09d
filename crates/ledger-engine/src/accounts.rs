//! Trader registration and administration.

use chrono::Utc;
use ledger_core::error::{AccountError, LedgerError, LedgerResult, StoreError};
use ledger_core::traits::TradeStore;
use ledger_core::types::{Role, Trader, TraderId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, warn};

use crate::locks::TraderLocks;

/// Starting balances for new accounts.
#[derive(Debug, Clone)]
pub struct AccountPolicy {
    pub initial_balance: Decimal,
    pub admin_balance: Decimal,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            admin_balance: dec!(100000),
        }
    }
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct NewTrader {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewTrader {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
        }
    }

    /// Check that every field is filled in and the email looks like one.
    pub fn validate(&self) -> Result<(), AccountError> {
        let fields = [
            ("username", &self.username),
            ("email", &self.email),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(AccountError::InvalidField {
                    field,
                    reason: "must not be blank".to_string(),
                });
            }
        }

        if self.username.chars().any(char::is_whitespace) {
            return Err(AccountError::InvalidField {
                field: "username",
                reason: "must not contain whitespace".to_string(),
            });
        }

        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(AccountError::InvalidField {
                field: "email",
                reason: format!("not a valid address: {}", self.email),
            }),
        }
    }
}

/// Account management on top of a trade store.
pub struct AccountService<S> {
    store: Arc<S>,
    locks: TraderLocks,
    policy: AccountPolicy,
}

impl<S: TradeStore> AccountService<S> {
    /// `locks` must be the registry used by the trading engine so that
    /// balance changes serialize with trades.
    pub fn new(store: Arc<S>, locks: TraderLocks, policy: AccountPolicy) -> Self {
        Self { store, locks, policy }
    }

    pub fn policy(&self) -> &AccountPolicy {
        &self.policy
    }

    /// Register a new trader with the initial balance.
    pub async fn register(&self, form: NewTrader) -> LedgerResult<Trader> {
        let trader = self.build(form, self.policy.initial_balance).await?;
        self.insert(&trader).await?;

        info!(trader = %trader.id, username = %trader.username, "Registered trader");
        Ok(trader)
    }

    /// Register a trader with the admin role and admin balance.
    pub async fn create_admin(&self, form: NewTrader) -> LedgerResult<Trader> {
        let mut admin = self.build(form, self.policy.admin_balance).await?;
        admin.add_role(Role::Admin);
        self.insert(&admin).await?;

        info!(trader = %admin.id, username = %admin.username, "Created admin account");
        Ok(admin)
    }

    /// Create the admin account unless its username already exists.
    pub async fn ensure_admin(&self, form: NewTrader) -> LedgerResult<Trader> {
        if let Some(existing) = self.store.find_by_username(&form.username).await? {
            return Ok(existing);
        }
        self.create_admin(form).await
    }

    async fn build(&self, form: NewTrader, balance: Decimal) -> LedgerResult<Trader> {
        form.validate()?;

        if self.store.find_by_username(&form.username).await?.is_some() {
            return Err(AccountError::UsernameTaken(form.username).into());
        }
        if self.store.find_by_email(&form.email).await?.is_some() {
            return Err(AccountError::EmailTaken(form.email).into());
        }

        Ok(Trader::new(
            form.username,
            form.email,
            form.first_name,
            form.last_name,
            balance,
        ))
    }

    /// Save a new trader. A registration racing this one past the
    /// duplicate check is caught by the store's uniqueness constraint.
    async fn insert(&self, trader: &Trader) -> LedgerResult<()> {
        match self.store.save_trader(trader).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate { field: "email", value }) => {
                Err(AccountError::EmailTaken(value).into())
            }
            Err(StoreError::Duplicate { value, .. }) => {
                Err(AccountError::UsernameTaken(value).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, trader_id: &TraderId) -> LedgerResult<Trader> {
        self.store
            .load_trader(trader_id)
            .await?
            .ok_or_else(|| LedgerError::TraderNotFound(trader_id.to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> LedgerResult<Option<Trader>> {
        Ok(self.store.find_by_username(username).await?)
    }

    pub async fn list_traders(&self) -> LedgerResult<Vec<Trader>> {
        Ok(self.store.list_traders().await?)
    }

    /// Overwrite a trader's cash balance. Not a trade: no transaction is
    /// recorded.
    pub async fn set_balance(
        &self,
        actor: &TraderId,
        trader_id: &TraderId,
        balance: Decimal,
    ) -> LedgerResult<Trader> {
        self.require_admin(actor, "set balance").await?;
        if balance < Decimal::ZERO {
            return Err(AccountError::NegativeBalance(balance).into());
        }

        let _guard = self.locks.acquire(trader_id).await;
        let mut trader = self.get(trader_id).await?;
        let previous = trader.balance;
        trader.balance = balance;
        trader.updated_at = Utc::now();
        self.store.save_trader(&trader).await?;

        info!(
            actor = %actor,
            trader = %trader_id,
            previous = %previous,
            balance = %balance,
            "Balance overridden"
        );
        Ok(trader)
    }

    /// Remove a trader with their positions and history.
    pub async fn delete_trader(&self, actor: &TraderId, trader_id: &TraderId) -> LedgerResult<()> {
        self.require_admin(actor, "delete trader").await?;

        {
            let _guard = self.locks.acquire(trader_id).await;
            if !self.store.remove_trader(trader_id).await? {
                return Err(LedgerError::TraderNotFound(trader_id.to_string()));
            }
        }
        self.locks.forget(trader_id);

        info!(actor = %actor, trader = %trader_id, "Deleted trader");
        Ok(())
    }

    async fn require_admin(&self, actor: &TraderId, action: &str) -> LedgerResult<()> {
        let actor_account = self.get(actor).await?;
        if !actor_account.is_admin() {
            warn!(actor = %actor, action, "Admin action refused");
            return Err(AccountError::Forbidden(action.to_string()).into());
        }
        Ok(())
    }
}
