//! Trader identity and cash account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Unique trader identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraderId(Uuid);

impl TraderId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TraderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Capability role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular user who can trade
    Trader,
    /// Administrative user
    Admin,
}

impl Role {
    /// Authority string as seen by an auth layer.
    pub fn authority(&self) -> &'static str {
        match self {
            Role::Trader => "ROLE_TRADER",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.authority())
    }
}

/// A registered trader with a simulated cash balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    pub id: TraderId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Cash balance, never negative
    pub balance: Decimal,
    pub roles: BTreeSet<Role>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trader {
    /// Create a trader with the default `Trader` role.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        let now = Utc::now();
        let mut roles = BTreeSet::new();
        roles.insert(Role::Trader);

        Self {
            id: TraderId::new(),
            username: username.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            balance,
            roles,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn add_role(&mut self, role: Role) {
        self.roles.insert(role);
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Whether the balance covers `amount`.
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Return a copy with the balance reduced by `amount`.
    ///
    /// Returns `None` if the result would be negative.
    pub fn debited(&self, amount: Decimal) -> Option<Self> {
        if !self.can_afford(amount) {
            return None;
        }
        let mut next = self.clone();
        next.balance -= amount;
        next.updated_at = Utc::now();
        Some(next)
    }

    /// Return a copy with the balance increased by `amount`.
    pub fn credited(&self, amount: Decimal) -> Self {
        let mut next = self.clone();
        next.balance += amount;
        next.updated_at = Utc::now();
        next
    }
}
