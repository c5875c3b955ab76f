use crate::core::error::{ensure_non_negative, ValidationError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a debt account, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtId(Uuid);

impl DebtId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DebtId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One interest-bearing debt account.
///
/// Debts are immutable once created. The scheduler and the optimizer only
/// read snapshots of them; adding or removing accounts happens on a
/// [`DebtSet`].
///
/// # Examples
///
/// ```
/// use debt_optimizer::core::debt::Debt;
/// use rust_decimal_macros::dec;
///
/// let card = Debt::new("Visa", dec!(2500), dec!(100), dec!(22), 36).unwrap();
/// assert_eq!(card.monthly_rate(), dec!(22) / dec!(100) / dec!(12));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    id: DebtId,
    name: String,
    /// Outstanding principal.
    principal: Decimal,
    minimum_payment: Decimal,
    /// Annual rate as a percentage, e.g. 18.5 for 18.5%/year.
    annual_interest_rate: Decimal,
    /// Informational only; never drives the simulation.
    term_months: u32,
    created_at: DateTime<Utc>,
}

impl Debt {
    /// Create a debt with a fresh id.
    pub fn new(
        name: impl Into<String>,
        principal: Decimal,
        minimum_payment: Decimal,
        annual_interest_rate: Decimal,
        term_months: u32,
    ) -> Result<Self, ValidationError> {
        Self::with_id(
            DebtId::new(),
            name,
            principal,
            minimum_payment,
            annual_interest_rate,
            term_months,
        )
    }

    /// Create a debt with a caller-chosen id (useful for testing / determinism).
    pub fn with_id(
        id: DebtId,
        name: impl Into<String>,
        principal: Decimal,
        minimum_payment: Decimal,
        annual_interest_rate: Decimal,
        term_months: u32,
    ) -> Result<Self, ValidationError> {
        let debt = Self {
            id,
            name: name.into(),
            principal,
            minimum_payment,
            annual_interest_rate,
            term_months,
            created_at: Utc::now(),
        };
        debt.validate()?;
        Ok(debt)
    }

    /// Re-check the field invariants. Deserialized debts bypass the
    /// constructor, so consumers call this before computing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        ensure_non_negative("principal", self.principal)?;
        ensure_non_negative("minimum payment", self.minimum_payment)?;
        ensure_non_negative("annual interest rate", self.annual_interest_rate)?;
        if self.term_months == 0 {
            return Err(ValidationError::ZeroTerm);
        }
        Ok(())
    }

    // --- Accessors ---

    pub fn id(&self) -> DebtId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn minimum_payment(&self) -> Decimal {
        self.minimum_payment
    }

    pub fn annual_interest_rate(&self) -> Decimal {
        self.annual_interest_rate
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Monthly rate as a fraction: `rate / 100 / 12`.
    pub fn monthly_rate(&self) -> Decimal {
        self.annual_interest_rate / Decimal::ONE_HUNDRED / Decimal::from(12)
    }

    /// Annual rate as a fraction (18.5% -> 0.185).
    pub fn annual_rate_fraction(&self) -> Decimal {
        self.annual_interest_rate / Decimal::ONE_HUNDRED
    }
}

/// An ordered working set of debts with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtSet {
    debts: Vec<Debt>,
}

impl DebtSet {
    pub fn new() -> Self {
        Self { debts: Vec::new() }
    }

    /// Build a set from debts, validating each and rejecting duplicate ids.
    pub fn try_from_debts(debts: Vec<Debt>) -> Result<Self, ValidationError> {
        let mut set = Self::new();
        for debt in debts {
            set.add(debt)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, debt: Debt) -> Result<(), ValidationError> {
        debt.validate()?;
        if self.get(debt.id()).is_some() {
            return Err(ValidationError::DuplicateId(debt.id()));
        }
        self.debts.push(debt);
        Ok(())
    }

    pub fn remove(&mut self, id: DebtId) -> Result<Debt, ValidationError> {
        let index = self
            .debts
            .iter()
            .position(|d| d.id() == id)
            .ok_or(ValidationError::UnknownDebt(id))?;
        Ok(self.debts.remove(index))
    }

    pub fn get(&self, id: DebtId) -> Option<&Debt> {
        self.debts.iter().find(|d| d.id() == id)
    }

    pub fn debts(&self) -> &[Debt] {
        &self.debts
    }

    pub fn len(&self) -> usize {
        self.debts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }

    /// Check every debt and id uniqueness. Needed after deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, debt) in self.debts.iter().enumerate() {
            debt.validate()?;
            if self.debts[..i].iter().any(|d| d.id() == debt.id()) {
                return Err(ValidationError::DuplicateId(debt.id()));
            }
        }
        Ok(())
    }

    pub fn total_principal(&self) -> Decimal {
        self.debts.iter().map(|d| d.principal()).sum()
    }

    pub fn total_minimum_payment(&self) -> Decimal {
        self.debts.iter().map(|d| d.minimum_payment()).sum()
    }

    /// Simple mean of the annual rates, in percent. Zero for an empty set.
    pub fn average_interest_rate(&self) -> Decimal {
        if self.debts.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = self.debts.iter().map(|d| d.annual_interest_rate()).sum();
        total / Decimal::from(self.debts.len())
    }

    /// Debts sorted by descending annual rate; ties keep insertion order.
    pub fn priority_order(&self) -> Vec<&Debt> {
        let mut ordered: Vec<&Debt> = self.debts.iter().collect();
        ordered.sort_by(|a, b| b.annual_interest_rate().cmp(&a.annual_interest_rate()));
        ordered
    }
}
