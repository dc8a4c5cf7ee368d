//! Utilities are the generation owners participating in the market.
//!
//! Only the financial ledger is modelled here: user accounts and
//! authentication live in the calling shell.
use crate::id::define_id_type;
use crate::units::Money;
use indexmap::IndexMap;
use rust_decimal_macros::dec;
use serde::Deserialize;

define_id_type! {UtilityID}

/// The share of new plant capital financed with debt; the remainder is
/// equity paid from cash.
const DEBT_FINANCING_SHARE: rust_decimal::Decimal = dec!(0.7);

/// A generation owner's financial ledger
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Utility {
    /// A unique identifier for the utility
    pub id: UtilityID,
    /// A human-readable name
    pub name: String,
    /// Cash on hand
    pub cash: Money,
    /// Shareholder equity
    pub equity: Money,
    /// Outstanding debt
    pub debt: Money,
}

impl Utility {
    /// Record the financing of a new plant investment.
    ///
    /// Capital is financed 70% with debt and 30% with equity; the full
    /// amount leaves the cash balance.
    pub fn finance_investment(&mut self, capital: Money) {
        let debt_portion = Money(capital.value() * DEBT_FINANCING_SHARE);
        let equity_portion = capital - debt_portion;
        self.cash = self.cash - capital;
        self.debt = self.debt + debt_portion;
        self.equity = self.equity - equity_portion;
    }

    /// Apply a year's settled profit (or loss) to the ledger
    pub fn apply_settlement(&mut self, profit: Money) {
        self.cash = self.cash + profit;
        self.equity = self.equity + profit;
    }
}

/// A map of [`Utility`]s, keyed by utility ID
pub type UtilityMap = IndexMap<UtilityID, Utility>;
