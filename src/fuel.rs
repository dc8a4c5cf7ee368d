//! Per-session fuel price tables.
//!
//! Prices are tabulated per (fuel, year) and escalated deterministically
//! beyond the last tabulated year, so economics calculations are a total
//! function of the scenario inputs.
use crate::error::{MarketError, MarketResult};
use crate::technology::FuelType;
use crate::units::{Dimensionless, MoneyPerMmbtu};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Fuel prices per (fuel type, year), read-only to the core
#[derive(Debug, Clone, PartialEq)]
pub struct FuelPriceTable {
    /// Tabulated prices: fuel -> year -> $/MMBtu
    prices: IndexMap<FuelType, BTreeMap<u32, MoneyPerMmbtu>>,
    /// Annual escalation applied beyond the last tabulated year
    escalation: Dimensionless,
}

impl FuelPriceTable {
    /// Build a table from base-year prices and an annual escalation rate
    pub fn new(
        base_year: u32,
        base_prices: IndexMap<FuelType, MoneyPerMmbtu>,
        escalation: Dimensionless,
    ) -> Self {
        let prices = base_prices
            .into_iter()
            .map(|(fuel, price)| (fuel, BTreeMap::from([(base_year, price)])))
            .collect();
        Self { prices, escalation }
    }

    /// Add or replace a tabulated price for a specific year
    pub fn set_price(&mut self, fuel: FuelType, year: u32, price: MoneyPerMmbtu) {
        self.prices.entry(fuel).or_default().insert(year, price);
    }

    /// Whether the table has any price for the given fuel
    pub fn covers(&self, fuel: FuelType) -> bool {
        self.prices.get(&fuel).is_some_and(|t| !t.is_empty())
    }

    /// The price of a fuel in a given year.
    ///
    /// Uses the most recent tabulated price at or before `year`, escalated
    /// per year since tabulation. Years before the first tabulated entry use
    /// that entry unescalated.
    pub fn price(&self, fuel: FuelType, year: u32) -> MarketResult<MoneyPerMmbtu> {
        let table = self
            .prices
            .get(&fuel)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MarketError::not_found("fuel price", fuel))?;

        if let Some((&tabulated_year, &price)) = table.range(..=year).next_back() {
            let factor = (Dimensionless::ONE + self.escalation)
                .powi(i64::from(year) - i64::from(tabulated_year));
            Ok(price * factor)
        } else {
            let (_, &price) = table.iter().next().expect("table is non-empty");
            Ok(price)
        }
    }

    /// Prices for every tabulated fuel in one year
    pub fn prices_for_year(&self, year: u32) -> IndexMap<FuelType, MoneyPerMmbtu> {
        self.prices
            .keys()
            .filter_map(|&fuel| self.price(fuel, year).ok().map(|p| (fuel, p)))
            .collect()
    }
}
