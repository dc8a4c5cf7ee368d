//! Investment analysis: a utility's financial position and what it can
//! prudently build next.
//!
//! Pure read queries over a [`Market`]; nothing here changes state.
use crate::error::MarketResult;
use crate::orchestrator::Market;
use crate::plant::PlantStatus;
use crate::technology::Technology;
use crate::units::{Capacity, Dimensionless, Money};
use crate::utility::UtilityID;
use indexmap::IndexMap;
use rust_decimal_macros::dec;

/// Equity multiplier bounding total sustainable debt
const LEVERAGE_MULTIPLIER: Dimensionless = Dimensionless(dec!(2.0));

/// Debt-to-equity ratio above which leverage is flagged
const HIGH_LEVERAGE: Dimensionless = Dimensionless(dec!(1.5));

/// Capacity share above which a portfolio is considered concentrated
const CONCENTRATION_LIMIT: Dimensionless = Dimensionless(dec!(0.5));

/// A utility's financial position and portfolio composition
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialPosition {
    /// The analyzed utility
    pub utility_id: UtilityID,
    /// Cash on hand
    pub cash: Money,
    /// Shareholder equity
    pub equity: Money,
    /// Outstanding debt
    pub debt: Money,
    /// Debt over equity; `None` when equity is zero or negative
    pub debt_to_equity: Option<Dimensionless>,
    /// Further debt the utility could sustain (equity x 2 less current
    /// debt), floored at zero
    pub borrowing_headroom: Money,
    /// Non-retired capacity per technology
    pub capacity_by_technology: IndexMap<Technology, Capacity>,
    /// Each technology's share of the non-retired portfolio
    pub technology_mix: IndexMap<Technology, Dimensionless>,
}

/// Advice derived from a financial position
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// Debt-to-equity exceeds the prudent ceiling
    ReduceLeverage {
        /// The observed ratio
        debt_to_equity: Dimensionless,
    },
    /// One technology dominates the portfolio
    Diversify {
        /// The dominant technology
        technology: Technology,
        /// Its share of portfolio capacity
        share: Dimensionless,
    },
    /// Leverage is prudent and headroom exists to fund new construction
    Invest {
        /// Debt still available under the leverage ceiling
        headroom: Money,
    },
}

/// Analyze one utility's financial position.
///
/// The portfolio covers every non-retired plant, including those still
/// planned or under construction, since their capital is already committed.
pub fn analyze(market: &Market, utility_id: &UtilityID) -> MarketResult<FinancialPosition> {
    let utility = market.utility(utility_id)?;

    let mut capacity_by_technology: IndexMap<Technology, Capacity> = IndexMap::new();
    for plant in market.plants().iter_for_utility(utility_id) {
        if plant.status == PlantStatus::Retired {
            continue;
        }
        let entry = capacity_by_technology
            .entry(plant.technology)
            .or_insert(Capacity::ZERO);
        *entry = *entry + plant.capacity;
    }
    let total: Capacity = capacity_by_technology.values().copied().sum();
    let technology_mix = capacity_by_technology
        .iter()
        .map(|(&technology, &capacity)| {
            let share = if total.is_zero() {
                Dimensionless::ZERO
            } else {
                Dimensionless(capacity.value() / total.value())
            };
            (technology, share)
        })
        .collect();

    let debt_to_equity = if utility.equity > Money::ZERO {
        Some(Dimensionless(utility.debt.value() / utility.equity.value()))
    } else {
        None
    };
    let ceiling = Money(utility.equity.value() * LEVERAGE_MULTIPLIER.0);
    let borrowing_headroom = (ceiling - utility.debt).max(Money::ZERO);

    Ok(FinancialPosition {
        utility_id: utility_id.clone(),
        cash: utility.cash,
        equity: utility.equity,
        debt: utility.debt,
        debt_to_equity,
        borrowing_headroom,
        capacity_by_technology,
        technology_mix,
    })
}

/// Derive recommendations from a financial position.
///
/// Over-leverage and concentration warnings come first; an investment
/// suggestion is only made when leverage is prudent and headroom remains.
pub fn recommend(position: &FinancialPosition) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let over_leveraged = match position.debt_to_equity {
        Some(ratio) if ratio > HIGH_LEVERAGE => {
            recommendations.push(Recommendation::ReduceLeverage {
                debt_to_equity: ratio,
            });
            true
        }
        Some(_) => false,
        // Zero or negative equity with outstanding debt is over-leveraged
        None => {
            if position.debt > Money::ZERO {
                recommendations.push(Recommendation::ReduceLeverage {
                    debt_to_equity: Dimensionless::ZERO,
                });
            }
            true
        }
    };

    for (&technology, &share) in &position.technology_mix {
        if share > CONCENTRATION_LIMIT {
            recommendations.push(Recommendation::Diversify { technology, share });
        }
    }

    if !over_leveraged && position.borrowing_headroom > Money::ZERO {
        recommendations.push(Recommendation::Invest {
            headroom: position.borrowing_headroom,
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::market;
    use crate::orchestrator::Market;
    use rstest::rstest;

    #[rstest]
    fn test_position_reflects_ledger_and_portfolio(market: Market) {
        let position = analyze(&market, &"u1".into()).unwrap();
        // Fixture: 400M equity, 100M debt, one 400 MW gas plant
        assert_eq!(position.debt_to_equity, Some(Dimensionless(dec!(0.25))));
        assert_eq!(position.borrowing_headroom, Money(dec!(700000000)));
        assert_eq!(
            position.capacity_by_technology[&Technology::NaturalGasCc],
            Capacity(dec!(400))
        );
        assert_eq!(
            position.technology_mix[&Technology::NaturalGasCc],
            Dimensionless(dec!(1))
        );
    }

    #[rstest]
    fn test_concentrated_prudent_utility_gets_both_signals(market: Market) {
        let position = analyze(&market, &"u1".into()).unwrap();
        let recommendations = recommend(&position);
        // Single-technology portfolio, low leverage: diversify and invest
        assert!(recommendations.iter().any(|r| matches!(
            r,
            Recommendation::Diversify {
                technology: Technology::NaturalGasCc,
                ..
            }
        )));
        assert!(
            recommendations
                .iter()
                .any(|r| matches!(r, Recommendation::Invest { .. }))
        );
        assert!(
            !recommendations
                .iter()
                .any(|r| matches!(r, Recommendation::ReduceLeverage { .. }))
        );
    }

    #[rstest]
    fn test_high_leverage_blocks_investment_advice(market: Market) {
        let mut position = analyze(&market, &"u1".into()).unwrap();
        position.debt = Money(dec!(800000000));
        position.debt_to_equity = Some(Dimensionless(dec!(2.0)));
        position.borrowing_headroom = Money::ZERO;
        let recommendations = recommend(&position);
        assert!(
            recommendations
                .iter()
                .any(|r| matches!(r, Recommendation::ReduceLeverage { .. }))
        );
        assert!(
            !recommendations
                .iter()
                .any(|r| matches!(r, Recommendation::Invest { .. }))
        );
    }

    #[rstest]
    fn test_unknown_utility_is_not_found(market: Market) {
        assert!(analyze(&market, &"nobody".into()).is_err());
    }

    #[rstest]
    fn test_negative_equity_flags_leverage(market: Market) {
        let mut position = analyze(&market, &"u1".into()).unwrap();
        position.equity = Money(dec!(-1000));
        position.debt_to_equity = None;
        let recommendations = recommend(&position);
        assert!(matches!(
            recommendations[0],
            Recommendation::ReduceLeverage { .. }
        ));
    }
}
