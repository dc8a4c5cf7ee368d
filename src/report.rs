//! Read-only reporting over a market: the operator dashboard and
//! multi-year trend series.
use crate::error::MarketResult;
use crate::orchestrator::{Market, MarketEvent};
use crate::period::LoadPeriod;
use crate::plant::PlantStatus;
use crate::session::GamePhase;
use crate::units::{Capacity, Dimensionless, Energy, Money, MoneyPerEnergy};
use crate::utility::UtilityID;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::Display;

/// One utility's line on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityStanding {
    /// The utility
    pub utility_id: UtilityID,
    /// Its display name
    pub name: String,
    /// Cash on hand
    pub cash: Money,
    /// Shareholder equity
    pub equity: Money,
    /// Outstanding debt
    pub debt: Money,
}

/// A point-in-time summary of the whole session
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// The session's display name
    pub session_name: String,
    /// The year currently being played
    pub current_year: u32,
    /// The session's phase
    pub phase: GamePhase,
    /// Forecast demand per period for the current year
    pub demand: IndexMap<LoadPeriod, Capacity>,
    /// Total capacity currently operating
    pub operating_capacity: Capacity,
    /// Operating capacity over peak demand, less one; negative when the
    /// fleet cannot cover the peak
    pub capacity_margin: Dimensionless,
    /// Plant counts per lifecycle status
    pub plants_by_status: IndexMap<PlantStatus, usize>,
    /// Financial standings, best equity first
    pub standings: Vec<UtilityStanding>,
    /// All recorded market events, oldest first
    pub events: Vec<MarketEvent>,
}

impl Display for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} - year {} ({})",
            self.session_name, self.current_year, self.phase
        )?;
        for (period, demand) in &self.demand {
            writeln!(f, "  {period} demand: {demand} MW")?;
        }
        writeln!(
            f,
            "Operating capacity: {} MW (margin {} over peak)",
            self.operating_capacity, self.capacity_margin
        )?;
        for (status, count) in &self.plants_by_status {
            writeln!(f, "  {status}: {count} plants")?;
        }
        for standing in &self.standings {
            writeln!(
                f,
                "  {}: cash {}, equity {}, debt {}",
                standing.name, standing.cash, standing.equity, standing.debt
            )?;
        }
        for event in &self.events {
            writeln!(f, "  event: {event}")?;
        }
        Ok(())
    }
}

/// One year's line in the trend series
#[derive(Debug, Clone, PartialEq)]
pub struct YearTrend {
    /// The year
    pub year: u32,
    /// Energy-weighted average clearing price over the year's periods
    pub average_price: MoneyPerEnergy,
    /// Total energy cleared over the year
    pub total_energy: Energy,
    /// Renewable technologies' share of cleared energy
    pub renewable_share: Dimensionless,
    /// How many periods cleared short
    pub shortages: usize,
}

/// Build the operator dashboard
pub fn dashboard(market: &Market) -> Dashboard {
    let session = market.session();
    let mut plants_by_status: IndexMap<PlantStatus, usize> = IndexMap::new();
    for plant in market.plants().iter() {
        *plants_by_status.entry(plant.status).or_insert(0) += 1;
    }
    let standings = market
        .utilities()
        .values()
        .map(|utility| UtilityStanding {
            utility_id: utility.id.clone(),
            name: utility.name.clone(),
            cash: utility.cash,
            equity: utility.equity,
            debt: utility.debt,
        })
        .sorted_by(|a, b| b.equity.cmp(&a.equity))
        .collect();

    let demand = market.demand().profile(session.current_year);
    let operating_capacity = market.plants().operating_capacity();
    let peak = market
        .demand()
        .demand(session.current_year, LoadPeriod::Peak);
    let capacity_margin = if peak.is_zero() {
        Dimensionless::ZERO
    } else {
        Dimensionless(operating_capacity.value() / peak.value()) - Dimensionless::ONE
    };

    Dashboard {
        session_name: session.name.clone(),
        current_year: session.current_year,
        phase: session.phase,
        demand,
        operating_capacity,
        capacity_margin,
        plants_by_status,
        standings,
        events: market.events().to_vec(),
    }
}

/// Build the multi-year trend series from the market's clearing records.
///
/// The average price is weighted by cleared energy, so a high-priced peak
/// period moves the average in proportion to what was actually dispatched.
/// Years with no cleared energy report a zero price and zero renewable
/// share.
pub fn multi_year_trends(market: &Market) -> MarketResult<Vec<YearTrend>> {
    let mut trends = Vec::new();
    for (year, records) in &market.results().iter().chunk_by(|r| r.year) {
        let mut total_energy = Energy::ZERO;
        let mut renewable_energy = Energy::ZERO;
        let mut weighted_revenue = Money::ZERO;
        let mut shortages = 0;
        for record in records {
            if record.outcome.shortage {
                shortages += 1;
            }
            for allocation in &record.outcome.allocations {
                let energy = allocation.quantity * record.period.hours();
                total_energy = total_energy + energy;
                weighted_revenue = weighted_revenue + energy * record.outcome.clearing_price;
                let plant = market.plants().get(&allocation.plant_id)?;
                if plant.technology.is_renewable() {
                    renewable_energy = renewable_energy + energy;
                }
            }
        }
        let (average_price, renewable_share) = if total_energy.is_zero() {
            (MoneyPerEnergy::ZERO, Dimensionless::ZERO)
        } else {
            (
                MoneyPerEnergy(weighted_revenue.value() / total_energy.value()),
                Dimensionless(renewable_energy.value() / total_energy.value()),
            )
        };
        trends.push(YearTrend {
            year,
            average_price,
            total_energy,
            renewable_share,
            shortages,
        });
    }
    Ok(trends)
}
