//! Plant economics: marginal cost and annual financial aggregates.
//!
//! All calculations are pure functions of the plant, the fuel price table
//! and the session's carbon price; the orchestrator calls them during
//! settlement and exposes them as read queries.
use crate::clearing::ClearingRecord;
use crate::error::MarketResult;
use crate::fuel::FuelPriceTable;
use crate::period::LoadPeriod;
use crate::plant::Plant;
use crate::units::{Energy, Money, MoneyPerEnergy, MoneyPerTon};

/// The annual economics of one plant in one year
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualEconomics {
    /// Cost of producing one more MWh
    pub marginal_cost: MoneyPerEnergy,
    /// Annual fixed O&M cost, incurred regardless of dispatch
    pub fixed_cost: Money,
    /// Variable O&M cost over the year's generation
    pub variable_cost: Money,
    /// Energy generated (or estimated) over the year
    pub generation: Energy,
    /// Market revenue over the year's cleared allocations
    pub revenue: Money,
    /// Whether generation was estimated rather than taken from results
    pub estimated: bool,
}

impl AnnualEconomics {
    /// Revenue less fixed and variable costs
    pub fn profit(&self) -> Money {
        self.revenue - self.fixed_cost - self.variable_cost
    }
}

/// The marginal cost of one plant in one year.
///
/// Variable O&M, plus fuel cost for thermal plants (heat rate converted to
/// MMBtu/MWh against the year's fuel price), plus the carbon cost of the
/// plant's emission rate. Renewables with no heat rate and no emissions pay
/// only their variable O&M.
pub fn marginal_cost(
    plant: &Plant,
    fuel_prices: &FuelPriceTable,
    carbon_price: MoneyPerTon,
    year: u32,
) -> MarketResult<MoneyPerEnergy> {
    let mut cost = plant.variable_om_per_mwh;
    if let (Some(heat_rate), Some(fuel)) = (plant.heat_rate, plant.fuel_type) {
        let fuel_price = fuel_prices.price(fuel, year)?;
        cost = cost + heat_rate.fuel_intensity() * fuel_price;
    }
    cost = cost + plant.co2_tons_per_mwh * carbon_price;
    Ok(cost)
}

/// A plant's expected annual generation from its capacity factor.
///
/// Used when no clearing results exist for the year (e.g. planning-time
/// estimates for plants not yet dispatched).
pub fn estimated_generation(plant: &Plant) -> Energy {
    LoadPeriod::all()
        .map(|period| plant.capacity * plant.capacity_factor * period.hours())
        .sum()
}

/// Compute one plant's annual economics for `year`.
///
/// Generation and revenue come from the year's clearing records when any
/// exist; otherwise generation falls back to the capacity-factor estimate
/// and revenue is zero. Fixed O&M is always the full annual amount.
pub fn annual_economics(
    plant: &Plant,
    fuel_prices: &FuelPriceTable,
    carbon_price: MoneyPerTon,
    year: u32,
    results: &[ClearingRecord],
) -> MarketResult<AnnualEconomics> {
    let marginal_cost = self::marginal_cost(plant, fuel_prices, carbon_price, year)?;

    let year_results: Vec<_> = results.iter().filter(|r| r.year == year).collect();
    let (generation, revenue, estimated) = if year_results.is_empty() {
        (estimated_generation(plant), Money::ZERO, true)
    } else {
        let mut generation = Energy::ZERO;
        let mut revenue = Money::ZERO;
        for record in year_results {
            let allocated = record.allocation_for(&plant.id);
            let energy = allocated * record.period.hours();
            generation = generation + energy;
            revenue = revenue + energy * record.outcome.clearing_price;
        }
        (generation, revenue, false)
    };

    Ok(AnnualEconomics {
        marginal_cost,
        fixed_cost: plant.fixed_om_annual,
        variable_cost: generation * plant.variable_om_per_mwh,
        generation,
        revenue,
        estimated,
    })
}
