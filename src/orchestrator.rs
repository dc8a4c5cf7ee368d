//! The year-phase orchestrator.
//!
//! A [`Market`] owns all state for one session and is the only writer of it.
//! Phase-control operations (`start_year_planning`, `open_bidding`,
//! `clear_markets`, `complete_year`) move the session around the annual
//! cycle; every operation validates the current phase first and makes no
//! partial changes on failure.
use crate::bid::{Bid, BidStore};
use crate::clearing::{ClearingRecord, SupplyOffer, clear};
use crate::demand::DemandForecast;
use crate::economics::{self, AnnualEconomics};
use crate::error::{MarketError, MarketResult};
use crate::fuel::FuelPriceTable;
use crate::period::LoadPeriod;
use crate::plant::{Plant, PlantID, PlantPool, PlantStatus};
use crate::session::{GamePhase, Session};
use crate::technology::{FuelType, TemplateMap, Technology};
use crate::units::{Capacity, Money, MoneyPerMmbtu};
use crate::utility::{Utility, UtilityID, UtilityMap};
use indexmap::IndexMap;
use log::info;

/// A notable market occurrence, recorded for reporting
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    /// Submitted supply fell short of demand in one period
    Shortage {
        /// The year the shortage occurred
        year: u32,
        /// The affected period
        period: LoadPeriod,
        /// Demand left unserved, in MW
        unserved: Capacity,
    },
}

impl std::fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketEvent::Shortage {
                year,
                period,
                unserved,
            } => {
                write!(f, "{year} {period}: shortage, {unserved} MW unserved")
            }
        }
    }
}

/// A plant investment request, validated as a whole before any state changes
#[derive(Debug, Clone)]
pub struct InvestmentRequest {
    /// The ID the new plant will take
    pub plant_id: PlantID,
    /// A human-readable name
    pub name: String,
    /// The technology to build
    pub technology: Technology,
    /// Nameplate capacity in MW
    pub capacity: Capacity,
    /// The year construction begins
    pub construction_start_year: u32,
    /// The first year the plant can operate
    pub commissioning_year: u32,
    /// The first year the plant is retired
    pub retirement_year: u32,
}

/// One plant's offers for a year, submitted as a unit.
///
/// Submission is all-or-nothing: if any per-period offer fails validation,
/// none of them is recorded.
#[derive(Debug, Clone)]
pub struct BidSubmission {
    /// The offering plant
    pub plant_id: PlantID,
    /// The delivery year
    pub year: u32,
    /// One offer per load period
    pub offers: Vec<PeriodOffer>,
}

/// A price/quantity pair for one load period
#[derive(Debug, Clone)]
pub struct PeriodOffer {
    /// The period offered into
    pub period: LoadPeriod,
    /// Offered quantity in MW
    pub quantity: Capacity,
    /// Offer price in currency/MWh
    pub price: crate::units::MoneyPerEnergy,
}

/// What a utility needs to plan the coming year
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningOutlook {
    /// The year being planned
    pub year: u32,
    /// Forecast demand per period
    pub demand: IndexMap<LoadPeriod, Capacity>,
    /// This year's fuel prices
    pub fuel_prices: IndexMap<FuelType, MoneyPerMmbtu>,
    /// Total capacity currently operating
    pub operating_capacity: Capacity,
}

/// The roster published when a bidding window opens
#[derive(Debug, Clone, PartialEq)]
pub struct BiddingNotice {
    /// The year bids are invited for
    pub year: u32,
    /// The plants eligible to bid, frozen at opening
    pub eligible_plants: Vec<PlantID>,
}

/// One utility's settled results for one year
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// The settled year
    pub year: u32,
    /// The settled utility
    pub utility_id: UtilityID,
    /// Market revenue across the utility's plants
    pub revenue: Money,
    /// Fixed O&M across operating and maintenance plants
    pub fixed_cost: Money,
    /// Variable O&M across dispatched generation
    pub variable_cost: Money,
    /// Revenue less fixed and variable costs
    pub profit: Money,
}

/// A completed year's summary
#[derive(Debug, Clone, PartialEq)]
pub struct YearReview {
    /// The year just settled
    pub year: u32,
    /// Per-utility settlements, applied to the ledgers
    pub settlements: Vec<Settlement>,
    /// Whether this was the session's final year
    pub game_complete: bool,
}

/// All state for one game session, and the operations that change it
#[derive(Debug, Clone)]
pub struct Market {
    session: Session,
    templates: TemplateMap,
    demand: DemandForecast,
    fuel_prices: FuelPriceTable,
    utilities: UtilityMap,
    plants: PlantPool,
    bids: Option<BidStore>,
    results: Vec<ClearingRecord>,
    settlements: Vec<Settlement>,
    events: Vec<MarketEvent>,
}

impl Market {
    /// Create a market for a new session.
    ///
    /// The demand forecast's base year defaults to the session's start year
    /// when unset.
    pub fn new(
        session: Session,
        templates: TemplateMap,
        mut demand: DemandForecast,
        fuel_prices: FuelPriceTable,
    ) -> MarketResult<Self> {
        if demand.base_year == 0 {
            demand.base_year = session.start_year;
        }
        demand
            .validate()
            .map_err(|err| MarketError::validation(err.to_string()))?;
        for template in templates.values() {
            template
                .validate()
                .map_err(|err| MarketError::validation(err.to_string()))?;
        }
        Ok(Self {
            session,
            templates,
            demand,
            fuel_prices,
            utilities: UtilityMap::new(),
            plants: PlantPool::new(),
            bids: None,
            results: Vec::new(),
            settlements: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Add a utility to the roster (setup only)
    pub fn add_utility(&mut self, utility: Utility) -> MarketResult<()> {
        self.session
            .require_phase("add_utility", &[GamePhase::Setup])?;
        if self.utilities.contains_key(&utility.id) {
            return Err(MarketError::validation(format!(
                "duplicate utility ID '{}'",
                utility.id
            )));
        }
        self.utilities.insert(utility.id.clone(), utility);
        Ok(())
    }

    /// Adopt a pre-existing plant from a scenario file (setup only).
    ///
    /// The plant's capital is treated as sunk; no financing is recorded.
    /// Thermal plants require a priced fuel, the same as new investments.
    pub fn adopt_plant(&mut self, plant: Plant) -> MarketResult<()> {
        self.session
            .require_phase("adopt_plant", &[GamePhase::Setup])?;
        self.require_utility(&plant.utility_id)?;
        if let Some(fuel) = plant.fuel_type {
            if !self.fuel_prices.covers(fuel) {
                return Err(MarketError::validation(format!(
                    "no fuel price for {fuel}, cannot adopt plant '{}'",
                    plant.id
                )));
            }
        }
        self.plants.insert(plant)?;
        Ok(())
    }

    /// Build a new plant for a utility, financing its capital cost.
    ///
    /// Allowed during setup and year planning. Capital is financed 70% with
    /// debt and 30% with equity, and the full amount leaves the utility's
    /// cash balance.
    pub fn create_plant(
        &mut self,
        utility_id: &UtilityID,
        request: InvestmentRequest,
    ) -> MarketResult<&Plant> {
        self.session
            .require_phase("create_plant", &[GamePhase::Setup, GamePhase::YearPlanning])?;
        self.require_utility(utility_id)?;
        let template = self
            .templates
            .get(&request.technology)
            .ok_or_else(|| MarketError::not_found("template", request.technology))?;
        if let Some(fuel) = template.fuel_type {
            if !self.fuel_prices.covers(fuel) {
                return Err(MarketError::validation(format!(
                    "no fuel price for {fuel}, cannot build {}",
                    request.technology
                )));
            }
        }
        let plant = Plant::from_template(
            request.plant_id,
            utility_id.clone(),
            request.name,
            template,
            request.capacity,
            request.construction_start_year,
            request.commissioning_year,
            request.retirement_year,
        )?;

        let capital = plant.capital_cost;
        let plant = self.plants.insert(plant)?;
        let utility = self
            .utilities
            .get_mut(utility_id)
            .ok_or_else(|| MarketError::not_found("utility", utility_id))?;
        utility.finance_investment(capital);
        info!(
            "{}: {} invests {capital} in {} ({} MW {})",
            self.session.id, utility_id, plant.id, plant.capacity, plant.technology
        );
        Ok(plant)
    }

    /// Begin planning `year`, which must be the expected next year.
    ///
    /// Valid from `SETUP` (first year) or `YEAR_COMPLETE`. Every plant's
    /// status advances to the current year before planning opens.
    pub fn start_year_planning(&mut self, year: u32) -> MarketResult<PlanningOutlook> {
        self.session.require_phase(
            "start_year_planning",
            &[GamePhase::Setup, GamePhase::YearComplete],
        )?;
        self.require_year("start_year_planning", year)?;
        self.plants.advance_to_year(year);
        self.session.phase = GamePhase::YearPlanning;
        info!("{}: year {year} planning open", self.session.id);
        Ok(PlanningOutlook {
            year,
            demand: self.demand.profile(year),
            fuel_prices: self.fuel_prices.prices_for_year(year),
            operating_capacity: self.plants.operating_capacity(),
        })
    }

    /// Open the bidding window for `year`, which must be the current year.
    ///
    /// The set of eligible plants (those `OPERATING` right now) is frozen at
    /// this moment; later status changes do not affect the window.
    pub fn open_bidding(&mut self, year: u32) -> MarketResult<BiddingNotice> {
        self.session
            .require_phase("open_bidding", &[GamePhase::YearPlanning])?;
        self.require_year("open_bidding", year)?;
        let eligible: IndexMap<PlantID, Capacity> = self
            .plants
            .iter()
            .filter(|p| p.is_operating())
            .map(|p| (p.id.clone(), p.capacity))
            .collect();
        let notice = BiddingNotice {
            year,
            eligible_plants: eligible.keys().cloned().collect(),
        };
        self.bids = Some(BidStore::open(year, eligible));
        self.session.phase = GamePhase::BiddingOpen;
        info!(
            "{}: year {year} bidding open, {} plants eligible",
            self.session.id,
            notice.eligible_plants.len()
        );
        Ok(notice)
    }

    /// Submit one plant's offers for the year, atomically.
    ///
    /// The plant must belong to `utility_id` and each per-period offer must
    /// pass bid validation; on any failure nothing is recorded.
    pub fn submit_bid(
        &mut self,
        utility_id: &UtilityID,
        submission: BidSubmission,
    ) -> MarketResult<()> {
        let phase = self.session.phase;
        if phase != GamePhase::BiddingOpen {
            return Err(MarketError::PhaseClosed { phase });
        }
        let plant = self.plants.get(&submission.plant_id)?;
        if &plant.utility_id != utility_id {
            return Err(MarketError::validation(format!(
                "plant '{}' is not owned by utility '{utility_id}'",
                submission.plant_id
            )));
        }
        let store = self
            .bids
            .as_mut()
            .ok_or(MarketError::PhaseClosed { phase })?;

        // Stage the whole submission so a late failure leaves no partial bids
        let mut staged = store.clone();
        for offer in submission.offers {
            staged.submit(
                Bid {
                    plant_id: submission.plant_id.clone(),
                    utility_id: utility_id.clone(),
                    year: submission.year,
                    period: offer.period,
                    quantity: offer.quantity,
                    price: offer.price,
                },
                phase,
            )?;
        }
        *store = staged;
        Ok(())
    }

    /// Close the bidding window and clear all three period markets for
    /// `year`, which must be the current year.
    ///
    /// Each period is cleared independently against the year's forecast
    /// demand; shortages are recorded as market events. Returns the year's
    /// clearing records in period order. On failure the window stays open
    /// and every submitted bid survives.
    pub fn clear_markets(&mut self, year: u32) -> MarketResult<Vec<ClearingRecord>> {
        self.session
            .require_phase("clear_markets", &[GamePhase::BiddingOpen])?;
        self.require_year("clear_markets", year)?;
        let store = self.bids.as_ref().ok_or(MarketError::InvalidTransition {
            operation: "clear_markets",
            phase: self.session.phase,
        })?;

        // Price every offer before closing the window, so a failure here
        // leaves the session exactly as it was
        let carbon = self.session.carbon_price_per_ton;
        let mut period_offers = Vec::with_capacity(3);
        for period in LoadPeriod::all() {
            let mut offers = Vec::new();
            for bid in store.bids_for_period(period) {
                let plant = self.plants.get(&bid.plant_id)?;
                offers.push(SupplyOffer {
                    plant_id: bid.plant_id.clone(),
                    quantity: bid.quantity,
                    price: bid.price,
                    marginal_cost: economics::marginal_cost(
                        plant,
                        &self.fuel_prices,
                        carbon,
                        year,
                    )?,
                });
            }
            period_offers.push((period, offers));
        }

        if let Some(store) = self.bids.as_mut() {
            store.close();
        }
        let mut records = Vec::with_capacity(3);
        for (period, offers) in period_offers {
            let demand = self.demand.demand(year, period);
            let outcome = clear(demand, &offers);
            if outcome.shortage {
                let unserved = demand - outcome.cleared_quantity;
                info!("{}: {year} {period} shortage, {unserved} MW unserved", self.session.id);
                self.events.push(MarketEvent::Shortage {
                    year,
                    period,
                    unserved,
                });
            }
            records.push(ClearingRecord {
                year,
                period,
                outcome,
            });
        }

        self.results.extend(records.iter().cloned());
        self.session.phase = GamePhase::MarketClearing;
        info!("{}: year {year} markets cleared", self.session.id);
        Ok(records)
    }

    /// Settle `year`, which must be the current year, and move on.
    ///
    /// Each utility is credited its plants' revenue and charged fixed O&M
    /// (operating and maintenance plants) plus variable O&M on dispatched
    /// generation. After the final year the session becomes `GAME_COMPLETE`;
    /// otherwise the current year advances, every plant's status advances
    /// with it, and the session awaits the next planning phase.
    pub fn complete_year(&mut self, year: u32) -> MarketResult<YearReview> {
        self.session
            .require_phase("complete_year", &[GamePhase::MarketClearing])?;
        self.require_year("complete_year", year)?;
        let carbon = self.session.carbon_price_per_ton;

        let mut settlements = Vec::with_capacity(self.utilities.len());
        for utility_id in self.utilities.keys().cloned().collect::<Vec<_>>() {
            let mut settlement = Settlement {
                year,
                utility_id: utility_id.clone(),
                revenue: Money::ZERO,
                fixed_cost: Money::ZERO,
                variable_cost: Money::ZERO,
                profit: Money::ZERO,
            };
            for plant in self.plants.iter_for_utility(&utility_id) {
                if !matches!(
                    plant.status,
                    PlantStatus::Operating | PlantStatus::Maintenance
                ) {
                    continue;
                }
                let econ = economics::annual_economics(
                    plant,
                    &self.fuel_prices,
                    carbon,
                    year,
                    &self.results,
                )?;
                settlement.revenue = settlement.revenue + econ.revenue;
                settlement.fixed_cost = settlement.fixed_cost + econ.fixed_cost;
                settlement.variable_cost = settlement.variable_cost + econ.variable_cost;
            }
            settlement.profit =
                settlement.revenue - settlement.fixed_cost - settlement.variable_cost;
            settlements.push(settlement);
        }
        for settlement in &settlements {
            if let Some(utility) = self.utilities.get_mut(&settlement.utility_id) {
                utility.apply_settlement(settlement.profit);
            }
        }
        self.settlements.extend(settlements.iter().cloned());

        let game_complete = self.session.is_final_year();
        if game_complete {
            self.session.phase = GamePhase::GameComplete;
            info!("{}: game complete after year {year}", self.session.id);
        } else {
            self.session.current_year = year + 1;
            self.plants.advance_to_year(year + 1);
            self.session.phase = GamePhase::YearComplete;
            info!("{}: year {year} settled", self.session.id);
        }
        Ok(YearReview {
            year,
            settlements,
            game_complete,
        })
    }

    /// Take an operating plant into maintenance (year planning only)
    pub fn begin_maintenance(&mut self, plant_id: &PlantID) -> MarketResult<()> {
        self.session
            .require_phase("begin_maintenance", &[GamePhase::YearPlanning])?;
        self.plants.get_mut(plant_id)?.begin_maintenance()
    }

    /// Return a plant from maintenance to operation (year planning only)
    pub fn end_maintenance(&mut self, plant_id: &PlantID) -> MarketResult<()> {
        self.session
            .require_phase("end_maintenance", &[GamePhase::YearPlanning])?;
        self.plants.get_mut(plant_id)?.end_maintenance()
    }

    /// One plant's annual economics, estimated if the year has no results
    pub fn plant_economics(
        &self,
        plant_id: &PlantID,
        year: u32,
    ) -> MarketResult<AnnualEconomics> {
        let plant = self.plants.get(plant_id)?;
        economics::annual_economics(
            plant,
            &self.fuel_prices,
            self.session.carbon_price_per_ton,
            year,
            &self.results,
        )
    }

    /// Fail with `InvalidTransition` unless `year` is the current year
    fn require_year(&self, operation: &'static str, year: u32) -> MarketResult<()> {
        if year == self.session.current_year {
            Ok(())
        } else {
            Err(MarketError::InvalidTransition {
                operation,
                phase: self.session.phase,
            })
        }
    }

    fn require_utility(&self, utility_id: &UtilityID) -> MarketResult<&Utility> {
        self.utilities
            .get(utility_id)
            .ok_or_else(|| MarketError::not_found("utility", utility_id))
    }

    /// The session's current state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The template catalog in use
    pub fn templates(&self) -> &TemplateMap {
        &self.templates
    }

    /// The demand forecast in use
    pub fn demand(&self) -> &DemandForecast {
        &self.demand
    }

    /// The roster of utilities
    pub fn utilities(&self) -> &UtilityMap {
        &self.utilities
    }

    /// Look up a utility's ledger
    pub fn utility(&self, utility_id: &UtilityID) -> MarketResult<&Utility> {
        self.require_utility(utility_id)
    }

    /// The pool of plants
    pub fn plants(&self) -> &PlantPool {
        &self.plants
    }

    /// All clearing records, oldest first
    pub fn results(&self) -> &[ClearingRecord] {
        &self.results
    }

    /// The clearing records for one year, in period order
    pub fn results_for_year(&self, year: u32) -> impl Iterator<Item = &ClearingRecord> {
        self.results.iter().filter(move |r| r.year == year)
    }

    /// All settlements applied so far, oldest first
    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    /// All recorded market events, oldest first
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{demand_forecast, fuel_prices, market, session};
    use crate::units::MoneyPerEnergy;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn offer_all_periods(quantity: i64, price: i64) -> Vec<PeriodOffer> {
        LoadPeriod::all()
            .map(|period| PeriodOffer {
                period,
                quantity: Capacity(rust_decimal::Decimal::from(quantity)),
                price: MoneyPerEnergy(rust_decimal::Decimal::from(price)),
            })
            .collect()
    }

    #[rstest]
    fn test_market_rejects_invalid_demand(
        session: Session,
        fuel_prices: FuelPriceTable,
        mut demand_forecast: DemandForecast,
    ) {
        demand_forecast.peak_mw = Capacity::ZERO;
        let result = Market::new(
            session,
            crate::technology::default_templates(),
            demand_forecast,
            fuel_prices,
        );
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[rstest]
    fn test_phase_controls_reject_wrong_state(mut market: Market) {
        // In SETUP: only start_year_planning is valid among phase controls
        assert!(matches!(
            market.open_bidding(2025),
            Err(MarketError::InvalidTransition { .. })
        ));
        assert!(matches!(
            market.clear_markets(2025),
            Err(MarketError::InvalidTransition { .. })
        ));
        assert!(matches!(
            market.complete_year(2025),
            Err(MarketError::InvalidTransition { .. })
        ));

        market.start_year_planning(2025).unwrap();
        assert_eq!(market.session().phase, GamePhase::YearPlanning);
        assert!(matches!(
            market.start_year_planning(2025),
            Err(MarketError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    fn test_bid_outside_window_is_phase_closed(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        let result = market.submit_bid(
            &"u1".into(),
            BidSubmission {
                plant_id: "gas1".into(),
                year: 2025,
                offers: offer_all_periods(100, 30),
            },
        );
        assert_eq!(
            result,
            Err(MarketError::PhaseClosed {
                phase: GamePhase::YearPlanning
            })
        );
    }

    #[rstest]
    fn test_eligibility_frozen_at_opening(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        let notice = market.open_bidding(2025).unwrap();
        assert!(notice.eligible_plants.contains(&"gas1".into()));
        // Plants under construction are not eligible
        assert!(!notice.eligible_plants.contains(&"wind1".into()));
    }

    #[rstest]
    fn test_submission_is_atomic(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        market.open_bidding(2025).unwrap();

        // Second offer exceeds capacity (gas1 is 400 MW), so the valid
        // first offer must not be recorded either
        let mut offers = offer_all_periods(100, 30);
        offers[1].quantity = Capacity(dec!(9999));
        let result = market.submit_bid(
            &"u1".into(),
            BidSubmission {
                plant_id: "gas1".into(),
                year: 2025,
                offers,
            },
        );
        assert!(matches!(result, Err(MarketError::CapacityExceeded { .. })));

        let records = market.clear_markets(2025).unwrap();
        assert!(records.iter().all(|r| r.outcome.allocations.is_empty()));
    }

    #[rstest]
    fn test_bid_for_unowned_plant_rejected(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        market.open_bidding(2025).unwrap();
        let result = market.submit_bid(
            &"u2".into(),
            BidSubmission {
                plant_id: "gas1".into(),
                year: 2025,
                offers: offer_all_periods(100, 30),
            },
        );
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[rstest]
    fn test_full_year_cycle_settles_and_advances(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        market.open_bidding(2025).unwrap();
        market
            .submit_bid(
                &"u1".into(),
                BidSubmission {
                    plant_id: "gas1".into(),
                    year: 2025,
                    offers: offer_all_periods(400, 48),
                },
            )
            .unwrap();

        let records = market.clear_markets(2025).unwrap();
        assert_eq!(records.len(), 3);
        // 400 MW against >400 MW demand: shortage in every period
        assert!(records.iter().all(|r| r.outcome.shortage));
        assert_eq!(market.events().len(), 3);

        let cash_before = market.utility(&"u1".into()).unwrap().cash;
        let review = market.complete_year(2025).unwrap();
        assert!(!review.game_complete);
        assert_eq!(market.session().phase, GamePhase::YearComplete);
        assert_eq!(market.session().current_year, 2026);

        // 400 MW * 8760 h at $48, less fixed and variable O&M
        let settlement = &review.settlements[0];
        assert_eq!(settlement.utility_id, "u1".into());
        assert_eq!(
            settlement.revenue,
            Money(dec!(400) * dec!(8760) * dec!(48))
        );
        assert_eq!(
            settlement.profit,
            settlement.revenue - settlement.fixed_cost - settlement.variable_cost
        );
        let utility = market.utility(&"u1".into()).unwrap();
        assert_eq!(utility.cash, cash_before + settlement.profit);
    }

    #[rstest]
    fn test_create_plant_finances_and_registers(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        let cash_before = market.utility(&"u1".into()).unwrap().cash;
        let capital = market
            .create_plant(
                &"u1".into(),
                InvestmentRequest {
                    plant_id: "solar1".into(),
                    name: "Desert Solar".into(),
                    technology: Technology::Solar,
                    capacity: Capacity(dec!(200)),
                    construction_start_year: 2025,
                    commissioning_year: 2026,
                    retirement_year: 2051,
                },
            )
            .unwrap()
            .capital_cost;

        // $1100/kW * 200 MW
        assert_eq!(capital, Money(dec!(220000000)));
        let utility = market.utility(&"u1".into()).unwrap();
        assert_eq!(utility.cash, cash_before - capital);
        assert_eq!(market.plants().get(&"solar1".into()).unwrap().status, PlantStatus::Planned);
    }

    #[rstest]
    fn test_create_plant_requires_planning_or_setup(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        market.open_bidding(2025).unwrap();
        let result = market.create_plant(
            &"u1".into(),
            InvestmentRequest {
                plant_id: "solar1".into(),
                name: "Desert Solar".into(),
                technology: Technology::Solar,
                capacity: Capacity(dec!(200)),
                construction_start_year: 2025,
                commissioning_year: 2026,
                retirement_year: 2051,
            },
        );
        assert!(matches!(result, Err(MarketError::InvalidTransition { .. })));
    }

    #[rstest]
    fn test_maintenance_only_during_planning(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        market.begin_maintenance(&"gas1".into()).unwrap();
        market.end_maintenance(&"gas1".into()).unwrap();

        market.open_bidding(2025).unwrap();
        assert!(matches!(
            market.begin_maintenance(&"gas1".into()),
            Err(MarketError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    fn test_game_completes_after_final_year(mut market: Market) {
        loop {
            let year = market.session().current_year;
            market.start_year_planning(year).unwrap();
            market.open_bidding(year).unwrap();
            market.clear_markets(year).unwrap();
            let review = market.complete_year(year).unwrap();
            if review.game_complete {
                break;
            }
        }
        assert_eq!(market.session().phase, GamePhase::GameComplete);
        assert_eq!(market.session().current_year, market.session().end_year);
        assert!(matches!(
            market.start_year_planning(market.session().end_year),
            Err(MarketError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    fn test_phase_controls_verify_the_year(mut market: Market) {
        // The session opens at 2025; any other year is rejected
        assert!(matches!(
            market.start_year_planning(2026),
            Err(MarketError::InvalidTransition { .. })
        ));
        market.start_year_planning(2025).unwrap();
        assert!(matches!(
            market.open_bidding(2024),
            Err(MarketError::InvalidTransition { .. })
        ));
        market.open_bidding(2025).unwrap();
        assert!(matches!(
            market.clear_markets(2026),
            Err(MarketError::InvalidTransition { .. })
        ));
        market.clear_markets(2025).unwrap();
        assert!(matches!(
            market.complete_year(2026),
            Err(MarketError::InvalidTransition { .. })
        ));
        market.complete_year(2025).unwrap();
        assert_eq!(market.session().current_year, 2026);
    }

    #[rstest]
    fn test_complete_year_advances_plant_statuses(mut market: Market) {
        // wind1 is commissioned in 2027; play 2025 and 2026
        for year in [2025, 2026] {
            market.start_year_planning(year).unwrap();
            market.open_bidding(year).unwrap();
            market.clear_markets(year).unwrap();
            market.complete_year(year).unwrap();
        }
        assert_eq!(market.session().phase, GamePhase::YearComplete);
        assert_eq!(market.session().current_year, 2027);
        assert_eq!(
            market.plants().get(&"wind1".into()).unwrap().status,
            PlantStatus::Operating
        );
    }

    #[rstest]
    fn test_adopt_plant_requires_fuel_price(mut market: Market) {
        // The fixture's table prices gas and coal only
        let templates = crate::technology::default_templates();
        let plant = Plant::from_template(
            "nuke1".into(),
            "u1".into(),
            "Atomville".into(),
            &templates[&Technology::Nuclear],
            Capacity(dec!(1000)),
            2017,
            2024,
            2084,
        )
        .unwrap();
        assert!(matches!(
            market.adopt_plant(plant),
            Err(MarketError::Validation(_))
        ));
    }

    #[rstest]
    fn test_failed_clearing_leaves_window_open(mut market: Market) {
        market.start_year_planning(2025).unwrap();
        market.open_bidding(2025).unwrap();
        market
            .submit_bid(
                &"u1".into(),
                BidSubmission {
                    plant_id: "gas1".into(),
                    year: 2025,
                    offers: offer_all_periods(400, 48),
                },
            )
            .unwrap();

        // Pull the gas price out from under the submitted bids
        let priced = std::mem::replace(
            &mut market.fuel_prices,
            FuelPriceTable::new(2025, IndexMap::new(), crate::units::Dimensionless::ZERO),
        );
        assert!(matches!(
            market.clear_markets(2025),
            Err(MarketError::NotFound { .. })
        ));

        // The window stays open, the bids survive and resubmission works
        assert_eq!(market.session().phase, GamePhase::BiddingOpen);
        market
            .submit_bid(
                &"u1".into(),
                BidSubmission {
                    plant_id: "gas1".into(),
                    year: 2025,
                    offers: offer_all_periods(300, 52),
                },
            )
            .unwrap();

        market.fuel_prices = priced;
        let records = market.clear_markets(2025).unwrap();
        assert_eq!(records.len(), 3);
        assert!(
            records
                .iter()
                .all(|r| r.outcome.cleared_quantity == Capacity(dec!(300)))
        );
    }
}
