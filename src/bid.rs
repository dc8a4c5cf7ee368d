//! Bids and the per-year bid store.
//!
//! The store is opened by the orchestrator with a frozen set of eligible
//! plants, accepts at most one live bid per (plant, period) key with
//! last-write-wins replacement, and is closed before clearing so the
//! snapshot handed to the clearing engine cannot change underneath it.
use crate::error::{MarketError, MarketResult};
use crate::period::LoadPeriod;
use crate::plant::PlantID;
use crate::session::GamePhase;
use crate::units::{Capacity, MoneyPerEnergy};
use crate::utility::UtilityID;
use indexmap::IndexMap;

/// A price/quantity offer for one plant, period and year
#[derive(Debug, Clone, PartialEq)]
pub struct Bid {
    /// The offering plant
    pub plant_id: PlantID,
    /// The utility that owns the plant
    pub utility_id: UtilityID,
    /// The delivery year
    pub year: u32,
    /// The load period the offer applies to
    pub period: LoadPeriod,
    /// Offered quantity in MW (0 <= quantity <= plant capacity)
    pub quantity: Capacity,
    /// Offer price in currency/MWh (non-negative)
    pub price: MoneyPerEnergy,
}

/// The bid store for one year's bidding window
#[derive(Debug, Clone, PartialEq)]
pub struct BidStore {
    year: u32,
    open: bool,
    /// Plants frozen as eligible when bidding opened, with their capacities
    eligible: IndexMap<PlantID, Capacity>,
    bids: IndexMap<(PlantID, LoadPeriod), Bid>,
}

impl BidStore {
    /// Open a bidding window for `year` over the given eligible plants
    pub fn open(year: u32, eligible: IndexMap<PlantID, Capacity>) -> Self {
        Self {
            year,
            open: true,
            eligible,
            bids: IndexMap::new(),
        }
    }

    /// The year this window covers
    pub fn year(&self) -> u32 {
        self.year
    }

    /// Whether the window still accepts writes
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The frozen set of plants eligible to bid
    pub fn eligible_plants(&self) -> impl Iterator<Item = (&PlantID, Capacity)> {
        self.eligible.iter().map(|(id, &cap)| (id, cap))
    }

    /// Validate and record a bid, replacing any prior bid for the same
    /// (plant, period) key.
    ///
    /// `phase` is the session phase at submission time, reported in the
    /// `PhaseClosed` error when the window is shut.
    pub fn submit(&mut self, bid: Bid, phase: GamePhase) -> MarketResult<()> {
        if !self.open {
            return Err(MarketError::PhaseClosed { phase });
        }
        if bid.year != self.year {
            return Err(MarketError::validation(format!(
                "bid is for year {}, bidding is open for year {}",
                bid.year, self.year
            )));
        }
        if bid.price < MoneyPerEnergy::ZERO {
            return Err(MarketError::NegativePrice { price: bid.price });
        }
        if bid.quantity < Capacity::ZERO {
            return Err(MarketError::validation(format!(
                "bid quantity {} MW must not be negative",
                bid.quantity
            )));
        }
        let capacity = *self.eligible.get(&bid.plant_id).ok_or_else(|| {
            MarketError::validation(format!(
                "plant '{}' is not eligible to bid in {}",
                bid.plant_id, self.year
            ))
        })?;
        if bid.quantity > capacity {
            return Err(MarketError::CapacityExceeded {
                quantity: bid.quantity,
                capacity,
            });
        }

        self.bids
            .insert((bid.plant_id.clone(), bid.period), bid);
        Ok(())
    }

    /// Close the window; subsequent submissions fail with `PhaseClosed`
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Iterate over all live bids in submission order
    pub fn iter(&self) -> impl Iterator<Item = &Bid> {
        self.bids.values()
    }

    /// The live bids for one period
    pub fn bids_for_period(&self, period: LoadPeriod) -> impl Iterator<Item = &Bid> {
        self.iter().filter(move |bid| bid.period == period)
    }

    /// The number of live bids
    pub fn len(&self) -> usize {
        self.bids.len()
    }

    /// Whether the store holds no bids
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}
