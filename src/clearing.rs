//! The market clearing engine.
//!
//! A pure uniform-price merit-order auction: offers are dispatched from
//! cheapest to most expensive until demand is met, and every accepted MW
//! settles at the marginal offer's price (pay-as-cleared). The function is
//! total and deterministic - identical inputs always produce an identical
//! result.
use crate::period::LoadPeriod;
use crate::plant::PlantID;
use crate::units::{Capacity, MoneyPerEnergy};

/// One plant's offer into a single period's auction.
///
/// `marginal_cost` is the plant's pre-computed marginal cost, used only to
/// break ties between offers at the same price.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyOffer {
    /// The offering plant
    pub plant_id: PlantID,
    /// Offered quantity in MW
    pub quantity: Capacity,
    /// Offer price in currency/MWh
    pub price: MoneyPerEnergy,
    /// The plant's marginal cost, for deterministic tie-breaking
    pub marginal_cost: MoneyPerEnergy,
}

/// An accepted quantity for one plant
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// The dispatched plant
    pub plant_id: PlantID,
    /// The accepted quantity in MW
    pub quantity: Capacity,
}

/// The result of clearing one period
#[derive(Debug, Clone, PartialEq)]
pub struct ClearingOutcome {
    /// The single price paid to all accepted supply
    pub clearing_price: MoneyPerEnergy,
    /// Total accepted quantity (never exceeds demand or total supply)
    pub cleared_quantity: Capacity,
    /// Accepted quantity per plant, in merit order
    pub allocations: Vec<Allocation>,
    /// The plant whose offer set the price, if any offers were received
    pub marginal_plant: Option<PlantID>,
    /// Whether submitted supply fell short of demand
    pub shortage: bool,
}

/// A persisted clearing result for one (year, period)
#[derive(Debug, Clone, PartialEq)]
pub struct ClearingRecord {
    /// The delivery year
    pub year: u32,
    /// The cleared period
    pub period: LoadPeriod,
    /// The auction outcome
    pub outcome: ClearingOutcome,
}

impl ClearingRecord {
    /// The quantity allocated to one plant in this record (zero if rejected)
    pub fn allocation_for(&self, plant_id: &PlantID) -> Capacity {
        self.outcome
            .allocations
            .iter()
            .find(|a| &a.plant_id == plant_id)
            .map_or(Capacity::ZERO, |a| a.quantity)
    }
}

/// Clear one period: dispatch `offers` against `demand` in merit order.
///
/// Offers are sorted by price, then by marginal cost, then by plant ID, so
/// the outcome is a total function of the snapshot. The first offer whose
/// cumulative quantity reaches demand is the marginal offer: it is accepted
/// for exactly the remainder and sets the clearing price for all accepted
/// supply. If total supply falls short of demand, every offer is accepted in
/// full, the shortage flag is set and the highest submitted price clears the
/// market (scarcity pricing). An empty book clears zero at a zero price with
/// the shortage flag set.
pub fn clear(demand: Capacity, offers: &[SupplyOffer]) -> ClearingOutcome {
    let mut merit_order: Vec<&SupplyOffer> = offers
        .iter()
        .filter(|offer| offer.quantity > Capacity::ZERO)
        .collect();
    merit_order.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then(a.marginal_cost.cmp(&b.marginal_cost))
            .then(a.plant_id.as_str().cmp(b.plant_id.as_str()))
    });

    if merit_order.is_empty() {
        return ClearingOutcome {
            clearing_price: MoneyPerEnergy::ZERO,
            cleared_quantity: Capacity::ZERO,
            allocations: Vec::new(),
            marginal_plant: None,
            shortage: true,
        };
    }

    let total_supply: Capacity = merit_order.iter().map(|o| o.quantity).sum();
    if total_supply < demand {
        // Scarcity: accept everything, the highest offer sets the price
        let clearing_price = merit_order
            .iter()
            .map(|o| o.price)
            .max()
            .expect("merit order is non-empty");
        let allocations = merit_order
            .iter()
            .map(|o| Allocation {
                plant_id: o.plant_id.clone(),
                quantity: o.quantity,
            })
            .collect();
        let marginal_plant = merit_order.last().map(|o| o.plant_id.clone());
        return ClearingOutcome {
            clearing_price,
            cleared_quantity: total_supply,
            allocations,
            marginal_plant,
            shortage: true,
        };
    }

    let mut allocations = Vec::new();
    let mut cumulative = Capacity::ZERO;
    let mut clearing_price = MoneyPerEnergy::ZERO;
    let mut marginal_plant = None;
    for offer in merit_order {
        let remainder = demand - cumulative;
        let accepted = offer.quantity.min(remainder);
        allocations.push(Allocation {
            plant_id: offer.plant_id.clone(),
            quantity: accepted,
        });
        cumulative = cumulative + accepted;
        if cumulative >= demand {
            // This offer is marginal; it sets the uniform price
            clearing_price = offer.price;
            marginal_plant = Some(offer.plant_id.clone());
            break;
        }
    }

    ClearingOutcome {
        clearing_price,
        cleared_quantity: cumulative,
        allocations,
        marginal_plant,
        shortage: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn offer(plant: &str, quantity: i64, price: i64) -> SupplyOffer {
        offer_with_cost(plant, quantity, price, price)
    }

    fn offer_with_cost(plant: &str, quantity: i64, price: i64, cost: i64) -> SupplyOffer {
        SupplyOffer {
            plant_id: plant.into(),
            quantity: Capacity(rust_decimal::Decimal::from(quantity)),
            price: MoneyPerEnergy(rust_decimal::Decimal::from(price)),
            marginal_cost: MoneyPerEnergy(rust_decimal::Decimal::from(cost)),
        }
    }

    #[test]
    fn test_merit_order_with_partial_marginal_acceptance() {
        // 1000 MW demand; A(500 @ $30), B(400 @ $40), C(300 @ $50):
        // A and B in full, C partially for 100, price $50
        let offers = [offer("A", 500, 30), offer("B", 400, 40), offer("C", 300, 50)];
        let outcome = clear(Capacity(dec!(1000)), &offers);

        assert_eq!(outcome.clearing_price, MoneyPerEnergy(dec!(50)));
        assert_eq!(outcome.cleared_quantity, Capacity(dec!(1000)));
        assert_eq!(outcome.marginal_plant, Some("C".into()));
        assert!(!outcome.shortage);
        assert_eq!(
            outcome.allocations,
            vec![
                Allocation {
                    plant_id: "A".into(),
                    quantity: Capacity(dec!(500))
                },
                Allocation {
                    plant_id: "B".into(),
                    quantity: Capacity(dec!(400))
                },
                Allocation {
                    plant_id: "C".into(),
                    quantity: Capacity(dec!(100))
                },
            ]
        );
    }

    #[test]
    fn test_shortage_accepts_all_at_highest_price() {
        // 2000 MW demand against 900 MW of supply
        let offers = [offer("A", 500, 30), offer("B", 400, 45)];
        let outcome = clear(Capacity(dec!(2000)), &offers);

        assert!(outcome.shortage);
        assert_eq!(outcome.clearing_price, MoneyPerEnergy(dec!(45)));
        assert_eq!(outcome.cleared_quantity, Capacity(dec!(900)));
        assert_eq!(outcome.allocations.len(), 2);
        assert!(
            outcome
                .allocations
                .iter()
                .zip(&offers)
                .all(|(a, o)| a.quantity == o.quantity)
        );
    }

    #[test]
    fn test_empty_book() {
        let outcome = clear(Capacity(dec!(100)), &[]);
        assert!(outcome.shortage);
        assert_eq!(outcome.clearing_price, MoneyPerEnergy::ZERO);
        assert_eq!(outcome.cleared_quantity, Capacity::ZERO);
        assert_eq!(outcome.marginal_plant, None);
    }

    #[test]
    fn test_exact_supply_is_not_a_shortage() {
        let offers = [offer("A", 600, 30), offer("B", 400, 40)];
        let outcome = clear(Capacity(dec!(1000)), &offers);
        assert!(!outcome.shortage);
        assert_eq!(outcome.cleared_quantity, Capacity(dec!(1000)));
        assert_eq!(outcome.clearing_price, MoneyPerEnergy(dec!(40)));
        assert_eq!(outcome.marginal_plant, Some("B".into()));
    }

    #[test]
    fn test_price_tie_broken_by_marginal_cost_then_id() {
        // Same price: the lower-cost offer dispatches first
        let offers = [
            offer_with_cost("B", 100, 30, 25),
            offer_with_cost("A", 100, 30, 20),
        ];
        let outcome = clear(Capacity(dec!(150)), &offers);
        assert_eq!(outcome.allocations[0].plant_id, "A".into());
        assert_eq!(outcome.allocations[0].quantity, Capacity(dec!(100)));
        assert_eq!(outcome.marginal_plant, Some("B".into()));

        // Same price and cost: plant ID decides
        let offers = [
            offer_with_cost("B", 100, 30, 20),
            offer_with_cost("A", 100, 30, 20),
        ];
        let outcome = clear(Capacity(dec!(150)), &offers);
        assert_eq!(outcome.allocations[0].plant_id, "A".into());
    }

    #[test]
    fn test_zero_quantity_offers_are_ignored() {
        let offers = [offer("A", 0, 10), offer("B", 200, 30)];
        let outcome = clear(Capacity(dec!(100)), &offers);
        assert_eq!(outcome.clearing_price, MoneyPerEnergy(dec!(30)));
        assert_eq!(outcome.allocations.len(), 1);
        assert_eq!(outcome.marginal_plant, Some("B".into()));
    }

    #[test]
    fn test_clearing_is_deterministic() {
        let offers = [
            offer("C", 300, 50),
            offer("A", 500, 30),
            offer("B", 400, 40),
        ];
        let first = clear(Capacity(dec!(1000)), &offers);
        let second = clear(Capacity(dec!(1000)), &offers);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cleared_quantity_bounds() {
        for demand in [0i64, 100, 900, 950, 10000] {
            let offers = [offer("A", 500, 30), offer("B", 450, 40)];
            let demand = Capacity(rust_decimal::Decimal::from(demand));
            let outcome = clear(demand, &offers);
            assert!(outcome.cleared_quantity <= demand);
            assert!(outcome.cleared_quantity <= Capacity(dec!(950)));
            let allocated: Capacity = outcome.allocations.iter().map(|a| a.quantity).sum();
            assert_eq!(allocated, outcome.cleared_quantity);
        }
    }
}
