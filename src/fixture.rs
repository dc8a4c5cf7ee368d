//! Shared `rstest` fixtures for unit tests.
use crate::demand::DemandForecast;
use crate::fuel::FuelPriceTable;
use crate::orchestrator::Market;
use crate::plant::Plant;
use crate::session::Session;
use crate::technology::{FuelType, PlantTemplate, Technology, default_templates};
use crate::units::{Capacity, Dimensionless, MoneyPerMmbtu, MoneyPerTon};
use crate::utility::Utility;
use rstest::fixture;
use rust_decimal_macros::dec;

/// The gas combined cycle template from the built-in catalog
#[fixture]
pub fn template() -> PlantTemplate {
    default_templates()[&Technology::NaturalGasCc].clone()
}

/// A 400 MW gas combined cycle plant, commissioned 2023
#[fixture]
pub fn plant(template: PlantTemplate) -> Plant {
    Plant::from_template(
        "gas1".into(),
        "u1".into(),
        "Riverside CC".into(),
        &template,
        Capacity(dec!(400)),
        2020,
        2023,
        2050,
    )
    .unwrap()
}

/// Gas and coal prices tabulated for 2025, escalating 2%/year
#[fixture]
pub fn fuel_prices() -> FuelPriceTable {
    FuelPriceTable::new(
        2025,
        [
            (FuelType::NaturalGas, MoneyPerMmbtu(dec!(4.50))),
            (FuelType::Coal, MoneyPerMmbtu(dec!(2.40))),
        ]
        .into_iter()
        .collect(),
        Dimensionless(dec!(0.02)),
    )
}

/// A demand forecast of 1000/1500/2000 MW growing 2%/year from 2025
#[fixture]
pub fn demand_forecast() -> DemandForecast {
    DemandForecast {
        off_peak_mw: Capacity(dec!(1000)),
        shoulder_mw: Capacity(dec!(1500)),
        peak_mw: Capacity(dec!(2000)),
        growth_rate: Dimensionless(dec!(0.02)),
        base_year: 2025,
    }
}

/// A three-year session (2025-2027) at a $50/ton carbon price
#[fixture]
pub fn session() -> Session {
    Session::new(
        "s1".into(),
        "Test Session".into(),
        "operator".into(),
        2025,
        2027,
        MoneyPerTon(dec!(50)),
    )
    .unwrap()
}

/// A market in `SETUP` with two utilities and two plants.
///
/// `gas1` (u1, 400 MW gas CC) will be operating from 2025; `wind1`
/// (u2, 150 MW onshore wind) is under construction until 2027.
#[fixture]
pub fn market(
    session: Session,
    demand_forecast: DemandForecast,
    fuel_prices: FuelPriceTable,
) -> Market {
    let templates = default_templates();
    let mut market = Market::new(session, templates.clone(), demand_forecast, fuel_prices)
        .unwrap();

    for id in ["u1", "u2"] {
        market
            .add_utility(Utility {
                id: id.into(),
                name: format!("Utility {id}"),
                cash: crate::units::Money(dec!(500000000)),
                equity: crate::units::Money(dec!(400000000)),
                debt: crate::units::Money(dec!(100000000)),
            })
            .unwrap();
    }

    market
        .adopt_plant(
            Plant::from_template(
                "gas1".into(),
                "u1".into(),
                "Riverside CC".into(),
                &templates[&Technology::NaturalGasCc],
                Capacity(dec!(400)),
                2021,
                2024,
                2050,
            )
            .unwrap(),
        )
        .unwrap();
    market
        .adopt_plant(
            Plant::from_template(
                "wind1".into(),
                "u2".into(),
                "Ridge Wind".into(),
                &templates[&Technology::WindOnshore],
                Capacity(dec!(150)),
                2024,
                2027,
                2052,
            )
            .unwrap(),
        )
        .unwrap();

    market
}
