//! Generation technologies and the plant template catalog.
//!
//! A [`PlantTemplate`] is immutable archetype data: the physical and cost
//! attributes a new plant of that technology is stamped from. The built-in
//! catalog covers ten technologies; a scenario may override it with its own
//! `templates.csv`.
use crate::units::{
    Capacity, Dimensionless, EmissionRate, HeatRate, Money, MoneyPerEnergy, MoneyPerKilowatt,
    MoneyPerKilowattYear,
};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::EnumIter;

/// A generation technology archetype
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
#[allow(missing_docs)]
pub enum Technology {
    #[string = "coal"]
    Coal,
    #[string = "natural_gas_cc"]
    NaturalGasCc,
    #[string = "natural_gas_ct"]
    NaturalGasCt,
    #[string = "nuclear"]
    Nuclear,
    #[string = "solar"]
    Solar,
    #[string = "wind_onshore"]
    WindOnshore,
    #[string = "wind_offshore"]
    WindOffshore,
    #[string = "battery"]
    Battery,
    #[string = "hydro"]
    Hydro,
    #[string = "biomass"]
    Biomass,
}

impl Technology {
    /// Whether the technology counts towards the renewable share of dispatch
    pub fn is_renewable(&self) -> bool {
        matches!(
            self,
            Technology::Solar
                | Technology::WindOnshore
                | Technology::WindOffshore
                | Technology::Hydro
        )
    }
}

/// A fuel consumed by thermal plants, priced per MMBtu
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
#[allow(missing_docs)]
pub enum FuelType {
    #[string = "coal"]
    Coal,
    #[string = "natural_gas"]
    NaturalGas,
    #[string = "uranium"]
    Uranium,
    #[string = "biomass"]
    Biomass,
}

/// Immutable catalog data for one generation technology
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlantTemplate {
    /// The technology this template describes
    pub technology: Technology,
    /// A human-readable description (e.g. "Supercritical coal")
    pub description: String,
    /// Overnight capital cost per kW of capacity
    pub overnight_cost_per_kw: MoneyPerKilowatt,
    /// Years from construction start to commissioning
    pub construction_time_years: u32,
    /// Economic life in years from commissioning
    pub economic_life_years: u32,
    /// Expected average output as a fraction of nameplate capacity
    pub capacity_factor_base: Dimensionless,
    /// Fuel energy input per unit output (thermal plants only)
    pub heat_rate: Option<HeatRate>,
    /// The fuel consumed (thermal plants only; set together with heat rate)
    pub fuel_type: Option<FuelType>,
    /// Annual fixed O&M cost per kW of capacity
    pub fixed_om_per_kw_year: MoneyPerKilowattYear,
    /// Variable O&M cost per MWh generated
    pub variable_om_per_mwh: MoneyPerEnergy,
    /// CO2 emitted per MWh generated
    pub co2_tons_per_mwh: EmissionRate,
}

impl PlantTemplate {
    /// Total capital cost for a plant of the given capacity
    pub fn capital_cost(&self, capacity: Capacity) -> Money {
        capacity * self.overnight_cost_per_kw
    }

    /// Annual fixed O&M cost for a plant of the given capacity
    pub fn fixed_om_annual(&self, capacity: Capacity) -> Money {
        capacity * self.fixed_om_per_kw_year
    }

    /// Check internal consistency of the template
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.heat_rate.is_some() == self.fuel_type.is_some(),
            "Template for {}: heat rate and fuel type must be set together",
            self.technology
        );
        ensure!(
            self.capacity_factor_base > Dimensionless::ZERO
                && self.capacity_factor_base <= Dimensionless::ONE,
            "Template for {}: capacity factor must be in (0, 1]",
            self.technology
        );
        ensure!(
            self.construction_time_years > 0,
            "Template for {}: construction time must be at least one year",
            self.technology
        );
        Ok(())
    }
}

/// A map of [`PlantTemplate`]s, keyed by technology
pub type TemplateMap = IndexMap<Technology, PlantTemplate>;

/// The built-in template catalog.
///
/// Figures are representative 2025 US dollar values; a scenario can supply
/// its own `templates.csv` to override them.
pub fn default_templates() -> TemplateMap {
    let template = |technology,
                    description: &str,
                    overnight,
                    construction,
                    life,
                    capacity_factor,
                    heat_rate: Option<HeatRate>,
                    fuel_type,
                    fixed_om,
                    variable_om,
                    co2| PlantTemplate {
        technology,
        description: description.into(),
        overnight_cost_per_kw: MoneyPerKilowatt(overnight),
        construction_time_years: construction,
        economic_life_years: life,
        capacity_factor_base: Dimensionless(capacity_factor),
        heat_rate,
        fuel_type,
        fixed_om_per_kw_year: MoneyPerKilowattYear(fixed_om),
        variable_om_per_mwh: MoneyPerEnergy(variable_om),
        co2_tons_per_mwh: EmissionRate(co2),
    };

    [
        template(
            Technology::Coal,
            "Supercritical pulverised coal",
            dec!(3500),
            4,
            40,
            dec!(0.85),
            Some(HeatRate(dec!(9500))),
            Some(FuelType::Coal),
            dec!(40),
            dec!(4.5),
            dec!(0.95),
        ),
        template(
            Technology::NaturalGasCc,
            "Natural gas combined cycle",
            dec!(1100),
            3,
            30,
            dec!(0.87),
            Some(HeatRate(dec!(6400))),
            Some(FuelType::NaturalGas),
            dec!(14),
            dec!(2.0),
            dec!(0.37),
        ),
        template(
            Technology::NaturalGasCt,
            "Natural gas combustion turbine",
            dec!(700),
            2,
            30,
            dec!(0.30),
            Some(HeatRate(dec!(9800))),
            Some(FuelType::NaturalGas),
            dec!(7),
            dec!(4.5),
            dec!(0.55),
        ),
        template(
            Technology::Nuclear,
            "Light water reactor",
            dec!(6000),
            7,
            60,
            dec!(0.92),
            Some(HeatRate(dec!(10450))),
            Some(FuelType::Uranium),
            dec!(120),
            dec!(2.3),
            dec!(0),
        ),
        template(
            Technology::Solar,
            "Utility-scale photovoltaic",
            dec!(1100),
            1,
            25,
            dec!(0.25),
            None,
            None,
            dec!(15),
            dec!(0),
            dec!(0),
        ),
        template(
            Technology::WindOnshore,
            "Onshore wind farm",
            dec!(1300),
            2,
            25,
            dec!(0.35),
            None,
            None,
            dec!(26),
            dec!(0),
            dec!(0),
        ),
        template(
            Technology::WindOffshore,
            "Offshore wind farm",
            dec!(3000),
            3,
            25,
            dec!(0.45),
            None,
            None,
            dec!(80),
            dec!(0),
            dec!(0),
        ),
        template(
            Technology::Battery,
            "Grid-scale battery storage",
            dec!(1200),
            1,
            15,
            dec!(0.15),
            None,
            None,
            dec!(25),
            dec!(1.0),
            dec!(0),
        ),
        template(
            Technology::Hydro,
            "Conventional hydroelectric",
            dec!(2500),
            5,
            80,
            dec!(0.45),
            None,
            None,
            dec!(30),
            dec!(1.0),
            dec!(0),
        ),
        template(
            Technology::Biomass,
            "Biomass steam turbine",
            dec!(4000),
            3,
            30,
            dec!(0.60),
            Some(HeatRate(dec!(13500))),
            Some(FuelType::Biomass),
            dec!(125),
            dec!(5.0),
            dec!(0),
        ),
    ]
    .into_iter()
    .map(|t| (t.technology, t))
    .collect()
}
