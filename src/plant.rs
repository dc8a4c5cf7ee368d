//! Power plants and their lifecycle.
//!
//! A plant's status is derived from its construction timeline as years
//! advance: `PLANNED` until construction starts, `UNDER_CONSTRUCTION` until
//! commissioning, `OPERATING` until retirement, then `RETIRED` permanently.
//! An operator may additionally take an operating plant into `MAINTENANCE`
//! and back; that excursion is not year-driven.
use crate::error::{MarketError, MarketResult};
use crate::id::define_id_type;
use crate::technology::{FuelType, PlantTemplate, Technology};
use crate::units::{Capacity, Dimensionless, EmissionRate, HeatRate, Money, MoneyPerEnergy};
use crate::utility::UtilityID;
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

define_id_type! {PlantID}

/// The lifecycle status of a plant
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum PlantStatus {
    /// Created but construction has not started
    #[string = "planned"]
    Planned,
    /// Being built; not eligible to bid
    #[string = "under_construction"]
    UnderConstruction,
    /// Commissioned and dispatchable
    #[string = "operating"]
    Operating,
    /// Temporarily withdrawn from the market by the operator
    #[string = "maintenance"]
    Maintenance,
    /// Permanently out of the market; never re-enters
    #[string = "retired"]
    Retired,
}

/// A power plant owned by a utility.
///
/// Cost and performance attributes are stamped from a [`PlantTemplate`] at
/// investment time; plants are never deleted, only retired.
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    /// A unique identifier for the plant
    pub id: PlantID,
    /// The owning utility
    pub utility_id: UtilityID,
    /// A human-readable name
    pub name: String,
    /// The technology this plant was built from
    pub technology: Technology,
    /// Nameplate capacity in MW (always positive)
    pub capacity: Capacity,
    /// The year construction begins
    pub construction_start_year: u32,
    /// The first year the plant can operate
    pub commissioning_year: u32,
    /// The first year the plant is retired
    pub retirement_year: u32,
    /// Current lifecycle status
    pub status: PlantStatus,
    /// Total capital cost at investment
    pub capital_cost: Money,
    /// Annual fixed O&M cost
    pub fixed_om_annual: Money,
    /// Variable O&M cost per MWh
    pub variable_om_per_mwh: MoneyPerEnergy,
    /// Expected average output as a fraction of capacity
    pub capacity_factor: Dimensionless,
    /// Fuel energy input per unit output (thermal plants only)
    pub heat_rate: Option<HeatRate>,
    /// The fuel consumed (set together with heat rate)
    pub fuel_type: Option<FuelType>,
    /// CO2 emitted per MWh generated
    pub co2_tons_per_mwh: EmissionRate,
}

impl Plant {
    /// Create a new plant from a template, validating its timeline.
    ///
    /// New plants start `PLANNED`; their status catches up with the
    /// timeline the next time years advance.
    #[allow(clippy::too_many_arguments)]
    pub fn from_template(
        id: PlantID,
        utility_id: UtilityID,
        name: String,
        template: &PlantTemplate,
        capacity: Capacity,
        construction_start_year: u32,
        commissioning_year: u32,
        retirement_year: u32,
    ) -> MarketResult<Self> {
        if capacity <= Capacity::ZERO {
            return Err(MarketError::validation(format!(
                "plant capacity must be positive, got {capacity} MW"
            )));
        }
        let earliest_commissioning = construction_start_year + template.construction_time_years;
        if commissioning_year < earliest_commissioning {
            return Err(MarketError::validation(format!(
                "{} cannot be commissioned before {earliest_commissioning} \
                 (construction takes {} years)",
                template.technology, template.construction_time_years
            )));
        }
        if retirement_year <= commissioning_year {
            return Err(MarketError::validation(format!(
                "retirement year {retirement_year} must be after \
                 commissioning year {commissioning_year}"
            )));
        }

        Ok(Self {
            id,
            utility_id,
            name,
            technology: template.technology,
            capacity,
            construction_start_year,
            commissioning_year,
            retirement_year,
            status: PlantStatus::Planned,
            capital_cost: template.capital_cost(capacity),
            fixed_om_annual: template.fixed_om_annual(capacity),
            variable_om_per_mwh: template.variable_om_per_mwh,
            capacity_factor: template.capacity_factor_base,
            heat_rate: template.heat_rate,
            fuel_type: template.fuel_type,
            co2_tons_per_mwh: template.co2_tons_per_mwh,
        })
    }

    /// The status this plant's timeline dictates for `year`.
    ///
    /// Retirement is permanent and a manual maintenance excursion survives
    /// year advances while the plant remains within its operating window.
    pub fn scheduled_status(&self, year: u32) -> PlantStatus {
        if self.status == PlantStatus::Retired || year >= self.retirement_year {
            PlantStatus::Retired
        } else if year >= self.commissioning_year {
            if self.status == PlantStatus::Maintenance {
                PlantStatus::Maintenance
            } else {
                PlantStatus::Operating
            }
        } else if year >= self.construction_start_year {
            PlantStatus::UnderConstruction
        } else {
            PlantStatus::Planned
        }
    }

    /// Advance the plant's status to the given year
    pub fn advance_to_year(&mut self, year: u32) {
        self.status = self.scheduled_status(year);
    }

    /// Take an operating plant into maintenance (operator-triggered)
    pub fn begin_maintenance(&mut self) -> MarketResult<()> {
        if self.status != PlantStatus::Operating {
            return Err(MarketError::validation(format!(
                "plant {} is {}, only operating plants can enter maintenance",
                self.id, self.status
            )));
        }
        self.status = PlantStatus::Maintenance;
        Ok(())
    }

    /// Return a plant from maintenance to operation (operator-triggered)
    pub fn end_maintenance(&mut self) -> MarketResult<()> {
        if self.status != PlantStatus::Maintenance {
            return Err(MarketError::validation(format!(
                "plant {} is {}, not in maintenance",
                self.id, self.status
            )));
        }
        self.status = PlantStatus::Operating;
        Ok(())
    }

    /// Whether the plant is dispatchable (eligible to bid)
    pub fn is_operating(&self) -> bool {
        self.status == PlantStatus::Operating
    }
}

/// The pool of all plants in a session, keyed by plant ID
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlantPool {
    plants: IndexMap<PlantID, Plant>,
}

impl PlantPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plant to the pool, rejecting duplicate IDs
    pub fn insert(&mut self, plant: Plant) -> MarketResult<&Plant> {
        let id = plant.id.clone();
        if self.plants.contains_key(&id) {
            return Err(MarketError::validation(format!(
                "duplicate plant ID '{id}'"
            )));
        }
        Ok(self.plants.entry(id).or_insert(plant))
    }

    /// Look up a plant by ID
    pub fn get(&self, id: &PlantID) -> MarketResult<&Plant> {
        self.plants
            .get(id)
            .ok_or_else(|| MarketError::not_found("plant", id))
    }

    /// Look up a plant by ID for mutation
    pub fn get_mut(&mut self, id: &PlantID) -> MarketResult<&mut Plant> {
        self.plants
            .get_mut(id)
            .ok_or_else(|| MarketError::not_found("plant", id))
    }

    /// Iterate over all plants in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Plant> {
        self.plants.values()
    }

    /// Iterate over the plants owned by one utility
    pub fn iter_for_utility<'a>(
        &'a self,
        utility_id: &'a UtilityID,
    ) -> impl Iterator<Item = &'a Plant> {
        self.iter().filter(move |p| &p.utility_id == utility_id)
    }

    /// Advance every plant's status to the given year
    pub fn advance_to_year(&mut self, year: u32) {
        for plant in self.plants.values_mut() {
            plant.advance_to_year(year);
        }
    }

    /// Total capacity of operating plants
    pub fn operating_capacity(&self) -> Capacity {
        self.iter()
            .filter(|p| p.is_operating())
            .map(|p| p.capacity)
            .sum()
    }

    /// The number of plants in the pool
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}
