//! Writing simulation results to disk.
use crate::clearing::ClearingRecord;
use crate::orchestrator::Settlement;
use crate::period::LoadPeriod;
use crate::plant::{Plant, PlantID, PlantStatus};
use crate::technology::Technology;
use crate::units::{Capacity, Money, MoneyPerEnergy};
use crate::utility::UtilityID;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which scenario-specific output folders are created
const OUTPUT_DIRECTORY_ROOT: &str = "gridbid_results";

/// The output file name for clearing results
const CLEARING_RESULTS_FILE_NAME: &str = "clearing_results.csv";

/// The output file name for per-plant allocations
const ALLOCATIONS_FILE_NAME: &str = "allocations.csv";

/// The output file name for settlements
const SETTLEMENTS_FILE_NAME: &str = "settlements.csv";

/// The output file name for plant statuses
const PLANT_STATUS_FILE_NAME: &str = "plant_status.csv";

/// Get the output directory for the scenario at `scenario_dir`
pub fn get_output_dir(scenario_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user passed "."
    let scenario_dir = scenario_dir
        .canonicalize()
        .context("Could not resolve path to scenario")?;
    let scenario_name = scenario_dir
        .file_name()
        .context("Scenario cannot be in the root folder")?
        .to_str()
        .context("Invalid chars in scenario dir name")?;
    Ok([OUTPUT_DIRECTORY_ROOT, scenario_name].iter().collect())
}

/// Create the output directory, including parents, if it does not exist
pub fn create_output_directory(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(output_dir)?;
    Ok(())
}

/// Represents a row in the clearing results CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ClearingRow {
    year: u32,
    period: LoadPeriod,
    clearing_price: MoneyPerEnergy,
    cleared_quantity: Capacity,
    marginal_plant: Option<PlantID>,
    shortage: bool,
}

/// Represents a row in the allocations CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AllocationRow {
    year: u32,
    period: LoadPeriod,
    plant_id: PlantID,
    quantity: Capacity,
}

/// Represents a row in the settlements CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SettlementRow {
    year: u32,
    utility_id: UtilityID,
    revenue: Money,
    fixed_cost: Money,
    variable_cost: Money,
    profit: Money,
}

impl SettlementRow {
    fn new(settlement: &Settlement) -> Self {
        Self {
            year: settlement.year,
            utility_id: settlement.utility_id.clone(),
            revenue: settlement.revenue,
            fixed_cost: settlement.fixed_cost,
            variable_cost: settlement.variable_cost,
            profit: settlement.profit,
        }
    }
}

/// Represents a row in the plant status CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PlantStatusRow {
    year: u32,
    plant_id: PlantID,
    utility_id: UtilityID,
    technology: Technology,
    capacity_mw: Capacity,
    status: PlantStatus,
}

/// An object for writing simulation results to CSV files
pub struct DataWriter {
    clearing_writer: csv::Writer<File>,
    allocations_writer: csv::Writer<File>,
    settlements_writer: csv::Writer<File>,
    plant_status_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files in `output_path` to write results to
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };
        Ok(Self {
            clearing_writer: new_writer(CLEARING_RESULTS_FILE_NAME)?,
            allocations_writer: new_writer(ALLOCATIONS_FILE_NAME)?,
            settlements_writer: new_writer(SETTLEMENTS_FILE_NAME)?,
            plant_status_writer: new_writer(PLANT_STATUS_FILE_NAME)?,
        })
    }

    /// Write one year's clearing records and their allocations
    pub fn write_clearing_records<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: Iterator<Item = &'a ClearingRecord>,
    {
        for record in records {
            self.clearing_writer.serialize(ClearingRow {
                year: record.year,
                period: record.period,
                clearing_price: record.outcome.clearing_price,
                cleared_quantity: record.outcome.cleared_quantity,
                marginal_plant: record.outcome.marginal_plant.clone(),
                shortage: record.outcome.shortage,
            })?;
            for allocation in &record.outcome.allocations {
                self.allocations_writer.serialize(AllocationRow {
                    year: record.year,
                    period: record.period,
                    plant_id: allocation.plant_id.clone(),
                    quantity: allocation.quantity,
                })?;
            }
        }
        Ok(())
    }

    /// Write one year's settlements
    pub fn write_settlements<'a, I>(&mut self, settlements: I) -> Result<()>
    where
        I: Iterator<Item = &'a Settlement>,
    {
        for settlement in settlements {
            self.settlements_writer
                .serialize(SettlementRow::new(settlement))?;
        }
        Ok(())
    }

    /// Write every plant's status as of `year`
    pub fn write_plant_statuses<'a, I>(&mut self, year: u32, plants: I) -> Result<()>
    where
        I: Iterator<Item = &'a Plant>,
    {
        for plant in plants {
            self.plant_status_writer.serialize(PlantStatusRow {
                year,
                plant_id: plant.id.clone(),
                utility_id: plant.utility_id.clone(),
                technology: plant.technology,
                capacity_mw: plant.capacity,
                status: plant.status,
            })?;
        }
        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.clearing_writer.flush()?;
        self.allocations_writer.flush()?;
        self.settlements_writer.flush()?;
        self.plant_status_writer.flush()?;
        Ok(())
    }
}
