//! Loading a scenario from a directory of input files.
//!
//! A scenario directory contains:
//!
//! * `scenario.toml` - the session, demand forecast and fuel prices
//! * `utilities.csv` - the participating utilities and their ledgers
//! * `plants.csv` - the pre-existing fleet (capital treated as sunk)
//! * `templates.csv` - optional override of the built-in template catalog
use crate::demand::DemandForecast;
use crate::fuel::FuelPriceTable;
use crate::orchestrator::Market;
use crate::plant::{Plant, PlantID};
use crate::session::Session;
use crate::technology::{FuelType, PlantTemplate, Technology, default_templates};
use crate::units::{Capacity, Dimensionless, MoneyPerMmbtu, MoneyPerTon};
use crate::utility::Utility;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// The scenario definition file
pub const SCENARIO_FILE_NAME: &str = "scenario.toml";
/// The utilities roster file
pub const UTILITIES_FILE_NAME: &str = "utilities.csv";
/// The pre-existing fleet file
pub const PLANTS_FILE_NAME: &str = "plants.csv";
/// The optional template catalog override
pub const TEMPLATES_FILE_NAME: &str = "templates.csv";

/// Read a series of type `T`s from a CSV file into a `Vec<T>`
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not open {}", file_path.display()))?;
    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let row: T =
            result.with_context(|| format!("Error reading {}", file_path.display()))?;
        vec.push(row);
    }
    ensure!(!vec.is_empty(), "{} cannot be empty", file_path.display());
    Ok(vec)
}

/// Parse a TOML file into a type `T`
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Error parsing {}", file_path.display()))
}

/// The `[session]` section of `scenario.toml`
#[derive(Debug, Deserialize)]
struct SessionSection {
    id: String,
    name: String,
    operator: String,
    start_year: u32,
    end_year: u32,
    carbon_price_per_ton: MoneyPerTon,
}

/// The `[fuel_prices]` section of `scenario.toml`
#[derive(Debug, Deserialize)]
struct FuelPricesSection {
    /// The year the base prices apply to; defaults to the start year
    base_year: Option<u32>,
    /// Annual escalation beyond tabulated prices
    escalation: Dimensionless,
    /// Base prices per fuel, in $/MMBtu
    base: IndexMap<FuelType, MoneyPerMmbtu>,
}

/// The layout of `scenario.toml`
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    session: SessionSection,
    demand: DemandForecast,
    fuel_prices: FuelPricesSection,
}

/// One row of `plants.csv`
#[derive(Debug, Deserialize)]
struct PlantRow {
    id: PlantID,
    utility_id: crate::utility::UtilityID,
    name: String,
    technology: Technology,
    capacity_mw: Capacity,
    construction_start_year: u32,
    commissioning_year: u32,
    retirement_year: u32,
}

/// Load a complete scenario into a new [`Market`] in `SETUP`.
///
/// Pre-existing plants are adopted without financing: their capital is sunk
/// and the utilities' opening ledgers already reflect it.
pub fn load_scenario(scenario_dir: &Path) -> Result<Market> {
    let scenario: ScenarioFile = read_toml(&scenario_dir.join(SCENARIO_FILE_NAME))?;

    let session = Session::new(
        scenario.session.id.as_str().into(),
        scenario.session.name,
        scenario.session.operator,
        scenario.session.start_year,
        scenario.session.end_year,
        scenario.session.carbon_price_per_ton,
    )?;

    let templates = load_templates(scenario_dir)?;
    let fuel_prices = FuelPriceTable::new(
        scenario.fuel_prices.base_year.unwrap_or(session.start_year),
        scenario.fuel_prices.base,
        scenario.fuel_prices.escalation,
    );
    let mut market = Market::new(session, templates, scenario.demand, fuel_prices)?;

    let utilities: Vec<Utility> = read_vec_from_csv(&scenario_dir.join(UTILITIES_FILE_NAME))?;
    for utility in utilities {
        market.add_utility(utility)?;
    }

    let rows: Vec<PlantRow> = read_vec_from_csv(&scenario_dir.join(PLANTS_FILE_NAME))?;
    for row in rows {
        let template = market
            .templates()
            .get(&row.technology)
            .with_context(|| format!("No template for technology {}", row.technology))?
            .clone();
        let plant = Plant::from_template(
            row.id,
            row.utility_id,
            row.name,
            &template,
            row.capacity_mw,
            row.construction_start_year,
            row.commissioning_year,
            row.retirement_year,
        )?;
        market.adopt_plant(plant)?;
    }

    Ok(market)
}

/// The template catalog for a scenario: `templates.csv` when present,
/// otherwise the built-in defaults.
fn load_templates(scenario_dir: &Path) -> Result<IndexMap<Technology, PlantTemplate>> {
    let file_path = scenario_dir.join(TEMPLATES_FILE_NAME);
    if !file_path.is_file() {
        return Ok(default_templates());
    }
    let templates: Vec<PlantTemplate> = read_vec_from_csv(&file_path)?;
    for template in &templates {
        template.validate()?;
    }
    Ok(templates.into_iter().map(|t| (t.technology, t)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GamePhase;
    use crate::units::Money;
    use rust_decimal_macros::dec;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const SCENARIO_TOML: &str = r#"
        [session]
        id = "demo"
        name = "Demo Session"
        operator = "operator"
        start_year = 2025
        end_year = 2035
        carbon_price_per_ton = 50

        [demand]
        off_peak_mw = 1100
        shoulder_mw = 1400
        peak_mw = 1800
        growth_rate = 0.02

        [fuel_prices]
        escalation = 0.02

        [fuel_prices.base]
        coal = 2.40
        natural_gas = 4.50
        uranium = 0.70
    "#;

    const UTILITIES_CSV: &str = "\
id,name,cash,equity,debt
u1,Metro Power,500000000,400000000,100000000
u2,Coastal Energy,450000000,350000000,150000000
";

    const PLANTS_CSV: &str = "\
id,utility_id,name,technology,capacity_mw,construction_start_year,commissioning_year,retirement_year
gas1,u1,Riverside CC,natural_gas_cc,400,2021,2024,2050
wind1,u2,Ridge Wind,wind_onshore,150,2023,2025,2050
";

    fn write_scenario(dir: &Path) {
        for (name, contents) in [
            (SCENARIO_FILE_NAME, SCENARIO_TOML),
            (UTILITIES_FILE_NAME, UTILITIES_CSV),
            (PLANTS_FILE_NAME, PLANTS_CSV),
        ] {
            File::create(dir.join(name))
                .unwrap()
                .write_all(contents.as_bytes())
                .unwrap();
        }
    }

    #[test]
    fn test_load_scenario() {
        let dir = tempdir().unwrap();
        write_scenario(dir.path());

        let market = load_scenario(dir.path()).unwrap();
        assert_eq!(market.session().phase, GamePhase::Setup);
        assert_eq!(market.session().current_year, 2025);
        assert_eq!(market.utilities().len(), 2);
        assert_eq!(market.plants().len(), 2);

        let gas1 = market.plants().get(&"gas1".into()).unwrap();
        assert_eq!(gas1.capacity, Capacity(dec!(400)));
        assert_eq!(gas1.technology, Technology::NaturalGasCc);

        // Adoption is not financed: the ledger is exactly as the file says
        let u1 = market.utility(&"u1".into()).unwrap();
        assert_eq!(u1.cash, Money(dec!(500000000)));
        assert_eq!(u1.debt, Money(dec!(100000000)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let err = load_scenario(dir.path()).unwrap_err();
        assert!(err.to_string().contains(SCENARIO_FILE_NAME));
    }

    #[test]
    fn test_empty_roster_rejected() {
        let dir = tempdir().unwrap();
        write_scenario(dir.path());
        File::create(dir.path().join(UTILITIES_FILE_NAME))
            .unwrap()
            .write_all(b"id,name,cash,equity,debt\n")
            .unwrap();
        assert!(load_scenario(dir.path()).is_err());
    }

    #[test]
    fn test_bad_timeline_rejected() {
        let dir = tempdir().unwrap();
        write_scenario(dir.path());
        // Gas CC takes 3 years to build; commissioning in 2022 is impossible
        File::create(dir.path().join(PLANTS_FILE_NAME))
            .unwrap()
            .write_all(
                b"id,utility_id,name,technology,capacity_mw,\
                  construction_start_year,commissioning_year,retirement_year\n\
                  gas1,u1,Riverside CC,natural_gas_cc,400,2021,2022,2050\n",
            )
            .unwrap();
        assert!(load_scenario(dir.path()).is_err());
    }
}
