//! Running a whole session unattended.
//!
//! The autopilot plays every year of a scenario with cost-based bidding:
//! each operating plant offers its expected output (capacity times capacity
//! factor) at its marginal cost, in every period. This gives a competitive
//! baseline run whose outputs show how the market evolves as plants come
//! online and retire.
use crate::orchestrator::{BidSubmission, Market, PeriodOffer};
use crate::output::DataWriter;
use crate::period::LoadPeriod;
use anyhow::Result;
use log::info;
use std::path::Path;

/// Play every year of the session, writing results to `output_path`.
///
/// Returns the completed market for inspection.
pub fn run(mut market: Market, output_path: &Path) -> Result<Market> {
    let mut writer = DataWriter::create(output_path)?;
    info!(
        "Starting simulation of {} ({}-{})",
        market.session().name,
        market.session().start_year,
        market.session().end_year
    );

    loop {
        let year = market.session().current_year;
        market.start_year_planning(year)?;
        let notice = market.open_bidding(year)?;

        // Cost-based offers: expected output at marginal cost
        let mut submissions = Vec::with_capacity(notice.eligible_plants.len());
        for plant_id in &notice.eligible_plants {
            let plant = market.plants().get(plant_id)?;
            let utility_id = plant.utility_id.clone();
            let quantity = plant.capacity * plant.capacity_factor;
            let price = market.plant_economics(plant_id, notice.year)?.marginal_cost;
            submissions.push((
                utility_id,
                BidSubmission {
                    plant_id: plant_id.clone(),
                    year: notice.year,
                    offers: LoadPeriod::all()
                        .map(|period| PeriodOffer {
                            period,
                            quantity,
                            price,
                        })
                        .collect(),
                },
            ));
        }
        for (utility_id, submission) in submissions {
            market.submit_bid(&utility_id, submission)?;
        }

        let records = market.clear_markets(year)?;
        writer.write_clearing_records(records.iter())?;

        let review = market.complete_year(year)?;
        writer.write_settlements(review.settlements.iter())?;
        writer.write_plant_statuses(review.year, market.plants().iter())?;

        if review.game_complete {
            break;
        }
    }

    writer.flush()?;
    info!("Simulation complete");
    Ok(market)
}
