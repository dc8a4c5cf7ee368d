//! Common functionality for GridBid, a multi-year wholesale electricity
//! market simulation game.
#![warn(missing_docs)]
pub mod bid;
pub mod cli;
pub mod clearing;
pub mod demand;
pub mod economics;
pub mod error;
pub mod fuel;
pub mod id;
pub mod input;
pub mod investment;
pub mod log;
pub mod orchestrator;
pub mod output;
pub mod period;
pub mod plant;
pub mod report;
pub mod session;
pub mod settings;
pub mod simulation;
pub mod technology;
pub mod units;
pub mod utility;

#[cfg(test)]
mod fixture;

/// The directory where program configuration (e.g. `settings.toml`) lives
pub fn get_gridbid_config_dir() -> std::path::PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("gridbid");
    path
}
