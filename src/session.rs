//! Game sessions and the phase machine they move through.
use crate::error::{MarketError, MarketResult};
use crate::id::define_id_type;
use crate::units::MoneyPerTon;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

define_id_type! {SessionID}

/// The phase a game session is in.
///
/// Phase-control operations move a session around the cycle
/// `YEAR_PLANNING -> BIDDING_OPEN -> MARKET_CLEARING -> YEAR_COMPLETE`,
/// entered from `SETUP` and left for `GAME_COMPLETE` after the final year.
/// Any operation invoked from the wrong phase fails with
/// [`MarketError::InvalidTransition`] and changes nothing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum GamePhase {
    /// Session created; roster and scenario may still change
    #[string = "setup"]
    Setup,
    /// A year has begun; plants advance and investments are placed
    #[string = "year_planning"]
    YearPlanning,
    /// The bidding window is open for the current year
    #[string = "bidding_open"]
    BiddingOpen,
    /// Bids are frozen and the markets have been cleared
    #[string = "market_clearing"]
    MarketClearing,
    /// The year is settled; the next planning phase may begin
    #[string = "year_complete"]
    YearComplete,
    /// The final year is settled; the session is read-only
    #[string = "game_complete"]
    GameComplete,
}

/// A multi-year game session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// A unique identifier for the session
    pub id: SessionID,
    /// A human-readable name
    pub name: String,
    /// Who runs the session's phase controls
    pub operator: String,
    /// The first simulated year
    pub start_year: u32,
    /// The last simulated year (inclusive)
    pub end_year: u32,
    /// The year currently being played
    pub current_year: u32,
    /// The carbon price applied to all emissions, constant over the session
    pub carbon_price_per_ton: MoneyPerTon,
    /// The session's current phase
    pub phase: GamePhase,
}

impl Session {
    /// Create a session in `SETUP`, positioned at the start year
    pub fn new(
        id: SessionID,
        name: String,
        operator: String,
        start_year: u32,
        end_year: u32,
        carbon_price_per_ton: MoneyPerTon,
    ) -> MarketResult<Self> {
        if end_year < start_year {
            return Err(MarketError::validation(format!(
                "end year {end_year} must not precede start year {start_year}"
            )));
        }
        if carbon_price_per_ton < MoneyPerTon::ZERO {
            return Err(MarketError::validation(format!(
                "carbon price {carbon_price_per_ton} must not be negative"
            )));
        }
        Ok(Self {
            id,
            name,
            operator,
            start_year,
            end_year,
            current_year: start_year,
            carbon_price_per_ton,
            phase: GamePhase::Setup,
        })
    }

    /// Fail with `InvalidTransition` unless the session is in an allowed phase
    pub fn require_phase(
        &self,
        operation: &'static str,
        allowed: &[GamePhase],
    ) -> MarketResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(MarketError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    /// Whether the current year is the session's last
    pub fn is_final_year(&self) -> bool {
        self.current_year >= self.end_year
    }

    /// The years this session spans, in order
    pub fn years(&self) -> impl Iterator<Item = u32> {
        self.start_year..=self.end_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session() -> Session {
        Session::new(
            "s1".into(),
            "Test".into(),
            "operator".into(),
            2025,
            2035,
            MoneyPerTon(dec!(50)),
        )
        .unwrap()
    }

    #[test]
    fn test_new_session_starts_in_setup() {
        let session = session();
        assert_eq!(session.phase, GamePhase::Setup);
        assert_eq!(session.current_year, 2025);
        assert!(!session.is_final_year());
    }

    #[test]
    fn test_invalid_year_range_rejected() {
        let result = Session::new(
            "s1".into(),
            "Test".into(),
            "operator".into(),
            2035,
            2025,
            MoneyPerTon(dec!(50)),
        );
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[test]
    fn test_require_phase() {
        let mut session = session();
        assert!(
            session
                .require_phase("open_bidding", &[GamePhase::YearPlanning])
                .is_err()
        );
        session.phase = GamePhase::YearPlanning;
        assert!(
            session
                .require_phase("open_bidding", &[GamePhase::YearPlanning])
                .is_ok()
        );
    }

    #[test]
    fn test_phase_labels_round_trip() {
        let toml = "phase = \"bidding_open\"";
        #[derive(serde::Deserialize)]
        struct Wrapper {
            phase: GamePhase,
        }
        let wrapper: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(wrapper.phase, GamePhase::BiddingOpen);
    }
}
