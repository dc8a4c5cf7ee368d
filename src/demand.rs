//! The demand forecast: a base MW value per load period, compounded by a
//! deterministic annual growth rate from the session's start year.
use crate::period::LoadPeriod;
use crate::units::{Capacity, Dimensionless};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

/// Deterministic per-period demand for every year of a session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DemandForecast {
    /// Base off-peak demand in the start year
    pub off_peak_mw: Capacity,
    /// Base shoulder demand in the start year
    pub shoulder_mw: Capacity,
    /// Base peak demand in the start year
    pub peak_mw: Capacity,
    /// Annual demand growth rate (e.g. 0.02 for 2%/year)
    pub growth_rate: Dimensionless,
    /// The year the base values apply to
    #[serde(default)]
    pub base_year: u32,
}

impl DemandForecast {
    /// Check the forecast's values are usable
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.off_peak_mw > Capacity::ZERO
                && self.shoulder_mw > Capacity::ZERO
                && self.peak_mw > Capacity::ZERO,
            "Base demand must be positive for every period"
        );
        ensure!(
            self.growth_rate > Dimensionless::ZERO - Dimensionless::ONE,
            "Demand growth rate must be greater than -100%"
        );
        Ok(())
    }

    /// The forecast demand for one period of one year
    pub fn demand(&self, year: u32, period: LoadPeriod) -> Capacity {
        let base = match period {
            LoadPeriod::OffPeak => self.off_peak_mw,
            LoadPeriod::Shoulder => self.shoulder_mw,
            LoadPeriod::Peak => self.peak_mw,
        };
        let offset = i64::from(year) - i64::from(self.base_year);
        let growth = (Dimensionless::ONE + self.growth_rate).powi(offset);
        base * growth
    }

    /// The forecast demand for every period of one year, in clearing order
    pub fn profile(&self, year: u32) -> IndexMap<LoadPeriod, Capacity> {
        LoadPeriod::all()
            .map(|period| (period, self.demand(year, period)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn forecast() -> DemandForecast {
        DemandForecast {
            off_peak_mw: Capacity(dec!(1000)),
            shoulder_mw: Capacity(dec!(1500)),
            peak_mw: Capacity(dec!(2000)),
            growth_rate: Dimensionless(dec!(0.02)),
            base_year: 2025,
        }
    }

    #[test]
    fn test_base_year_demand_is_the_base() {
        let forecast = forecast();
        assert_eq!(
            forecast.demand(2025, LoadPeriod::Peak),
            Capacity(dec!(2000))
        );
    }

    #[test]
    fn test_growth_compounds_exactly() {
        let forecast = forecast();
        assert_eq!(
            forecast.demand(2027, LoadPeriod::OffPeak),
            Capacity(dec!(1040.4))
        );
    }

    #[test]
    fn test_profile_covers_all_periods_in_order() {
        let profile = forecast().profile(2025);
        assert_eq!(
            profile.keys().copied().collect::<Vec<_>>(),
            vec![LoadPeriod::OffPeak, LoadPeriod::Shoulder, LoadPeriod::Peak]
        );
    }

    #[test]
    fn test_validate_rejects_zero_demand() {
        let mut forecast = forecast();
        forecast.peak_mw = Capacity::ZERO;
        assert!(forecast.validate().is_err());
    }
}
