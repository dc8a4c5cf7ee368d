//! Code for working with load periods.
//!
//! The market clears three demand buckets per year rather than hourly:
//! off-peak, shoulder and peak, each covering a fixed number of hours.
use crate::units::Hours;
use rust_decimal_macros::dec;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::EnumIter;

/// One of the three annual demand buckets
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum LoadPeriod {
    /// Low-demand hours (nights, weekends)
    #[string = "off_peak"]
    OffPeak,
    /// Mid-demand hours
    #[string = "shoulder"]
    Shoulder,
    /// High-demand hours
    #[string = "peak"]
    Peak,
}

impl LoadPeriod {
    /// The number of hours this period covers in a year.
    ///
    /// The three periods together cover the full 8760-hour year.
    pub fn hours(&self) -> Hours {
        match self {
            LoadPeriod::OffPeak => Hours(dec!(5000)),
            LoadPeriod::Shoulder => Hours(dec!(2500)),
            LoadPeriod::Peak => Hours(dec!(1260)),
        }
    }

    /// Iterate over all load periods in clearing order.
    pub fn all() -> impl Iterator<Item = LoadPeriod> {
        use strum::IntoEnumIterator;
        Self::iter()
    }
}
