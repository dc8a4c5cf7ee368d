#![allow(missing_docs)]

//! Dimensioned quantity types and the arithmetic rules between them.
//!
//! Every quantity in the simulation is an exact decimal ([`rust_decimal::Decimal`])
//! wrapped in a unit newtype, so that multi-year accumulation of prices and
//! costs never drifts and market clearing is fully deterministic (decimals
//! have a total order).
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Represents a dimensionless quantity (capacity factors, growth rates, shares).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub Decimal);

impl Dimensionless {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    /// Raise to an integer power (compound growth).
    pub fn powi(self, exp: i64) -> Self {
        use rust_decimal::MathematicalOps;
        Self(self.0.powi(exp))
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl From<Decimal> for Dimensionless {
    fn from(val: Decimal) -> Self {
        Self(val)
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Default,
            serde::Serialize,
            serde::Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        pub struct $name(pub Decimal);

        impl $name {
            /// The zero quantity.
            pub const ZERO: Self = Self(Decimal::ZERO);

            /// Creates a new instance of the unit type from a decimal value.
            pub fn from(val: Decimal) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a decimal.
            pub fn value(self) -> Decimal {
                self.0
            }

            /// Whether the quantity is exactly zero.
            pub fn is_zero(self) -> bool {
                self.0.is_zero()
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|v| v.0).sum())
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::from(self.0 * lhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Capacity); // MW
unit_struct!(Energy); // MWh
unit_struct!(Hours); // hours per year
unit_struct!(Money); // currency, whole units

// Prices and rates
unit_struct!(MoneyPerEnergy); // $/MWh
unit_struct!(MoneyPerMmbtu); // $/MMBtu
unit_struct!(MoneyPerTon); // $/ton CO2
unit_struct!(EmissionRate); // tons CO2/MWh
unit_struct!(HeatRate); // BTU/kWh
unit_struct!(FuelIntensity); // MMBtu/MWh
unit_struct!(MoneyPerKilowatt); // $/kW (overnight capital cost)
unit_struct!(MoneyPerKilowattYear); // $/kW-year (fixed O&M)

// Multiplication rules
impl_mul!(Capacity, Hours, Energy);
impl_mul!(Energy, MoneyPerEnergy, Money);
impl_mul!(EmissionRate, MoneyPerTon, MoneyPerEnergy);
impl_mul!(FuelIntensity, MoneyPerMmbtu, MoneyPerEnergy);

impl HeatRate {
    /// Fuel energy input per MWh of output.
    ///
    /// Heat rate is conventionally quoted in BTU/kWh; dividing by 1000 gives
    /// MMBtu/MWh, the unit fuel prices are quoted against.
    pub fn fuel_intensity(self) -> FuelIntensity {
        FuelIntensity(self.0 / dec!(1000))
    }
}

// Capital and fixed O&M rates are quoted per kW while capacity is in MW.
impl std::ops::Mul<MoneyPerKilowatt> for Capacity {
    type Output = Money;
    fn mul(self, rhs: MoneyPerKilowatt) -> Money {
        Money(self.0 * dec!(1000) * rhs.0)
    }
}

impl std::ops::Mul<MoneyPerKilowattYear> for Capacity {
    type Output = Money;
    fn mul(self, rhs: MoneyPerKilowattYear) -> Money {
        Money(self.0 * dec!(1000) * rhs.0)
    }
}
