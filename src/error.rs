//! The error taxonomy for core market operations.
//!
//! Every rejected operation reports a specific kind; nothing is silently
//! swallowed. All errors are deterministic and synchronous - retries, if
//! any, belong to the calling shell. Note that an under-supplied market is
//! *not* an error: it is a modelled outcome surfaced via the shortage flag
//! on a clearing result.
use crate::session::GamePhase;
use crate::units::{Capacity, MoneyPerEnergy};
use thiserror::Error;

/// An error arising from a core market operation
#[derive(Debug, Error, PartialEq)]
pub enum MarketError {
    /// Malformed or out-of-range input, rejected before any state changes
    #[error("validation failed: {0}")]
    Validation(String),

    /// A phase-control call made from the wrong state; state is unchanged
    #[error("operation '{operation}' is not valid in phase '{phase}'")]
    InvalidTransition {
        /// The operation that was attempted
        operation: &'static str,
        /// The phase the session was in
        phase: GamePhase,
    },

    /// A bid submitted while the bidding window is not open
    #[error("bidding is closed (session phase is '{phase}')")]
    PhaseClosed {
        /// The phase the session was in
        phase: GamePhase,
    },

    /// A reference to an unknown session, utility, plant or template
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What kind of entity was looked up
        kind: &'static str,
        /// The ID that was not found
        id: String,
    },

    /// A bid offering more than the plant's nameplate capacity
    #[error("bid quantity {quantity} MW exceeds plant capacity {capacity} MW")]
    CapacityExceeded {
        /// The offered quantity
        quantity: Capacity,
        /// The plant's capacity
        capacity: Capacity,
    },

    /// A negative bid price
    #[error("bid price {price} must not be negative")]
    NegativePrice {
        /// The offending price
        price: MoneyPerEnergy,
    },
}

impl MarketError {
    /// Shorthand for a [`MarketError::Validation`] with a formatted message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a [`MarketError::NotFound`]
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// The result type for core market operations
pub type MarketResult<T> = Result<T, MarketError>;
