// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Refusals returned by ledger operations. Every variant is raised before any state changes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient funds: need {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("No holding in '{0}'")]
    NoPosition(String),

    #[error("Requested {requested} exceeds holding of {held} in '{id}'")]
    ExceedsHolding {
        id: String,
        requested: Decimal,
        held: Decimal,
    },

    #[error("Holding in '{0}' is below the minimum redeemable units")]
    DustPosition(String),

    #[error("Unknown instrument '{0}'")]
    UnknownInstrument(String),
}
