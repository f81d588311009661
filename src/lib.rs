// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod app;
pub mod catalog;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod scheduler;
pub mod sip_calc;
pub mod store;
pub mod utils;
pub mod valuation;
