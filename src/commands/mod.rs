// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod stocks;
pub mod funds;
pub mod sips;
pub mod portfolio;
pub mod transactions;
pub mod exporter;
pub mod watchlist;
pub mod prefs;
pub mod ticker;
