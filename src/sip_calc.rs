// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::round2;
use anyhow::{Result, anyhow, bail};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Longest horizon the calculator projects.
pub const MAX_YEARS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SipProjection {
    pub invested: Decimal,
    pub expected: Decimal,
    pub gain: Decimal,
    /// Projected value at the end of each month.
    pub monthly: Vec<Decimal>,
}

/// Future value of a monthly SIP paid at the start of each month,
/// compounding monthly at `annual_rate_pct / 12`.
///
/// Fails when `years` exceeds [`MAX_YEARS`] or the value leaves the
/// decimal range.
pub fn project(
    monthly_amount: Decimal,
    annual_rate_pct: Decimal,
    years: u32,
) -> Result<SipProjection> {
    if years > MAX_YEARS {
        bail!("SIP horizon is limited to {} years", MAX_YEARS);
    }
    let overflow = || {
        anyhow!(
            "SIP projection of {} at {}% for {} years is out of range",
            monthly_amount,
            annual_rate_pct,
            years
        )
    };
    let months = years.checked_mul(12).ok_or_else(overflow)?;
    let i = annual_rate_pct / dec!(1200);
    let value_after = |m: u32| -> Option<Decimal> {
        if i.is_zero() {
            return monthly_amount.checked_mul(Decimal::from(m));
        }
        let growth = (Decimal::ONE + i).checked_powu(m as u64)?;
        let factor = growth
            .checked_sub(Decimal::ONE)?
            .checked_div(i)?
            .checked_mul(Decimal::ONE + i)?;
        monthly_amount.checked_mul(factor)
    };
    let invested = monthly_amount
        .checked_mul(Decimal::from(months))
        .ok_or_else(overflow)?;
    let expected = round2(value_after(months).ok_or_else(overflow)?);
    let monthly = (1..=months)
        .map(|m| value_after(m).map(round2).ok_or_else(overflow))
        .collect::<Result<Vec<_>>>()?;
    Ok(SipProjection {
        invested,
        expected,
        gain: expected - invested,
        monthly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_grows_linearly() {
        let p = project(dec!(5000), Decimal::ZERO, 2).unwrap();
        assert_eq!(p.invested, dec!(120000));
        assert_eq!(p.expected, dec!(120000));
        assert_eq!(p.gain, Decimal::ZERO);
        assert_eq!(p.monthly.len(), 24);
        assert_eq!(p.monthly[0], dec!(5000));
    }

    #[test]
    fn one_year_at_twelve_percent() {
        let p = project(dec!(1000), dec!(12), 1).unwrap();
        assert_eq!(p.invested, dec!(12000));
        // 1000 * ((1.01^12 - 1) / 0.01) * 1.01
        assert_eq!(p.expected, dec!(12809.33));
        assert_eq!(p.monthly[0], dec!(1010));
        assert!(p.gain > Decimal::ZERO);
    }

    #[test]
    fn zero_years_is_empty() {
        let p = project(dec!(1000), dec!(10), 0).unwrap();
        assert_eq!(p.invested, Decimal::ZERO);
        assert_eq!(p.expected, Decimal::ZERO);
        assert!(p.monthly.is_empty());
    }

    #[test]
    fn runaway_growth_is_an_error_not_a_panic() {
        assert!(project(dec!(1000), dec!(100), 100).is_err());
        assert!(project(dec!(1000), dec!(12), MAX_YEARS + 1).is_err());
        assert!(project(dec!(1000), dec!(12), u32::MAX).is_err());
        assert!(project(dec!(1000), dec!(12), MAX_YEARS).is_ok());
    }
}
