//! Money arithmetic for the fund: interest splitting, capital allocation,
//! interest accrual and management fees.

use bigdecimal::{BigDecimal, Zero};

/// Rounds a non-negative amount half-up to `scale` decimal places.
pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    let half = BigDecimal::new(5.into(), scale + 1);
    (value + &half).with_scale(scale)
}

pub fn round_cents(value: &BigDecimal) -> BigDecimal {
    round_half_up(value, 2)
}

/// The two beneficiary shares of a loan's interest rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestSplit {
    pub bim_interest: BigDecimal,
    pub bsf_interest: BigDecimal,
}

/// Splits the total rate evenly between BIM and BSF.
pub fn split_interest(interest_rate: &BigDecimal) -> InterestSplit {
    let half = round_half_up(&(interest_rate / &BigDecimal::from(2)), 4);
    InterestSplit {
        bim_interest: half.clone(),
        bsf_interest: half,
    }
}

/// Splits `total` evenly across `parts` allocations to the cent.
///
/// The leftover cents from truncation go to the first allocation, so the
/// parts always sum to `total` exactly. Returns an empty vec for zero parts.
pub fn allocate_evenly(total: &BigDecimal, parts: usize) -> Vec<BigDecimal> {
    if parts == 0 {
        return Vec::new();
    }

    let count = BigDecimal::from(parts as u64);
    let base = (total / &count).with_scale(2);
    let remainder = total - &(&base * &count);

    let mut shares = vec![base.clone(); parts];
    shares[0] = &base + &remainder;
    shares
}

/// Per-account share of the BIM interest rate when `accounts` fund one loan.
pub fn rate_per_account(bim_interest: &BigDecimal, accounts: usize) -> BigDecimal {
    if accounts == 0 {
        return BigDecimal::zero();
    }
    round_half_up(&(bim_interest / &BigDecimal::from(accounts as u64)), 4)
}

/// Interest realised on an allocation at settlement: `amount * rate / 100`.
pub fn interest_on(amount: &BigDecimal, rate_percent: &BigDecimal) -> BigDecimal {
    round_cents(&(amount * rate_percent / BigDecimal::from(100)))
}

/// Monthly management fee on a balance: `balance * rate / 100`.
pub fn management_fee(balance: &BigDecimal, rate_percent: &BigDecimal) -> BigDecimal {
    round_cents(&(balance * rate_percent / BigDecimal::from(100)))
}
