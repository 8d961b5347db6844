//! Fixed-point amount parsing for ledger asset amounts.
//!
//! The ledger represents asset amounts as decimal strings with at most seven
//! fractional digits. Amounts are parsed into an integer count of the smallest
//! unit (stroops) so balance comparisons never go through binary floating
//! point.

use thiserror::Error;

/// Number of decimal places in a ledger asset amount.
pub const AMOUNT_DECIMALS: u32 = 7;

/// Smallest-unit multiplier (10^AMOUNT_DECIMALS).
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
	#[error("amount is not a valid decimal number: {0:?}")]
	Malformed(String),

	#[error("amount must be greater than zero: {0:?}")]
	NotPositive(String),

	#[error("amount has more than {AMOUNT_DECIMALS} decimal places: {0:?}")]
	TooPrecise(String),

	#[error("amount is too large: {0:?}")]
	Overflow(String),
}

/// Parses a decimal amount string into stroops.
///
/// Accepts plain decimal notation (`"10"`, `"10.5"`, `"0.0000001"`). Rejects
/// empty input, signs, exponents, zero, and more than seven fractional digits.
pub fn parse_amount(raw: &str) -> Result<i64, AmountError> {
	let (whole, frac) = match raw.split_once('.') {
		Some((w, f)) => (w, f),
		None => (raw, ""),
	};

	if whole.is_empty() && frac.is_empty() {
		return Err(AmountError::Malformed(raw.to_string()));
	}
	if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
		return Err(AmountError::Malformed(raw.to_string()));
	}
	if frac.len() > AMOUNT_DECIMALS as usize {
		return Err(AmountError::TooPrecise(raw.to_string()));
	}

	let whole_part: i64 = if whole.is_empty() {
		0
	} else {
		whole
			.parse()
			.map_err(|_| AmountError::Overflow(raw.to_string()))?
	};

	// Right-pad the fractional digits out to full stroop precision.
	let mut frac_part: i64 = 0;
	if !frac.is_empty() {
		frac_part = frac
			.parse()
			.map_err(|_| AmountError::Overflow(raw.to_string()))?;
		frac_part *= 10_i64.pow(AMOUNT_DECIMALS - frac.len() as u32);
	}

	let stroops = whole_part
		.checked_mul(STROOPS_PER_UNIT)
		.and_then(|v| v.checked_add(frac_part))
		.ok_or_else(|| AmountError::Overflow(raw.to_string()))?;

	if stroops <= 0 {
		return Err(AmountError::NotPositive(raw.to_string()));
	}
	Ok(stroops)
}

/// Parses a balance string reported by the ledger into stroops.
///
/// Balances are not subject to the positivity rule; a zero balance is valid.
pub fn parse_balance(raw: &str) -> Result<i64, AmountError> {
	match parse_amount(raw) {
		Ok(v) => Ok(v),
		Err(AmountError::NotPositive(_)) => Ok(0),
		Err(e) => Err(e),
	}
}
