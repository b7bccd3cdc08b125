use rust_decimal::prelude::*;
use rust_decimal_macros::*;

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod lnurl;
pub mod nostr;
pub mod token;

pub const SATS_IN_BITCOIN: Decimal = dec!(100000000);
pub const MSATS_IN_SAT: u64 = 1000;

/// Largest integer a javascript wallet can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Lower bound of any fiat priced offer.
pub const MIN_FIAT_PRICE_MSATS: u64 = 1000;

pub type Msats = u64;

#[inline]
pub fn is_safe_integer(value: u64) -> bool {
    value <= MAX_SAFE_INTEGER
}

/// Fiat currencies a price can be quoted in.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Eq, Hash)]
pub enum Currency {
    USD,
    GBP,
    EUR,
}

impl Currency {
    /// Spot instrument that quotes one bitcoin in this currency.
    pub fn instrument(&self) -> &'static str {
        match self {
            Currency::USD => "BTC-USD",
            Currency::EUR => "BTC-EUR",
            Currency::GBP => "BTC-GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self {
            Self::USD => "USD",
            Self::GBP => "GBP",
            Self::EUR => "EUR",
        };

        write!(f, "{sign}")
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(currency: &str) -> Result<Currency, Self::Err> {
        let currency = currency.to_lowercase();
        match &currency[..] {
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "usd" => Ok(Currency::USD),
            _ => Err("unknown currency".to_string()),
        }
    }
}

/// Unit of the `u` offer parameter. No unit means sats.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Eq)]
pub enum PriceUnit {
    Sats,
    Fiat(Currency),
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sats => write!(f, "sats"),
            Self::Fiat(currency) => write!(f, "{currency}"),
        }
    }
}

impl FromStr for PriceUnit {
    type Err = String;

    fn from_str(unit: &str) -> Result<PriceUnit, Self::Err> {
        if unit.eq_ignore_ascii_case("sats") {
            return Ok(PriceUnit::Sats);
        }
        Currency::from_str(unit)
            .map(PriceUnit::Fiat)
            .map_err(|_| "unknown price unit".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// The result does not fit into a millisat amount.
    Overflow,
    NonPositiveQuote,
}

/// Converts a fiat price into millisats: `ceil(price * sats_per_btc / quote) * 1000`,
/// never below `MIN_FIAT_PRICE_MSATS`.
pub fn fiat_to_msats(price: Decimal, btc_quote: Decimal) -> Result<Msats, ConversionError> {
    if btc_quote <= Decimal::ZERO {
        return Err(ConversionError::NonPositiveQuote);
    }
    let sats = price
        .checked_mul(SATS_IN_BITCOIN)
        .and_then(|v| v.checked_div(btc_quote))
        .ok_or(ConversionError::Overflow)?
        .ceil();
    let msats = sats
        .to_u64()
        .and_then(|s| s.checked_mul(MSATS_IN_SAT))
        .ok_or(ConversionError::Overflow)?;
    Ok(msats.max(MIN_FIAT_PRICE_MSATS))
}

/// Converts a price denominated in sats into millisats: `round(price * 1000)`.
pub fn sats_to_msats(price: Decimal) -> Result<Msats, ConversionError> {
    price
        .checked_mul(Decimal::from(MSATS_IN_SAT))
        .ok_or(ConversionError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(ConversionError::Overflow)
}

/// Outcome of comparing the amount a wallet asked for with the amount committed in an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountCheck {
    Match,
    /// The wallet rounded to whole sats.
    UnitMismatch,
    Mismatch,
}

pub fn check_amount(committed: Msats, requested: Msats) -> AmountCheck {
    if committed == requested {
        return AmountCheck::Match;
    }
    if requested % MSATS_IN_SAT == 0 {
        let rounded_down = committed / MSATS_IN_SAT * MSATS_IN_SAT;
        let rounded_up = if committed % MSATS_IN_SAT == 0 {
            rounded_down
        } else {
            rounded_down.saturating_add(MSATS_IN_SAT)
        };
        if requested == rounded_down || requested == rounded_up {
            return AmountCheck::UnitMismatch;
        }
    }
    AmountCheck::Mismatch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_unit_from_str() {
        assert_eq!(PriceUnit::from_str("USD"), Ok(PriceUnit::Fiat(Currency::USD)));
        assert_eq!(PriceUnit::from_str("eur"), Ok(PriceUnit::Fiat(Currency::EUR)));
        assert_eq!(PriceUnit::from_str("SATS"), Ok(PriceUnit::Sats));
        assert!(PriceUnit::from_str("BTC").is_err());
        assert!(PriceUnit::from_str("").is_err());
    }

    #[test]
    fn test_fiat_to_msats() {
        assert_eq!(fiat_to_msats(dec!(5), dec!(50000)), Ok(10_000_000));
        // 0.01 USD at 100k is 10 sats exactly.
        assert_eq!(fiat_to_msats(dec!(0.01), dec!(100000)), Ok(10_000));
        // 1 USD at 30000 is 3333.33.. sats, rounded up.
        assert_eq!(fiat_to_msats(dec!(1), dec!(30000)), Ok(3_334_000));
    }

    #[test]
    fn test_fiat_to_msats_floor() {
        assert_eq!(fiat_to_msats(dec!(0.00), dec!(50000)), Ok(MIN_FIAT_PRICE_MSATS));
        assert_eq!(fiat_to_msats(dec!(0.01), dec!(90000000)), Ok(MIN_FIAT_PRICE_MSATS));
    }

    #[test]
    fn test_fiat_to_msats_bad_quote() {
        assert_eq!(fiat_to_msats(dec!(5), dec!(0)), Err(ConversionError::NonPositiveQuote));
        assert_eq!(fiat_to_msats(dec!(5), dec!(-1)), Err(ConversionError::NonPositiveQuote));
        assert_eq!(
            fiat_to_msats(dec!(99999999999999999.99), dec!(0.0000001)),
            Err(ConversionError::Overflow)
        );
    }

    #[test]
    fn test_fiat_to_msats_monotonic() {
        let quote = dec!(61234.57);
        let mut previous = 0;
        for cents in 0..2000u32 {
            let price = Decimal::new(cents as i64, 2);
            let msats = fiat_to_msats(price, quote).unwrap();
            assert!(msats >= previous, "{price} gave {msats} < {previous}");
            assert_eq!(msats % MSATS_IN_SAT, 0);
            previous = msats;
        }
    }

    #[test]
    fn test_sats_to_msats() {
        assert_eq!(sats_to_msats(dec!(21)), Ok(21_000));
        assert_eq!(sats_to_msats(dec!(0.5)), Ok(500));
        assert_eq!(sats_to_msats(dec!(1.23)), Ok(1230));
        assert_eq!(sats_to_msats(dec!(0)), Ok(0));
    }

    #[test]
    fn test_check_amount_match() {
        assert_eq!(check_amount(10_000_000, 10_000_000), AmountCheck::Match);
        assert_eq!(check_amount(1_500, 1_500), AmountCheck::Match);
    }

    #[test]
    fn test_check_amount_whole_sat_rounding() {
        assert_eq!(check_amount(1_500, 1_000), AmountCheck::UnitMismatch);
        assert_eq!(check_amount(1_500, 2_000), AmountCheck::UnitMismatch);
        assert_eq!(check_amount(1_999, 2_000), AmountCheck::UnitMismatch);
        assert_eq!(check_amount(1_500, 3_000), AmountCheck::Mismatch);
        assert_eq!(check_amount(1_500, 1_501), AmountCheck::Mismatch);
    }

    #[test]
    fn test_check_amount_sats_instead_of_msats() {
        assert_eq!(check_amount(10_000_000, 10_000), AmountCheck::Mismatch);
        assert_eq!(check_amount(1_000_000, 1_000), AmountCheck::Mismatch);
        assert_eq!(check_amount(10_000_000, 10_001), AmountCheck::Mismatch);
    }

    #[test]
    fn test_check_amount_plain_mismatch() {
        assert_eq!(check_amount(10_000_000, 9_000_000), AmountCheck::Mismatch);
        assert_eq!(check_amount(10_000_000, 10_000_001), AmountCheck::Mismatch);
        assert_eq!(check_amount(10_000_000, 1), AmountCheck::Mismatch);
        assert_eq!(check_amount(1_000, u64::MAX), AmountCheck::Mismatch);
    }

    #[test]
    fn test_is_safe_integer() {
        assert!(is_safe_integer(0));
        assert!(is_safe_integer(MAX_SAFE_INTEGER));
        assert!(!is_safe_integer(MAX_SAFE_INTEGER + 1));
    }
}
