use rust_decimal::Decimal;

use super::fx_errors::FxError;
use super::rate_table::RateTable;

/// Exchange rate and base-currency amount derived for a single record.
///
/// Both fields are `None` for base-currency records. For foreign-currency
/// records both are `Some`, and `converted_amount` may legitimately be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedAmount {
    pub exchange_rate: Option<Decimal>,
    pub converted_amount: Option<Decimal>,
}

/// Converts `amount` into the base currency, truncating toward negative infinity.
///
/// Always computed from the original amount, so applying it again with the
/// same rate gives the same result. Fails instead of overflowing when the
/// product does not fit in a `Decimal`.
pub fn convert(amount: Decimal, rate: Decimal) -> Result<Decimal, FxError> {
    amount
        .checked_mul(rate)
        .map(|product| product.floor())
        .ok_or_else(|| FxError::AmountOverflow(format!("{} x {}", amount, rate)))
}

pub fn is_base_currency(currency: &str, base_currency: &str) -> bool {
    currency.trim().eq_ignore_ascii_case(base_currency.trim())
}

/// Derives the stored rate and converted amount for a record.
///
/// The record's own rate wins over the table; the table only fills in a rate
/// the user has not set.
pub fn derive_amount(
    amount: Decimal,
    currency: &str,
    explicit_rate: Option<Decimal>,
    base_currency: &str,
    rates: &RateTable,
) -> Result<DerivedAmount, FxError> {
    if is_base_currency(currency, base_currency) {
        return Ok(DerivedAmount::default());
    }

    let rate = match explicit_rate {
        Some(rate) => rate,
        None => rates.get(currency).ok_or_else(|| {
            FxError::RateNotFound(format!(
                "no rate for {} -> {} and none supplied on the record",
                currency.trim().to_ascii_uppercase(),
                base_currency
            ))
        })?,
    };

    if rate <= Decimal::ZERO {
        return Err(FxError::InvalidRate(format!(
            "rate for {} must be positive, got {}",
            currency, rate
        )));
    }

    Ok(DerivedAmount {
        exchange_rate: Some(rate),
        converted_amount: Some(convert(amount, rate)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd_table() -> RateTable {
        RateTable::new().with_rate("USD", dec!(302.5)).unwrap()
    }

    #[test]
    fn test_convert_floors_fractional_results() {
        assert_eq!(convert(dec!(100), dec!(302.5)).unwrap(), dec!(30250));
        assert_eq!(convert(dec!(3), dec!(0.5)).unwrap(), dec!(1));
        assert_eq!(convert(dec!(10.99), dec!(1)).unwrap(), dec!(10));
    }

    #[test]
    fn test_convert_does_not_compound() {
        let once = convert(dec!(123.45), dec!(299.9)).unwrap();
        let twice = convert(dec!(123.45), dec!(299.9)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zero_amount_converts_to_zero_not_none() {
        let derived = derive_amount(Decimal::ZERO, "USD", None, "LKR", &usd_table()).unwrap();
        assert_eq!(derived.converted_amount, Some(Decimal::ZERO));
        assert_eq!(derived.exchange_rate, Some(dec!(302.5)));
    }

    #[test]
    fn test_base_currency_clears_rate_and_converted_amount() {
        let derived =
            derive_amount(dec!(5000), "lkr", Some(dec!(302.5)), "LKR", &usd_table()).unwrap();
        assert_eq!(derived, DerivedAmount::default());
    }

    #[test]
    fn test_explicit_rate_wins_over_table() {
        let derived =
            derive_amount(dec!(100), "USD", Some(dec!(300)), "LKR", &usd_table()).unwrap();
        assert_eq!(derived.exchange_rate, Some(dec!(300)));
        assert_eq!(derived.converted_amount, Some(dec!(30000)));
    }

    #[test]
    fn test_missing_rate_is_an_error() {
        let err = derive_amount(dec!(100), "EUR", None, "LKR", &usd_table()).unwrap_err();
        assert!(matches!(err, FxError::RateNotFound(_)));
    }

    #[test]
    fn test_non_positive_explicit_rate_is_rejected() {
        let err = derive_amount(dec!(100), "USD", Some(dec!(0)), "LKR", &usd_table()).unwrap_err();
        assert!(matches!(err, FxError::InvalidRate(_)));
    }

    #[test]
    fn test_overflowing_product_is_an_error() {
        let err = convert(Decimal::MAX / dec!(2), dec!(302.5)).unwrap_err();
        assert!(matches!(err, FxError::AmountOverflow(_)));

        let err = derive_amount(Decimal::MAX, "USD", None, "LKR", &usd_table()).unwrap_err();
        assert!(matches!(err, FxError::AmountOverflow(_)));
    }
}
