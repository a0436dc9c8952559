use currex::currency::{self, Conversion, CurrencyCode, CurrencyError};

#[test]
fn hundred_dollars_in_euros() {
    assert_eq!(currency::convert(100.0, "USD", "EUR").unwrap(), 92.0);
}

#[test]
fn same_currency_is_identity_to_the_cent() {
    for code in CurrencyCode::ALL {
        let code = code.as_str();
        assert_eq!(currency::convert(123.45, code, code).unwrap(), 123.45);
    }
}

#[test]
fn every_pair_round_trips_within_rounding() {
    let amount = 250.0;
    for from in CurrencyCode::ALL {
        for to in CurrencyCode::ALL {
            let there = currency::convert_codes(amount, from, to);
            let back = currency::convert_codes(there, to, from);
            // Each leg rounds to the cent; the first rounding error is scaled
            // by the return rate.
            let tolerance = 0.005 * from.rate() / to.rate() + 0.005 + 1e-6;
            assert!(
                (back - amount).abs() <= tolerance,
                "{from}->{to}->{from}: {back} vs {amount}"
            );
        }
    }
}

#[test]
fn unknown_codes_are_rejected() {
    for (from, to) in [
        ("XYZ", "USD"),
        ("USD", "XYZ"),
        ("", "EUR"),
        ("usd", "EUR"),
        (" EUR ", "USD"),
    ] {
        match currency::convert(1.0, from, to) {
            Err(currex::Error::Currency(CurrencyError::InvalidCurrency { .. })) => {}
            other => panic!("{from}->{to}: expected InvalidCurrency, got {other:?}"),
        }
    }
}

#[test]
fn conversion_renders_like_the_result_line() {
    let conversion = Conversion::new(12.5, CurrencyCode::Gbp, CurrencyCode::Jpy);
    assert_eq!(conversion.to_string(), "12.50 GBP = 2339.74 JPY");
}
