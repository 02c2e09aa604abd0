/// `value` as an integer when it is whole and fits in an `i64`.
fn whole_number(value: f64) -> Option<i64> {
    let in_range = value > i64::MIN as f64 && value < i64::MAX as f64;
    if value.is_finite() && in_range && value == value.trunc() {
        Some(value as i64)
    } else {
        None
    }
}

/// Keeps only digits, `.` and `-`; whole numbers lose their decimal part.
pub fn clean_price(raw: Option<&str>) -> String {
    let trimmed = match raw {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => return String::new(),
    };

    let filtered: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    match filtered.parse::<f64>().ok().and_then(whole_number) {
        Some(value) => value.to_string(),
        None => filtered,
    }
}

/// Rounds to the nearest ten and subtracts one, e.g. `150` becomes `149`.
/// Blank, unparseable, non-positive and out-of-range inputs are returned as-is.
pub fn round_to_nearest_9(price: &str) -> String {
    if price.trim().is_empty() {
        return price.to_string();
    }

    let value = match price.trim().parse::<f64>() {
        Ok(value) if value > 0.0 => value,
        _ => return price.to_string(),
    };

    let rounded = (((value + 5.0) / 10.0).floor() * 10.0 - 1.0).max(0.0);
    match whole_number(rounded) {
        Some(rounded) => rounded.to_string(),
        None => price.to_string(),
    }
}

/// Price fields for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceFields {
    pub price: String,
    pub compare_at: String,
    pub cost: String,
}

pub fn derive_prices(selling: &str, mrp: &str, cost: &str) -> PriceFields {
    let selling = clean_price(Some(selling));
    let cost = clean_price(Some(cost));

    let price = if !selling.is_empty() {
        round_to_nearest_9(&selling)
    } else if !cost.is_empty() {
        round_to_nearest_9(&cost)
    } else {
        String::new()
    };

    PriceFields {
        price,
        compare_at: clean_price(Some(mrp)),
        cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_lands_just_below_multiple_of_ten() {
        assert_eq!(round_to_nearest_9("100"), "99");
        assert_eq!(round_to_nearest_9("101"), "99");
        assert_eq!(round_to_nearest_9("150"), "149");
        assert_eq!(round_to_nearest_9("1299"), "1299");
        assert_eq!(round_to_nearest_9("4"), "0");
        assert_eq!(round_to_nearest_9("19.95"), "19");
    }

    #[test]
    fn rounding_passes_through_blank_and_non_positive() {
        assert_eq!(round_to_nearest_9("0"), "0");
        assert_eq!(round_to_nearest_9(""), "");
        assert_eq!(round_to_nearest_9("-20"), "-20");
        assert_eq!(round_to_nearest_9("abc"), "abc");
    }

    #[test]
    fn clean_price_strips_currency_and_grouping() {
        assert_eq!(clean_price(Some("₹1,299.00")), "1299");
        assert_eq!(clean_price(Some("19.95")), "19.95");
        assert_eq!(clean_price(Some(" INR 450 ")), "450");
        assert_eq!(clean_price(None), "");
        assert_eq!(clean_price(Some("   ")), "");
        assert_eq!(clean_price(Some("N/A")), "");
    }

    #[test]
    fn oversized_numbers_are_not_clamped() {
        let huge = "123456789012345678901234";
        assert_eq!(clean_price(Some(huge)), huge);
        assert_eq!(round_to_nearest_9(huge), huge);
        assert_eq!(round_to_nearest_9("1e300"), "1e300");
        assert_eq!(clean_price(Some("9007199254740992")), "9007199254740992");
    }

    #[test]
    fn selling_price_wins_and_others_pass_through() {
        let prices = derive_prices("₹1,049", "1,999.50", "700");
        assert_eq!(prices.price, "1049");
        assert_eq!(prices.compare_at, "1999.50");
        assert_eq!(prices.cost, "700");

        let prices = derive_prices("", "", "700");
        assert_eq!(prices.price, "699");

        let prices = derive_prices("nan", "", "");
        assert_eq!(prices, PriceFields::default());
    }
}
