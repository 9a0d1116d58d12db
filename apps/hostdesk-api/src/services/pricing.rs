use rust_decimal::{Decimal, RoundingStrategy};

/// Half-up to two decimal places. Every stored monetary amount goes through
/// this, so recomputing a figure can never drift from what was persisted.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::from(100))
}

#[derive(Debug, Clone)]
pub struct PricingInput {
    pub plan_price: Decimal,
    /// Promotional percent from the plan_prices row for the chosen cycle.
    pub discount_percent: Decimal,
    /// From settings (`tax_percent`).
    pub tax_percent: Decimal,
    pub addon_prices: Vec<Decimal>,
    pub service_prices: Vec<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingBreakdown {
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

/// grand_total = total - discount + tax. The discount tier applies to the
/// plan price only; addon and service lines are charged at face value.
pub fn price_order(input: &PricingInput) -> PricingBreakdown {
    let lines: Decimal = input.addon_prices.iter().chain(&input.service_prices).sum();
    let total_amount = round_money(input.plan_price + lines);
    let discount_amount = percent_of(input.plan_price, input.discount_percent);
    let taxable = total_amount - discount_amount;
    let tax_amount = percent_of(taxable, input.tax_percent);
    let grand_total = taxable + tax_amount;

    PricingBreakdown {
        total_amount,
        discount_amount,
        tax_amount,
        grand_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn plain_monthly_order_with_tax() {
        let out = price_order(&PricingInput {
            plan_price: d("499.00"),
            discount_percent: Decimal::ZERO,
            tax_percent: d("18.00"),
            addon_prices: vec![],
            service_prices: vec![],
        });
        assert_eq!(out.total_amount, d("499.00"));
        assert_eq!(out.discount_amount, d("0.00"));
        assert_eq!(out.tax_amount, d("89.82"));
        assert_eq!(out.grand_total, d("588.82"));
    }

    #[test]
    fn annual_order_with_discount_addons_and_services() {
        let out = price_order(&PricingInput {
            plan_price: d("4990.00"),
            discount_percent: d("20.00"),
            tax_percent: d("18.00"),
            addon_prices: vec![d("150.00"), d("99.00")],
            service_prices: vec![d("500.00")],
        });
        assert_eq!(out.total_amount, d("5739.00"));
        assert_eq!(out.discount_amount, d("998.00"));
        assert_eq!(out.tax_amount, d("853.38"));
        assert_eq!(out.grand_total, d("5594.38"));
    }

    #[test]
    fn rounding_is_half_up() {
        // 0.125 would round to 0.12 under banker's rounding.
        assert_eq!(round_money(d("0.125")), d("0.13"));
        assert_eq!(round_money(d("0.124")), d("0.12"));
        assert_eq!(percent_of(d("33.33"), d("1.50")), d("0.50"));
    }

    #[test]
    fn rounding_is_idempotent() {
        let once = percent_of(d("10000.00"), d("2.75"));
        assert_eq!(round_money(once), once);
        assert_eq!(percent_of(d("10000.00"), d("2.75")), once);
    }

    #[test]
    fn grand_total_ties_out() {
        let input = PricingInput {
            plan_price: d("1234.56"),
            discount_percent: d("7.50"),
            tax_percent: d("18.00"),
            addon_prices: vec![d("78.90")],
            service_prices: vec![],
        };
        let out = price_order(&input);
        assert_eq!(
            out.grand_total,
            out.total_amount - out.discount_amount + out.tax_amount
        );
    }
}
