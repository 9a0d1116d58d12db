use hostdesk_db::models::referral::CommissionRule;
use rust_decimal::Decimal;

use super::pricing::percent_of;

/// Which order amount commissions are computed on. Policy parameter, read
/// from the `commission_basis` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionBasis {
    /// grand_total (tax included)
    Gross,
    /// total - discount (tax excluded)
    Net,
}

impl CommissionBasis {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "net" => Self::Net,
            _ => Self::Gross,
        }
    }
}

/// Pick the rule for a (level, product type) pair from the active rule set.
/// A rule with a concrete product_type beats a catch-all (NULL) rule; among
/// equally specific rules the highest priority wins, then the lowest id.
pub fn select_rule<'a>(
    rules: &'a [CommissionRule],
    level: i32,
    product_type: &str,
) -> Option<&'a CommissionRule> {
    rules
        .iter()
        .filter(|rule| rule.is_active && rule.level == level)
        .filter(|rule| match &rule.product_type {
            Some(pt) => pt == product_type,
            None => true,
        })
        .max_by_key(|rule| {
            (
                rule.product_type.is_some(),
                rule.priority,
                std::cmp::Reverse(rule.id),
            )
        })
}

pub fn commission_amount(basis: Decimal, rate: Decimal) -> Decimal {
    percent_of(basis, rate)
}

/// Validate the next hop of the referrer chain. Returns None when the link
/// is absent, points back at the purchaser, or revisits an earlier hop (a
/// circular referral assignment that slipped past registration).
pub fn next_referrer(chain: &[i64], purchaser: i64, candidate: Option<i64>) -> Option<i64> {
    let candidate = candidate?;
    if candidate == purchaser || chain.contains(&candidate) {
        return None;
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn rule(id: i64, level: i32, product_type: Option<&str>, rate: &str, priority: i32) -> CommissionRule {
        CommissionRule {
            id,
            level,
            product_type: product_type.map(str::to_string),
            rate: d(rate),
            priority,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn amounts_match_rate_times_basis() {
        assert_eq!(commission_amount(d("10000.00"), d("5.00")), d("500.00"));
        assert_eq!(commission_amount(d("10000.00"), d("1.00")), d("100.00"));
        // Half-up at the paisa boundary.
        assert_eq!(commission_amount(d("333.33"), d("7.50")), d("25.00"));
    }

    #[test]
    fn amount_recomputation_does_not_drift() {
        let first = commission_amount(d("11798.82"), d("2.75"));
        for _ in 0..10 {
            assert_eq!(commission_amount(d("11798.82"), d("2.75")), first);
        }
    }

    #[test]
    fn specific_product_rule_beats_catch_all() {
        let rules = vec![
            rule(1, 1, None, "5.00", 100),
            rule(2, 1, Some("vps"), "8.00", 0),
        ];
        let picked = select_rule(&rules, 1, "vps").unwrap();
        assert_eq!(picked.id, 2);
        // Other product types fall back to the catch-all.
        assert_eq!(select_rule(&rules, 1, "shared").unwrap().id, 1);
    }

    #[test]
    fn higher_priority_wins_then_lower_id() {
        let rules = vec![
            rule(1, 1, Some("vps"), "5.00", 10),
            rule(2, 1, Some("vps"), "6.00", 20),
            rule(3, 1, Some("vps"), "7.00", 20),
        ];
        // Priority 20 beats 10; between ids 2 and 3 the lower id wins.
        assert_eq!(select_rule(&rules, 1, "vps").unwrap().id, 2);
    }

    #[test]
    fn inactive_and_wrong_level_rules_are_ignored() {
        let mut inactive = rule(1, 1, None, "5.00", 100);
        inactive.is_active = false;
        let rules = vec![inactive, rule(2, 2, None, "1.00", 0)];
        assert!(select_rule(&rules, 1, "vps").is_none());
        assert_eq!(select_rule(&rules, 2, "vps").unwrap().id, 2);
    }

    #[test]
    fn chain_walk_stops_on_missing_link() {
        assert_eq!(next_referrer(&[], 10, None), None);
        assert_eq!(next_referrer(&[], 10, Some(20)), Some(20));
        assert_eq!(next_referrer(&[20], 10, Some(30)), Some(30));
    }

    #[test]
    fn chain_walk_guards_against_cycles() {
        // Self-referral.
        assert_eq!(next_referrer(&[], 10, Some(10)), None);
        // 10 -> 20 -> 30 -> 20 would revisit 20.
        assert_eq!(next_referrer(&[20, 30], 10, Some(20)), None);
        // 10 -> 20 -> 10 points back at the purchaser.
        assert_eq!(next_referrer(&[20], 10, Some(10)), None);
    }
}
