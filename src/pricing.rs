//! Price arithmetic shared by catalog views and checkout. All amounts are kobo.

use chrono::{DateTime, Utc};

use crate::entity::flash_sales;

pub const MAX_DISCOUNT_PERCENT: i32 = 90;

/// Variant override wins over the product's base price.
pub fn unit_price(product_price: i64, variant_price: Option<i64>) -> i64 {
    variant_price.unwrap_or(product_price)
}

pub fn sale_is_live(sale: &flash_sales::Model, now: DateTime<Utc>) -> bool {
    sale.is_active
        && sale.starts_at.with_timezone(&Utc) <= now
        && now < sale.ends_at.with_timezone(&Utc)
}

/// Largest of the overlapping sale percentages, clamped to the allowed range.
pub fn best_percent(percents: impl IntoIterator<Item = i32>) -> Option<i32> {
    percents
        .into_iter()
        .map(|p| p.clamp(0, MAX_DISCOUNT_PERCENT))
        .filter(|p| *p > 0)
        .max()
}

pub fn discount_per_unit(unit_price: i64, percent: Option<i32>) -> i64 {
    match percent {
        Some(p) => unit_price * i64::from(p) / 100,
        None => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRules {
    pub flat_fee: i64,
    pub free_threshold: Option<i64>,
}

impl Default for ShippingRules {
    fn default() -> Self {
        Self {
            flat_fee: 0,
            free_threshold: None,
        }
    }
}

impl ShippingRules {
    pub fn fee_for(&self, discounted_subtotal: i64) -> i64 {
        match self.free_threshold {
            Some(threshold) if discounted_subtotal >= threshold => 0,
            _ => self.flat_fee.max(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub unit_price: i64,
    pub discount_per_unit: i64,
    pub quantity: i32,
}

impl PricedLine {
    pub fn charged_unit_price(&self) -> i64 {
        self.unit_price - self.discount_per_unit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: i64,
    pub discount: i64,
    pub shipping: i64,
    pub total: i64,
}

pub fn totals(lines: &[PricedLine], shipping: &ShippingRules) -> Totals {
    let mut subtotal = 0_i64;
    let mut discount = 0_i64;
    for line in lines {
        let qty = i64::from(line.quantity);
        subtotal += line.unit_price * qty;
        discount += line.discount_per_unit * qty;
    }
    let shipping_fee = shipping.fee_for(subtotal - discount);
    Totals {
        subtotal,
        discount,
        shipping: shipping_fee,
        total: subtotal - discount + shipping_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn sale(percent: i32, starts: DateTime<Utc>, ends: DateTime<Utc>, active: bool) -> flash_sales::Model {
        flash_sales::Model {
            id: Uuid::new_v4(),
            name: "Weekend".into(),
            discount_percent: percent,
            starts_at: starts.into(),
            ends_at: ends.into(),
            is_active: active,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn variant_price_overrides_product_price() {
        assert_eq!(unit_price(10_000, Some(12_500)), 12_500);
        assert_eq!(unit_price(10_000, None), 10_000);
    }

    #[test]
    fn sale_window_is_half_open() {
        let now = Utc::now();
        let live = sale(20, now - Duration::hours(1), now + Duration::hours(1), true);
        assert!(sale_is_live(&live, now));

        let ended = sale(20, now - Duration::hours(2), now, true);
        assert!(!sale_is_live(&ended, now));

        let starts_now = sale(20, now, now + Duration::hours(1), true);
        assert!(sale_is_live(&starts_now, now));

        let disabled = sale(20, now - Duration::hours(1), now + Duration::hours(1), false);
        assert!(!sale_is_live(&disabled, now));
    }

    #[test]
    fn best_percent_takes_the_largest_and_clamps() {
        assert_eq!(best_percent([10, 25, 15]), Some(25));
        assert_eq!(best_percent([120]), Some(MAX_DISCOUNT_PERCENT));
        assert_eq!(best_percent([0, -5]), None);
        assert_eq!(best_percent(Vec::<i32>::new()), None);
    }

    #[test]
    fn discount_floors_to_whole_kobo() {
        assert_eq!(discount_per_unit(999, Some(10)), 99);
        assert_eq!(discount_per_unit(999, None), 0);
    }

    #[test]
    fn shipping_is_waived_above_threshold() {
        let rules = ShippingRules {
            flat_fee: 2_500,
            free_threshold: Some(50_000),
        };
        assert_eq!(rules.fee_for(49_999), 2_500);
        assert_eq!(rules.fee_for(50_000), 0);
        assert_eq!(ShippingRules::default().fee_for(1), 0);
    }

    #[test]
    fn totals_combine_lines_discount_and_shipping() {
        let lines = [
            PricedLine {
                unit_price: 20_000,
                discount_per_unit: 4_000,
                quantity: 2,
            },
            PricedLine {
                unit_price: 5_000,
                discount_per_unit: 0,
                quantity: 1,
            },
        ];
        let rules = ShippingRules {
            flat_fee: 1_500,
            free_threshold: Some(100_000),
        };
        let t = totals(&lines, &rules);
        assert_eq!(t.subtotal, 45_000);
        assert_eq!(t.discount, 8_000);
        assert_eq!(t.shipping, 1_500);
        assert_eq!(t.total, 38_500);
        assert_eq!(lines[0].charged_unit_price(), 16_000);
    }
}
