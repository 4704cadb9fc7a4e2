use chrono::NaiveDate;
use rust_decimal::Decimal;

use fashiondesk_core::domain::order::{OrderId, OrderRecord};

/// Seed orders a fresh store starts from when no snapshot is configured.
struct SeedOrder {
    order_id: &'static str,
    customer_name: &'static str,
    items: &'static [&'static str],
    address: &'static str,
    status: &'static str,
    total_cents: i64,
    create_date: (i32, u32, u32),
}

const SEED_ORDERS: &[SeedOrder] = &[
    SeedOrder {
        order_id: "123",
        customer_name: "Zhang San",
        items: &["T-shirt", "Jeans"],
        address: "1 Financial Street, Xicheng District, Beijing",
        status: "processing",
        total_cents: 29_900,
        create_date: (2025, 2, 10),
    },
    SeedOrder {
        order_id: "456",
        customer_name: "Li Si",
        items: &["Dress", "Sneakers"],
        address: "2 Zhongguancun Street, Haidian District, Beijing",
        status: "shipped",
        total_cents: 58_800,
        create_date: (2025, 2, 8),
    },
    SeedOrder {
        order_id: "789",
        customer_name: "Wang Wu",
        items: &["Jacket", "Hat"],
        address: "3 Wangfujing Street, Dongcheng District, Beijing",
        status: "delivered",
        total_cents: 49_900,
        create_date: (2025, 2, 5),
    },
];

pub fn seed_orders() -> Vec<OrderRecord> {
    SEED_ORDERS
        .iter()
        .map(|seed| {
            let (year, month, day) = seed.create_date;
            OrderRecord {
                order_id: OrderId(seed.order_id.to_string()),
                customer_name: seed.customer_name.to_string(),
                items: seed.items.iter().map(|item| (*item).to_string()).collect(),
                address: seed.address.to_string(),
                status: seed.status.to_string(),
                total_amount: Decimal::new(seed.total_cents, 2),
                create_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rust_decimal::Decimal;

    use super::seed_orders;

    #[test]
    fn seed_contains_three_orders_with_unique_ids() {
        let orders = seed_orders();
        let ids = orders.iter().map(|order| order.order_id.0.as_str()).collect::<HashSet<_>>();

        assert_eq!(orders.len(), 3);
        assert_eq!(ids, HashSet::from(["123", "456", "789"]));
        assert!(orders.iter().all(|order| order.validate().is_ok()));
    }

    #[test]
    fn seed_order_123_is_processing() {
        let orders = seed_orders();
        let order = orders.iter().find(|order| order.order_id.0 == "123").expect("order 123");

        assert_eq!(order.status, "processing");
        assert_eq!(order.total_amount, Decimal::new(29_900, 2));
        assert_eq!(order.create_date.to_string(), "2025-02-10");
    }
}
