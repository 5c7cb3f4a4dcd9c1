//! Integration tests for the pure checkout rules.
//!
//! These tests walk a cart through pricing, order creation and stock
//! adjustment the way a checkout does, without any I/O.

use common::{BuyerRef, CartId, ProductRef};
use domain::{
    Cart, CartLine, DomainError, Money, NewOrder, NewOrderLine, OrderNumber, OrderStatus,
    OrderSummary, ShippingProfile, StockRecord,
};

fn shipping() -> ShippingProfile {
    ShippingProfile {
        first_name: "Dory".to_string(),
        last_name: "Blue".to_string(),
        address_line1: "1 Reef Rd".to_string(),
        address_line2: Some("Apt 2".to_string()),
        city: "Sarasota".to_string(),
        state: "FL".to_string(),
        postal_code: "34236".to_string(),
        phone: "555-0199".to_string(),
        email: Some("dory@example.com".to_string()),
    }
}

mod pricing_scenarios {
    use super::*;

    #[test]
    fn three_ten_dollar_items() {
        let mut cart = Cart::new(CartId::new());
        cart.add_line(CartLine::new("a", "Zoanthid", Money::from_dollars(10), 3))
            .unwrap();

        let summary = OrderSummary::for_lines(&cart.snapshot().unwrap());

        assert_eq!(summary.shipping, Money::from_cents(1500));
        assert_eq!(summary.tax, Money::from_cents(210));
        assert_eq!(summary.total, Money::from_cents(4710));
    }

    #[test]
    fn two_hundred_fifty_dollar_subtotal() {
        let mut cart = Cart::new(CartId::new());
        cart.add_line(CartLine::new("a", "Maroon Clown", Money::from_dollars(100), 2))
            .unwrap();
        cart.add_line(CartLine::new("b", "Hammer Coral", Money::from_dollars(50), 1))
            .unwrap();

        let summary = OrderSummary::for_lines(&cart.snapshot().unwrap());

        assert_eq!(summary.subtotal, Money::from_dollars(250));
        assert_eq!(summary.shipping, Money::zero());
        assert_eq!(summary.tax, Money::from_cents(1750));
        assert_eq!(summary.total, Money::from_cents(26_750));
    }
}

mod order_flow {
    use super::*;

    #[test]
    fn order_total_matches_lines() {
        let lines = vec![
            CartLine::new("a", "Clownfish", Money::from_cents(2999), 2),
            CartLine::new("b", "Anemone", Money::from_cents(5499), 1),
        ];
        let summary = OrderSummary::for_lines(&lines);
        let order = NewOrder {
            buyer: BuyerRef::Guest,
            order_number: OrderNumber::from_string("ORD-240101-7"),
            shipping_address: shipping(),
            billing_address: shipping(),
            total_amount: summary.total,
            guest_email: shipping().email(),
        }
        .into_order();

        let order_lines: Vec<_> = lines
            .iter()
            .map(|l| NewOrderLine::from(l).into_line(order.id))
            .collect();
        let line_cost: Money = order_lines.iter().map(|l| l.line_total()).sum();

        assert_eq!(line_cost + summary.tax + summary.shipping, order.total_amount);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn paid_order_cannot_fail() {
        let status = OrderStatus::Pending
            .transition_to(OrderStatus::Paid)
            .unwrap();
        let result = status.transition_to(OrderStatus::Failed);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStatusTransition { .. })
        ));
    }
}

mod stock_flow {
    use super::*;

    #[test]
    fn purchase_drains_stock_across_lines() {
        let mut records = vec![
            StockRecord::new("a", 1),
            StockRecord::new("b", 4),
            StockRecord::category("fish"),
        ];
        let purchases = [("a", 1_u32), ("b", 1), ("fish", 1)];

        let adjustments: Vec<_> = purchases
            .iter()
            .filter_map(|(product, qty)| {
                records
                    .iter_mut()
                    .find(|r| r.product_ref == ProductRef::new(*product))
                    .and_then(|r| r.apply_purchase(*qty))
            })
            .collect();

        assert_eq!(adjustments.len(), 2);
        assert!(records[0].sold_out && records[0].disabled);
        assert_eq!(records[1].quantity_on_hand, 3);
        assert!(!records[2].sold_out);
    }
}
