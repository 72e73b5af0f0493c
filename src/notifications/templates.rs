use std::fmt::Write;

use super::{EmailMessage, OrderNotification, OrderSummary};

pub fn render(notification: &OrderNotification) -> EmailMessage {
    match notification {
        OrderNotification::Confirmation { to, order } => {
            let text = format!(
                "{}\n\nThank you for your order {}.\n\n{}",
                greeting(order),
                order.order_number,
                line_table(order)
            );
            message(
                to,
                format!("Order confirmation - {}", order.order_number),
                text,
            )
        }
        OrderNotification::AdminNewOrder {
            to,
            customer_email,
            shipping_address,
            order,
        } => {
            let mut text = format!(
                "New order {} received.\nCustomer: {} <{}>\n",
                order.order_number,
                order.customer_name.as_deref().unwrap_or("unknown"),
                customer_email.as_deref().unwrap_or("no email"),
            );
            if let Some(address) = shipping_address {
                let _ = writeln!(text, "Ship to: {}", address);
            }
            let _ = write!(text, "\n{}", line_table(order));
            message(to, format!("New order - {}", order.order_number), text)
        }
        OrderNotification::StatusUpdate { to, order } => {
            let mut text = format!(
                "{}\n\nYour order {} is now: {}.",
                greeting(order),
                order.order_number,
                order.status
            );
            if let Some(tracking) = &order.tracking_number {
                let _ = write!(text, "\nTracking number: {}", tracking);
            }
            if let Some(eta) = &order.estimated_delivery {
                let _ = write!(text, "\nEstimated delivery: {}", eta.format("%Y-%m-%d"));
            }
            message(
                to,
                format!("Order {} - {}", order.order_number, order.status),
                text,
            )
        }
        OrderNotification::Cancellation { to, reason, order } => {
            let mut text = format!(
                "{}\n\nYour order {} has been cancelled.",
                greeting(order),
                order.order_number
            );
            if let Some(reason) = reason.as_deref().filter(|r| !r.trim().is_empty()) {
                let _ = write!(text, "\nReason: {}", reason);
            }
            message(
                to,
                format!("Order cancelled - {}", order.order_number),
                text,
            )
        }
    }
}

fn greeting(order: &OrderSummary) -> String {
    match &order.customer_name {
        Some(name) => format!("Hello {},", name),
        None => "Hello,".to_string(),
    }
}

fn line_table(order: &OrderSummary) -> String {
    let mut out = String::new();
    for line in &order.lines {
        let _ = writeln!(
            out,
            "{} x {} @ {} = {}",
            line.quantity, line.product_id, line.unit_price, line.subtotal
        );
    }
    if !order.discount.is_zero() {
        let _ = writeln!(out, "Discount: -{} {}", order.discount, order.currency);
    }
    let _ = writeln!(out, "Shipping: {} {}", order.shipping, order.currency);
    let _ = write!(out, "Total: {} {}", order.total, order.currency);
    out
}

fn message(to: &str, subject: String, text_body: String) -> EmailMessage {
    let html_body = format!(
        "<html><body><pre>{}</pre></body></html>",
        escape_html(&text_body)
    );
    EmailMessage {
        to: vec![to.to_string()],
        subject,
        text_body,
        html_body,
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use crate::notifications::LineSummary;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn order() -> OrderSummary {
        OrderSummary {
            order_id: Uuid::new_v4(),
            order_number: "ORD-42".into(),
            customer_name: Some("Grace".into()),
            status: OrderStatus::OutForDelivery,
            currency: "USD".into(),
            shipping: dec!(4.99),
            discount: dec!(10),
            total: dec!(94.99),
            tracking_number: Some("1Z999".into()),
            estimated_delivery: None,
            lines: vec![LineSummary {
                product_id: Uuid::new_v4(),
                variation_id: None,
                quantity: 2,
                unit_price: dec!(50),
                subtotal: dec!(100),
            }],
        }
    }

    #[test]
    fn status_update_mentions_status_and_tracking() {
        let msg = render(&OrderNotification::StatusUpdate {
            to: "grace@example.com".into(),
            order: order(),
        });
        assert_eq!(msg.subject, "Order ORD-42 - Out for Delivery");
        assert!(msg.text_body.contains("1Z999"));
        assert_eq!(msg.to, vec!["grace@example.com".to_string()]);
    }

    #[test]
    fn cancellation_carries_reason() {
        let msg = render(&OrderNotification::Cancellation {
            to: "grace@example.com".into(),
            reason: Some("changed <mind>".into()),
            order: order(),
        });
        assert!(msg.text_body.contains("Reason: changed <mind>"));
        assert!(msg.html_body.contains("changed &lt;mind&gt;"));
    }

    #[test]
    fn admin_notice_includes_address_and_totals() {
        let msg = render(&OrderNotification::AdminNewOrder {
            to: "ops@example.com".into(),
            customer_email: Some("grace@example.com".into()),
            shipping_address: Some(serde_json::json!({"city": "Arlington"})),
            order: order(),
        });
        assert!(msg.text_body.contains("Arlington"));
        assert!(msg.text_body.contains("Total: 94.99 USD"));
        assert!(msg.text_body.contains("Discount: -10 USD"));
    }
}
