//! Operator notifications for placed orders and help requests. All texts are
//! plain (no parse mode), so user input is sent as typed.

use chrono::{DateTime, Utc};

use crate::cart::CartSummary;
use crate::dialogue::PendingOrder;
use crate::localization::Messages;

use super::event::{Sender, SharedContact};

/// Timestamp layout used in order notifications
pub const PLACED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

fn customer_line(messages: &Messages, key: &str, sender: &Sender) -> String {
    messages.get_with_args(
        key,
        &[
            ("customer", &sender.display_name()),
            ("id", &sender.user_id.to_string()),
        ],
    )
}

/// Builds the itemised order notification sent to the operator
pub fn format_order_notification(
    messages: &Messages,
    sender: &Sender,
    order: &PendingOrder,
    summary: &CartSummary,
    placed_at: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        messages.get("operator-new-order"),
        String::new(),
        customer_line(messages, "operator-customer", sender),
        messages.get_with_args("operator-address", &[("address", &order.address)]),
        messages.get_with_args(
            "operator-contact",
            &[("phone", &order.contact_phone), ("name", &order.contact_name)],
        ),
        messages.get_with_args(
            "operator-placed-at",
            &[("time", &placed_at.format(PLACED_AT_FORMAT).to_string())],
        ),
        String::new(),
        messages.get("operator-cart"),
    ];

    for resolved in &summary.lines {
        let quantity = resolved.line.quantity.to_string();
        let item = match (&resolved.product, resolved.line_total()) {
            (Some(product), Some(total)) => messages.get_with_args(
                "operator-order-line",
                &[
                    ("name", &product.name),
                    ("quantity", &quantity),
                    ("price", &product.price.to_string()),
                    ("total", &total.to_string()),
                ],
            ),
            _ => messages.get_with_args(
                "operator-order-line-unknown",
                &[
                    ("id", &resolved.line.product_id.to_string()),
                    ("quantity", &quantity),
                ],
            ),
        };
        lines.push(format!("- {item}"));
    }

    lines.push(String::new());
    lines.push(messages.get_with_args("operator-total", &[("total", &summary.total.to_string())]));
    lines.join("\n")
}

/// Help request forwarded as free text
pub fn format_help_message(messages: &Messages, sender: &Sender, text: &str) -> String {
    format!(
        "{}\n\n{}",
        customer_line(messages, "operator-help-message", sender),
        text
    )
}

/// Help request forwarded as a shared contact
pub fn format_help_contact(messages: &Messages, sender: &Sender, contact: &SharedContact) -> String {
    format!(
        "{}\n\n{}",
        customer_line(messages, "operator-help-contact", sender),
        messages.get_with_args(
            "operator-help-contact-details",
            &[("phone", &contact.phone_number), ("name", &contact.full_name())],
        )
    )
}
