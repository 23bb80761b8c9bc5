//! Storefront emails used by the demo.

use postbox_core::{EmailTemplate, Priority};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OrderConfirmation {
    pub to: String,
    pub order_id: String,
    pub total: String,
}

impl EmailTemplate for OrderConfirmation {
    const TEMPLATE_ID: &'static str = "order.confirmation.v1";
}

#[derive(Debug, Serialize)]
pub struct ShipmentNotice {
    pub to: String,
    pub order_id: String,
    pub tracking_url: String,
}

impl EmailTemplate for ShipmentNotice {
    const TEMPLATE_ID: &'static str = "order.shipped.v1";
}

#[derive(Debug, Serialize)]
pub struct WorkshopResponse {
    pub to: String,
    pub workshop: String,
    pub accepted: bool,
}

impl EmailTemplate for WorkshopResponse {
    const TEMPLATE_ID: &'static str = "workshop.response.v1";
}

#[derive(Debug, Serialize)]
pub struct CartReminder {
    pub to: String,
    pub items: Vec<String>,
}

impl EmailTemplate for CartReminder {
    const TEMPLATE_ID: &'static str = "cart.reminder.v1";
}

/// Priority the storefront uses for each kind of email.
pub fn priority_for(template_id: &str) -> Priority {
    if template_id == OrderConfirmation::TEMPLATE_ID {
        Priority::High
    } else if template_id == ShipmentNotice::TEMPLATE_ID
        || template_id == WorkshopResponse::TEMPLATE_ID
    {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmations_outrank_reminders() {
        assert_eq!(priority_for(OrderConfirmation::TEMPLATE_ID), Priority::High);
        assert_eq!(priority_for(ShipmentNotice::TEMPLATE_ID), Priority::Medium);
        assert_eq!(priority_for(CartReminder::TEMPLATE_ID), Priority::Low);
    }
}
