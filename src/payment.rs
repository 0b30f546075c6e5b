use serde::{Deserialize, Serialize};

use crate::models::client::Pricing;

/// Payment label shown alongside a client. Derived from [`Pricing`] on every
/// create and update; never taken from the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    #[serde(rename = "Partial Paid")]
    PartialPaid,
    Received,
}

/// A zero total means nothing is owed, which outranks any partial payment.
pub fn payment_status(pricing: &Pricing) -> PaymentStatus {
    if pricing.total_cost == 0.0 {
        PaymentStatus::Received
    } else if pricing.partial_paid > 0.0 {
        PaymentStatus::PartialPaid
    } else {
        PaymentStatus::Pending
    }
}
