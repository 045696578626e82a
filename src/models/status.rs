use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inventory state of a phone listing. Stored as a varchar column; the enum
/// is the typed view the reservation and sweep logic branches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PhoneStatus {
    Available,
    Reserved,
    Sold,
}

impl PhoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneStatus::Available => "available",
            PhoneStatus::Reserved => "reserved",
            PhoneStatus::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(PhoneStatus::Available),
            "reserved" => Some(PhoneStatus::Reserved),
            "sold" => Some(PhoneStatus::Sold),
            _ => None,
        }
    }
}

/// Payment state of an order. Unrecognized gateway statuses are written
/// through to the column verbatim, so the column stays a varchar and this
/// enum covers only the states the reconciliation logic acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Issued,
    Pending,
    Success,
    Failed,
    Cancelled,
    Expired,
    Manual,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Issued => "issued",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(PaymentStatus::Created),
            "issued" => Some(PaymentStatus::Issued),
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "expired" => Some(PaymentStatus::Expired),
            "manual" => Some(PaymentStatus::Manual),
            _ => None,
        }
    }

    /// Terminal for display purposes: no further transitions expected
    /// absent manual intervention.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success
                | PaymentStatus::Failed
                | PaymentStatus::Cancelled
                | PaymentStatus::Expired
                | PaymentStatus::Manual
        )
    }
}

/// Terminal check over the raw column value. Unknown statuses are treated
/// as open so a later reconciliation can still move them.
pub fn is_terminal_status(s: &str) -> bool {
    PaymentStatus::parse(s).map(|p| p.is_terminal()).unwrap_or(false)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentType {
    #[default]
    Pickup,
    Delivery,
}

impl FulfillmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::Pickup => "pickup",
            FulfillmentType::Delivery => "delivery",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_round_trips() {
        for s in [
            "created", "issued", "pending", "success", "failed", "cancelled", "expired", "manual",
        ] {
            assert_eq!(PaymentStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(PaymentStatus::parse("chargeback").is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal_status("success"));
        assert!(is_terminal_status("failed"));
        assert!(is_terminal_status("cancelled"));
        assert!(is_terminal_status("expired"));
        assert!(is_terminal_status("manual"));
        assert!(!is_terminal_status("created"));
        assert!(!is_terminal_status("issued"));
        assert!(!is_terminal_status("pending"));
        assert!(!is_terminal_status("chargeback"));
    }
}
