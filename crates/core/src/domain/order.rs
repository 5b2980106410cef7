use serde::{Deserialize, Serialize};

/// Fulfillment stage of a tailoring order. Closed set: the upstream order
/// service reports free-form strings, anything unrecognized collapses to
/// `Processing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    Processing,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStage {
    pub fn from_upstream(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "processing" => Self::Processing,
            "in_progress" => Self::InProgress,
            "ready" => Self::Ready,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Processing,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::InProgress => "In Progress",
            Self::Ready => "Ready for Pickup",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
}

/// Point-in-time view of one order, fetched fresh per query and never cached.
/// Date fields stay as the upstream strings (`N/A` when absent); rendering
/// decides how to format them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_number: String,
    pub stage: OrderStage,
    pub tailor_label: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub garment: String,
    pub price: f64,
    pub due_amount: f64,
    pub due_date: String,
    pub last_updated: String,
    pub measurements: Vec<Measurement>,
}
