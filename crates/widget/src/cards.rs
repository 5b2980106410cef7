use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use tailorlink_core::{Message, MessagePayload, OrderSnapshot, OrderStage, TailorSummary};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardRow {
    pub label: String,
    pub value: String,
}

impl CardRow {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self { label: label.to_string(), value: value.into() }
    }
}

/// Render model for the order-status block the widget draws under the bot
/// message: a status badge plus label/value rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderCard {
    pub stage: OrderStage,
    pub status_label: String,
    pub rows: Vec<CardRow>,
    pub measurements: Vec<CardRow>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TailorCard {
    pub name: String,
    pub rows: Vec<CardRow>,
}

/// Card payloads attached to outbound messages, keyed by payload type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageCard {
    Order { card: OrderCard },
    Tailors { cards: Vec<TailorCard> },
}

/// Derive the render card for a message, if its payload warrants one. Store
/// links carry no card; the widget opens them directly.
pub fn card_for(message: &Message) -> Option<MessageCard> {
    match &message.payload {
        Some(MessagePayload::Order { order }) => {
            Some(MessageCard::Order { card: order_card(order) })
        }
        Some(MessagePayload::Tailors { tailors }) => Some(MessageCard::Tailors {
            cards: tailors.iter().map(tailor_card).collect(),
        }),
        Some(MessagePayload::StoreLink { .. }) | None => None,
    }
}

pub fn order_card(order: &OrderSnapshot) -> OrderCard {
    let rows = vec![
        CardRow::new("Tailor", order.tailor_label.clone()),
        CardRow::new("Customer", order.customer_name.clone()),
        CardRow::new("Garment", order.garment.clone()),
        CardRow::new("Total Price", format_currency(order.price)),
        CardRow::new("Due Amount", format_currency(order.due_amount)),
        CardRow::new("Due Date", format_date(&order.due_date)),
        CardRow::new("Last Updated", format_date(&order.last_updated)),
    ];

    let measurements = order
        .measurements
        .iter()
        .map(|measurement| {
            CardRow::new(&measurement.name, format!("{} cm", measurement.value))
        })
        .collect();

    OrderCard {
        stage: order.stage,
        status_label: order.stage.label().to_string(),
        rows,
        measurements,
    }
}

pub fn tailor_card(tailor: &TailorSummary) -> TailorCard {
    let availability = if tailor.available { "Available" } else { "Fully booked" };

    TailorCard {
        name: tailor.name.clone(),
        rows: vec![
            CardRow::new("Rating", format!("{:.1} / 5", tailor.rating)),
            CardRow::new("Specialties", tailor.specialties.join(", ")),
            CardRow::new("Distance", format!("{:.1} km", tailor.distance_km)),
            CardRow::new("Price Range", tailor.price_range.clone()),
            CardRow::new("Availability", availability),
        ],
    }
}

fn format_currency(amount: f64) -> String {
    format!("GH₵ {amount:.2}")
}

// Accepts RFC 3339 timestamps and bare dates; anything else (the upstream
// "N/A" placeholder included) passes through untouched.
fn format_date(raw: &str) -> String {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.format("%b %d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%b %d, %Y").to_string();
    }
    raw.to_string()
}
