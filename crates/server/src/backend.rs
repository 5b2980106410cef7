//! Reqwest clients for the upstream order and tailor services.
//!
//! Both endpoints are treated as opaque JSON services with defensive
//! envelope handling: a non-2xx status, a missing `data` object, or a
//! malformed payload reads as "not found" / "no results" and never as an
//! error the widget could see.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use tailorlink_assistant::conversation::{OrderService, TailorDirectory};
use tailorlink_core::config::BackendConfig;
use tailorlink_core::{Coordinates, Measurement, OrderSnapshot, OrderStage, TailorSummary};

pub fn build_client(config: &BackendConfig) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(std::time::Duration::from_secs(config.timeout_secs)).build()
}

pub struct HttpOrderService {
    client: Client,
    base_url: String,
}

impl HttpOrderService {
    pub fn new(client: Client, config: &BackendConfig) -> Self {
        Self { client, base_url: config.base_url.trim_end_matches('/').to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    data: Option<OrderData>,
}

#[derive(Debug, Default, Deserialize)]
struct OrderData {
    order_number: Option<String>,
    status: Option<String>,
    tailor_id: Option<i64>,
    customer: Option<CustomerData>,
    garment_type: Option<GarmentTypeData>,
    price: Option<f64>,
    due_amount: Option<f64>,
    due_date: Option<String>,
    updated_at: Option<String>,
    order_measurements: Option<Vec<MeasurementData>>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerData {
    name: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GarmentTypeData {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeasurementData {
    measurement_name: Option<String>,
    value: Option<f64>,
}

fn order_snapshot(requested_number: &str, data: OrderData) -> OrderSnapshot {
    let customer = data.customer.unwrap_or_default();
    let garment = data
        .garment_type
        .and_then(|garment_type| garment_type.name)
        .unwrap_or_else(|| "Custom garment".to_string());

    OrderSnapshot {
        order_number: data.order_number.unwrap_or_else(|| requested_number.to_string()),
        stage: OrderStage::from_upstream(data.status.as_deref().unwrap_or("")),
        tailor_label: data
            .tailor_id
            .map(|id| format!("Tailor #{id}"))
            .unwrap_or_else(|| "N/A".to_string()),
        customer_name: customer.name.unwrap_or_else(|| "N/A".to_string()),
        customer_phone: customer.phone.unwrap_or_else(|| "N/A".to_string()),
        garment,
        price: data.price.unwrap_or(0.0),
        due_amount: data.due_amount.unwrap_or(0.0),
        due_date: data.due_date.unwrap_or_else(|| "N/A".to_string()),
        last_updated: data.updated_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
        measurements: data
            .order_measurements
            .unwrap_or_default()
            .into_iter()
            .filter_map(|measurement| {
                Some(Measurement {
                    name: measurement.measurement_name?,
                    value: measurement.value?,
                })
            })
            .collect(),
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn track_order(&self, order_number: &str) -> Result<Option<OrderSnapshot>> {
        let url = format!("{}/api/v2/customers/orders/{order_number}", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "backend.order_lookup.request_failed",
                    order_number,
                    error = %error,
                    "order lookup request failed"
                );
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            return Ok(None);
        }

        let envelope = match response.json::<OrderEnvelope>().await {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(
                    event_name = "backend.order_lookup.malformed_payload",
                    order_number,
                    error = %error,
                    "order lookup returned a malformed payload"
                );
                return Ok(None);
            }
        };

        Ok(envelope.data.map(|data| order_snapshot(order_number, data)))
    }
}

pub struct HttpTailorDirectory {
    client: Client,
    base_url: String,
    search_radius_km: u32,
}

impl HttpTailorDirectory {
    pub fn new(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_radius_km: config.search_radius_km,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TailorsEnvelope {
    tailors: Option<Vec<TailorData>>,
}

#[derive(Debug, Deserialize)]
struct TailorData {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    rating: f64,
    #[serde(default, rename = "specialty")]
    specialties: Vec<String>,
    #[serde(default)]
    distance: f64,
    #[serde(default, rename = "priceRange")]
    price_range: String,
    #[serde(default)]
    available: bool,
}

impl From<TailorData> for TailorSummary {
    fn from(data: TailorData) -> Self {
        Self {
            id: data.id.unwrap_or_default(),
            name: data.name.unwrap_or_else(|| "Unnamed tailor".to_string()),
            rating: data.rating,
            specialties: data.specialties,
            distance_km: data.distance,
            price_range: data.price_range,
            available: data.available,
        }
    }
}

#[async_trait]
impl TailorDirectory for HttpTailorDirectory {
    async fn find_nearby(
        &self,
        position: Coordinates,
        service_type: Option<&str>,
    ) -> Result<Vec<TailorSummary>> {
        let url = format!("{}/api/v2/tailors/nearby", self.base_url);
        let body = json!({
            "latitude": position.latitude,
            "longitude": position.longitude,
            "serviceType": service_type,
            "radius": self.search_radius_km,
        });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "backend.tailor_search.request_failed",
                    error = %error,
                    "tailor search request failed"
                );
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let envelope = match response.json::<TailorsEnvelope>().await {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(
                    event_name = "backend.tailor_search.malformed_payload",
                    error = %error,
                    "tailor search returned a malformed payload"
                );
                return Ok(Vec::new());
            }
        };

        Ok(envelope.tailors.unwrap_or_default().into_iter().map(TailorSummary::from).collect())
    }
}
