use serde::{Deserialize, Serialize};

/// Nearby service provider returned by the tailor directory search. Fetched
/// fresh per search and never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TailorSummary {
    pub id: String,
    pub name: String,
    pub rating: f64,
    pub specialties: Vec<String>,
    pub distance_km: f64,
    pub price_range: String,
    pub available: bool,
}

/// Widget-reported geographic position. Absent coordinates mean the browser
/// denied or could not provide geolocation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::{Coordinates, TailorSummary};

    #[test]
    fn tailor_summary_round_trips_through_json() {
        let tailor = TailorSummary {
            id: "t-17".to_string(),
            name: "Adjei Bespoke".to_string(),
            rating: 4.8,
            specialties: vec!["kaftan".to_string(), "suit".to_string()],
            distance_km: 2.4,
            price_range: "GH₵ 80 - 250".to_string(),
            available: true,
        };

        let json = serde_json::to_string(&tailor).expect("serialize");
        let back: TailorSummary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, tailor);
    }

    #[test]
    fn coordinates_serialize_with_named_fields() {
        let here = Coordinates { latitude: 5.6037, longitude: -0.187 };
        let json = serde_json::to_value(here).expect("serialize");
        assert_eq!(json["latitude"], 5.6037);
        assert_eq!(json["longitude"], -0.187);
    }
}
