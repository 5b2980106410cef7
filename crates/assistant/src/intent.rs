use once_cell::sync::Lazy;
use regex::Regex;

/// Conversational topics the widget understands. `Unknown` is the fallback,
/// never matched directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    Greeting,
    Farewell,
    OrderTracking,
    FindTailor,
    Pricing,
    Measurement,
    Delivery,
    Support,
    Urgent,
    Download,
    Location,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::OrderTracking => "order_tracking",
            Self::FindTailor => "find_tailor",
            Self::Pricing => "pricing",
            Self::Measurement => "measurement",
            Self::Delivery => "delivery",
            Self::Support => "support",
            Self::Urgent => "urgent",
            Self::Download => "download",
            Self::Location => "location",
            Self::Unknown => "unknown",
        }
    }

    /// Every intent, matchable ones in table order, `Unknown` last.
    pub const ALL: [Intent; 12] = [
        Intent::Greeting,
        Intent::Farewell,
        Intent::OrderTracking,
        Intent::FindTailor,
        Intent::Pricing,
        Intent::Measurement,
        Intent::Delivery,
        Intent::Support,
        Intent::Urgent,
        Intent::Download,
        Intent::Location,
        Intent::Unknown,
    ];
}

pub const CONFIDENCE_HIGH: f64 = 0.9;
pub const CONFIDENCE_MATCHED: f64 = 0.8;
pub const CONFIDENCE_UNKNOWN: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
}

// Table order is load-bearing: patterns are tested top to bottom and the
// first hit wins, so an input matching several rows resolves by position.
static INTENT_PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    let table: [(Intent, &str); 11] = [
        (
            Intent::Greeting,
            r"(?i)\b(hello|hi|hey|sup|wossop|whatsapp|good morning|good afternoon|good evening)\b",
        ),
        (Intent::Farewell, r"(?i)\b(bye|goodbye|see you|farewell|thanks|thank you|appreciate)\b"),
        (
            Intent::OrderTracking,
            r"(?i)track.*order|order.*status|status.*order|where.*order|ORD-[A-Z0-9]{6,15}|#\s*[A-Z0-9]{6,15}",
        ),
        (
            Intent::FindTailor,
            r"(?i)tailor|find.*tailor|seamstress|alteration|repair|custom|bespoke|clothing.*made|stitch|sew",
        ),
        (
            Intent::Pricing,
            r"(?i)price|cost|how much|fee|charge|expensive|cheap|pricing|estimate|rate",
        ),
        (
            Intent::Measurement,
            r"(?i)measure|measurement|size|fitting|hemming|too big|too small|alter.*fit",
        ),
        (
            Intent::Delivery,
            r"(?i)deliver|delivery|pickup|shipping|when ready|completion|timeframe|how long",
        ),
        (
            Intent::Support,
            r"(?i)app|download|install|bug|crash|login|account|password|technical|help",
        ),
        (
            Intent::Urgent,
            r"(?i)emergency|urgent|asap|immediately|today|tomorrow|rush|quick",
        ),
        (
            Intent::Download,
            r"(?i)download|install|get.*app|mobile.*app|app.*store|play.*store|google.*play",
        ),
        (Intent::Location, r"(?i)location|near me|nearby|close to me|in my area|local"),
    ];

    table
        .into_iter()
        .map(|(intent, pattern)| {
            let regex = Regex::new(pattern)
                .unwrap_or_else(|error| panic!("invalid pattern for {intent:?}: {error}"));
            (intent, regex)
        })
        .collect()
});

static ORDER_NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ORD-[A-Z0-9]{6,15}|[A-Z0-9]{6,15})").expect("valid order number pattern")
});

#[derive(Clone, Copy, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify free text. Pure and infallible: unmatched input yields
    /// `Unknown` at the floor confidence.
    pub fn classify(&self, text: &str) -> IntentClassification {
        let normalized = normalize_text(text);

        for (intent, pattern) in INTENT_PATTERNS.iter() {
            if pattern.is_match(&normalized) {
                let confidence = match intent {
                    Intent::OrderTracking | Intent::FindTailor => CONFIDENCE_HIGH,
                    _ => CONFIDENCE_MATCHED,
                };
                return IntentClassification { intent: *intent, confidence };
            }
        }

        IntentClassification { intent: Intent::Unknown, confidence: CONFIDENCE_UNKNOWN }
    }
}

fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// First order-number-shaped substring: optional `ORD-` prefix plus 6-15
/// alphanumerics.
pub fn extract_order_number(text: &str) -> Option<String> {
    ORDER_NUMBER_PATTERN
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str().to_string())
}

/// Strip the `#` marker and whitespace customers paste along with their
/// order number.
pub fn clean_order_number(raw: &str) -> String {
    raw.chars().filter(|ch| *ch != '#' && !ch.is_whitespace()).collect()
}
