use tailorlink_core::{Message, MessageKind, MessagePayload, OrderSnapshot, TailorSummary};

use crate::intent::Intent;

/// One canned reply: text (may carry `**bold**` spans) plus the quick-reply
/// labels offered with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CannedResponse {
    pub text: &'static str,
    pub quick_replies: &'static [&'static str],
}

/// Static fallback table, one entry per intent. Used whenever a turn needs no
/// external fetch.
pub fn canned(intent: Intent) -> &'static CannedResponse {
    match intent {
        Intent::Greeting => &CannedResponse {
            text: "Hello! How can I assist you today?",
            quick_replies: &[
                "Find tailors near me",
                "Track my order",
                "Pricing information",
                "Download the app",
            ],
        },
        Intent::Farewell => &CannedResponse {
            text: "Thank you for chatting with TailorLink! If you need anything else, just let me know.",
            quick_replies: &["Main menu", "Download the app"],
        },
        Intent::OrderTracking => &CannedResponse {
            text: "I'd be happy to help track your order. Please provide your order number (e.g., ORD-XXXXXXX).",
            quick_replies: &[
                "Where to find order number?",
                "Download app for tracking",
                "Contact support",
                "Main menu",
            ],
        },
        Intent::FindTailor => &CannedResponse {
            text: "I can help you find expert tailors near you. Would you like to use your current location?",
            quick_replies: &["Yes, use my location", "No, skip location", "Download app instead"],
        },
        Intent::Pricing => &CannedResponse {
            text: "For pricing information, please specify the type of garment or service you're interested in.",
            quick_replies: &["Find tailors", "Download app", "Main menu"],
        },
        Intent::Measurement => &CannedResponse {
            text: "I can provide a measurement guide or connect you with a tailor for fittings. What would you like?",
            quick_replies: &["Measurement guide", "Find tailors", "Main menu"],
        },
        Intent::Delivery => &CannedResponse {
            text: "Delivery times depend on the tailor and service. Would you like to track an order or find tailors?",
            quick_replies: &["Track my order", "Find tailors", "Download app"],
        },
        Intent::Support => &CannedResponse {
            text: "For technical support, please describe your issue or download our app for more help.",
            quick_replies: &["Download app", "Contact support", "Main menu"],
        },
        Intent::Urgent => &CannedResponse {
            text: "For urgent tailoring needs, I recommend finding tailors near you or contacting support.",
            quick_replies: &["Find tailors", "Contact support", "Download app"],
        },
        Intent::Download => &CannedResponse {
            text: "You can download the TailorLink app from the Google Play Store for the best experience!",
            quick_replies: &["Download Now", "Find tailors", "Track order", "Main menu"],
        },
        Intent::Location => &CannedResponse {
            text: "To find tailors near you, may I use your current location?",
            quick_replies: &["Yes, use my location", "No, skip location", "Download app instead"],
        },
        Intent::Unknown => &CannedResponse {
            text: "I'm not sure I understand. Could you please rephrase or select an option below?",
            quick_replies: &["Find tailors", "Track my order", "Download the app", "Main menu"],
        },
    }
}

pub fn canned_message(intent: Intent) -> Message {
    let response = canned(intent);
    Message::from_bot(response.text).with_quick_replies(response.quick_replies.iter().copied())
}

/// Seeded into an empty transcript so a fresh (or freshly cleared) chat
/// greets the customer.
pub fn welcome_message() -> Message {
    Message::from_bot(
        "Hello! I'm your TailorLink assistant. I can help you:\n\n\
         • Find expert tailors near you\n\
         • Track your orders in real-time\n\
         • Get pricing estimates\n\
         • Schedule fittings\n\
         • Answer measurement questions\n\n\
         How can I assist you today?",
    )
    .with_quick_replies([
        "Find tailors near me",
        "Track my order",
        "Pricing information",
        "Measurement guide",
        "Download the app",
    ])
}

pub fn order_number_prompt() -> Message {
    Message::from_bot(
        "I'd be happy to track your order! Please provide your order number \
         (it usually looks like ORD-6902011D56DA9). You can find it in your \
         order confirmation or in the app.",
    )
    .with_quick_replies([
        "Where to find order number?",
        "Download app for tracking",
        "Contact support",
        "Main menu",
    ])
}

pub fn order_status_message(order: OrderSnapshot) -> Message {
    Message::from_bot(format!(
        "Here's the current status of your order **{}**:",
        order.order_number
    ))
    .with_quick_replies([
        "Track another order",
        "Contact tailor",
        "Download app for live tracking",
        "Main menu",
    ])
    .with_payload(MessagePayload::Order { order })
    .with_kind(MessageKind::OrderStatus)
}

pub fn order_not_found_message(order_number: &str) -> Message {
    Message::from_bot(format!(
        "I couldn't find order \"{order_number}\". Please check that:\n\n\
         • The order number is correct (format: ORD-XXXXXXX)\n\
         • The order exists in our system\n\n\
         You can also download our app for real-time order tracking!"
    ))
    .with_quick_replies(["Try again", "Download app", "Contact support", "Main menu"])
}

pub fn tailors_found_message(tailors: Vec<TailorSummary>) -> Message {
    Message::from_bot(format!(
        "I found {} expert tailors near your location! Here are the top results:",
        tailors.len()
    ))
    .with_quick_replies(["Download app to book", "Find different service", "Get pricing", "Main menu"])
    .with_payload(MessagePayload::Tailors { tailors })
    .with_kind(MessageKind::TailorList)
}

pub fn no_tailors_message() -> Message {
    Message::from_bot(
        "I couldn't find any tailors in your immediate area. Try expanding your \
         search radius or download our app to see more options and book instantly!",
    )
    .with_quick_replies(["Download app", "Try different location", "Contact support"])
}

pub fn location_permission_message() -> Message {
    Message::from_bot(
        "To find the best tailors near you, I'll need your location. This helps \
         me show you tailors who are actually available in your area. Is it okay \
         to use your current location?",
    )
    .with_quick_replies(["Yes, use my location", "No, skip location", "Download app instead"])
    .with_kind(MessageKind::LocationRequest)
}

pub fn location_unavailable_message() -> Message {
    Message::from_bot(
        "I couldn't access your location. Please enable location permissions in \
         your browser settings, or download our app for the best experience \
         finding and booking local tailors!",
    )
    .with_quick_replies(["Download app", "Enter location manually", "Skip location"])
    .with_kind(MessageKind::LocationRequest)
}

pub fn download_confirmation_message(store_url: &str) -> Message {
    Message::from_bot(
        "Perfect! I've opened the Play Store for you. Download the app to unlock all features:\n\n\
         • Instant tailor booking\n\
         • Real-time order tracking\n\
         • Exclusive discounts\n\
         • Full tailor profiles and reviews\n\n\
         Happy tailoring! 🪡",
    )
    .with_quick_replies(["Find tailors", "Track order", "Pricing", "Support"])
    .with_payload(MessagePayload::StoreLink { url: store_url.to_string() })
    .with_kind(MessageKind::DownloadPrompt)
}

#[cfg(test)]
mod tests {
    use tailorlink_core::{MessageKind, MessagePayload, OrderSnapshot, OrderStage};

    use super::{
        canned, canned_message, download_confirmation_message, order_not_found_message,
        order_status_message, welcome_message,
    };
    use crate::intent::Intent;

    #[test]
    fn every_intent_has_text_and_quick_replies() {
        for intent in Intent::ALL {
            let response = canned(intent);
            assert!(!response.text.is_empty(), "missing text for {intent:?}");
            assert!(!response.quick_replies.is_empty(), "missing quick replies for {intent:?}");
        }
    }

    #[test]
    fn canned_message_carries_the_table_entry() {
        let message = canned_message(Intent::Pricing);
        assert_eq!(message.text, canned(Intent::Pricing).text);
        assert_eq!(
            message.quick_replies.as_ref().map(Vec::len),
            Some(canned(Intent::Pricing).quick_replies.len())
        );
        assert!(!message.from_user);
    }

    #[test]
    fn welcome_message_lists_capabilities_and_offers_five_shortcuts() {
        let message = welcome_message();
        assert!(message.text.contains("TailorLink assistant"));
        assert_eq!(message.quick_replies.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn order_status_message_bolds_the_order_number_and_attaches_the_snapshot() {
        let order = OrderSnapshot {
            order_number: "ORD-ABC1234567".to_string(),
            stage: OrderStage::Ready,
            tailor_label: "Tailor #12".to_string(),
            customer_name: "Ama".to_string(),
            customer_phone: "+233200000000".to_string(),
            garment: "Kaftan".to_string(),
            price: 350.0,
            due_amount: 120.0,
            due_date: "2026-08-20T00:00:00Z".to_string(),
            last_updated: "2026-08-01T09:30:00Z".to_string(),
            measurements: vec![],
        };

        let message = order_status_message(order.clone());
        assert!(message.text.contains("**ORD-ABC1234567**"));
        assert_eq!(message.kind, MessageKind::OrderStatus);
        assert!(matches!(
            message.payload,
            Some(MessagePayload::Order { order: ref attached }) if *attached == order
        ));
    }

    #[test]
    fn order_not_found_message_offers_recovery_shortcuts() {
        let message = order_not_found_message("ORD-MISSING123");
        assert!(message.text.contains("couldn't find order \"ORD-MISSING123\""));
        assert_eq!(
            message.quick_replies.as_deref(),
            Some(
                &[
                    "Try again".to_string(),
                    "Download app".to_string(),
                    "Contact support".to_string(),
                    "Main menu".to_string()
                ][..]
            )
        );
    }

    #[test]
    fn download_confirmation_carries_the_store_link() {
        let message = download_confirmation_message("https://store.example/app");
        assert_eq!(message.kind, MessageKind::DownloadPrompt);
        assert!(matches!(
            message.payload,
            Some(MessagePayload::StoreLink { ref url }) if url == "https://store.example/app"
        ));
    }
}
