//! Wire protocol between the embedded chat widget and the server.
//!
//! Inbound: typed widget events (user message, quick reply, clear) routed
//! through an `EventDispatcher`. Outbound: domain messages plus derived
//! render models - `**bold**` span parsing and the order/tailor cards the
//! widget draws as structured blocks.

pub mod cards;
pub mod events;
pub mod markup;

pub use cards::{card_for, order_card, tailor_card, CardRow, MessageCard, OrderCard, TailorCard};
pub use events::{
    ClearChatEvent, DispatchError, EventContext, EventDispatcher, EventHandler, EventHandlerError,
    EventReply, HandlerResult, QuickReplyEvent, UserMessageEvent, WidgetEvent, WidgetEventType,
};
pub use markup::{parse_markup, plain_text, TextSpan};
