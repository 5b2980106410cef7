use serde::Serialize;

/// One run of message text. Bot copy uses `**bold**` spans for emphasis;
/// everything else is plain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum TextSpan {
    Plain(String),
    Bold(String),
}

/// Split message text into plain/bold spans. An unpaired `**` marker is kept
/// as literal text.
pub fn parse_markup(text: &str) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };

        if open > 0 {
            spans.push(TextSpan::Plain(rest[..open].to_string()));
        }
        spans.push(TextSpan::Bold(after_open[..close].to_string()));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(TextSpan::Plain(rest.to_string()));
    }

    spans
}

/// Message text with the bold markers stripped, for logs and fallback
/// rendering.
pub fn plain_text(text: &str) -> String {
    parse_markup(text)
        .into_iter()
        .map(|span| match span {
            TextSpan::Plain(text) | TextSpan::Bold(text) => text,
        })
        .collect()
}
