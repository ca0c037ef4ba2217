//! Text-clip content.
//!
//! A text clip is rendered either from a plain string or from a
//! structured receipt card (header, labeled line items, total).

use serde::{Deserialize, Serialize};

/// One labeled line item on a receipt card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub label: String,
    pub value: String,
}

impl ReceiptLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Content for a rendered text clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextContent {
    /// A single centered text block
    Plain { text: String },
    /// A receipt card: header, ordered line items, total row
    Receipt {
        header: String,
        lines: Vec<ReceiptLine>,
        total: String,
    },
}

impl TextContent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn receipt(
        header: impl Into<String>,
        lines: Vec<ReceiptLine>,
        total: impl Into<String>,
    ) -> Self {
        Self::Receipt {
            header: header.into(),
            lines,
            total: total.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_serde_round_trip() {
        let content = TextContent::receipt(
            "Your Quote",
            vec![
                ReceiptLine::new("Base cover", "$120.00"),
                ReceiptLine::new("Roadside assist", "$14.50"),
            ],
            "$134.50",
        );

        let json = serde_json::to_string(&content).expect("serialize TextContent");
        assert!(json.contains("\"type\":\"receipt\""));

        let decoded: TextContent = serde_json::from_str(&json).expect("deserialize TextContent");
        assert_eq!(decoded, content);
    }

    #[test]
    fn plain_content_tag() {
        let json = serde_json::to_string(&TextContent::plain("Jane")).unwrap();
        assert!(json.contains("\"type\":\"plain\""));
    }
}
