//! Card data model and the cold-start stub run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One analysis finding shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Cards produced by one analysis invocation.
pub type Run = Vec<Card>;

/// Every stored run, oldest first.
pub type RunHistory = Vec<Run>;

impl Card {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Build a card from a JSON object without validating field types.
    ///
    /// Absent or `null` fields become empty strings, strings are taken as-is,
    /// and any other value is kept as its compact JSON text. Returns `None`
    /// when `value` is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            title: field_text(object.get("title")),
            description: field_text(object.get("description")),
        })
    }

    /// Whether a JSON value looks like a serialized card.
    pub fn is_card_shaped(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|o| o.contains_key("title") || o.contains_key("description"))
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Cards served before any analysis has been stored.
pub fn stub_run() -> Run {
    vec![
        Card::new(
            "BUILDING",
            "40% completed. Last floor progress updated 2h ago.",
        ),
        Card::new(
            "FLOOR",
            "4th floor under construction. Materials delivered this morning.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_fills_missing_fields() {
        let card = Card::from_value(&json!({"title": "Crane"})).unwrap();
        assert_eq!(card, Card::new("Crane", ""));

        let card = Card::from_value(&json!({"description": null})).unwrap();
        assert_eq!(card, Card::default());
    }

    #[test]
    fn from_value_keeps_non_string_fields_as_json_text() {
        let card = Card::from_value(&json!({"title": 4, "description": ["a", "b"]})).unwrap();
        assert_eq!(card.title, "4");
        assert_eq!(card.description, r#"["a","b"]"#);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Card::from_value(&json!("title")).is_none());
        assert!(Card::from_value(&json!([{"title": "x"}])).is_none());
    }

    #[test]
    fn card_shape_needs_a_known_key() {
        assert!(Card::is_card_shaped(&json!({"title": "x"})));
        assert!(Card::is_card_shaped(&json!({"description": "y", "extra": 1})));
        assert!(!Card::is_card_shaped(&json!({"name": "x"})));
        assert!(!Card::is_card_shaped(&json!([])));
    }

    #[test]
    fn stub_run_has_two_cards() {
        let stub = stub_run();
        assert_eq!(stub.len(), 2);
        assert_eq!(stub[0].title, "BUILDING");
        assert_eq!(stub[1].title, "FLOOR");
    }

    #[test]
    fn card_serializes_with_both_fields() {
        let json = serde_json::to_value(Card::new("A", "B")).unwrap();
        assert_eq!(json, json!({"title": "A", "description": "B"}));
    }
}
