use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single product record scraped from one platform.
///
/// Only `title` and `platform` take part in matching. The remaining fields
/// are carried through exactly as the ingestion side wrote them, whatever
/// their JSON type.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Listing {
    pub fn new(platform: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(Value::from(price));
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(Value::from(link.into()));
        self
    }

    /// Price as a number when it is a JSON number or a numeric string.
    pub fn price_amount(&self) -> Option<f64> {
        match self.price.as_ref()? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().replace(',', "").parse().ok(),
            _ => None,
        }
    }

    /// Link when it is a JSON string.
    pub fn link_url(&self) -> Option<&str> {
        self.link.as_ref().and_then(Value::as_str)
    }
}

/// A listing annotated by the clustering engine.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub group_id: usize,
    /// `true` when the listing was linked to at least one other listing.
    pub matched: bool,
}
