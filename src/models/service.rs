use serde::{Deserialize, Serialize};

use super::wire;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "wire::decimal")]
    pub price: f64,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "default_available")]
    pub availability: bool,
    #[serde(default)]
    pub provider_name: Option<String>,
}

fn default_available() -> bool {
    true
}

impl ServiceCatalogEntry {
    pub fn availability_label(&self) -> &'static str {
        if self.availability {
            "Available"
        } else {
            "Unavailable"
        }
    }
}
