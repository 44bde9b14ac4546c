use serde::Deserialize;
use serde_json::Value;

use crate::util::lenient_opt_f64;

// Request structure is omitted since the place list is a plain GET.

/// Raw place entry from the API. Coordinates are sometimes sent as strings.
#[derive(Deserialize)]
pub struct Place {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub address: Option<String>,
}
