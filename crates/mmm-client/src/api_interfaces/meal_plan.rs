use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{lenient_opt, lenient_opt_string, lenient_opt_u32};

#[derive(Serialize)]
pub struct Request<'a> {
    pub prompt: &'a str,
}

/// Raw generation envelope. Every field is optional here; validation happens
/// when converting into the plan model.
#[derive(Deserialize)]
pub struct Envelope {
    pub success: Option<bool>,
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "lenient_opt")]
    pub meta: Option<Meta>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub iterations: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub generated_at: Option<String>,
}
