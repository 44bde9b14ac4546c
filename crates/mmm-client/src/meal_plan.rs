use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

pub use crate::api_interfaces::meal_plan::Meta;

use crate::{
    api_interfaces::meal_plan::{Envelope, Request},
    error::GenerateError,
    promotions::RecordId,
    util::{collection, lenient_f64, lenient_opt, lenient_opt_string, lenient_string, lenient_u32},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    #[default]
    Other,
}

impl MealType {
    fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Other => "other",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Other => "Meal",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for MealType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        let Some(Value::String(label)) = value else {
            return Ok(MealType::Other);
        };
        Ok(match label.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            _ => MealType::Other,
        })
    }
}

impl Serialize for MealType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "lenient_opt")]
    pub product_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(default)]
    pub meal_type: MealType,
    #[serde(default, deserialize_with = "lenient_opt")]
    pub place_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub place_name: String,
    #[serde(default, deserialize_with = "collection")]
    pub products: Vec<Product>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_cost: f64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub discount_applied: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub day: u32,
    #[serde(default, deserialize_with = "collection")]
    pub meals: Vec<Meal>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub daily_total: f64,
}

/// A generated plan. Totals are the service's figures and are never
/// recomputed from the meals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_budget: f64,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub days: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub health_level: u32,
    #[serde(default, deserialize_with = "collection")]
    pub daily_plans: Vec<DailyPlan>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_cost: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub remaining_budget: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlan {
    pub plan: MealPlanResponse,
    pub meta: Option<Meta>,
}

/// Whole amounts print without decimals, anything else with two.
pub fn format_amount(amount: f64) -> String {
    if amount.is_finite() && amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

/// Validate the `{success, data, meta}` envelope and extract the plan.
pub fn parse_envelope(body: &str) -> Result<GeneratedPlan, GenerateError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.success != Some(true) {
        return Err(GenerateError::MalformedEnvelope("success flag is missing or false"));
    }
    let data = match envelope.data {
        Some(data) if data.is_object() => data,
        Some(_) => return Err(GenerateError::MalformedEnvelope("data is not an object")),
        None => return Err(GenerateError::MalformedEnvelope("data is missing")),
    };
    Ok(GeneratedPlan {
        plan: serde_json::from_value(data)?,
        meta: envelope.meta,
    })
}

/// Ask the generation service for a plan. This call can take a long time.
pub async fn generate(
    client: &Client,
    endpoint: &str,
    token: Option<&str>,
    prompt: &str,
) -> Result<GeneratedPlan, GenerateError> {
    tracing::info!(%endpoint, "requesting meal plan");
    let mut request = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&Request { prompt })?);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(GenerateError::ResponseError(response.status()));
    }
    let body = response
        .text()
        .await
        .map_err(GenerateError::ResponseBodyError)?;
    parse_envelope(&body)
}
