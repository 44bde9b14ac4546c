use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};

use crate::{
    constants::FALLBACK_TITLE,
    util::{lenient_opt, lenient_opt_f64, lenient_opt_string, lenient_opt_u8},
};

static TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})").expect("Invalid regex pattern"));

/// Identifier that the backend sends either as a number or as a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

/// A discount attached to a place. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromotionRecord {
    #[serde(default, deserialize_with = "lenient_opt")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "image", deserialize_with = "lenient_opt_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub votes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub price: Option<f64>,
    #[serde(default, alias = "startTime", deserialize_with = "lenient_opt_string")]
    pub start_time: Option<String>,
    #[serde(default, alias = "endTime", deserialize_with = "lenient_opt_string")]
    pub end_time: Option<String>,
    #[serde(default, alias = "dayOfWeek", deserialize_with = "lenient_opt_u8")]
    pub day_of_week: Option<u8>,
    #[serde(default, alias = "placeName", deserialize_with = "lenient_opt_string")]
    pub place_name: Option<String>,
}

/// A product sold at a place. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    #[serde(default, deserialize_with = "lenient_opt")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "image", deserialize_with = "lenient_opt_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub votes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub price: Option<f64>,
}

/// What a card needs to render, with every fallback already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub key: String,
    pub label: String,
    pub image: String,
    pub votes: i64,
    pub price: Option<String>,
    pub schedule: Option<String>,
}

/// Records that render as a card.
pub trait ToCard {
    fn card(&self) -> CardView;
}

fn label_or_fallback(primary: &Option<String>, secondary: &Option<String>) -> String {
    primary
        .as_deref()
        .or(secondary.as_deref())
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

fn votes_or_zero(votes: Option<f64>) -> i64 {
    votes.map(|votes| votes.round() as i64).unwrap_or(0)
}

impl ToCard for PromotionRecord {
    fn card(&self) -> CardView {
        let label = label_or_fallback(&self.title, &self.name);
        CardView {
            key: self
                .id
                .as_ref()
                .map(RecordId::to_string)
                .unwrap_or_else(|| label.clone()),
            image: self.image_url.clone().unwrap_or_default(),
            votes: votes_or_zero(self.votes),
            price: format_price(self.price),
            schedule: self.schedule(),
            label,
        }
    }
}

impl PromotionRecord {
    /// "Monday, 1:00 PM - 3:30 PM" style summary of when the offer applies.
    pub fn schedule(&self) -> Option<String> {
        let day = self.day_of_week.and_then(day_name);
        let start = self.start_time.as_deref().and_then(format_time);
        let end = self.end_time.as_deref().and_then(format_time);
        let hours = match (start, end) {
            (Some(start), Some(end)) => Some(format!("{start} - {end}")),
            (Some(start), None) => Some(start),
            (None, Some(end)) => Some(end),
            (None, None) => None,
        };
        match (day, hours) {
            (Some(day), Some(hours)) => Some(format!("{day}, {hours}")),
            (Some(day), None) => Some(day.to_string()),
            (None, hours) => hours,
        }
    }
}

impl ToCard for ProductRecord {
    fn card(&self) -> CardView {
        let label = label_or_fallback(&self.name, &self.title);
        CardView {
            key: self
                .id
                .as_ref()
                .map(RecordId::to_string)
                .unwrap_or_else(|| label.clone()),
            image: self.image_url.clone().unwrap_or_default(),
            votes: votes_or_zero(self.votes),
            price: format_price(self.price),
            schedule: None,
            label,
        }
    }
}

/// Day names as used by the discount form; 7 and 8 are recurring schedules.
pub fn day_name(day: u8) -> Option<&'static str> {
    match day {
        0 => Some("Sunday"),
        1 => Some("Monday"),
        2 => Some("Tuesday"),
        3 => Some("Wednesday"),
        4 => Some("Thursday"),
        5 => Some("Friday"),
        6 => Some("Saturday"),
        7 => Some("Every day"),
        8 => Some("Weekends"),
        _ => None,
    }
}

/// `HH:MM[:SS]` to a 12 hour clock.
pub fn format_time(time: &str) -> Option<String> {
    let captures = TIME_REGEX.captures(time)?;
    let hour: u32 = captures[1].parse().ok()?;
    if hour > 23 {
        return None;
    }
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    Some(format!("{display_hour}:{} {suffix}", &captures[2]))
}

pub fn format_price(price: Option<f64>) -> Option<String> {
    price
        .filter(|price| price.is_finite())
        .map(|price| format!("{price:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn promotion_defaults_missing_fields() {
        let record: PromotionRecord = serde_json::from_value(json!({})).unwrap();
        let card = record.card();
        assert_eq!(card.label, FALLBACK_TITLE);
        assert_eq!(card.key, FALLBACK_TITLE);
        assert_eq!(card.image, "");
        assert_eq!(card.votes, 0);
        assert_eq!(card.price, None);
        assert_eq!(card.schedule, None);
    }

    #[test]
    fn promotion_card_from_backend_record() {
        let record: PromotionRecord = serde_json::from_value(json!({
            "id": 4,
            "title": "2x1 en Cafés",
            "image_url": "https://img.example.com/4.png",
            "votes": "17",
            "price": "35.5",
            "start_time": "13:00:00",
            "end_time": "15:30",
            "day_of_week": 2
        }))
        .unwrap();
        let card = record.card();
        assert_eq!(card.key, "4");
        assert_eq!(card.label, "2x1 en Cafés");
        assert_eq!(card.image, "https://img.example.com/4.png");
        assert_eq!(card.votes, 17);
        assert_eq!(card.price.as_deref(), Some("35.50"));
        assert_eq!(
            card.schedule.as_deref(),
            Some("Tuesday, 1:00 PM - 3:30 PM")
        );
    }

    #[test]
    fn product_uses_name_then_title() {
        let record: ProductRecord =
            serde_json::from_value(json!({"id": "p-1", "title": "Combo", "imageUrl": "x.png"}))
                .unwrap();
        let card = record.card();
        assert_eq!(card.key, "p-1");
        assert_eq!(card.label, "Combo");
        assert_eq!(card.image, "x.png");

        let named = ProductRecord {
            name: Some("Burrito".to_string()),
            title: Some("Combo".to_string()),
            ..ProductRecord::default()
        };
        assert_eq!(named.card().label, "Burrito");
    }

    #[test]
    fn day_names() {
        assert_eq!(day_name(0), Some("Sunday"));
        assert_eq!(day_name(7), Some("Every day"));
        assert_eq!(day_name(8), Some("Weekends"));
        assert_eq!(day_name(9), None);
    }

    #[test]
    fn times() {
        assert_eq!(format_time("00:05").as_deref(), Some("12:05 AM"));
        assert_eq!(format_time("12:00").as_deref(), Some("12:00 PM"));
        assert_eq!(format_time("23:59:00").as_deref(), Some("11:59 PM"));
        assert_eq!(format_time("noon"), None);
        assert_eq!(format_time("25:00"), None);
    }

    #[test]
    fn prices() {
        assert_eq!(format_price(Some(3.0)).as_deref(), Some("3.00"));
        assert_eq!(format_price(Some(f64::NAN)), None);
        assert_eq!(format_price(None), None);
    }
}
