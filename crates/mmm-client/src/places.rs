use crate::{api_interfaces::places, error::*, util::normalize_collection};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, path::Path};

/// Rating as sent by the backend: a number or a free-form label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Rating {
    Score(f64),
    Label(String),
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Score(score) => write!(f, "{score:.1}"),
            Rating::Label(label) => f.write_str(label),
        }
    }
}

/// A venue shown as a map marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Place {
    /// Marker position as `(longitude, latitude)`, the order map views expect.
    pub fn marker(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

/// The set of places loaded for one map session.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Places(Vec<Place>);

impl Places {
    /// Retrieve all places from the place list endpoint.
    pub async fn get_custom(client: &Client, endpoint: &str) -> Result<Self, GetError> {
        tracing::debug!(%endpoint, "fetching places");
        let response = client.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(GetError::ResponseError(response.status()));
        }
        let response_body = response.text().await.map_err(GetError::ResponseBodyError)?;
        let parsed_body: Value = serde_json::from_str(&response_body)?;
        Ok(Places(to_places(normalize_collection(parsed_body))))
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let file_contents = tokio::fs::read_to_string(path).await?;
        Ok(Self(serde_json::from_str(file_contents.as_str())?))
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        let serialized = serde_json::to_string(&self.0)?;
        tokio::fs::write(path, serialized).await?;
        Ok(())
    }

    pub fn get(&self, id: i64) -> Option<&Place> {
        self.0.iter().find(|place| place.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Place> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Place>> for Places {
    fn from(places: Vec<Place>) -> Self {
        Places(places)
    }
}

impl IntoIterator for Places {
    type Item = Place;
    type IntoIter = std::vec::IntoIter<Place>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn to_rating(value: Value) -> Option<Rating> {
    match value {
        Value::Number(number) => number.as_f64().map(Rating::Score),
        Value::String(label) => match label.trim().parse::<f64>() {
            Ok(score) => Some(Rating::Score(score)),
            Err(_) => Some(Rating::Label(label)),
        },
        _ => None,
    }
}

/// Places without usable coordinates cannot be drawn and are dropped.
fn to_places(raw: Vec<places::Place>) -> Vec<Place> {
    raw.into_iter()
        .filter_map(|place| match (place.latitude, place.longitude) {
            (Some(latitude), Some(longitude)) => Some(Place {
                id: place.id,
                name: place.name.unwrap_or_default(),
                latitude,
                longitude,
                description: place.description,
                image_url: place.image_url,
                rating: place.rating.and_then(to_rating),
                address: place.address,
            }),
            _ => {
                tracing::warn!(place_id = place.id, "place has no coordinates");
                None
            }
        })
        .collect()
}
