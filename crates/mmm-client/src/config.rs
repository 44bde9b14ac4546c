use crate::constants::DEFAULT_API_URL;

const DEFAULT_LATITUDE: f64 = 25.6514;
const DEFAULT_LONGITUDE: f64 = -100.2906;
const DEFAULT_ZOOM: f64 = 15.0;
const USER_LOCATION_ZOOM: f64 = 16.0;

/// Map provider settings. Every field is optional; a missing field only
/// disables tile signing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapConfig {
    pub region: Option<String>,
    pub name: Option<String>,
    pub api_key: Option<String>,
}

impl MapConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.region.is_none() {
            missing.push("region");
        }
        if self.name.is_none() {
            missing.push("name");
        }
        if self.api_key.is_none() {
            missing.push("api_key");
        }
        missing
    }

    /// Style descriptor URL for the configured map, if region and name are set.
    pub fn style_url(&self) -> Option<String> {
        let region = self.region.as_deref()?;
        let name = self.name.as_deref()?;
        Some(format!(
            "https://maps.geo.{region}.amazonaws.com/maps/v0/maps/{name}/style-descriptor"
        ))
    }

    /// Append the API key to provider URLs that do not already carry one.
    pub fn sign_url(&self, url: &str) -> String {
        let Some(key) = self.api_key.as_deref() else {
            return url.to_string();
        };
        if !url.contains("amazonaws.com") || url.contains("?key=") || url.contains("&key=") {
            return url.to_string();
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}key={key}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    /// Same-origin endpoint that turns a bearer token into an httpOnly cookie.
    pub session_relay_url: Option<String>,
    pub map: MapConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_relay_url: None,
            map: MapConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        let missing = config.map.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(?missing, "map provider settings incomplete");
        }
        config
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            api_url: non_empty("MMM_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            session_relay_url: non_empty("MMM_SESSION_RELAY_URL"),
            map: MapConfig {
                region: non_empty("MMM_MAP_REGION"),
                name: non_empty("MMM_MAP_NAME"),
                api_key: non_empty("MMM_MAP_API_KEY"),
            },
        }
    }
}

/// Initial camera of the map page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapView {
    pub fn centered_on_user(self, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom: USER_LOCATION_ZOOM,
        }
    }
}
