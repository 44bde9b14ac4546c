use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::{
    auth,
    constants::*,
    discounts::{self, NewDiscount},
    error::{GenerateError, GetError, LoginError, PostError},
    meal_plan::{self, GeneratedPlan},
    places::Places,
    promotions::{ProductRecord, PromotionRecord},
    util::normalize_collection,
};

#[derive(Clone, Debug)]
pub struct Client {
    http_client: reqwest::Client,
    endpoints: EndpointConfig,
    token: Option<String>,
}

/// URL format with a token standing in for a path parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub replace_token: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum EndpointConfigError {
    #[error("the base URL is missing")]
    MissingBaseUrl,
    #[error("the base URL `{0}` is not an http(s) URL")]
    InvalidBaseUrl(String),
    #[error("the replace token is missing")]
    MissingReplaceToken,
    #[error("the replace token provided is not in the endpoint format")]
    ReplaceTokenNotInEndpoint,
}

impl Endpoint {
    pub fn try_new(
        endpoint_format: String,
        replace_token: String,
    ) -> Result<Self, EndpointConfigError> {
        if replace_token.is_empty() {
            return Err(EndpointConfigError::MissingReplaceToken);
        }
        if !endpoint_format.contains(&replace_token) {
            return Err(EndpointConfigError::ReplaceTokenNotInEndpoint);
        }
        Ok(Self {
            url: endpoint_format,
            replace_token,
        })
    }

    pub fn to_url(&self, place_id: i64) -> String {
        self.url.replace(&self.replace_token, &place_id.to_string())
    }
}

/// Every backend URL the client talks to, derived from one base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointConfig {
    base_url: String,
    discounts_by_place: Endpoint,
    products_by_place: Endpoint,
    session_relay: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, EndpointConfigError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(EndpointConfigError::MissingBaseUrl);
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(EndpointConfigError::InvalidBaseUrl(base_url));
        }
        let discounts_by_place = Endpoint::try_new(
            format!("{base_url}{DISCOUNTS_BY_PLACE_PATH_FORMAT}"),
            PLACE_ID_REPLACE_TOKEN.to_string(),
        )?;
        let products_by_place = Endpoint::try_new(
            format!("{base_url}{PRODUCTS_BY_PLACE_PATH_FORMAT}"),
            PLACE_ID_REPLACE_TOKEN.to_string(),
        )?;
        Ok(Self {
            base_url,
            discounts_by_place,
            products_by_place,
            session_relay: None,
        })
    }

    pub fn with_session_relay(mut self, url: Option<String>) -> Self {
        self.session_relay = url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn discounts_by_place(&self, place_id: i64) -> String {
        self.discounts_by_place.to_url(place_id)
    }

    pub fn products_by_place(&self, place_id: i64) -> String {
        self.products_by_place.to_url(place_id)
    }

    pub fn session_relay(&self) -> Option<&str> {
        self.session_relay.as_deref()
    }
}

impl Client {
    pub fn new(http_client: reqwest::Client, endpoints: EndpointConfig) -> Self {
        Self {
            http_client,
            endpoints,
            token: None,
        }
    }

    /// Attach a bearer token to authenticated requests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub async fn get_places(&self) -> Result<Places, GetError> {
        Places::get_custom(&self.http_client, &self.endpoints.url(PLACES_PATH)).await
    }

    pub async fn get_discounts_by_place(
        &self,
        place_id: i64,
    ) -> Result<Vec<PromotionRecord>, GetError> {
        self.get_collection(&self.endpoints.discounts_by_place(place_id))
            .await
    }

    pub async fn get_products_by_place(
        &self,
        place_id: i64,
    ) -> Result<Vec<ProductRecord>, GetError> {
        self.get_collection(&self.endpoints.products_by_place(place_id))
            .await
    }

    pub async fn get_discounts_now(&self) -> Result<Vec<PromotionRecord>, GetError> {
        self.get_collection(&self.endpoints.url(DISCOUNTS_NOW_PATH))
            .await
    }

    pub async fn get_top_discounts(&self) -> Result<Vec<PromotionRecord>, GetError> {
        self.get_collection(&self.endpoints.url(TOP_DISCOUNTS_PATH))
            .await
    }

    pub async fn create_discount(&self, discount: NewDiscount) -> Result<Value, PostError> {
        discounts::create(
            &self.http_client,
            &self.endpoints.url(CREATE_DISCOUNT_PATH),
            self.token.as_deref(),
            discount,
        )
        .await
    }

    pub async fn generate_meal_plan(&self, prompt: &str) -> Result<GeneratedPlan, GenerateError> {
        meal_plan::generate(
            &self.http_client,
            &self.endpoints.url(GENERATE_MEAL_PLAN_PATH),
            self.token.as_deref(),
            prompt,
        )
        .await
    }

    /// Log in and return the bearer token. The token is relayed to the
    /// session endpoint when one is configured.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, LoginError> {
        let token = auth::login(
            &self.http_client,
            &self.endpoints.url(LOGIN_PATH),
            email,
            password,
        )
        .await?;
        if let Some(relay) = self.endpoints.session_relay() {
            auth::relay_token(&self.http_client, relay, &token).await?;
        }
        Ok(token)
    }

    async fn get_collection<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, GetError> {
        tracing::debug!(%url, "fetching collection");
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GetError::ResponseError(response.status()));
        }
        let body = response.text().await.map_err(GetError::ResponseBodyError)?;
        let parsed_body: Value = serde_json::from_str(&body)?;
        Ok(normalize_collection(parsed_body))
    }
}
