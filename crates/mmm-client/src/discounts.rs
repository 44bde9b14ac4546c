use derive_builder::Builder;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde_json::Value;
use std::time::Instant;

use crate::{constants::PUBLISH_AUTO_CLOSE_DELAY, error::PostError};

#[derive(Debug, Clone, PartialEq)]
pub struct DiscountImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A discount to publish for one place.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct NewDiscount {
    pub title: String,
    #[builder(default)]
    pub description: String,
    pub price: f64,
    pub place_id: i64,
    pub start_time: String,
    pub end_time: String,
    /// 0..6 Sunday..Saturday, 7 every day, 8 weekends.
    pub day_of_week: u8,
    #[builder(default)]
    pub image: Option<DiscountImage>,
}

impl NewDiscountBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("title must not be empty".to_string());
            }
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(format!("invalid price {price}"));
            }
        }
        if let Some(day) = self.day_of_week {
            if day > 8 {
                return Err(format!("invalid day of week {day}"));
            }
        }
        Ok(())
    }
}

impl NewDiscount {
    pub fn builder() -> NewDiscountBuilder {
        NewDiscountBuilder::default()
    }

    fn into_form(self) -> Form {
        let form = Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("price", self.price.to_string())
            .text("place_id", self.place_id.to_string())
            .text("start_time", self.start_time)
            .text("end_time", self.end_time)
            .text("day_of_week", self.day_of_week.to_string());
        match self.image {
            Some(image) => form.part("image", Part::bytes(image.bytes).file_name(image.file_name)),
            None => form,
        }
    }
}

/// Post a discount as a multipart form. Returns the service's
/// acknowledgement; a body that is not JSON comes back as a string.
pub async fn create(
    client: &Client,
    endpoint: &str,
    token: Option<&str>,
    discount: NewDiscount,
) -> Result<Value, PostError> {
    tracing::info!(%endpoint, place_id = discount.place_id, "publishing discount");
    let mut request = client.post(endpoint).multipart(discount.into_form());
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(PostError::ResponseError(response.status()));
    }
    let body = response.text().await.map_err(PostError::ResponseBodyError)?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success,
    Error(String),
}

/// The form panel used to publish discounts.
#[derive(Debug, Default)]
pub struct PublishPanel {
    open: bool,
    submitting: bool,
    feedback: Option<Feedback>,
    succeeded_at: Option<Instant>,
}

impl PublishPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
        self.feedback = None;
        self.succeeded_at = None;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.succeeded_at = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Build and publish the form, recording the outcome as feedback.
    pub async fn submit(
        &mut self,
        client: &crate::Client,
        form: &NewDiscountBuilder,
    ) -> Result<Value, PostError> {
        self.submitting = true;
        let result = match form.build() {
            Ok(discount) => client.create_discount(discount).await,
            Err(e) => Err(e.into()),
        };
        self.submitting = false;
        self.record(&result, Instant::now());
        result
    }

    fn record(&mut self, result: &Result<Value, PostError>, now: Instant) {
        match result {
            Ok(_) => {
                self.feedback = Some(Feedback::Success);
                self.succeeded_at = Some(now);
            }
            Err(e) => {
                tracing::warn!(error = %e, "publishing discount failed");
                self.feedback = Some(Feedback::Error(e.to_string()));
                self.succeeded_at = None;
            }
        }
    }

    pub fn should_auto_close(&self, now: Instant) -> bool {
        self.open
            && self
                .succeeded_at
                .is_some_and(|at| now.duration_since(at) >= PUBLISH_AUTO_CLOSE_DELAY)
    }

    /// Close the panel once the success delay has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.should_auto_close(now) {
            self.close();
            return true;
        }
        false
    }
}
