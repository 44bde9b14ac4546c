use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt, StreamExt};

use crate::{
    client::Client,
    constants::SKELETON_COUNT,
    error::GetError,
    promotions::{CardView, ProductRecord, PromotionRecord, ToCard},
};

pub const EMPTY_MESSAGE: &str = "Nothing here yet. Be the first to post one!";
pub const RELOAD_HINT: &str = "Try reloading the page.";

/// Load state of a single collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionStatus<T> {
    Loading,
    Error(String),
    Empty,
    Ready(Vec<T>),
}

/// What a consumer draws for a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionView {
    Skeletons(usize),
    Error { message: String, hint: &'static str },
    Empty(&'static str),
    Cards(Vec<CardView>),
}

impl<T> CollectionStatus<T> {
    /// An empty list is `Empty`, never `Error`; a failure is never `Empty`.
    pub fn from_result(collection: &str, result: Result<Vec<T>, GetError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => CollectionStatus::Empty,
            Ok(items) => CollectionStatus::Ready(items),
            Err(e) => CollectionStatus::Error(format!("Error loading {collection}: {e}")),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CollectionStatus::Loading)
    }

    pub fn items(&self) -> &[T] {
        match self {
            CollectionStatus::Ready(items) => items,
            _ => &[],
        }
    }
}

impl<T: ToCard> CollectionStatus<T> {
    pub fn view(&self) -> CollectionView {
        match self {
            CollectionStatus::Loading => CollectionView::Skeletons(SKELETON_COUNT),
            CollectionStatus::Error(message) => CollectionView::Error {
                message: message.clone(),
                hint: RELOAD_HINT,
            },
            CollectionStatus::Empty => CollectionView::Empty(EMPTY_MESSAGE),
            CollectionStatus::Ready(items) => {
                CollectionView::Cards(items.iter().map(ToCard::card).collect())
            }
        }
    }
}

/// Identifies one load request. Results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub place_id: i64,
    generation: u64,
}

/// A completed fetch, tagged with the request that issued it.
#[derive(Debug)]
pub enum Arrival {
    Discounts(RequestTicket, Result<Vec<PromotionRecord>, GetError>),
    Products(RequestTicket, Result<Vec<ProductRecord>, GetError>),
}

impl Arrival {
    pub fn ticket(&self) -> RequestTicket {
        match self {
            Arrival::Discounts(ticket, _) | Arrival::Products(ticket, _) => *ticket,
        }
    }
}

/// Discounts and products of one place, each with its own status.
#[derive(Debug)]
pub struct PromotionsLoader {
    generation: u64,
    active: Option<RequestTicket>,
    discounts: CollectionStatus<PromotionRecord>,
    products: CollectionStatus<ProductRecord>,
}

impl Default for PromotionsLoader {
    fn default() -> Self {
        Self {
            generation: 0,
            active: None,
            discounts: CollectionStatus::Loading,
            products: CollectionStatus::Loading,
        }
    }
}

impl PromotionsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load for `place_id`, superseding any outstanding one.
    pub fn begin(&mut self, place_id: i64) -> RequestTicket {
        self.generation += 1;
        let ticket = RequestTicket {
            place_id,
            generation: self.generation,
        };
        tracing::debug!(place_id, generation = self.generation, "loading promotions");
        self.active = Some(ticket);
        self.discounts = CollectionStatus::Loading;
        self.products = CollectionStatus::Loading;
        ticket
    }

    /// Forget the current request; anything still in flight will be discarded.
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.active.take() {
            tracing::debug!(place_id = ticket.place_id, "promotions load cancelled");
        }
        self.generation += 1;
        self.discounts = CollectionStatus::Loading;
        self.products = CollectionStatus::Loading;
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.active == Some(ticket)
    }

    pub fn place_id(&self) -> Option<i64> {
        self.active.map(|ticket| ticket.place_id)
    }

    /// Commit an arrival if it belongs to the current request.
    /// Returns `false` when the arrival was stale and dropped.
    pub fn apply(&mut self, arrival: Arrival) -> bool {
        let ticket = arrival.ticket();
        if !self.is_current(ticket) {
            tracing::debug!(
                place_id = ticket.place_id,
                generation = ticket.generation,
                "discarding stale promotions result"
            );
            return false;
        }
        match arrival {
            Arrival::Discounts(_, result) => {
                if let Err(e) = &result {
                    tracing::warn!(place_id = ticket.place_id, error = %e, "discounts failed");
                }
                self.discounts = CollectionStatus::from_result("discounts", result);
            }
            Arrival::Products(_, result) => {
                if let Err(e) = &result {
                    tracing::warn!(place_id = ticket.place_id, error = %e, "products failed");
                }
                self.products = CollectionStatus::from_result("products", result);
            }
        }
        true
    }

    pub fn discounts(&self) -> &CollectionStatus<PromotionRecord> {
        &self.discounts
    }

    pub fn products(&self) -> &CollectionStatus<ProductRecord> {
        &self.products
    }

    /// Begin a load and drive both fetches to completion, committing each as it lands.
    pub async fn load(&mut self, client: &Client, place_id: i64) {
        let ticket = self.begin(place_id);
        let mut arrivals = fetch(client, ticket);
        while let Some(arrival) = arrivals.next().await {
            self.apply(arrival);
        }
    }
}

/// Issue both fetches for `ticket` concurrently. Arrivals come out in
/// completion order, which is unspecified.
pub fn fetch(client: &Client, ticket: RequestTicket) -> FuturesUnordered<BoxFuture<'_, Arrival>> {
    let pending = FuturesUnordered::new();
    pending.push(
        async move {
            let discounts = client.get_discounts_by_place(ticket.place_id).await;
            Arrival::Discounts(ticket, discounts)
        }
        .boxed(),
    );
    pending.push(
        async move {
            let products = client.get_products_by_place(ticket.place_id).await;
            Arrival::Products(ticket, products)
        }
        .boxed(),
    );
    pending
}

/// The two featured listings of the promotions page.
#[derive(Debug)]
pub struct FeaturedListings {
    pub now: CollectionStatus<PromotionRecord>,
    pub top: CollectionStatus<PromotionRecord>,
}

impl FeaturedListings {
    pub async fn load(client: &Client) -> Self {
        let (now, top) = futures::join!(client.get_discounts_now(), client.get_top_discounts());
        Self {
            now: CollectionStatus::from_result("current discounts", now),
            top: CollectionStatus::from_result("top discounts", top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EndpointConfig;
    use httpmock::prelude::*;
    use regex::Regex;
    use serde_json::json;
    use std::time::Duration;

    fn promotion(title: &str) -> PromotionRecord {
        PromotionRecord {
            title: Some(title.to_string()),
            ..PromotionRecord::default()
        }
    }

    fn titles(loader: &PromotionsLoader) -> Vec<String> {
        loader
            .discounts()
            .items()
            .iter()
            .filter_map(|record| record.title.clone())
            .collect()
    }

    fn client_for(server: &MockServer) -> Client {
        let endpoints = EndpointConfig::new(server.base_url()).unwrap();
        Client::new(reqwest::Client::new(), endpoints)
    }

    #[test]
    fn stale_arrival_is_discarded() {
        let mut loader = PromotionsLoader::new();
        let first = loader.begin(1);
        let second = loader.begin(2);

        assert!(loader.apply(Arrival::Discounts(second, Ok(vec![promotion("two")]))));
        assert!(!loader.apply(Arrival::Discounts(first, Ok(vec![promotion("one")]))));

        assert_eq!(titles(&loader), vec!["two"]);
        assert_eq!(loader.place_id(), Some(2));
    }

    #[test]
    fn reselecting_same_place_still_supersedes() {
        let mut loader = PromotionsLoader::new();
        let first = loader.begin(1);
        let second = loader.begin(1);
        assert_ne!(first, second);
        assert!(!loader.apply(Arrival::Discounts(first, Ok(vec![promotion("old")]))));
        assert!(loader.discounts().is_loading());
    }

    #[test]
    fn cancel_discards_in_flight_results() {
        let mut loader = PromotionsLoader::new();
        let ticket = loader.begin(3);
        loader.cancel();
        assert!(!loader.apply(Arrival::Products(ticket, Ok(vec![ProductRecord::default()]))));
        assert!(loader.products().is_loading());
        assert_eq!(loader.place_id(), None);
    }

    #[test]
    fn collections_are_independent() {
        let mut loader = PromotionsLoader::new();
        let ticket = loader.begin(5);
        loader.apply(Arrival::Products(
            ticket,
            Err(GetError::ResponseError(reqwest::StatusCode::BAD_GATEWAY)),
        ));
        assert!(loader.discounts().is_loading());
        assert!(matches!(loader.products(), CollectionStatus::Error(_)));

        loader.apply(Arrival::Discounts(ticket, Ok(vec![promotion("a")])));
        assert_eq!(titles(&loader), vec!["a"]);
    }

    #[test]
    fn empty_and_error_are_distinct() {
        let empty: CollectionStatus<PromotionRecord> =
            CollectionStatus::from_result("discounts", Ok(vec![]));
        assert_eq!(empty, CollectionStatus::Empty);
        assert_eq!(empty.view(), CollectionView::Empty(EMPTY_MESSAGE));

        let failed: CollectionStatus<PromotionRecord> = CollectionStatus::from_result(
            "discounts",
            Err(GetError::ResponseError(reqwest::StatusCode::NOT_FOUND)),
        );
        match failed.view() {
            CollectionView::Error { message, hint } => {
                assert!(message.contains("404"), "message was {message}");
                assert_eq!(hint, RELOAD_HINT);
            }
            other => panic!("expected error view, got {other:?}"),
        }
    }

    #[test]
    fn loading_renders_skeletons() {
        let loader = PromotionsLoader::new();
        assert_eq!(loader.discounts().view(), CollectionView::Skeletons(SKELETON_COUNT));
    }

    #[tokio::test]
    async fn load_wrapped_and_bare_render_the_same() {
        // Arrange
        let server = MockServer::start_async().await;
        let record = json!({"id": 1, "title": "2x1", "image_url": "a.png", "votes": 3});
        let discounts_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/getDiscountsByPlace/1");
                then.status(200).json_body(json!({ "data": [record.clone()] }));
            })
            .await;
        let products_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/getPlacesProductsByPlace/1");
                then.status(200).json_body(json!([record.clone()]));
            })
            .await;
        let client = client_for(&server);
        let mut loader = PromotionsLoader::new();

        // Act
        loader.load(&client, 1).await;

        // Assert
        let CollectionView::Cards(discount_cards) = loader.discounts().view() else {
            panic!("discounts not ready: {:?}", loader.discounts());
        };
        let CollectionView::Cards(product_cards) = loader.products().view() else {
            panic!("products not ready: {:?}", loader.products());
        };
        assert_eq!(discount_cards, product_cards);
        assert_eq!(discount_cards[0].votes, 3);
        discounts_mock.assert();
        products_mock.assert();
    }

    #[tokio::test]
    async fn loosely_typed_records_are_kept() {
        // Arrange
        let server = MockServer::start_async().await;
        let discounts_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/getDiscountsByPlace/5");
                then.status(200).json_body(json!([
                    {"id": 1, "title": "2x1", "day_of_week": "2", "start_time": "13:00"},
                    {"id": 2, "title": "Combo", "day_of_week": 300},
                    {"id": 3.5, "title": 42, "image_url": false, "place_name": {"x": 1}}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/getPlacesProductsByPlace/5");
                then.status(200)
                    .json_body(json!([{"id": "p-1", "name": ["Latte"], "image": 7}]));
            })
            .await;
        let client = client_for(&server);
        let mut loader = PromotionsLoader::new();

        // Act
        loader.load(&client, 5).await;

        // Assert
        let CollectionView::Cards(cards) = loader.discounts().view() else {
            panic!("discounts not ready: {:?}", loader.discounts());
        };
        let labels: Vec<_> = cards.iter().map(|card| card.label.as_str()).collect();
        assert_eq!(labels, vec!["2x1", "Combo", "42"]);
        assert_eq!(cards[0].schedule.as_deref(), Some("Tuesday, 1:00 PM"));
        assert_eq!(cards[1].schedule, None);
        assert_eq!(cards[2].key, "42");
        assert_eq!(cards[2].image, "");
        let CollectionView::Cards(products) = loader.products().view() else {
            panic!("products not ready: {:?}", loader.products());
        };
        assert_eq!(products[0].label, "Untitled");
        assert_eq!(products[0].key, "p-1");
        assert_eq!(products[0].image, "7");
        discounts_mock.assert();
    }

    #[tokio::test]
    async fn load_failure_does_not_block_other_collection() {
        // Arrange
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/api/getDiscountsByPlace/9");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/api/getPlacesProductsByPlace/9");
                then.status(200).json_body(json!([]));
            })
            .await;
        let client = client_for(&server);
        let mut loader = PromotionsLoader::new();

        // Act
        loader.load(&client, 9).await;

        // Assert
        match loader.discounts() {
            CollectionStatus::Error(message) => assert!(message.contains("500")),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(loader.products(), &CollectionStatus::Empty);
    }

    #[tokio::test]
    async fn slow_superseded_response_is_discarded() {
        // Arrange
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/api/getDiscountsByPlace/1");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(json!([{"title": "one"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/api/getDiscountsByPlace/2");
                then.status(200).json_body(json!([{"title": "two"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path_matches(Regex::new("^/api/getPlacesProductsByPlace/").unwrap());
                then.status(200).json_body(json!([]));
            })
            .await;
        let client = client_for(&server);
        let mut loader = PromotionsLoader::new();

        // Act
        let first = loader.begin(1);
        let second = loader.begin(2);
        let (mut slow, mut fast) = (fetch(&client, first), fetch(&client, second));
        while let Some(arrival) = fast.next().await {
            loader.apply(arrival);
        }
        let mut discarded = 0;
        while let Some(arrival) = slow.next().await {
            if !loader.apply(arrival) {
                discarded += 1;
            }
        }

        // Assert
        assert_eq!(discarded, 2);
        assert_eq!(titles(&loader), vec!["two"]);
    }

    #[tokio::test]
    async fn featured_listings_load_concurrently() {
        // Arrange
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/api/getDiscountsNow");
                then.status(200).json_body(json!([{"title": "now"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/api/getTopDiscounts");
                then.status(503);
            })
            .await;
        let client = client_for(&server);

        // Act
        let listings = FeaturedListings::load(&client).await;

        // Assert
        assert_eq!(listings.now.items().len(), 1);
        assert!(matches!(listings.top, CollectionStatus::Error(_)));
    }
}
