use std::time::Duration;

/// The default base URL of the Map My Meal backend
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const PLACES_PATH: &str = "/api/getPlaces";
pub const DISCOUNTS_NOW_PATH: &str = "/api/getDiscountsNow";
pub const TOP_DISCOUNTS_PATH: &str = "/api/getTopDiscounts";
pub const CREATE_DISCOUNT_PATH: &str = "/api/createDiscount";
pub const GENERATE_MEAL_PLAN_PATH: &str = "/api/generateMealPlan";
pub const LOGIN_PATH: &str = "/api/login";

/// Per-place endpoint formats. The replace token is swapped for the place id.
pub const DISCOUNTS_BY_PLACE_PATH_FORMAT: &str = "/api/getDiscountsByPlace/$place_id";
pub const PRODUCTS_BY_PLACE_PATH_FORMAT: &str = "/api/getPlacesProductsByPlace/$place_id";
pub const PLACE_ID_REPLACE_TOKEN: &str = "$place_id";

/// Cookie set by the client itself after login
pub const AUTH_TOKEN_COOKIE: &str = "authToken";
pub const AUTH_TOKEN_COOKIE_DAYS: i64 = 7;
/// httpOnly cookie set through the session relay
pub const SESSION_TOKEN_COOKIE: &str = "token";
pub const SESSION_TOKEN_COOKIE_DAYS: i64 = 1;
/// Browsers cap cookie lifetimes at 400 days.
pub const MAX_COOKIE_DAYS: i64 = 400;

/// Number of placeholder cards shown while a collection loads
pub const SKELETON_COUNT: usize = 4;

/// How long the publish panel stays open after a successful post
pub const PUBLISH_AUTO_CLOSE_DELAY: Duration = Duration::from_secs(2);

// Sheet heights are percentages of the viewport height.
pub const SHEET_MIN_HEIGHT: f64 = 20.0;
pub const SHEET_MAX_HEIGHT: f64 = 100.0;
pub const SHEET_MID_HEIGHT: f64 = 50.0;
pub const SHEET_LOW_THRESHOLD: f64 = 35.0;
pub const SHEET_HIGH_THRESHOLD: f64 = 65.0;

pub const FALLBACK_TITLE: &str = "Untitled";
