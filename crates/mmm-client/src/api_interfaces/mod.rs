pub mod auth;
pub mod meal_plan;
pub mod places;
