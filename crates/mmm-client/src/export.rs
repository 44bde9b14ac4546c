use chrono::{DateTime, Local};
use std::path::Path;

use crate::{
    error::SaveError,
    meal_plan::{format_amount, MealPlanResponse},
};

pub const LINES_PER_PAGE: usize = 50;
pub const PAGE_BREAK: char = '\u{000C}';
pub const DEFAULT_FILE_NAME: &str = "meal-plan.txt";

/// Printable summary of a generated plan, split into fixed-height pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDocument {
    lines: Vec<String>,
}

impl PlanDocument {
    pub fn from_plan(plan: &MealPlanResponse, generated_at: DateTime<Local>) -> Self {
        let mut lines = vec![
            "Map My Meal - Meal Plan".to_string(),
            format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M")),
            String::new(),
            "Budget summary".to_string(),
            format!("  Total budget:     ${}", format_amount(plan.total_budget)),
            format!("  Days:             {}", plan.days),
            format!("  Total cost:       ${}", format_amount(plan.total_cost)),
            format!("  Remaining budget: ${}", format_amount(plan.remaining_budget)),
        ];

        for daily in &plan.daily_plans {
            lines.push(String::new());
            lines.push(format!(
                "Day {} (total ${})",
                daily.day,
                format_amount(daily.daily_total)
            ));
            for meal in &daily.meals {
                let mut heading = format!(
                    "  {} at {} - ${}",
                    meal.meal_type,
                    meal.place_name,
                    format_amount(meal.total_cost)
                );
                if let Some(discount) = meal.discount_applied.as_deref().filter(|d| !d.is_empty()) {
                    heading.push_str(&format!(" (discount: {discount})"));
                }
                lines.push(heading);
                for product in &meal.products {
                    lines.push(format!(
                        "    {} x{} ${}",
                        product.name,
                        product.quantity,
                        format_amount(product.price)
                    ));
                }
            }
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn pages(&self) -> Vec<&[String]> {
        self.lines.chunks(LINES_PER_PAGE).collect()
    }

    pub fn render(&self) -> String {
        self.pages()
            .iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join(&format!("\n{PAGE_BREAK}\n"))
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_plan::{DailyPlan, Meal, MealType, Product};
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 1, 9, 30, 0).unwrap()
    }

    fn plan() -> MealPlanResponse {
        MealPlanResponse {
            total_budget: 500.0,
            days: 1,
            total_cost: 420.0,
            remaining_budget: 80.0,
            daily_plans: vec![DailyPlan {
                day: 1,
                daily_total: 420.0,
                meals: vec![Meal {
                    meal_type: MealType::Lunch,
                    place_name: "Tacos Don Juan".to_string(),
                    total_cost: 120.5,
                    discount_applied: Some("2x1".to_string()),
                    products: vec![Product {
                        name: "Taco".to_string(),
                        price: 20.0,
                        quantity: 3,
                        ..Product::default()
                    }],
                    ..Meal::default()
                }],
            }],
            ..MealPlanResponse::default()
        }
    }

    #[test]
    fn layout() {
        let document = PlanDocument::from_plan(&plan(), generated_at());
        let lines = document.lines();
        assert_eq!(lines[0], "Map My Meal - Meal Plan");
        assert_eq!(lines[1], "Generated 2025-05-01 09:30");
        assert_eq!(lines[4], "  Total budget:     $500");
        assert_eq!(lines[7], "  Remaining budget: $80");
        assert_eq!(lines[9], "Day 1 (total $420)");
        assert_eq!(lines[10], "  Lunch at Tacos Don Juan - $120.50 (discount: 2x1)");
        assert_eq!(lines[11], "    Taco x3 $20");
        assert_eq!(document.pages().len(), 1);
        assert!(!document.render().contains(PAGE_BREAK));
    }

    #[test]
    fn missing_fields_default() {
        let document = PlanDocument::from_plan(&MealPlanResponse::default(), generated_at());
        assert_eq!(document.lines().len(), 8);
        assert_eq!(document.lines()[5], "  Days:             0");
        assert_eq!(document.lines()[6], "  Total cost:       $0");
    }

    #[test]
    fn paginates_long_plans() {
        let mut plan = plan();
        let meal = plan.daily_plans[0].meals[0].clone();
        plan.daily_plans[0].meals = vec![meal; 30];

        let document = PlanDocument::from_plan(&plan, generated_at());

        // 10 header lines plus two per meal.
        assert_eq!(document.lines().len(), 70);
        let pages = document.pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), LINES_PER_PAGE);
        assert_eq!(pages[1].len(), 20);
        assert_eq!(document.render().matches(PAGE_BREAK).count(), 1);
    }

    #[tokio::test]
    async fn save_writes_rendered_document() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);
        let document = PlanDocument::from_plan(&plan(), generated_at());

        // Act
        let saved = document.save(&path).await;

        // Assert
        assert!(saved.is_ok(), "Failed to save document: {:?}", saved.unwrap_err());
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, document.render());
    }
}
