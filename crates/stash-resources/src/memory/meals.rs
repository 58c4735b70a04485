use std::time::Duration;

use async_trait::async_trait;
use stash_core::Result;
use stash_core::model::{Meal, MealResponse, RawMeal, validate_meal_id};

use super::{CallLog, simulate_latency};
use crate::transport::MealTransport;

/// Serves a fixed set of raw meals.
///
/// Payloads go through the same validation as upstream responses, so an
/// incomplete fixture fails the fetch that reads it.
#[derive(Debug, Default)]
pub struct StaticMealTransport {
    meals: Vec<RawMeal>,
    calls: CallLog,
    latency: Duration,
}

impl StaticMealTransport {
    pub fn new(meals: Vec<RawMeal>) -> Self {
        Self {
            meals,
            ..Self::default()
        }
    }

    /// A small catalogue of well-formed meals.
    pub fn sample() -> Self {
        Self::new(vec![
            raw_meal(
                "52874",
                "Beef and Mustard Pie",
                "Beef",
                "British",
                "Meat,Pie",
                &[("Beef", "1kg"), ("Plain Flour", "2 tbs"), ("English Mustard", "2 tbs")],
            ),
            raw_meal(
                "52772",
                "Teriyaki Chicken Casserole",
                "Chicken",
                "Japanese",
                "Meat,Casserole",
                &[("soy sauce", "3/4 cup"), ("water", "1/2 cup"), ("chicken thighs", "2")],
            ),
            raw_meal(
                "52771",
                "Spicy Arrabiata Penne",
                "Vegetarian",
                "Italian",
                "Pasta,Curry",
                &[("penne rigate", "1 pound"), ("olive oil", "1/4 cup"), ("garlic", "3 cloves")],
            ),
        ])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls made to `operation` ("all" or "by_id").
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.count(operation)
    }
}

fn raw_meal(
    id: &str,
    name: &str,
    category: &str,
    area: &str,
    tags: &str,
    ingredients: &[(&str, &str)],
) -> RawMeal {
    let mut meal = RawMeal {
        id_meal: Some(id.to_string()),
        str_meal: Some(name.to_string()),
        str_category: Some(category.to_string()),
        str_area: Some(area.to_string()),
        str_instructions: Some(format!("Prepare the {}.", name.to_lowercase())),
        str_meal_thumb: Some(format!("https://www.themealdb.com/images/media/meals/{}.jpg", id)),
        str_tags: Some(tags.to_string()),
        ..RawMeal::default()
    };
    for (n, (ingredient, measure)) in ingredients.iter().enumerate() {
        meal.set_ingredient(n + 1, ingredient, measure);
    }
    meal
}

#[async_trait]
impl MealTransport for StaticMealTransport {
    async fn all(&self) -> Result<Vec<Meal>> {
        self.calls.record("all");
        simulate_latency(self.latency).await;
        MealResponse {
            meals: Some(self.meals.clone()),
        }
        .into_meals()
    }

    async fn by_id(&self, id: &str) -> Result<Meal> {
        self.calls.record("by_id");
        let id = validate_meal_id(id)?;
        simulate_latency(self.latency).await;

        let found: Vec<_> = self
            .meals
            .iter()
            .filter(|meal| meal.id_meal.as_deref() == Some(id))
            .cloned()
            .collect();
        MealResponse {
            meals: (!found.is_empty()).then_some(found),
        }
        .into_meal(id)
    }

    fn name(&self) -> &str {
        "static-meals"
    }
}
