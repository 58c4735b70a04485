//! TheMealDB payloads.
//!
//! The upstream shape is flat and loosely typed (twenty numbered
//! ingredient/measure pairs, empty strings for absent values). [`Meal`]
//! is the validated form that the cache stores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StashError};

const RESOURCE: &str = "meals";
const MAX_INGREDIENTS: usize = 20;

/// Meal exactly as returned by the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMeal {
    #[serde(rename = "idMeal", default)]
    pub id_meal: Option<String>,
    #[serde(rename = "strMeal", default)]
    pub str_meal: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub str_category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub str_area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub str_instructions: Option<String>,
    #[serde(rename = "strMealThumb", default)]
    pub str_meal_thumb: Option<String>,
    #[serde(rename = "strTags", default)]
    pub str_tags: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub str_youtube: Option<String>,
    /// Numbered ingredient/measure fields and anything else upstream sends.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawMeal {
    fn numbered(&self, prefix: &str, n: usize) -> Option<&str> {
        self.extra
            .get(&format!("{}{}", prefix, n))
            .and_then(Value::as_str)
    }

    /// Sets ingredient `n` (1-based) and its measure.
    pub fn set_ingredient(&mut self, n: usize, name: &str, measure: &str) {
        self.extra
            .insert(format!("strIngredient{}", n), Value::String(name.to_string()));
        self.extra
            .insert(format!("strMeasure{}", n), Value::String(measure.to_string()));
    }
}

/// Envelope of search and lookup responses. `meals` is `null` when
/// nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealResponse {
    pub meals: Option<Vec<RawMeal>>,
}

impl MealResponse {
    /// Validates every meal of a listing. A `null` listing is empty.
    pub fn into_meals(self) -> Result<Vec<Meal>> {
        self.meals
            .unwrap_or_default()
            .into_iter()
            .map(Meal::try_from)
            .collect()
    }

    /// Validates the single meal of a lookup. A `null` or empty result
    /// means the id does not exist.
    pub fn into_meal(self, id: &str) -> Result<Meal> {
        let mut meals = self.meals.unwrap_or_default();
        match meals.len() {
            0 => Err(StashError::not_found(RESOURCE, id)),
            1 => Meal::try_from(meals.remove(0)),
            n => Err(StashError::validation(
                RESOURCE,
                "meals",
                format!("Expected 1 meal for ID \"{}\" but got {}", id, n),
            )),
        }
    }
}

/// Rejects blank meal ids before any request is made.
pub fn validate_meal_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(StashError::validation(RESOURCE, "idMeal", "Meal ID cannot be empty"));
    }
    Ok(id)
}

/// One ingredient line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

/// Validated meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub category: String,
    pub area: String,
    pub instructions: String,
    pub thumbnail: String,
    pub tags: Vec<String>,
    pub youtube: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

fn required(value: &Option<String>, field: &str, message: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(StashError::validation(RESOURCE, field, message)),
    }
}

impl TryFrom<RawMeal> for Meal {
    type Error = StashError;

    fn try_from(raw: RawMeal) -> Result<Self> {
        let id = required(&raw.id_meal, "idMeal", "Meal must have an ID")?;
        let name = required(&raw.str_meal, "strMeal", "Meal must have a name")?;
        let category = required(&raw.str_category, "strCategory", "Meal must have a category")?;
        let area = required(&raw.str_area, "strArea", "Meal must have an area")?;
        let instructions = required(
            &raw.str_instructions,
            "strInstructions",
            "Meal must have instructions",
        )?;
        let thumbnail = required(&raw.str_meal_thumb, "strMealThumb", "Meal must have a thumbnail")?;

        if !thumbnail.starts_with("http") {
            return Err(StashError::validation(
                RESOURCE,
                "strMealThumb",
                "Meal thumbnail must be a valid URL",
            ));
        }

        let ingredients: Vec<Ingredient> = (1..=MAX_INGREDIENTS)
            .filter_map(|n| {
                let name = raw.numbered("strIngredient", n)?.trim();
                if name.is_empty() {
                    return None;
                }
                let measure = raw.numbered("strMeasure", n).unwrap_or_default().trim();
                Some(Ingredient {
                    name: name.to_string(),
                    measure: measure.to_string(),
                })
            })
            .collect();

        if ingredients.is_empty() {
            return Err(StashError::validation(
                RESOURCE,
                "strIngredient",
                format!("Meal \"{}\" must have at least one ingredient", name),
            ));
        }

        let tags = raw
            .str_tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let youtube = raw.str_youtube.filter(|url| !url.trim().is_empty());

        Ok(Self {
            id,
            name,
            category,
            area,
            instructions,
            thumbnail,
            tags,
            youtube,
            ingredients,
        })
    }
}
