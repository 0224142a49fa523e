
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Servings;

#[derive(Debug, Serialize, Clone)]
pub struct MealPlanQuery {
    from_date: String,
    to_date: String,
}

impl MealPlanQuery {
    /// query for a single day, both bounds inclusive
    pub fn day(date: NaiveDate) -> Self {
        let date = date.format("%Y-%m-%d").to_string();
        Self {
            from_date: date.clone(),
            to_date: date,
        }
    }

    pub fn from_date(&self) -> &str { &self.from_date }
}


/// one element of the `/api/meal-plan/` array
///
/// only the fields the sensor reads, the rest of the payload is ignored
#[derive(Debug, Deserialize, Clone)]
pub struct ApiPlanEntry {
    pub title: Option<String>,
    pub recipe: Option<ApiRecipe>,
    pub servings: Option<Servings>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ApiRecipe {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl ApiRecipe {
    /// `{}` is sent for plan entries that do not reference a recipe
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
