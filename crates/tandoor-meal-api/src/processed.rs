use std::fmt;

use serde::{Deserialize, Serialize};

use super::raw;

pub const NO_MEAL_PLAN: &str = "No meal plan";

/// servings exactly as the upstream sent them
///
/// depending on the tandoor version this is a json number or a decimal string,
/// the textual form is kept so links render the same value the web ui shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Servings {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Servings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Servings::Number(n) => write!(f, "{n}"),
            Servings::Text(s) => f.write_str(s),
        }
    }
}

/// a meal plan entry, either pointing at a catalogued recipe or just a title
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry {
    StructuredRecipe {
        name: Option<String>,
        id: Option<u64>,
        image: Option<String>,
        servings: Option<Servings>,
        note: Option<String>,
    },
    FreeformNote {
        title: Option<String>,
        servings: Option<Servings>,
        note: Option<String>,
    },
}

impl From<raw::ApiPlanEntry> for PlanEntry {
    fn from(value: raw::ApiPlanEntry) -> Self {
        match value.recipe {
            Some(recipe) if !recipe.is_empty() => PlanEntry::StructuredRecipe {
                name: recipe.name,
                id: recipe.id,
                image: recipe.image,
                servings: value.servings,
                note: value.note,
            },
            _ => PlanEntry::FreeformNote {
                title: value.title,
                servings: value.servings,
                note: value.note,
            },
        }
    }
}

impl PlanEntry {
    pub fn into_record(self, base_url: &str) -> MealPlanRecord {
        match self {
            PlanEntry::StructuredRecipe { name, id, image, servings, note } => {
                let recipe_url = id.map(|id| match &servings {
                    Some(s) => format!("{base_url}/view/recipe/{id}?servings={s}"),
                    None => format!("{base_url}/view/recipe/{id}"),
                });

                MealPlanRecord {
                    recipe_name: name,
                    recipe_id: id,
                    recipe_image: image,
                    servings,
                    note,
                    recipe_url,
                }
            },
            PlanEntry::FreeformNote { title, servings, note } => MealPlanRecord {
                recipe_name: title,
                recipe_id: None,
                recipe_image: None,
                servings,
                note,
                recipe_url: Some(format!("{base_url}/plan/")),
            },
        }
    }
}

/// flattened view of today's meal
///
/// every field is always serialized, missing values become `null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRecord {
    pub recipe_name: Option<String>,
    pub recipe_id: Option<u64>,
    pub recipe_image: Option<String>,
    pub servings: Option<Servings>,
    pub note: Option<String>,
    pub recipe_url: Option<String>,
}

impl MealPlanRecord {
    pub fn no_meal_plan() -> Self {
        Self {
            recipe_name: Some(NO_MEAL_PLAN.into()),
            recipe_id: None,
            recipe_image: None,
            servings: None,
            note: None,
            recipe_url: None,
        }
    }

    /// only the first entry is used when several are planned for the day
    pub fn from_entries(
        entries: Vec<raw::ApiPlanEntry>, base_url: &str,
    ) -> Self {
        match entries.into_iter().next() {
            Some(entry) => PlanEntry::from(entry).into_record(base_url),
            None => Self::no_meal_plan(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://recipes.example";

    fn entries(json: &str) -> Vec<raw::ApiPlanEntry> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_plan_is_sentinel() {
        let record = MealPlanRecord::from_entries(Vec::new(), BASE);

        assert_eq!(record, MealPlanRecord::no_meal_plan());
        assert_eq!(record.recipe_name.as_deref(), Some(NO_MEAL_PLAN));
        assert!(record.recipe_id.is_none());
        assert!(record.recipe_url.is_none());
    }

    #[test]
    fn structured_recipe_links_to_recipe() {
        let record = MealPlanRecord::from_entries(entries(r#"[{
            "title": "",
            "recipe": { "id": 42, "name": "Pad Thai", "image": "https://img/42.jpg" },
            "servings": 4,
            "note": "double the peanuts"
        }]"#), BASE);

        assert_eq!(record.recipe_name.as_deref(), Some("Pad Thai"));
        assert_eq!(record.recipe_id, Some(42));
        assert_eq!(record.recipe_image.as_deref(), Some("https://img/42.jpg"));
        assert_eq!(record.note.as_deref(), Some("double the peanuts"));
        assert_eq!(
            record.recipe_url.as_deref(),
            Some("https://recipes.example/view/recipe/42?servings=4"),
        );
    }

    #[test]
    fn servings_keep_upstream_formatting() {
        let record = MealPlanRecord::from_entries(entries(r#"[{
            "recipe": { "id": 7, "name": "Soup" },
            "servings": "2.5000"
        }]"#), BASE);

        assert_eq!(record.servings, Some(Servings::Text("2.5000".into())));
        assert_eq!(
            record.recipe_url.as_deref(),
            Some("https://recipes.example/view/recipe/7?servings=2.5000"),
        );

        let record = MealPlanRecord::from_entries(entries(r#"[{
            "recipe": { "id": 7, "name": "Soup" },
            "servings": 1.5
        }]"#), BASE);
        assert_eq!(
            record.recipe_url.as_deref(),
            Some("https://recipes.example/view/recipe/7?servings=1.5"),
        );
    }

    #[test]
    fn structured_recipe_without_servings_omits_query() {
        let record = MealPlanRecord::from_entries(entries(r#"[{
            "recipe": { "id": 9, "name": "Toast" }
        }]"#), BASE);

        assert_eq!(
            record.recipe_url.as_deref(),
            Some("https://recipes.example/view/recipe/9"),
        );
    }

    #[test]
    fn freeform_entry_uses_title() {
        let record = MealPlanRecord::from_entries(entries(r#"[{
            "title": "Eat out",
            "recipe": null,
            "servings": 2,
            "note": "pizza place"
        }]"#), BASE);

        assert_eq!(record.recipe_name.as_deref(), Some("Eat out"));
        assert!(record.recipe_id.is_none());
        assert!(record.recipe_image.is_none());
        assert_eq!(record.note.as_deref(), Some("pizza place"));
        assert_eq!(record.recipe_url.as_deref(), Some("https://recipes.example/plan/"));
    }

    #[test]
    fn empty_recipe_object_is_freeform() {
        let entry = entries(r#"[{ "title": "Salad", "recipe": {} }]"#)
            .remove(0);

        assert!(matches!(
            PlanEntry::from(entry),
            PlanEntry::FreeformNote { title: Some(t), .. } if t == "Salad"
        ));
    }

    #[test]
    fn first_entry_wins() {
        let record = MealPlanRecord::from_entries(entries(r#"[
            { "title": "Lunch" },
            { "recipe": { "id": 1, "name": "Dinner" } }
        ]"#), BASE);

        assert_eq!(record.recipe_name.as_deref(), Some("Lunch"));
        assert!(record.recipe_id.is_none());
    }

    #[test]
    fn record_always_serializes_all_fields() {
        let value = serde_json::to_value(MealPlanRecord::no_meal_plan()).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "recipe_name", "recipe_id", "recipe_image",
            "servings", "note", "recipe_url",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 6);
        assert!(obj["recipe_id"].is_null());
    }
}
