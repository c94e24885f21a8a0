use serde::{Deserialize, Serialize};

use crate::common::{RecipeError, RecipeResult};

/// One line of a recipe's ingredient list. No identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub measure: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            measure: measure.into(),
        }
    }
}

/// Content fields shared by submissions and publications.
///
/// Field names are identical in both stores so approval copies content
/// across without any mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecipeContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub cook_time: String,
    #[serde(default)]
    pub servings: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default)]
    #[sqlx(json)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Partial content update. `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub category: Option<String>,
    /// An empty string clears the field.
    pub area: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<Vec<String>>,
    /// An empty string clears the field.
    pub video_url: Option<String>,
}

impl RecipeContent {
    /// Normalizes then validates content ahead of any write.
    ///
    /// Text is trimmed, blank ingredients and instruction lines are dropped,
    /// and empty optional fields become `None`.
    pub fn normalized(self) -> RecipeResult<Self> {
        let content = Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            cook_time: self.cook_time.trim().to_string(),
            servings: self.servings.trim().to_string(),
            category: self.category.trim().to_string(),
            area: non_blank(self.area),
            ingredients: self
                .ingredients
                .into_iter()
                .filter(|i| !i.name.trim().is_empty())
                .map(|i| Ingredient::new(i.name.trim(), i.measure.trim()))
                .collect(),
            instructions: self
                .instructions
                .into_iter()
                .map(|step| step.trim().to_string())
                .filter(|step| !step.is_empty())
                .collect(),
            video_url: non_blank(self.video_url),
        };

        content.validate()?;
        Ok(content)
    }

    /// Applies a patch onto a copy of this content and re-validates the result.
    pub fn merged(&self, patch: &RecipeContentPatch) -> RecipeResult<Self> {
        let mut next = self.clone();
        let patch = patch.clone();

        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(image) = patch.image {
            next.image = image;
        }
        if let Some(cook_time) = patch.cook_time {
            next.cook_time = cook_time;
        }
        if let Some(servings) = patch.servings {
            next.servings = servings;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(area) = patch.area {
            next.area = Some(area);
        }
        if let Some(ingredients) = patch.ingredients {
            next.ingredients = ingredients;
        }
        if let Some(instructions) = patch.instructions {
            next.instructions = instructions;
        }
        if let Some(video_url) = patch.video_url {
            next.video_url = Some(video_url);
        }

        next.normalized()
    }

    fn validate(&self) -> RecipeResult<()> {
        if self.title.is_empty() {
            return Err(RecipeError::validation("title is required"));
        }
        if self.description.is_empty() {
            return Err(RecipeError::validation("description is required"));
        }
        if self.ingredients.is_empty() {
            return Err(RecipeError::validation(
                "at least one ingredient is required",
            ));
        }
        if self.instructions.is_empty() {
            return Err(RecipeError::validation(
                "at least one instruction is required",
            ));
        }
        if let Some(url) = &self.video_url {
            if !is_http_url(url) {
                return Err(RecipeError::validation(format!(
                    "videoUrl must be an http(s) URL, got {:?}",
                    url
                )));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://"].iter().any(|scheme| {
        lower
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
    })
}
