use crate::domain::{Category, Ingredient};

/// Criteria for listing categories. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Exact, case-sensitive name match
    pub name: Option<String>,
    /// Keep categories that contain any of these ingredients
    pub ingredient_ids: Vec<i64>,
}

/// Criteria for listing ingredients. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientFilter {
    pub name: Option<String>,
    pub name_icontains: Option<String>,
    pub name_istartswith: Option<String>,
    pub notes: Option<String>,
    pub notes_icontains: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

impl CategoryFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ingredient_ids.is_empty()
    }

    /// `ingredients` holds every ingredient that belongs to `category`.
    pub fn matches(&self, category: &Category, ingredients: &[Ingredient]) -> bool {
        if let Some(name) = &self.name {
            if &category.name != name {
                return false;
            }
        }
        if !self.ingredient_ids.is_empty()
            && !ingredients
                .iter()
                .any(|i| i.category_id == category.id && self.ingredient_ids.contains(&i.id))
        {
            return false;
        }
        true
    }
}

impl IngredientFilter {
    /// Restrict to the ingredients of a single category.
    pub fn for_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// `category` is the row referenced by `ingredient.category_id`, if it exists.
    pub fn matches(&self, ingredient: &Ingredient, category: Option<&Category>) -> bool {
        if let Some(name) = &self.name {
            if &ingredient.name != name {
                return false;
            }
        }
        if let Some(needle) = &self.name_icontains {
            if !icontains(&ingredient.name, needle) {
                return false;
            }
        }
        if let Some(prefix) = &self.name_istartswith {
            if !istartswith(&ingredient.name, prefix) {
                return false;
            }
        }
        if let Some(notes) = &self.notes {
            if &ingredient.notes != notes {
                return false;
            }
        }
        if let Some(needle) = &self.notes_icontains {
            if !icontains(&ingredient.notes, needle) {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if ingredient.category_id != category_id {
                return false;
            }
        }
        if let Some(category_name) = &self.category_name {
            match category {
                Some(c) if &c.name == category_name => {}
                _ => return false,
            }
        }
        true
    }
}

// Case folding is ASCII-only, the same as SQLite's LIKE.
fn icontains(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn istartswith(haystack: &str, prefix: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .starts_with(&prefix.to_ascii_lowercase())
}

/// Escapes `LIKE` wildcards so the needle matches literally under `ESCAPE '\'`.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
