use crate::nutrients::NutrientProfile;
use serde::Serialize;

/// Identifier and name of a vegetable, as listed by the web API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VegetableRef {
    pub id: i32,
    pub name: String,
}

/// Full vegetable record used by the bot.
#[derive(Debug, Clone, PartialEq)]
pub struct Vegetable {
    pub id: i32,
    pub name: String,
    pub aliases: Vec<String>,
    pub nutrients: NutrientProfile,
}

impl Vegetable {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            aliases: Vec::new(),
            nutrients: NutrientProfile::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_nutrients(mut self, nutrients: NutrientProfile) -> Self {
        self.nutrients = nutrients;
        self
    }

    /// Records without a name or without any nutrient data are never
    /// rendered as cards.
    pub fn is_presentable(&self) -> bool {
        !self.name.trim().is_empty() && self.nutrients.has_values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeStep {
    pub step_no: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: i32,
    pub title: String,
    /// Ordered by step number.
    pub steps: Vec<RecipeStep>,
}

impl Recipe {
    /// First step doubles as the short description on cards.
    pub fn summary(&self) -> &str {
        self.steps
            .first()
            .map(|s| s.description.as_str())
            .unwrap_or("")
    }

    /// `步驟{n}. {description}` lines, as the web frontend shows them.
    pub fn instructions(&self) -> String {
        self.steps
            .iter()
            .map(|s| format!("步驟{}. {}", s.step_no, s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrients::Nutrient;

    fn recipe() -> Recipe {
        Recipe {
            id: 3,
            title: "蒜炒空心菜".into(),
            steps: vec![
                RecipeStep {
                    step_no: 1,
                    description: "洗菜".into(),
                },
                RecipeStep {
                    step_no: 2,
                    description: "爆香蒜頭".into(),
                },
            ],
        }
    }

    #[test]
    fn instructions_number_each_step() {
        assert_eq!(recipe().instructions(), "步驟1. 洗菜\n步驟2. 爆香蒜頭");
        assert_eq!(recipe().summary(), "洗菜");
    }

    #[test]
    fn empty_recipe_has_blank_summary() {
        let empty = Recipe {
            id: 1,
            title: "x".into(),
            steps: vec![],
        };
        assert_eq!(empty.summary(), "");
        assert_eq!(empty.instructions(), "");
    }

    #[test]
    fn presentable_requires_name_and_data() {
        let bare = Vegetable::new(1, "芹菜");
        assert!(!bare.is_presentable());

        let named = Vegetable::new(1, "芹菜")
            .with_nutrients(NutrientProfile::new().with(Nutrient::Water, 95.0));
        assert!(named.is_presentable());

        let unnamed = Vegetable::new(2, " ")
            .with_nutrients(NutrientProfile::new().with(Nutrient::Water, 95.0));
        assert!(!unnamed.is_presentable());
    }
}
