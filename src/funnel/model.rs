//! Answer record and the typed fields steps write into.

use serde::{Deserialize, Serialize};

/// The binary attribute captured by the selector stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// Both choices, in display order.
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// A record field holding one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    Gender,
    Age,
    Diet,
    CookingSkills,
    Sourdough,
    GlutenFreePizza,
    FrenchBaguette,
    Focaccia,
    Cheesecake,
    Yogurt,
    NewRecipes,
    CookingFrequency,
    MealPrep,
    PrepTime,
    RecipeFrequency,
    ShoppingLists,
    Email,
    Name,
}

/// A record field holding an ordered list of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListField {
    GlutenFreeReasons,
    Allergies,
    RecipeTypes,
    Appliances,
    ImportantFeatures,
}

/// Accumulated user responses across the flow.
///
/// Starts empty and is filled one field per confirmed step. Nothing is ever
/// rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub gender: String,
    pub age: String,
    pub diet: String,
    pub gluten_free_reasons: Vec<String>,
    pub allergies: Vec<String>,
    pub recipe_types: Vec<String>,
    pub cooking_skills: String,
    pub sourdough: String,
    pub gluten_free_pizza: String,
    pub french_baguette: String,
    pub focaccia: String,
    pub cheesecake: String,
    pub yogurt: String,
    pub new_recipes: String,
    pub cooking_frequency: String,
    pub meal_prep: String,
    pub prep_time: String,
    pub appliances: Vec<String>,
    pub recipe_frequency: String,
    pub shopping_lists: String,
    pub important_features: Vec<String>,
    pub email: String,
    pub name: String,
}

impl AnswerRecord {
    fn scalar_mut(&mut self, field: ScalarField) -> &mut String {
        match field {
            ScalarField::Gender => &mut self.gender,
            ScalarField::Age => &mut self.age,
            ScalarField::Diet => &mut self.diet,
            ScalarField::CookingSkills => &mut self.cooking_skills,
            ScalarField::Sourdough => &mut self.sourdough,
            ScalarField::GlutenFreePizza => &mut self.gluten_free_pizza,
            ScalarField::FrenchBaguette => &mut self.french_baguette,
            ScalarField::Focaccia => &mut self.focaccia,
            ScalarField::Cheesecake => &mut self.cheesecake,
            ScalarField::Yogurt => &mut self.yogurt,
            ScalarField::NewRecipes => &mut self.new_recipes,
            ScalarField::CookingFrequency => &mut self.cooking_frequency,
            ScalarField::MealPrep => &mut self.meal_prep,
            ScalarField::PrepTime => &mut self.prep_time,
            ScalarField::RecipeFrequency => &mut self.recipe_frequency,
            ScalarField::ShoppingLists => &mut self.shopping_lists,
            ScalarField::Email => &mut self.email,
            ScalarField::Name => &mut self.name,
        }
    }

    fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::GlutenFreeReasons => &mut self.gluten_free_reasons,
            ListField::Allergies => &mut self.allergies,
            ListField::RecipeTypes => &mut self.recipe_types,
            ListField::Appliances => &mut self.appliances,
            ListField::ImportantFeatures => &mut self.important_features,
        }
    }

    /// Overwrite a scalar answer.
    pub fn set_scalar(&mut self, field: ScalarField, value: impl Into<String>) {
        *self.scalar_mut(field) = value.into();
    }

    /// Overwrite a list answer.
    pub fn set_list(&mut self, field: ListField, values: Vec<String>) {
        *self.list_mut(field) = values;
    }

    pub fn scalar(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::Gender => &self.gender,
            ScalarField::Age => &self.age,
            ScalarField::Diet => &self.diet,
            ScalarField::CookingSkills => &self.cooking_skills,
            ScalarField::Sourdough => &self.sourdough,
            ScalarField::GlutenFreePizza => &self.gluten_free_pizza,
            ScalarField::FrenchBaguette => &self.french_baguette,
            ScalarField::Focaccia => &self.focaccia,
            ScalarField::Cheesecake => &self.cheesecake,
            ScalarField::Yogurt => &self.yogurt,
            ScalarField::NewRecipes => &self.new_recipes,
            ScalarField::CookingFrequency => &self.cooking_frequency,
            ScalarField::MealPrep => &self.meal_prep,
            ScalarField::PrepTime => &self.prep_time,
            ScalarField::RecipeFrequency => &self.recipe_frequency,
            ScalarField::ShoppingLists => &self.shopping_lists,
            ScalarField::Email => &self.email,
            ScalarField::Name => &self.name,
        }
    }

    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::GlutenFreeReasons => &self.gluten_free_reasons,
            ListField::Allergies => &self.allergies,
            ListField::RecipeTypes => &self.recipe_types,
            ListField::Appliances => &self.appliances,
            ListField::ImportantFeatures => &self.important_features,
        }
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_empty() {
        let record = AnswerRecord::default();
        assert!(record.gender.is_empty());
        assert!(record.appliances.is_empty());
        assert!(!record.has_email());
        assert!(!record.has_name());
    }

    #[test]
    fn set_scalar_overwrites() {
        let mut record = AnswerRecord::default();
        record.set_scalar(ScalarField::Age, "30s");
        record.set_scalar(ScalarField::Age, "40s");
        assert_eq!(record.age, "40s");
        assert_eq!(record.scalar(ScalarField::Age), "40s");
    }

    #[test]
    fn set_list_overwrites_whole_list() {
        let mut record = AnswerRecord::default();
        record.set_list(ListField::Allergies, vec!["🥚 Eggs".into(), "🫘 Soy".into()]);
        record.set_list(ListField::Allergies, vec!["🚫 None".into()]);
        assert_eq!(record.list(ListField::Allergies), ["🚫 None".to_string()]);
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" Male ".parse::<Gender>().unwrap(), Gender::Male);
        assert!("other".parse::<Gender>().is_err());
        assert_eq!(Gender::Female.to_string(), "Female");
    }

    #[test]
    fn record_serializes_snake_case() {
        let mut record = AnswerRecord::default();
        record.set_scalar(ScalarField::GlutenFreePizza, "Yes");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["gluten_free_pizza"], "Yes");
        assert!(json["important_features"].as_array().unwrap().is_empty());
    }
}
