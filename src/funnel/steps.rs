//! Static step definitions for the questionnaire.
//!
//! Each step is a heading plus a [`StepKind`]. The kind decides what the
//! step carries: only choice kinds have options, only multi-select has a
//! selection cap, only display kinds carry display content. Steps are
//! `'static` configuration and never change at runtime.

use serde::Serialize;

use super::model::{ListField, ScalarField};
use crate::media::ImageRef;

/// Options offered by every yes/no step.
pub const YES_NO_OPTIONS: &[&str] = &["Yes", "No"];

/// Button label when a step does not set its own.
pub const DEFAULT_BUTTON_LABEL: &str = "OK";

/// Title block of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// First line, may contain `**bold**` markup.
    pub title: &'static str,
    /// Fully emphasized second line.
    pub bold_line: Option<&'static str>,
    /// Closing line after the bold line, may contain markup.
    pub closing_line: Option<&'static str>,
    /// Renders a trailing `*` marker.
    pub required: bool,
}

/// Which identifying answer a free-text step collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextInput {
    Email,
    Name,
}

impl TextInput {
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Email => "name@example.com",
            Self::Name => "Type your answer here...",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
        }
    }
}

/// Testimonial block shown on the social-proof step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocialProof {
    pub avatars: &'static [ImageRef],
    pub headline: &'static str,
    pub rating_label: &'static str,
    pub rating: &'static str,
    pub reviewers: &'static [ImageRef],
    /// Count shown in the "+N" bubble after the reviewer avatars.
    pub more_reviewers: u32,
    pub review_summary: &'static str,
}

/// Expert-backing block shown on the credibility step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Credibility {
    /// Lines with `**bold**` markup.
    pub highlights: &'static [&'static str],
    pub image: ImageRef,
}

/// The closed set of step kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum StepKind {
    #[serde(rename = "single")]
    SingleChoice {
        options: &'static [&'static str],
        field: ScalarField,
    },
    #[serde(rename = "multiple")]
    MultiChoice {
        options: &'static [&'static str],
        max_selections: Option<usize>,
        field: ListField,
    },
    #[serde(rename = "yesno")]
    YesNo { field: ScalarField },
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "text")]
    FreeText { input: TextInput, field: ScalarField },
    #[serde(rename = "social")]
    SocialProof(SocialProof),
    #[serde(rename = "credibility")]
    Credibility(Credibility),
    #[serde(rename = "result")]
    Result,
}

impl StepKind {
    /// Short tag reported to analytics.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::SingleChoice { .. } => "single",
            Self::MultiChoice { .. } => "multiple",
            Self::YesNo { .. } => "yesno",
            Self::Info => "info",
            Self::FreeText { input, .. } => input.tag(),
            Self::SocialProof(_) => "social",
            Self::Credibility(_) => "credibility",
            Self::Result => "result",
        }
    }

    /// Options a user can pick from; empty for non-choice kinds.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::SingleChoice { options, .. } | Self::MultiChoice { options, .. } => options,
            Self::YesNo { .. } => YES_NO_OPTIONS,
            _ => &[],
        }
    }

    /// Display kinds can always be continued past.
    pub fn is_display(&self) -> bool {
        matches!(
            self,
            Self::Info | Self::SocialProof(_) | Self::Credibility(_) | Self::Result
        )
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            Self::SingleChoice { .. } | Self::MultiChoice { .. } | Self::YesNo { .. }
        )
    }

    pub fn text_input(&self) -> Option<TextInput> {
        match self {
            Self::FreeText { input, .. } => Some(*input),
            _ => None,
        }
    }
}

/// Immutable descriptor of one questionnaire screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub heading: Heading,
    pub subtitle: Option<&'static str>,
    pub image: Option<ImageRef>,
    pub button_label: Option<&'static str>,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl StepDefinition {
    pub const fn new(title: &'static str, kind: StepKind) -> Self {
        Self {
            heading: Heading {
                title,
                bold_line: None,
                closing_line: None,
                required: false,
            },
            subtitle: None,
            image: None,
            button_label: None,
            kind,
        }
    }

    pub const fn subtitle(self, subtitle: &'static str) -> Self {
        Self {
            subtitle: Some(subtitle),
            ..self
        }
    }

    pub const fn bold_line(self, line: &'static str) -> Self {
        Self {
            heading: Heading {
                bold_line: Some(line),
                ..self.heading
            },
            ..self
        }
    }

    pub const fn closing_line(self, line: &'static str) -> Self {
        Self {
            heading: Heading {
                closing_line: Some(line),
                ..self.heading
            },
            ..self
        }
    }

    pub const fn required(self) -> Self {
        Self {
            heading: Heading {
                required: true,
                ..self.heading
            },
            ..self
        }
    }

    pub const fn image(self, image: ImageRef) -> Self {
        Self {
            image: Some(image),
            ..self
        }
    }

    pub const fn button(self, label: &'static str) -> Self {
        Self {
            button_label: Some(label),
            ..self
        }
    }

    pub fn button_label(&self) -> &'static str {
        self.button_label.unwrap_or(DEFAULT_BUTTON_LABEL)
    }

    /// Title text as reported to analytics: at most `max` characters.
    pub fn truncated_title(&self, max: usize) -> String {
        self.heading.title.chars().take(max).collect()
    }
}

const fn single(
    title: &'static str,
    options: &'static [&'static str],
    field: ScalarField,
) -> StepDefinition {
    StepDefinition::new(title, StepKind::SingleChoice { options, field })
}

const fn multiple(
    title: &'static str,
    options: &'static [&'static str],
    field: ListField,
) -> StepDefinition {
    StepDefinition::new(
        title,
        StepKind::MultiChoice {
            options,
            max_selections: None,
            field,
        },
    )
}

const fn capped(
    title: &'static str,
    options: &'static [&'static str],
    max: usize,
    field: ListField,
) -> StepDefinition {
    StepDefinition::new(
        title,
        StepKind::MultiChoice {
            options,
            max_selections: Some(max),
            field,
        },
    )
}

const fn yes_no(title: &'static str, bold_line: &'static str, field: ScalarField) -> StepDefinition {
    StepDefinition::new(title, StepKind::YesNo { field }).bold_line(bold_line)
}

const fn info(title: &'static str) -> StepDefinition {
    StepDefinition::new(title, StepKind::Info)
}

const fn text(title: &'static str, input: TextInput, field: ScalarField) -> StepDefinition {
    StepDefinition::new(title, StepKind::FreeText { input, field })
}

const fn recipe_image(url: &'static str) -> ImageRef {
    ImageRef::new(url, "Recipe", "🍽️", 400, 192)
}

const fn avatar(url: &'static str, alt: &'static str, tag: &'static str, size: u32) -> ImageRef {
    ImageRef::new(url, alt, tag, size, size)
}

const GLUTEN_FREE_PIZZA: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/11515a6a-a34d-4cb5-8e84-4192d1058b0e.png",
);
const SOURDOUGH_BREAD: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/a6e46555-106e-49fa-b6e1-df9e34c2c62e.png",
);
const FRENCH_BAGUETTE: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/19d9acdb-2b59-4e60-a16b-f1a834d14c95.png",
);
const FOCACCIA: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/5343c40a-6a94-495c-889f-7a6de8af7831.png",
);
const CHEESECAKE: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/3891df8c-33aa-4861-9dbf-948bfd558a3b.png",
);
const YOGURT: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/9bc4483b-4916-4939-a0e2-f1f0a05dd650.png",
);
const NUTRITIOUS_MEALS: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/dbe30f49-5192-410f-a294-394e62c55e26.png",
);
const KITCHEN_SKILLS: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/8d660fe1-5b34-42ce-a5c5-95eea334bb79.png",
);
const BLOOM_LEARNING: ImageRef = recipe_image(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/86fab4ee-c174-4d0d-9e0c-6befd221d166.png",
);

const PERSON_1: &str = "https://nutricaoalimentos.shop/wp-content/uploads/2025/06/01.png";
const PERSON_2: &str = "https://nutricaoalimentos.shop/wp-content/uploads/2025/06/02.png";
const PERSON_3: &str =
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/06/8db332e349f045c0e1949cb88c6096d4.jpg";
const PERSON_4: &str = "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/05-fernando.png";
const PERSON_5: &str = "https://nutricaoalimentos.shop/wp-content/uploads/2025/06/1-DEPOIMENTO.png";

const TESTIMONIAL_AVATARS: &[ImageRef] = &[
    avatar(PERSON_1, "Customer testimonial 1", "👩", 48),
    avatar(PERSON_2, "Customer testimonial 2", "👨", 48),
    avatar(PERSON_3, "Customer testimonial 3", "👩", 48),
    avatar(PERSON_4, "Customer testimonial 4", "👨", 48),
    avatar(PERSON_5, "Customer testimonial 5", "👩", 48),
];

const FACEBOOK_REVIEWERS: &[ImageRef] = &[
    avatar(PERSON_1, "Facebook reviewer 1", "👩", 32),
    avatar(PERSON_2, "Facebook reviewer 2", "👨", 32),
    avatar(PERSON_3, "Facebook reviewer 3", "👩", 32),
];

const CREDIBILITY_IMAGE: ImageRef = ImageRef::new(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/911999c6-305c-4dd8-b8ff-dadba9edcef5.png",
    "Credibility badges and certifications",
    "🏆",
    500,
    300,
);

const SOCIAL_PROOF: SocialProof = SocialProof {
    avatars: TESTIMONIAL_AVATARS,
    headline: "People rave about FlourCraft's Learning Experience",
    rating_label: "Outstanding",
    rating: "4.8/5",
    reviewers: FACEBOOK_REVIEWERS,
    more_reviewers: 235,
    review_summary: "4.9 rating from 312 Reviews",
};

const CREDIBILITY: Credibility = Credibility {
    highlights: &[
        "**35 Detailed step-by-step guides**, interactive cookbooks & smart shopping lists",
        "**650+ Nutritionist-approved** GF recipes",
    ],
    image: CREDIBILITY_IMAGE,
};

/// The questionnaire, in order.
pub static CATALOG: &[StepDefinition] = &[
    single(
        "What's your age?",
        &["20s", "30s", "40s", "50s", "60s", "70s", "80s+"],
        ScalarField::Age,
    )
    .subtitle("This helps us **customize recipes** that fit your **lifestyle perfectly**")
    .required(),
    StepDefinition::new(
        "Join 85,000+ home cooks who transformed their kitchens with FlourCraft",
        StepKind::SocialProof(SOCIAL_PROOF),
    )
    .subtitle("\"FlourCraft makes discovering **amazing gluten free recipes** simple, learning **new techniques** fun, and cooking **complete meals** faster than ever\"")
    .button("Continue"),
    single(
        "Are you currently following a **specific eating style**?",
        &["Gluten Free", "Dairy free", "Paleo", "Vegan", "Vegetarian", "Keto", "Low Carb"],
        ScalarField::Diet,
    ),
    multiple(
        "What drives you to choose **Gluten Free living**?",
        &[
            "Allergy",
            "Improve heart health",
            "Celiac",
            "Improve digestion",
            "Heal my gut",
            "Autoimmune condition",
            "Lose some weight",
            "Reduce inflammation",
            "Gain more energy",
        ],
        ListField::GlutenFreeReasons,
    )
    .required(),
    multiple(
        "Do you have any **food sensitivities** we should know about?",
        &[
            "🌾 Gluten/Wheat",
            "🥛 Dairy/Lactose",
            "🫘 Soy",
            "🥚 Eggs",
            "🍅 Nightshades",
            "🥜 Nuts",
            "🌽 Corn",
            "🚫 None",
        ],
        ListField::Allergies,
    )
    .required(),
    multiple(
        "Which **gluten free creations** excite you most to **master**?",
        &["Pizza", "Bread", "Cookies", "Pasta", "Snacks", "Cakes", "Whole meals"],
        ListField::RecipeTypes,
    )
    .required(),
    single(
        "How would you rate your **kitchen confidence** right now?",
        &[
            "🍞 Beginner (still burning toast)",
            "🍳 Intermediate (I follow recipes fine)",
            "👨‍🍳 Experienced (I can freestyle and experiment)",
        ],
        ScalarField::CookingSkills,
    ),
    info("FlourCraft unlocks your potential to master **incredible Gluten Free Recipes** and create **complete satisfying meals**")
        .image(BLOOM_LEARNING)
        .button("Continue"),
    yes_no(
        "Ready to master the art of",
        "Perfect Gluten Free Sourdough?",
        ScalarField::Sourdough,
    )
    .image(SOURDOUGH_BREAD),
    yes_no(
        "What about creating restaurant-quality",
        "Gluten Free Pizza at home?",
        ScalarField::GlutenFreePizza,
    )
    .image(GLUTEN_FREE_PIZZA),
    yes_no(
        "Imagine baking authentic",
        "Gluten Free French Baguettes",
        ScalarField::FrenchBaguette,
    )
    .required()
    .image(FRENCH_BAGUETTE),
    yes_no(
        "Want to create bakery-style",
        "Gluten Free Focaccia?",
        ScalarField::Focaccia,
    )
    .image(FOCACCIA),
    yes_no(
        "How about a decadent",
        "Gluten & Dairy Free Raspberry Cheesecake?",
        ScalarField::Cheesecake,
    )
    .image(CHEESECAKE),
    yes_no(
        "Ready to craft creamy",
        "Homemade Probiotic Yogurt?",
        ScalarField::Yogurt,
    )
    .image(YOGURT),
    single(
        "How many **new recipes** would you like to learn in the **next 30 days**?",
        &["5", "10", "20", "30+"],
        ScalarField::NewRecipes,
    ),
    info("With FlourCraft, mastering **25+ exciting**")
        .bold_line("Gluten Free Recipes and pro kitchen techniques")
        .closing_line("every month feels **effortless**!")
        .image(KITCHEN_SKILLS)
        .button("Continue"),
    single(
        "How many times a week do you typically **cook at home**?",
        &[
            "🚫 Almost never",
            "2️⃣ 1-2 times a week",
            "4️⃣ 3-5 times a week",
            "7️⃣ Every day",
        ],
        ScalarField::CookingFrequency,
    ),
    single(
        "Do you **meal-prep** regularly or prefer **daily fresh cooking**?",
        &[
            "📦 Meal-prep (cook in bulk)",
            "👨‍🍳 Fresh daily cooking",
            "🔄 A mix of both",
        ],
        ScalarField::MealPrep,
    ),
    single(
        "How much **time** are you willing to spend **preparing each meal**?",
        &[
            "⏰ 15 minutes or less",
            "⏰ About 30 minutes",
            "⏰ 45 minutes or more",
            "📅 Weekend prep for the whole week",
        ],
        ScalarField::PrepTime,
    ),
    info("Discover **150+ Nourishing Meals** that come together in just **25 minutes**")
        .subtitle("**Morning energy bowls**, **satisfying snacks**, **comforting mains**, and **flavorful sides** - transform simple ingredients into **gut-loving**, **family-favorite** dishes.")
        .image(NUTRITIOUS_MEALS)
        .button("Continue"),
    multiple(
        "Which **cooking appliances** do you have at home?",
        &[
            "🔥 Stove/oven",
            "🍲 Instant Pot or Pressure Cooker",
            "🥤 Blender or Food Processor",
            "🍟 Air Fryer",
            "🍲 Slow Cooker",
        ],
        ListField::Appliances,
    )
    .subtitle("Select all that apply"),
    single(
        "How often would you like to receive **new recipes** and **meal ideas**?",
        &["☀️ Every Day", "🌓 Every Week", "🌙 Once a Month"],
        ScalarField::RecipeFrequency,
    ),
    single(
        "Would you like **personalized shopping lists** created automatically based on your **meal plan**?",
        &["😊 Yes, definitely", "😊 Maybe, sometimes"],
        ScalarField::ShoppingLists,
    ),
    StepDefinition::new(
        "Crafted by **culinary experts**. Validated by **nutrition science**.",
        StepKind::Credibility(CREDIBILITY),
    )
    .button("Continue"),
    capped(
        "What are the most **important features** to you?",
        &[
            "💰 Budget-friendly recipes",
            "🥗 Nutritionist-approved meal ideas",
            "📋 Personalized weekly meal plans",
            "🎥 Step by step video tutorials",
            "🍽️ Large variety of healthy recipes",
            "⏰ Time-saving cooking methods",
            "🎓 Cooking courses",
        ],
        2,
        ListField::ImportantFeatures,
    ),
    text(
        "Enter your **email** to get your **21-day Culinary Transformation Plan**!",
        TextInput::Email,
        ScalarField::Email,
    ),
    text("What's your **name**?", TextInput::Name, ScalarField::Name),
    StepDefinition::new(
        "Based on your answers, we've designed your **custom roadmap**",
        StepKind::Result,
    )
    .button("Unlock My Plan"),
    info("Your mission: **Boost your energy** through **incredibly delicious meals**")
        .subtitle("Created by you, with ❤️")
        .button("Continue"),
    info("Over the next **21 days**, you'll master **25+ amazing recipes**")
        .subtitle("**Fresh inspiration** delivered **weekly**")
        .button("Continue"),
    info("You'll discover **creative ways** to make **incredible Pizza**")
        .subtitle("plus **countless other mouth-watering dishes**...")
        .button("Download My Plan"),
];

/// The full questionnaire.
pub fn catalog() -> &'static [StepDefinition] {
    CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_thirty_one_steps() {
        assert_eq!(catalog().len(), 31);
    }

    #[test]
    fn first_step_is_age() {
        let step = &catalog()[0];
        assert_eq!(step.kind.type_tag(), "single");
        assert!(step.kind.options().contains(&"30s"));
        assert!(step.heading.required);
    }

    #[test]
    fn choice_steps_have_options() {
        for (i, step) in catalog().iter().enumerate() {
            if step.kind.is_choice() {
                assert!(!step.kind.options().is_empty(), "step {i} has no options");
            } else {
                assert!(step.kind.options().is_empty(), "step {i} should not offer options");
            }
        }
    }

    #[test]
    fn options_are_unique_within_a_step() {
        for (i, step) in catalog().iter().enumerate() {
            let opts = step.kind.options();
            for (j, a) in opts.iter().enumerate() {
                assert!(!opts[j + 1..].contains(a), "step {i} repeats option {a}");
            }
        }
    }

    #[test]
    fn important_features_capped_at_two() {
        let capped: Vec<_> = catalog()
            .iter()
            .filter_map(|s| match s.kind {
                StepKind::MultiChoice {
                    max_selections: Some(max),
                    field,
                    ..
                } => Some((max, field)),
                _ => None,
            })
            .collect();
        assert_eq!(capped, vec![(2, ListField::ImportantFeatures)]);
    }

    #[test]
    fn email_precedes_name() {
        let inputs: Vec<TextInput> = catalog()
            .iter()
            .filter_map(|s| s.kind.text_input())
            .collect();
        assert_eq!(inputs, vec![TextInput::Email, TextInput::Name]);
    }

    #[test]
    fn display_kinds() {
        assert!(StepKind::Info.is_display());
        assert!(StepKind::Result.is_display());
        assert!(StepKind::Credibility(CREDIBILITY).is_display());
        assert!(StepKind::SocialProof(SOCIAL_PROOF).is_display());
        assert!(!StepKind::YesNo { field: ScalarField::Yogurt }.is_display());
    }

    #[test]
    fn button_label_defaults_to_ok() {
        assert_eq!(catalog()[0].button_label(), "OK");
        assert_eq!(catalog()[27].button_label(), "Unlock My Plan");
    }

    #[test]
    fn truncated_title_counts_characters() {
        let step = &catalog()[1];
        let t = step.truncated_title(50);
        assert_eq!(t.chars().count(), 50);
        assert!(step.heading.title.starts_with(&t));
    }

    #[test]
    fn step_serializes_with_type_tag() {
        let json = serde_json::to_value(catalog()[24]).unwrap();
        assert_eq!(json["type"], "multiple");
        assert_eq!(json["max_selections"], 2);
        assert_eq!(json["field"], "important_features");
    }
}
