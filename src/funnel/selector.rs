//! Selector stage: the opening binary choice.

use super::model::Gender;
use crate::error::FunnelError;
use crate::media::ImageRef;

pub const BRAND_NAME: &str = "FlourCraft";
pub const BRAND_TAGLINE: &str = "Gluten-Free Mastery";
pub const SELECTOR_TITLE: &str = "21-Day Culinary Transformation Plan*";
pub const SELECTOR_SUBTITLE: &str =
    "Let's Create a Personalized Plan for Making Delicious & Healthy Meals at Home";
pub const SELECTOR_BUTTON: &str = "OK";

const FEMALE_AVATAR: ImageRef = ImageRef::new(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/069d6867-feab-4523-b018-55c3875690cb.png",
    "Female avatar",
    "👩",
    64,
    64,
);
const MALE_AVATAR: ImageRef = ImageRef::new(
    "https://nutricaoalimentos.shop/wp-content/uploads/2025/07/1746f4d2-f88b-4c83-8ebf-f7906d30fc98.png",
    "Male avatar",
    "👨",
    64,
    64,
);

/// Avatar shown next to each choice.
pub fn avatar(gender: Gender) -> ImageRef {
    match gender {
        Gender::Female => FEMALE_AVATAR,
        Gender::Male => MALE_AVATAR,
    }
}

/// Holds the pending choice until the visitor confirms.
#[derive(Debug, Clone, Default)]
pub struct SelectorStage {
    pending: Option<Gender>,
}

impl SelectorStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending choice.
    pub fn select(&mut self, gender: Gender) {
        self.pending = Some(gender);
    }

    pub fn pending(&self) -> Option<Gender> {
        self.pending
    }

    pub fn can_continue(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the stage and hand back the chosen value.
    ///
    /// Without a pending choice the stage is returned untouched.
    pub fn confirm(self) -> Result<Gender, (Self, FunnelError)> {
        match self.pending {
            Some(gender) => Ok(gender),
            None => Err((self, FunnelError::ContinueDisabled)),
        }
    }
}
