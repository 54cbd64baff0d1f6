//! Offer stage: the sales page shown after the questionnaire.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use super::countdown::{Countdown, CountdownTimer};
use super::model::AnswerRecord;
use crate::analytics::{EventReporter, events, labels};
use crate::checkout::CheckoutLauncher;
use crate::media::ImageRef;

pub const DEFAULT_CHECKOUT_URL: &str = "https://pay.hotmart.com/M101011389E?off=qduzrp2b";
pub const DEFAULT_PRICE: Decimal = dec!(17);
pub const DEFAULT_CURRENCY: &str = "USD";

const OFFER_VIEW_STEP_NUMBER: i64 = 32;
const PURCHASE_STEP_NUMBER: i64 = 33;

/// Tunable parts of the offer.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferSettings {
    pub checkout_url: String,
    pub price: Decimal,
    pub currency: String,
    pub countdown_start: Countdown,
}

impl Default for OfferSettings {
    fn default() -> Self {
        Self {
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
            price: DEFAULT_PRICE,
            currency: DEFAULT_CURRENCY.to_string(),
            countdown_start: Countdown::INITIAL,
        }
    }
}

/// One bundle item in the value stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueItem {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub value: Decimal,
}

/// A member quote with avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Testimonial {
    pub author: &'static str,
    pub quote: &'static str,
    pub avatar: ImageRef,
}

pub const HEADLINE: &[&str] = &[
    "🎉 CONGRATULATIONS!",
    "Your Custom FlourCraft",
    "21-Day Culinary Transformation",
    "Is Ready!",
];

pub const INTRO: &str = "Based on your answers, we've crafted a **personalized gluten-free roadmap** that will help you reclaim your energy, shed stubborn weight, and finally enjoy meals without fear - all while mastering restaurant-quality dishes your entire family will crave!";

pub const SOCIAL_BANNER: &str =
    "**85,000+ people** started their gluten-free transformation this month!";

pub const VALUE_STACK: &[ValueItem] = &[
    ValueItem {
        icon: "📚",
        title: "FlourCraft 21-Day Reset System",
        description: "650+ chef-tested recipes, weekly meal blueprints & smart shopping lists that save you 3+ hours weekly",
        value: dec!(127),
    },
    ValueItem {
        icon: "📋",
        title: "Master Chef Technique Library",
        description: "35+ detailed step-by-step guides with pro secrets from James Beard Award winners",
        value: dec!(167),
    },
    ValueItem {
        icon: "📖",
        title: "18 Premium Digital Cookbooks",
        description: "Instant-download cookbooks for every craving: comfort food, desserts, holiday meals & more",
        value: dec!(97),
    },
    ValueItem {
        icon: "👥",
        title: "VIP FlourCraft Community",
        description: "Join 67,000+ members sharing wins, tips & support - plus monthly live Q&As with nutrition experts",
        value: dec!(67),
    },
];

pub const TESTIMONIALS: &[Testimonial] = &[
    Testimonial {
        author: "Jennifer K., Austin TX",
        quote: "Down 18 pounds in 3 weeks and my brain fog is GONE! These recipes are so good, my husband asks for seconds every night.",
        avatar: ImageRef::new(
            "https://optimalhealthscout.shop/wp-content/uploads/2025/06/3-DEPOIMENTO.png",
            "Jennifer K.",
            "👩",
            48,
            48,
        ),
    },
    Testimonial {
        author: "Mark D., Phoenix AZ",
        quote: "Finally! A program that actually works for celiac disease. My stomach issues vanished and I have energy to play with my kids again.",
        avatar: ImageRef::new(
            "https://optimalhealthscout.shop/wp-content/uploads/2025/05/05.png",
            "Mark D.",
            "👨",
            48,
            48,
        ),
    },
    Testimonial {
        author: "Lisa M., Denver CO",
        quote: "The step-by-step guides are incredible! I went from ordering takeout 5x/week to making bakery-quality bread at home.",
        avatar: ImageRef::new(
            "https://optimalhealthscout.shop/wp-content/uploads/2025/06/2fc1e47b2931f00666611ff2960c9c3f.jpg",
            "Lisa M.",
            "👩",
            48,
            48,
        ),
    },
];

pub const GUARANTEE_DAYS: u32 = 60;
pub const SPOTS_LEFT: u32 = 23;
pub const PURCHASE_LABEL: &str = "🚀 YES! Give Me FlourCraft";

/// Sum of the value stack, shown struck through as the regular price.
pub fn regular_price() -> Decimal {
    VALUE_STACK.iter().map(|item| item.value).sum()
}

/// Whole-percent discount of `price` against the regular price.
pub fn discount_percent(price: Decimal) -> u32 {
    let regular = regular_price();
    if regular.is_zero() || price >= regular {
        return 0;
    }
    ((regular - price) / regular * dec!(100))
        .floor()
        .to_u32()
        .unwrap_or(0)
}

/// The mounted sales page. Dropping it stops the countdown.
pub struct OfferStage {
    record: AnswerRecord,
    settings: OfferSettings,
    timer: CountdownTimer,
    reporter: EventReporter,
    checkout: Arc<dyn CheckoutLauncher>,
}

impl OfferStage {
    /// Mount the page: report the view and start the countdown.
    pub fn mount(
        record: AnswerRecord,
        settings: OfferSettings,
        reporter: &EventReporter,
        checkout: Arc<dyn CheckoutLauncher>,
    ) -> Self {
        let reporter = reporter.labelled(labels::OFFER);
        reporter.report(
            reporter
                .event(events::OFFER_VIEWED)
                .with("step", "offer_page")
                .with("step_number", OFFER_VIEW_STEP_NUMBER)
                .with("user_email", record.email.as_str())
                .with("user_name", record.name.as_str()),
        );

        let timer = CountdownTimer::start(settings.countdown_start);
        info!(client_id = %reporter.client_id(), "Offer page mounted");

        Self {
            record,
            settings,
            timer,
            reporter,
            checkout,
        }
    }

    pub fn record(&self) -> &AnswerRecord {
        &self.record
    }

    pub fn settings(&self) -> &OfferSettings {
        &self.settings
    }

    pub fn countdown(&self) -> Countdown {
        self.timer.current()
    }

    pub fn countdown_updates(&self) -> watch::Receiver<Countdown> {
        self.timer.subscribe()
    }

    pub fn checkout_url(&self) -> &str {
        &self.settings.checkout_url
    }

    /// Report the click and open checkout. Fire-and-forget; every call
    /// reports and opens again.
    pub fn purchase(&self) {
        self.reporter.report(
            self.reporter
                .event(events::PURCHASE_CLICKED)
                .with("step", "purchase_attempt")
                .with("step_number", PURCHASE_STEP_NUMBER)
                .with("user_email", self.record.email.as_str())
                .with("user_name", self.record.name.as_str())
                .with("price", self.settings.price.to_f64().unwrap_or_default())
                .with("currency", self.settings.currency.as_str()),
        );
        self.checkout.open(&self.settings.checkout_url);
    }

    /// Take the record back, unmounting the page.
    pub fn into_record(self) -> AnswerRecord {
        self.record
    }
}
