//! Render-ready views of each stage.
//!
//! A [`StageView`] is what the JSON API returns and what the terminal
//! session prints. Markup is already split into segments, images carry
//! their fallback, and the offer carries the formatted countdown.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::Serialize;

use super::flow::{FunnelFlow, Stage};
use super::markup::{Segment, parse_emphasis};
use super::model::Gender;
use super::offer::{self, OfferStage};
use super::selector::{self, SelectorStage};
use super::sequencer::StepSequencer;
use super::steps::{Credibility, SocialProof, StepKind};
use crate::media::ImageView;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One option as rendered, with its selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub label: String,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorView {
    pub brand: String,
    pub tagline: String,
    pub title: String,
    pub subtitle: String,
    pub choices: Vec<ChoiceView>,
    pub can_continue: bool,
    pub button_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInputView {
    pub input: &'static str,
    pub placeholder: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialProofView {
    pub avatars: Vec<ImageView>,
    pub headline: String,
    pub rating_label: String,
    pub rating: String,
    pub reviewers: Vec<ImageView>,
    pub more_reviewers: u32,
    pub review_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredibilityView {
    pub highlights: Vec<Vec<Segment>>,
    pub image: ImageView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    /// Percent of the questionnaire done once this step is confirmed.
    pub progress: u8,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: Vec<Segment>,
    pub bold_line: Option<String>,
    pub closing_line: Option<Vec<Segment>>,
    pub required: bool,
    pub subtitle: Option<Vec<Segment>>,
    pub image: Option<ImageView>,
    pub options: Vec<ChoiceView>,
    pub max_selections: Option<usize>,
    pub text_input: Option<TextInputView>,
    pub social_proof: Option<SocialProofView>,
    pub credibility: Option<CredibilityView>,
    pub can_continue: bool,
    pub button_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueItemView {
    pub icon: String,
    pub title: String,
    pub description: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestimonialView {
    pub author: String,
    pub quote: String,
    pub avatar: ImageView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferView {
    pub headline: Vec<String>,
    pub intro: Vec<Segment>,
    pub social_banner: Vec<Segment>,
    pub value_stack: Vec<ValueItemView>,
    pub regular_price: Decimal,
    pub price: Decimal,
    pub currency: String,
    pub discount_percent: u32,
    pub countdown: String,
    pub spots_left: u32,
    pub testimonials: Vec<TestimonialView>,
    pub guarantee_days: u32,
    pub purchase_label: String,
    pub checkout_url: String,
}

/// View of whichever stage is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageView {
    Selector(SelectorView),
    Step(StepView),
    Offer(OfferView),
    /// Questionnaire handed its record back but the offer is not mounted.
    Completed,
}

impl StageView {
    pub fn of(flow: &FunnelFlow) -> Self {
        match flow.stage() {
            Stage::Selector { selector, .. } => Self::Selector(selector_view(selector)),
            Stage::Questionnaire(sequencer) => {
                step_view(sequencer).map_or(Self::Completed, Self::Step)
            }
            Stage::Offer(offer) => Self::Offer(offer_view(offer)),
        }
    }

    /// Every image in the view, for fallback substitution.
    pub fn images_mut(&mut self) -> Vec<&mut ImageView> {
        match self {
            Self::Selector(view) => view
                .choices
                .iter_mut()
                .filter_map(|c| c.image.as_mut())
                .collect(),
            Self::Step(view) => {
                let mut images: Vec<&mut ImageView> = view.image.iter_mut().collect();
                if let Some(social) = view.social_proof.as_mut() {
                    images.extend(social.avatars.iter_mut());
                    images.extend(social.reviewers.iter_mut());
                }
                if let Some(credibility) = view.credibility.as_mut() {
                    images.push(&mut credibility.image);
                }
                images
            }
            Self::Offer(view) => view
                .testimonials
                .iter_mut()
                .map(|t| &mut t.avatar)
                .collect(),
            Self::Completed => Vec::new(),
        }
    }

    /// Plain-text rendering with ANSI bold for emphasized segments.
    pub fn render_terminal(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Selector(view) => render_selector(&mut out, view),
            Self::Step(view) => render_step(&mut out, view),
            Self::Offer(view) => render_offer(&mut out, view),
            Self::Completed => out.push_str("Questionnaire complete.\n"),
        }
        out
    }
}

fn selector_view(stage: &SelectorStage) -> SelectorView {
    let choices = Gender::ALL
        .iter()
        .map(|gender| ChoiceView {
            label: gender.as_str().to_string(),
            selected: stage.pending() == Some(*gender),
            image: Some(selector::avatar(*gender).view()),
        })
        .collect();

    SelectorView {
        brand: selector::BRAND_NAME.to_string(),
        tagline: selector::BRAND_TAGLINE.to_string(),
        title: selector::SELECTOR_TITLE.to_string(),
        subtitle: selector::SELECTOR_SUBTITLE.to_string(),
        choices,
        can_continue: stage.can_continue(),
        button_label: selector::SELECTOR_BUTTON.to_string(),
    }
}

fn step_view(sequencer: &StepSequencer) -> Option<StepView> {
    let step = sequencer.current_step()?;
    let index = sequencer.cursor();
    let total = sequencer.len();
    let buffer = sequencer.buffer();

    let options = step
        .kind
        .options()
        .iter()
        .map(|option| ChoiceView {
            label: option.to_string(),
            selected: buffer.contains(option),
            image: None,
        })
        .collect();

    let max_selections = match step.kind {
        StepKind::MultiChoice { max_selections, .. } => max_selections,
        _ => None,
    };

    let text_input = step.kind.text_input().map(|input| TextInputView {
        input: input.tag(),
        placeholder: input.placeholder(),
        value: buffer.first().unwrap_or_default().to_string(),
    });

    let (social_proof, credibility) = match &step.kind {
        StepKind::SocialProof(social) => (Some(social_view(social)), None),
        StepKind::Credibility(cred) => (None, Some(credibility_view(cred))),
        _ => (None, None),
    };

    Some(StepView {
        index,
        total,
        progress: progress_percent(index + 1, total),
        kind: step.kind.type_tag(),
        title: parse_emphasis(step.heading.title),
        bold_line: step.heading.bold_line.map(str::to_string),
        closing_line: step.heading.closing_line.map(parse_emphasis),
        required: step.heading.required,
        subtitle: step.subtitle.map(parse_emphasis),
        image: step.image.map(|image| image.view()),
        options,
        max_selections,
        text_input,
        social_proof,
        credibility,
        can_continue: sequencer.can_continue(),
        button_label: step.button_label().to_string(),
    })
}

fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done.min(total) * 100 / total).unwrap_or(100)
}

fn social_view(social: &SocialProof) -> SocialProofView {
    SocialProofView {
        avatars: social.avatars.iter().map(|a| a.view()).collect(),
        headline: social.headline.to_string(),
        rating_label: social.rating_label.to_string(),
        rating: social.rating.to_string(),
        reviewers: social.reviewers.iter().map(|a| a.view()).collect(),
        more_reviewers: social.more_reviewers,
        review_summary: social.review_summary.to_string(),
    }
}

fn credibility_view(cred: &Credibility) -> CredibilityView {
    CredibilityView {
        highlights: cred.highlights.iter().map(|h| parse_emphasis(h)).collect(),
        image: cred.image.view(),
    }
}

fn offer_view(stage: &OfferStage) -> OfferView {
    let settings = stage.settings();

    OfferView {
        headline: offer::HEADLINE.iter().map(|l| l.to_string()).collect(),
        intro: parse_emphasis(offer::INTRO),
        social_banner: parse_emphasis(offer::SOCIAL_BANNER),
        value_stack: offer::VALUE_STACK
            .iter()
            .map(|item| ValueItemView {
                icon: item.icon.to_string(),
                title: item.title.to_string(),
                description: item.description.to_string(),
                value: item.value,
            })
            .collect(),
        regular_price: offer::regular_price(),
        price: settings.price,
        currency: settings.currency.clone(),
        discount_percent: offer::discount_percent(settings.price),
        countdown: stage.countdown().to_string(),
        spots_left: offer::SPOTS_LEFT,
        testimonials: offer::TESTIMONIALS
            .iter()
            .map(|t| TestimonialView {
                author: t.author.to_string(),
                quote: t.quote.to_string(),
                avatar: t.avatar.view(),
            })
            .collect(),
        guarantee_days: offer::GUARANTEE_DAYS,
        purchase_label: offer::PURCHASE_LABEL.to_string(),
        checkout_url: settings.checkout_url.clone(),
    }
}

fn styled(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text.clone(),
            Segment::Emphasized(text) => format!("{BOLD}{text}{RESET}"),
        })
        .collect()
}

fn render_choices(out: &mut String, choices: &[ChoiceView]) {
    for (i, choice) in choices.iter().enumerate() {
        let mark = if choice.selected { "[x]" } else { "[ ]" };
        let _ = writeln!(out, "  {}. {mark} {}", i + 1, choice.label);
    }
}

fn render_button(out: &mut String, label: &str, enabled: bool) {
    let hint = if enabled { "" } else { " (disabled)" };
    let _ = writeln!(out, "\n  > {label}{hint}");
}

fn render_selector(out: &mut String, view: &SelectorView) {
    let _ = writeln!(out, "{BOLD}{}{RESET} | {}", view.brand, view.tagline);
    let _ = writeln!(out, "\n{BOLD}{}{RESET}", view.title);
    let _ = writeln!(out, "{}\n", view.subtitle);
    render_choices(out, &view.choices);
    render_button(out, &view.button_label, view.can_continue);
}

fn render_step(out: &mut String, view: &StepView) {
    let _ = writeln!(
        out,
        "[{}/{}] {}%",
        view.index + 1,
        view.total,
        view.progress
    );
    let marker = if view.required { " *" } else { "" };
    let _ = writeln!(out, "\n{}{marker}", styled(&view.title));
    if let Some(line) = &view.bold_line {
        let _ = writeln!(out, "{BOLD}{line}{RESET}");
    }
    if let Some(line) = &view.closing_line {
        let _ = writeln!(out, "{}", styled(line));
    }
    if let Some(subtitle) = &view.subtitle {
        let _ = writeln!(out, "{}", styled(subtitle));
    }

    if let Some(social) = &view.social_proof {
        let _ = writeln!(out, "\n{}", social.headline);
        let _ = writeln!(
            out,
            "{} {} | +{} | {}",
            social.rating_label, social.rating, social.more_reviewers, social.review_summary
        );
    }
    if let Some(cred) = &view.credibility {
        for highlight in &cred.highlights {
            let _ = writeln!(out, "  ✓ {}", styled(highlight));
        }
    }

    if !view.options.is_empty() {
        out.push('\n');
        render_choices(out, &view.options);
        if let Some(max) = view.max_selections {
            let _ = writeln!(out, "  (choose up to {max})");
        }
    }
    if let Some(input) = &view.text_input {
        let shown = if input.value.is_empty() {
            input.placeholder
        } else {
            input.value.as_str()
        };
        let _ = writeln!(out, "\n  [{}] {shown}", input.input);
    }
    render_button(out, &view.button_label, view.can_continue);
}

fn render_offer(out: &mut String, view: &OfferView) {
    for line in &view.headline {
        let _ = writeln!(out, "{BOLD}{line}{RESET}");
    }
    let _ = writeln!(out, "\n{}", styled(&view.intro));
    let _ = writeln!(out, "{}\n", styled(&view.social_banner));

    for item in &view.value_stack {
        let _ = writeln!(out, "  {} {} (${})", item.icon, item.title, item.value);
    }
    let _ = writeln!(
        out,
        "\nRegular ${}  Today {BOLD}${} {}{RESET}  ({}% OFF)",
        view.regular_price, view.price, view.currency, view.discount_percent
    );
    let _ = writeln!(
        out,
        "Offer expires in {BOLD}{}{RESET} | only {} spots left",
        view.countdown, view.spots_left
    );

    for t in &view.testimonials {
        let _ = writeln!(out, "\n  \"{}\"\n    - {}", t.quote, t.author);
    }
    let _ = writeln!(out, "\n{}-day money-back guarantee", view.guarantee_days);
    let _ = writeln!(out, "\n  > {} (type `buy`)", view.purchase_label);
}
