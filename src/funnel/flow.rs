//! Flow controller: owns the current stage and moves the answer record
//! forward through Selector, Questionnaire and Offer.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::countdown::Countdown;
use super::model::{AnswerRecord, Gender, ScalarField};
use super::offer::{OfferSettings, OfferStage};
use super::selector::SelectorStage;
use super::sequencer::{Advance, StepSequencer};
use super::steps::{self, StepDefinition};
use crate::analytics::{Analytics, EventReporter, NoopAnalytics, events};
use crate::checkout::{CheckoutLauncher, LogCheckout};
use crate::error::FunnelError;

/// Step number reported for the end of the questionnaire.
const QUIZ_COMPLETE_STEP_NUMBER: i64 = 30;

/// Collaborators and configuration shared by every flow.
#[derive(Clone)]
pub struct FunnelDeps {
    pub analytics: Arc<dyn Analytics>,
    pub checkout: Arc<dyn CheckoutLauncher>,
    pub steps: &'static [StepDefinition],
    pub offer: OfferSettings,
}

impl FunnelDeps {
    pub fn new(analytics: Arc<dyn Analytics>, checkout: Arc<dyn CheckoutLauncher>) -> Self {
        Self {
            analytics,
            checkout,
            steps: steps::catalog(),
            offer: OfferSettings::default(),
        }
    }

    pub fn with_steps(mut self, steps: &'static [StepDefinition]) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_offer(mut self, offer: OfferSettings) -> Self {
        self.offer = offer;
        self
    }
}

impl Default for FunnelDeps {
    fn default() -> Self {
        Self::new(Arc::new(NoopAnalytics), Arc::new(LogCheckout))
    }
}

/// Which stage a flow is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Selector,
    Questionnaire,
    Offer,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selector => "selector",
            Self::Questionnaire => "questionnaire",
            Self::Offer => "offer",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mounted stage. The answer record always travels with it.
pub enum Stage {
    Selector {
        selector: SelectorStage,
        record: AnswerRecord,
    },
    Questionnaire(StepSequencer),
    Offer(OfferStage),
}

impl Stage {
    pub fn name(&self) -> StageName {
        match self {
            Self::Selector { .. } => StageName::Selector,
            Self::Questionnaire(_) => StageName::Questionnaire,
            Self::Offer(_) => StageName::Offer,
        }
    }
}

/// What a successful confirmation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// Selector confirmed; the first step is in view.
    EnteredQuestionnaire,
    /// Moved to the step at `index`.
    NextStep { index: usize },
    /// Questionnaire finished; the offer is mounted.
    EnteredOffer,
}

/// One visitor's pass through the funnel.
pub struct FunnelFlow {
    stage: Stage,
    reporter: EventReporter,
    deps: FunnelDeps,
}

impl FunnelFlow {
    /// Mount the selector and report the start of the quiz.
    pub fn start(deps: FunnelDeps, client_id: Uuid) -> Self {
        let reporter = EventReporter::new(Arc::clone(&deps.analytics), client_id);
        reporter.report(
            reporter
                .event(events::QUIZ_STARTED)
                .with("step", "gender_selection")
                .with("step_number", 0i64),
        );
        info!(%client_id, "Funnel started");

        Self {
            stage: Stage::Selector {
                selector: SelectorStage::new(),
                record: AnswerRecord::default(),
            },
            reporter,
            deps,
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.reporter.client_id()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_name(&self) -> StageName {
        self.stage.name()
    }

    pub fn steps(&self) -> &'static [StepDefinition] {
        self.deps.steps
    }

    fn wrong_stage(&self, expected: StageName) -> FunnelError {
        FunnelError::WrongStage {
            expected: expected.to_string(),
            actual: self.stage_name().to_string(),
        }
    }

    /// Set the pending selector choice.
    pub fn select_gender(&mut self, gender: Gender) -> Result<(), FunnelError> {
        match &mut self.stage {
            Stage::Selector { selector, .. } => {
                selector.select(gender);
                Ok(())
            }
            _ => Err(self.wrong_stage(StageName::Selector)),
        }
    }

    /// Pick or toggle an option on the current step.
    pub fn select(&mut self, option: &str) -> Result<(), FunnelError> {
        match &mut self.stage {
            Stage::Questionnaire(sequencer) => sequencer.select(option),
            _ => Err(self.wrong_stage(StageName::Questionnaire)),
        }
    }

    /// Mirror the text input of the current step.
    pub fn set_text(&mut self, value: &str) -> Result<(), FunnelError> {
        match &mut self.stage {
            Stage::Questionnaire(sequencer) => sequencer.set_text(value),
            _ => Err(self.wrong_stage(StageName::Questionnaire)),
        }
    }

    pub fn can_continue(&self) -> bool {
        match &self.stage {
            Stage::Selector { selector, .. } => selector.can_continue(),
            Stage::Questionnaire(sequencer) => sequencer.can_continue(),
            Stage::Offer(_) => false,
        }
    }

    /// Confirm the current screen. On the offer there is nothing to confirm.
    pub fn confirm(&mut self) -> Result<Transition, FunnelError> {
        match &mut self.stage {
            Stage::Selector { selector, record } => {
                let gender = std::mem::take(selector).confirm().map_err(|(stage, e)| {
                    *selector = stage;
                    e
                })?;
                let mut record = std::mem::take(record);
                record.set_scalar(ScalarField::Gender, gender.as_str());

                self.reporter.report(
                    self.reporter
                        .event(events::GENDER_SELECTED)
                        .with("gender", gender.as_str())
                        .with("step", "gender_complete")
                        .with("step_number", 1i64),
                );
                info!(client_id = %self.client_id(), %gender, "Selector completed");

                self.stage = Stage::Questionnaire(StepSequencer::new(
                    self.deps.steps,
                    record,
                    &self.reporter,
                ));
                Ok(Transition::EnteredQuestionnaire)
            }
            Stage::Questionnaire(sequencer) => match sequencer.confirm()? {
                Advance::Next(index) => Ok(Transition::NextStep { index }),
                Advance::Completed(record) => {
                    self.enter_offer(record);
                    Ok(Transition::EnteredOffer)
                }
            },
            Stage::Offer(_) => Err(self.wrong_stage(StageName::Questionnaire)),
        }
    }

    fn enter_offer(&mut self, record: AnswerRecord) {
        self.reporter.report(
            self.reporter
                .event(events::QUIZ_COMPLETED)
                .with("step", "quiz_complete")
                .with("step_number", QUIZ_COMPLETE_STEP_NUMBER)
                .with("has_email", record.has_email())
                .with("has_name", record.has_name()),
        );
        info!(client_id = %self.client_id(), "Questionnaire completed, mounting offer");

        self.stage = Stage::Offer(OfferStage::mount(
            record,
            self.deps.offer.clone(),
            &self.reporter,
            Arc::clone(&self.deps.checkout),
        ));
    }

    /// Trigger checkout. Returns the URL handed to the launcher.
    pub fn purchase(&self) -> Result<&str, FunnelError> {
        match &self.stage {
            Stage::Offer(offer) => {
                offer.purchase();
                Ok(offer.checkout_url())
            }
            _ => Err(self.wrong_stage(StageName::Offer)),
        }
    }

    /// Snapshot of the answers collected so far.
    pub fn answers(&self) -> AnswerRecord {
        match &self.stage {
            Stage::Selector { record, .. } => record.clone(),
            Stage::Questionnaire(sequencer) => sequencer.record().cloned().unwrap_or_default(),
            Stage::Offer(offer) => offer.record().clone(),
        }
    }

    /// Countdown value, only while the offer is mounted.
    pub fn countdown(&self) -> Option<Countdown> {
        match &self.stage {
            Stage::Offer(offer) => Some(offer.countdown()),
            _ => None,
        }
    }

    pub fn countdown_updates(&self) -> Option<watch::Receiver<Countdown>> {
        match &self.stage {
            Stage::Offer(offer) => Some(offer.countdown_updates()),
            _ => None,
        }
    }
}
