//! Step sequencer: walks the questionnaire one step at a time.

use tracing::{debug, info};

use super::buffer::SelectionBuffer;
use super::model::AnswerRecord;
use super::steps::{StepDefinition, StepKind, TextInput};
use crate::analytics::{EventReporter, events, labels};
use crate::error::FunnelError;

/// Characters of the step title included in analytics.
pub const REPORTED_TITLE_CHARS: usize = 50;

/// Step numbers in analytics count the selector as step 1.
const STEP_NUMBER_OFFSET: usize = 2;

/// Outcome of a successful confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the step at this index.
    Next(usize),
    /// That was the last step; the finished record is handed back.
    Completed(AnswerRecord),
}

/// Owns the cursor, the selection buffer and, until completion, the record.
pub struct StepSequencer {
    steps: &'static [StepDefinition],
    cursor: usize,
    buffer: SelectionBuffer,
    record: Option<AnswerRecord>,
    reporter: EventReporter,
}

impl StepSequencer {
    pub fn new(
        steps: &'static [StepDefinition],
        record: AnswerRecord,
        reporter: &EventReporter,
    ) -> Self {
        Self {
            steps,
            cursor: 0,
            buffer: SelectionBuffer::new(),
            record: Some(record),
            reporter: reporter.labelled(labels::STEPS),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.record.is_none()
    }

    /// Step in view, `None` once completed.
    pub fn current_step(&self) -> Option<&'static StepDefinition> {
        if self.is_completed() {
            return None;
        }
        self.steps.get(self.cursor)
    }

    pub fn buffer(&self) -> &SelectionBuffer {
        &self.buffer
    }

    /// Answers collected so far, `None` once handed back.
    pub fn record(&self) -> Option<&AnswerRecord> {
        self.record.as_ref()
    }

    fn active_step(&self) -> Result<&'static StepDefinition, FunnelError> {
        self.current_step().ok_or(FunnelError::AlreadyCompleted)
    }

    /// Pick or toggle an option on a choice step.
    pub fn select(&mut self, option: &str) -> Result<(), FunnelError> {
        let step = self.active_step()?;
        if !step.kind.is_choice() {
            return Err(FunnelError::WrongStepKind {
                step: self.cursor,
                expected: "choice".to_string(),
            });
        }
        if !step.kind.options().contains(&option) {
            return Err(FunnelError::OptionNotOffered {
                step: self.cursor,
                option: option.to_string(),
            });
        }

        match step.kind {
            StepKind::MultiChoice { max_selections, .. } => {
                if !self.buffer.toggle(option, max_selections) {
                    debug!(step = self.cursor, option, "Selection cap reached");
                }
            }
            _ => self.buffer.replace(option),
        }
        Ok(())
    }

    /// Mirror the current input of a free-text step.
    pub fn set_text(&mut self, value: &str) -> Result<(), FunnelError> {
        let step = self.active_step()?;
        if step.kind.text_input().is_none() {
            return Err(FunnelError::WrongStepKind {
                step: self.cursor,
                expected: "text".to_string(),
            });
        }
        self.buffer.set_text(value);
        Ok(())
    }

    /// Display steps can always be continued; everything else needs input.
    pub fn can_continue(&self) -> bool {
        match self.current_step() {
            Some(step) => step.kind.is_display() || !self.buffer.is_empty(),
            None => false,
        }
    }

    /// Commit the buffer for the current step and move on.
    pub fn confirm(&mut self) -> Result<Advance, FunnelError> {
        if self.is_completed() {
            return Err(FunnelError::AlreadyCompleted);
        }
        let Some(step) = self.steps.get(self.cursor) else {
            return self.complete();
        };
        if !self.can_continue() {
            return Err(FunnelError::ContinueDisabled);
        }

        if let Some(record) = self.record.as_mut() {
            apply_answer(record, &step.kind, &self.buffer);
        }
        self.report_step(step);

        if self.cursor + 1 < self.steps.len() {
            self.cursor += 1;
            self.buffer.clear();
            debug!(step = self.cursor, "Advanced to next step");
            Ok(Advance::Next(self.cursor))
        } else {
            self.complete()
        }
    }

    fn complete(&mut self) -> Result<Advance, FunnelError> {
        let record = self.record.take().ok_or(FunnelError::AlreadyCompleted)?;
        self.buffer.clear();
        info!(steps = self.steps.len(), "Questionnaire completed");
        Ok(Advance::Completed(record))
    }

    fn report_step(&self, step: &StepDefinition) {
        let step_number = self.cursor + STEP_NUMBER_OFFSET;
        self.reporter.report(
            self.reporter
                .event(events::STEP_COMPLETED)
                .with("step_number", step_number)
                .with("step_type", step.kind.type_tag())
                .with("step_title", step.truncated_title(REPORTED_TITLE_CHARS))
                .with("selected_options", self.buffer.joined())
                .with("total_steps", self.steps.len() + STEP_NUMBER_OFFSET),
        );

        let value = self.buffer.first().unwrap_or_default().to_string();
        match step.kind.text_input() {
            Some(TextInput::Email) => self.reporter.report(
                self.reporter
                    .event(events::EMAIL_COLLECTED)
                    .with("email", value)
                    .with("step_number", step_number),
            ),
            Some(TextInput::Name) => self.reporter.report(
                self.reporter
                    .event(events::NAME_COLLECTED)
                    .with("name", value)
                    .with("step_number", step_number),
            ),
            None => {}
        }
    }
}

/// Write the buffer into the field the step is bound to.
fn apply_answer(record: &mut AnswerRecord, kind: &StepKind, buffer: &SelectionBuffer) {
    match kind {
        StepKind::SingleChoice { field, .. }
        | StepKind::YesNo { field }
        | StepKind::FreeText { field, .. } => {
            if let Some(value) = buffer.first() {
                record.set_scalar(*field, value);
            }
        }
        StepKind::MultiChoice { field, .. } => record.set_list(*field, buffer.values().to_vec()),
        StepKind::Info
        | StepKind::SocialProof(_)
        | StepKind::Credibility(_)
        | StepKind::Result => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::analytics::MemoryAnalytics;
    use crate::funnel::model::{ListField, ScalarField};
    use crate::funnel::steps::catalog;

    static SHORT: &[StepDefinition] = &[
        StepDefinition::new(
            "Pick **one**",
            StepKind::SingleChoice {
                options: &["a", "b"],
                field: ScalarField::Age,
            },
        ),
        StepDefinition::new(
            "Pick two",
            StepKind::MultiChoice {
                options: &["x", "y", "z"],
                max_selections: Some(2),
                field: ListField::Appliances,
            },
        ),
        StepDefinition::new("Hello", StepKind::Info),
        StepDefinition::new(
            "Mail?",
            StepKind::FreeText {
                input: TextInput::Email,
                field: ScalarField::Email,
            },
        ),
    ];

    fn sequencer(steps: &'static [StepDefinition]) -> (StepSequencer, Arc<MemoryAnalytics>) {
        let sink = MemoryAnalytics::new();
        let reporter = EventReporter::new(sink.clone(), Uuid::new_v4());
        (
            StepSequencer::new(steps, AnswerRecord::default(), &reporter),
            sink,
        )
    }

    #[test]
    fn single_choice_replaces() {
        let (mut seq, _) = sequencer(SHORT);
        seq.select("a").unwrap();
        seq.select("b").unwrap();
        assert_eq!(seq.buffer().values(), ["b".to_string()]);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let (mut seq, _) = sequencer(SHORT);
        let err = seq.select("nope").unwrap_err();
        assert_eq!(
            err,
            FunnelError::OptionNotOffered {
                step: 0,
                option: "nope".into()
            }
        );
        assert!(seq.buffer().is_empty());
    }

    #[test]
    fn text_on_choice_step_is_wrong_kind() {
        let (mut seq, _) = sequencer(SHORT);
        assert!(matches!(
            seq.set_text("hi"),
            Err(FunnelError::WrongStepKind { step: 0, .. })
        ));
    }

    #[test]
    fn confirm_requires_selection() {
        let (mut seq, sink) = sequencer(SHORT);
        assert!(!seq.can_continue());
        assert_eq!(seq.confirm(), Err(FunnelError::ContinueDisabled));
        assert_eq!(seq.cursor(), 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn multi_choice_respects_cap_and_resets_on_advance() {
        let (mut seq, _) = sequencer(SHORT);
        seq.select("a").unwrap();
        assert_eq!(seq.confirm(), Ok(Advance::Next(1)));
        assert!(seq.buffer().is_empty());

        for opt in ["x", "y", "z"] {
            seq.select(opt).unwrap();
        }
        assert_eq!(seq.buffer().len(), 2);
        assert!(!seq.buffer().contains("z"));
        seq.confirm().unwrap();

        let record = seq.record().unwrap();
        assert_eq!(record.age, "a");
        assert_eq!(record.appliances, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn display_step_continues_with_empty_buffer() {
        let (mut seq, _) = sequencer(SHORT);
        seq.select("a").unwrap();
        seq.confirm().unwrap();
        seq.select("x").unwrap();
        seq.confirm().unwrap();
        assert!(seq.can_continue());
        assert_eq!(seq.confirm(), Ok(Advance::Next(3)));
    }

    #[test]
    fn completes_exactly_once() {
        let (mut seq, sink) = sequencer(SHORT);
        seq.select("b").unwrap();
        seq.confirm().unwrap();
        seq.select("z").unwrap();
        seq.confirm().unwrap();
        seq.confirm().unwrap();
        seq.set_text("a@b.com").unwrap();

        let record = match seq.confirm().unwrap() {
            Advance::Completed(record) => record,
            other => panic!("expected completion, got {other:?}"),
        };
        assert_eq!(record.email, "a@b.com");
        assert_eq!(record.appliances, vec!["z".to_string()]);
        assert!(seq.is_completed());
        assert!(seq.current_step().is_none());

        assert_eq!(seq.confirm(), Err(FunnelError::AlreadyCompleted));
        assert_eq!(seq.select("a"), Err(FunnelError::AlreadyCompleted));

        assert_eq!(sink.count(events::STEP_COMPLETED), 4);
        assert_eq!(sink.count(events::EMAIL_COLLECTED), 1);
    }

    #[test]
    fn step_event_carries_number_type_and_title() {
        let (mut seq, sink) = sequencer(catalog());
        seq.select("30s").unwrap();
        seq.confirm().unwrap();
        seq.confirm().unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].integer("step_number"), Some(2));
        assert_eq!(events[0].text("step_type"), Some("single"));
        assert_eq!(events[0].text("step_title"), Some("What's your age?"));
        assert_eq!(events[0].text("selected_options"), Some("30s"));
        assert_eq!(events[0].integer("total_steps"), Some(33));
        assert_eq!(events[0].text("event_label"), Some("Quiz_Steps"));

        assert_eq!(events[1].text("step_type"), Some("social"));
        assert_eq!(
            events[1].text("step_title").map(|t| t.chars().count()),
            Some(REPORTED_TITLE_CHARS)
        );
    }

    #[test]
    fn continue_gating_holds_for_every_interactive_step() {
        for (index, step) in catalog().iter().enumerate() {
            if step.kind.is_display() {
                continue;
            }
            let (mut seq, _) = sequencer(catalog());
            seq.cursor = index;
            assert!(!seq.can_continue(), "step {index} enabled with empty buffer");

            match step.kind.options().first() {
                Some(first) => seq.select(first).unwrap(),
                None => seq.set_text("value").unwrap(),
            }
            assert!(seq.can_continue(), "step {index} disabled with a selection");
        }
    }

    #[test]
    fn blank_text_edit_keeps_continue_enabled() {
        let (mut seq, _) = sequencer(SHORT);
        seq.cursor = 3;
        assert!(!seq.can_continue());
        seq.set_text("a@b.com").unwrap();
        assert!(seq.can_continue());
        seq.set_text("").unwrap();
        assert!(seq.can_continue());
        seq.set_text("   ").unwrap();
        assert!(seq.can_continue());
    }

    #[test]
    fn yes_no_offers_only_yes_and_no() {
        let (mut seq, _) = sequencer(catalog());
        seq.cursor = 8;
        assert!(seq.select("Maybe").is_err());
        seq.select("Yes").unwrap();
        seq.confirm().unwrap();
        assert_eq!(seq.record().unwrap().sourdough, "Yes");
    }
}
