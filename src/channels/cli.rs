//! CLI channel: drives one funnel from stdin/stdout for local runs.

use futures::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::{ChannelError, FunnelError};
use crate::funnel::flow::{FunnelFlow, Stage, Transition};
use crate::funnel::model::Gender;
use crate::funnel::view::StageView;

const CHANNEL_NAME: &str = "cli";

/// One line of user input, interpreted against the screen in view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Confirm,
    Buy,
    /// 1-based option (or gender) number.
    Pick(usize),
    Text(String),
}

impl Command {
    /// Parse a line. On a text step everything but the control words is text.
    pub fn parse(line: &str, expects_text: bool) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "/quit" => return Self::Quit,
            "" | "ok" => return Self::Confirm,
            "buy" => return Self::Buy,
            _ => {}
        }
        if !expects_text {
            if let Ok(n) = line.parse::<usize>() {
                return Self::Pick(n);
            }
        }
        Self::Text(line.to_string())
    }
}

/// A funnel driven by typed commands.
pub struct TerminalSession {
    flow: FunnelFlow,
}

impl TerminalSession {
    pub fn new(flow: FunnelFlow) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &FunnelFlow {
        &self.flow
    }

    pub fn expects_text(&self) -> bool {
        match self.flow.stage() {
            Stage::Questionnaire(seq) => seq
                .current_step()
                .is_some_and(|step| step.kind.text_input().is_some()),
            _ => false,
        }
    }

    /// Apply one command. Returns a short note for the user, if any.
    pub fn apply(&mut self, command: Command) -> Result<Option<String>, FunnelError> {
        match command {
            Command::Quit => Ok(None),
            Command::Confirm => match self.flow.confirm()? {
                Transition::EnteredOffer => Ok(Some("Your plan is ready!".to_string())),
                Transition::EnteredQuestionnaire | Transition::NextStep { .. } => Ok(None),
            },
            Command::Buy => {
                let url = self.flow.purchase()?;
                Ok(Some(format!("Opening checkout: {url}")))
            }
            Command::Pick(n) => self.pick(n).map(|_| None),
            Command::Text(text) => self.flow.set_text(&text).map(|_| None),
        }
    }

    fn pick(&mut self, n: usize) -> Result<(), FunnelError> {
        let index = n.saturating_sub(1);
        match self.flow.stage() {
            Stage::Selector { .. } => {
                let gender = Gender::ALL.get(index).copied().ok_or_else(|| {
                    FunnelError::OptionNotOffered {
                        step: 0,
                        option: n.to_string(),
                    }
                })?;
                self.flow.select_gender(gender)
            }
            Stage::Questionnaire(seq) => {
                let step = seq.current_step().ok_or(FunnelError::AlreadyCompleted)?;
                let option = step.kind.options().get(index).copied().ok_or_else(|| {
                    FunnelError::OptionNotOffered {
                        step: seq.cursor(),
                        option: n.to_string(),
                    }
                })?;
                self.flow.select(option)
            }
            Stage::Offer(_) => self.flow.select(&n.to_string()),
        }
    }

    pub fn render(&self) -> String {
        StageView::of(&self.flow).render_terminal()
    }
}

/// Lines from stdin as a stream. Ends on EOF or read error.
pub fn stdin_lines() -> impl Stream<Item = String> + Unpin {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    }))
}

async fn write_out<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), ChannelError> {
    out.write_all(text.as_bytes())
        .await
        .map_err(|e| ChannelError::WriteFailed {
            name: CHANNEL_NAME.to_string(),
            reason: e.to_string(),
        })?;
    out.flush().await.map_err(|e| ChannelError::WriteFailed {
        name: CHANNEL_NAME.to_string(),
        reason: e.to_string(),
    })
}

/// Run the session until `/quit` or end of input.
pub async fn run<S, W>(
    mut session: TerminalSession,
    mut input: S,
    mut out: W,
) -> Result<TerminalSession, ChannelError>
where
    S: Stream<Item = String> + Unpin,
    W: AsyncWrite + Unpin,
{
    write_out(&mut out, &session.render()).await?;
    write_out(&mut out, "> ").await?;

    while let Some(line) = input.next().await {
        let command = Command::parse(&line, session.expects_text());
        if command == Command::Quit {
            info!("Terminal session ended by user");
            break;
        }
        debug!(?command, "Terminal command");

        match session.apply(command) {
            Ok(Some(note)) => write_out(&mut out, &format!("\n{note}\n")).await?,
            Ok(None) => {}
            Err(e) => write_out(&mut out, &format!("\n! {e}\n")).await?,
        }
        write_out(&mut out, &format!("\n{}> ", session.render())).await?;
    }

    Ok(session)
}
