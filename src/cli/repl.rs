use crate::cli::commands::{Command, HELP_TEXT, is_command_line, parse_command};
use crate::cli::theme::Theme;
use crate::config::ThemeToken;
use crate::conversation::Conversation;
use crate::llm::models::{KNOWN_MODELS, display_name};
use crate::llm::provider::Role;
use crate::relay::{Mode, Relay, TurnError, TurnResult};
use crate::trace::SessionTrace;
use anyhow::Result;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

const CREDENTIAL_HINT: &str =
    "Set OPENAI_API_KEY in your shell, a .env file, or openai_api_key in the config file.";

/// Everything one interactive chat needs: the conversation, the relay that
/// answers it and where to record it.
pub struct ChatSession<R> {
    pub conversation: Conversation,
    pub relay: R,
    pub theme: Theme,
    pub trace: SessionTrace,
    pub startup_message: Option<String>,
}

pub async fn run_repl<R: Relay>(session: &mut ChatSession<R>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    {
        let mut stdout = io::stdout().lock();
        write_banner(session, &mut stdout)?;
    }

    loop {
        {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", session.theme.prompt(session.conversation.mode()))?;
            stdout.flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let mut output = Vec::new();
        session.handle_line(line, &mut output).await?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(&output)?;
        stdout.flush()?;
    }

    Ok(())
}

fn write_banner<R>(session: &ChatSession<R>, out: &mut impl Write) -> io::Result<()> {
    let theme = &session.theme;
    writeln!(
        out,
        "{}",
        theme.paint(
            ThemeToken::SystemInfo,
            "Welcome to PathwayAI. Type /help for commands, /modes to pick a mode, exit to leave."
        )
    )?;
    writeln!(
        out,
        "{}",
        theme.paint(ThemeToken::SystemInfo, &describe_setup(&session.conversation))
    )?;
    if let Some(message) = &session.startup_message {
        writeln!(out, "{}", theme.paint(ThemeToken::SystemError, message))?;
    }
    Ok(())
}

impl<R: Relay> ChatSession<R> {
    /// Handles one trimmed input line that is not `exit`/`quit`.
    pub async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<()> {
        if line.is_empty() {
            return Ok(());
        }

        if is_command_line(line) {
            self.trace.log_output("cmd.in", line);
            return match parse_command(line) {
                Ok(command) => self.run_command(command, out).await,
                Err(err) => self.error_line(out, err.message()),
            };
        }

        self.trace
            .log_user_input(self.conversation.mode().tag(), line);
        self.info_line_as(out, ThemeToken::AssistantWaiting, "Thinking...")?;
        let result = self.conversation.submit(&self.relay, line).await;
        self.report_turn(result, out)
    }

    async fn run_command(&mut self, command: Command, out: &mut impl Write) -> io::Result<()> {
        match command {
            Command::Help => self.info_line(out, HELP_TEXT),
            Command::Mode(None) => {
                let mode = self.conversation.mode();
                self.info_line(
                    out,
                    &format!(
                        "Mode: {} ({}: {})",
                        mode.tag(),
                        mode.display_name(),
                        mode.description()
                    ),
                )
            }
            Command::Mode(Some(mode)) => {
                self.conversation.change_mode(mode);
                self.info_line(
                    out,
                    &format!("Switched to {} mode ({})", mode.display_name(), mode.tag()),
                )
            }
            Command::Modes => {
                let current = self.conversation.mode();
                let listing = Mode::ALL
                    .iter()
                    .map(|mode| {
                        format!(
                            "{} {:<12} {}: {}",
                            if *mode == current { '*' } else { ' ' },
                            mode.tag(),
                            mode.display_name(),
                            mode.description()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                self.info_line(out, &listing)
            }
            Command::Model(None) => {
                let text = format!("Model: {}", describe_model(self.conversation.model()));
                self.info_line(out, &text)
            }
            Command::Model(Some(model)) => {
                let text = format!("Model set to {}", describe_model(&model));
                self.conversation.change_model(model);
                self.info_line(out, &text)
            }
            Command::Models => {
                let current = self.conversation.model();
                let listing = KNOWN_MODELS
                    .iter()
                    .map(|model| {
                        format!(
                            "{} {:<24} {}",
                            if model.id == current { '*' } else { ' ' },
                            model.id,
                            model.name
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                self.info_line(out, &listing)
            }
            Command::History(limit) => {
                let transcript = self.conversation.transcript();
                if transcript.is_empty() {
                    return self.info_line(out, "No messages yet");
                }
                let skip = limit.map_or(0, |n| transcript.len().saturating_sub(n));
                let listing = transcript[skip..]
                    .iter()
                    .map(|message| {
                        let who = match message.role {
                            Role::User => "you",
                            Role::Assistant => "ai",
                            Role::System => "system",
                        };
                        format!("{who}: {}", message.content)
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                self.info_line(out, &listing)
            }
            Command::Retry => {
                if self.conversation.last_error().is_none() {
                    return self.info_line(out, "Nothing to retry");
                }
                self.info_line_as(out, ThemeToken::AssistantWaiting, "Retrying...")?;
                let result = self.conversation.retry(&self.relay).await;
                self.report_turn(result, out)
            }
            Command::Trace => {
                let text = format!("Trace file: {}", self.trace.file_path().display());
                self.info_line(out, &text)
            }
        }
    }

    fn report_turn(&self, result: Option<TurnResult>, out: &mut impl Write) -> io::Result<()> {
        match result {
            None => Ok(()),
            Some(Ok(reply)) => {
                self.trace.log_assistant_reply(&reply);
                writeln!(
                    out,
                    "{}",
                    self.theme.paint(ThemeToken::AssistantText, &reply)
                )
            }
            Some(Err(err)) => {
                let message = format!("Request failed: {err}");
                self.trace.log_turn_error(&message);
                self.error_line(out, &message)?;
                if matches!(err, TurnError::ConfigurationError(_)) {
                    self.info_line(out, CREDENTIAL_HINT)?;
                }
                self.info_line(out, "Type /retry to send it again.")
            }
        }
    }

    fn info_line(&self, out: &mut impl Write, text: &str) -> io::Result<()> {
        self.info_line_as(out, ThemeToken::SystemInfo, text)
    }

    fn info_line_as(&self, out: &mut impl Write, token: ThemeToken, text: &str) -> io::Result<()> {
        for line in text.lines() {
            writeln!(out, "{}", self.theme.paint(token, line))?;
        }
        Ok(())
    }

    fn error_line(&self, out: &mut impl Write, text: &str) -> io::Result<()> {
        self.info_line_as(out, ThemeToken::SystemError, text)
    }
}

fn describe_setup(conversation: &Conversation) -> String {
    format!(
        "Mode: {}. Model: {}.",
        conversation.mode().display_name(),
        describe_model(conversation.model())
    )
}

fn describe_model(id: &str) -> String {
    match display_name(id) {
        Some(name) => format!("{id} ({name})"),
        None => id.to_string(),
    }
}
