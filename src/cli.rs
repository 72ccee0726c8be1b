// src/cli.rs
// Line-driven terminal front end over SessionView

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::{ApiError, Explanation, FeedbackResult, HttpSessionClient, SessionDataClient};
use crate::audio::{AudioOutput, Microphone};
use crate::auth::AuthContext;
use crate::config::{self, AppConfig, ConfigError};
use crate::explanation::{DrawerState, ExplanationTicket};
use crate::practice::{AnswerCapture, InputMode, PracticePhase, SubmissionTicket};
use crate::session_view::{PinError, SessionView};
use crate::stt::{self, ServerTranscriber, Transcriber};

const HELP: &str = "\
commands:
  list                 show the session and its questions
  pin <n>              pin or unpin question n
  more                 generate and append more questions
  explain <n>          explain the concept behind question n
  close                close the explanation
  practice             enter practice mode
  select <n>           practice question n
  mode text|voice      switch answer input mode
  type <answer...>     set the typed answer
  record / stop        start / stop a voice recording
  play                 play or stop the recorded answer
  clear                discard the current answer
  submit               send the answer for evaluation
  another / again      after feedback: pick another question / retry this one
  exit                 leave practice mode
  login <token>        store an auth token
  logout               forget the stored auth token
  quit";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("usage: interview-prep <session-id>")]
    Usage,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load session: {0}")]
    Load(#[from] ApiError),

    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Help,
    List,
    Pin(usize),
    More,
    Explain(usize),
    Close,
    Practice,
    Select(usize),
    Mode(InputMode),
    Type(String),
    Record,
    Stop,
    Play,
    Clear,
    Submit,
    Another,
    Again,
    Exit,
    Login(String),
    Logout,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let index = || -> Result<usize, String> {
            rest.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("'{}' needs a question number", word))
        };

        Ok(match word {
            "help" | "?" => Command::Help,
            "list" | "ls" => Command::List,
            "pin" => Command::Pin(index()?),
            "more" => Command::More,
            "explain" => Command::Explain(index()?),
            "close" => Command::Close,
            "practice" => Command::Practice,
            "select" => Command::Select(index()?),
            "mode" => match rest {
                "text" => Command::Mode(InputMode::Text),
                "voice" => Command::Mode(InputMode::Voice),
                _ => return Err("mode is 'text' or 'voice'".to_string()),
            },
            "type" => Command::Type(rest.to_string()),
            "record" => Command::Record,
            "stop" => Command::Stop,
            "play" => Command::Play,
            "clear" => Command::Clear,
            "submit" => Command::Submit,
            "another" => Command::Another,
            "again" => Command::Again,
            "exit" => Command::Exit,
            "login" if !rest.is_empty() => Command::Login(rest.to_string()),
            "login" => return Err("login needs a token".to_string()),
            "logout" => Command::Logout,
            "quit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        })
    }
}

/// Results of calls detached from the input loop
enum Completed {
    Evaluation(SubmissionTicket, Result<FeedbackResult, ApiError>),
    Explanation(ExplanationTicket, Result<Explanation, ApiError>),
}

struct App {
    view: SessionView,
    auth: AuthContext,
    config_path: PathBuf,
    done: mpsc::UnboundedSender<Completed>,
}

pub async fn run(args: Vec<String>) -> Result<(), CliError> {
    let session_id = args
        .first()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(CliError::Usage)?;

    let config_path = config::config_path()?;
    let mut config = config::load_or_create(&config_path)?;
    config::apply_env_overrides(&mut config);
    tracing::info!("Config loaded from {}", config_path.display());

    let auth = AuthContext::initialize(&config);
    let client: Arc<dyn SessionDataClient> =
        Arc::new(HttpSessionClient::from_config(&config, auth.clone()));
    let capture = build_capture(&config, &auth);

    let (done, mut completed) = mpsc::unbounded_channel();
    let mut app = App {
        view: SessionView::new(&session_id, client, capture, &config),
        auth,
        config_path,
        done,
    };

    app.view.load().await?;
    app.print_list();
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => app.handle(command).await,
                    Err(message) => println!("{}", message),
                }
            }
            Some(result) = completed.recv() => app.apply(result),
        }
        app.flush_notifications();
    }

    app.view.exit_practice();
    tracing::info!("Bye");
    Ok(())
}

fn build_capture(config: &AppConfig, auth: &AuthContext) -> AnswerCapture {
    #[cfg(feature = "microphone")]
    let (microphone, output): (Box<dyn Microphone>, Box<dyn AudioOutput>) = (
        Box::new(crate::audio::CpalMicrophone::new(None)),
        Box::new(crate::audio::CpalSpeaker::new()),
    );
    #[cfg(not(feature = "microphone"))]
    let (microphone, output): (Box<dyn Microphone>, Box<dyn AudioOutput>) = (
        Box::new(crate::audio::NoMicrophone),
        Box::new(crate::audio::NoSpeaker),
    );

    let server = if config.transcription.server_fallback {
        let transcriber: Arc<dyn Transcriber> = Arc::new(ServerTranscriber::new(
            &config.api_base_url,
            auth.clone(),
            &config.transcription.language,
        ));
        Some(transcriber)
    } else {
        None
    };

    AnswerCapture::new(
        microphone,
        output,
        stt::config_probe(config.transcription.clone()),
        server,
    )
}

impl App {
    async fn handle(&mut self, command: Command) {
        match command {
            Command::Help => println!("{}", HELP),
            Command::List => self.print_list(),
            Command::Pin(n) => {
                if let Some(id) = self.question_id(n) {
                    match self.view.toggle_pin(&id).await {
                        Ok(_) => self.print_list(),
                        Err(PinError::Refresh { pinned, .. }) => {
                            let state = if pinned { "pinned" } else { "unpinned" };
                            println!("question {} {}; list may be out of date", n, state);
                            self.print_list();
                        }
                        Err(PinError::Toggle(_)) => {}
                    }
                }
            }
            Command::More => {
                println!("generating questions...");
                if self.view.load_more().await.is_ok() {
                    self.print_list();
                }
            }
            Command::Explain(n) => {
                let Some(id) = self.question_id(n) else { return };
                if let Some(pending) = self.view.begin_explanation(&id) {
                    println!("loading explanation...");
                    let client = self.view.client();
                    let done = self.done.clone();
                    tokio::spawn(async move {
                        let result = client.fetch_explanation(&pending.question).await;
                        let _ = done.send(Completed::Explanation(pending.ticket, result));
                    });
                }
            }
            Command::Close => self.view.close_explanation(),
            Command::Practice => {
                self.view.enable_practice();
                println!("practice mode: 'select <n>' to pick a question");
            }
            Command::Select(n) => {
                let Some(id) = self.question_id(n) else { return };
                if self.view.select_question(&id).is_ok() {
                    if let Some(q) = self.view.practice().current_question() {
                        println!("Q: {}", q.question);
                    }
                }
            }
            Command::Mode(mode) => {
                if self.view.set_input_mode(mode).is_ok() {
                    println!("input mode: {}", mode);
                }
            }
            Command::Type(text) => self.view.set_draft(&text),
            Command::Record => {
                if self.view.start_recording().is_ok() {
                    println!("recording... 'stop' when done");
                }
            }
            Command::Stop => {
                let elapsed = self.view.capture().elapsed_label();
                if self.view.stop_recording().await.is_ok() {
                    println!("recorded {}", elapsed);
                    let draft = self.view.capture().draft();
                    match self.view.capture().placeholder() {
                        Some(placeholder) if draft.is_empty() => println!("{}", placeholder),
                        _ => println!("transcript: {}", draft),
                    }
                }
            }
            Command::Play => {
                if self.view.capture().is_playing() {
                    self.view.stop_playback();
                } else {
                    let _ = self.view.play_recording();
                }
            }
            Command::Clear => self.view.clear_answer(),
            Command::Submit => match self.view.begin_evaluation() {
                Ok(Some(pending)) => {
                    println!("evaluating...");
                    let client = self.view.client();
                    let done = self.done.clone();
                    tokio::spawn(async move {
                        let result = client.evaluate_answer(&pending.request).await;
                        let _ = done.send(Completed::Evaluation(pending.ticket, result));
                    });
                }
                Ok(None) => println!("already evaluating"),
                Err(_) => {}
            },
            Command::Another => {
                if self.view.try_another().is_ok() {
                    println!("pick another question with 'select <n>'");
                }
            }
            Command::Again => {
                if self.view.practice_again().is_ok() {
                    println!("try again, 'submit' when ready");
                }
            }
            Command::Exit => self.view.exit_practice(),
            Command::Login(token) => self.login(&token),
            Command::Logout => self.logout(),
            Command::Quit => {}
        }
    }

    fn apply(&mut self, completed: Completed) {
        match completed {
            Completed::Evaluation(ticket, result) => {
                self.view.finish_evaluation(ticket, result);
                if self.view.practice().phase() == PracticePhase::Reviewing {
                    if let Some(feedback) = self.view.feedback_view() {
                        println!("\n{}\n", feedback);
                        println!("'another' or 'again'");
                    }
                }
            }
            Completed::Explanation(ticket, result) => {
                if self.view.finish_explanation(ticket, result) {
                    match self.view.drawer().state() {
                        DrawerState::Loaded { explanation, .. } => {
                            println!("\n{}\n\n{}\n", explanation.title, explanation.explanation)
                        }
                        DrawerState::Failed { message, .. } => println!("{}", message),
                        _ => {}
                    }
                }
            }
        }
    }

    fn login(&mut self, token: &str) {
        match config::store_auth_token(&self.config_path, Some(token)) {
            Ok(config) => {
                let user_name = Some(config.user_name).filter(|n| !n.is_empty());
                self.auth.login(token.trim().to_string(), user_name);
                println!("logged in ({})", config::mask_token(token.trim()));
            }
            Err(e) => self.view.notifications().error(e.to_string()),
        }
    }

    fn logout(&mut self) {
        self.auth.logout();
        match config::store_auth_token(&self.config_path, None) {
            Ok(_) => println!("logged out"),
            Err(e) => self.view.notifications().error(e.to_string()),
        }
    }

    fn question_id(&mut self, n: usize) -> Option<String> {
        let id = self.view.questions().get(n - 1).map(|q| q.id.clone());
        if id.is_none() {
            self.view
                .notifications()
                .warning(format!("No question #{}", n));
        }
        id
    }

    fn print_list(&self) {
        if let Some(header) = self.view.header() {
            println!("{}\n", header);
        }
        for (i, q) in self.view.questions().iter().enumerate() {
            let pin = if q.is_pinned { "*" } else { " " };
            println!("{:>3}{} {}", i + 1, pin, q.question);
        }
    }

    fn flush_notifications(&mut self) {
        for notification in self.view.notifications().drain() {
            println!("{}", notification);
        }
    }
}
