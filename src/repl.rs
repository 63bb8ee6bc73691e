//! Interactive terminal front end.
//!
//! One turn at a time: read a line, stream the response, re-split the
//! accumulated text on every fragment, and render the reasoning and answer
//! regions. The loop blocks while a stream is outstanding; there is no
//! cancellation, so a stream runs to completion or transport failure.

use std::io::Write as _;
use std::time::{Duration, Instant};

use crossterm::style::Stylize;
use futures::{pin_mut, StreamExt};
use tokio::io::AsyncBufReadExt;

use crate::chat::{split_response, ChatSession, SplitResponse};
use crate::inference::{ClientConfig, OllamaClient, Role};

/// A line of user input, resolved to a local command or a model prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Prompt(String),
    Models,
    ToggleThinking,
    History,
    Clear,
    Stats,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Prompt(trimmed.to_string());
    };
    match command {
        "models" => Input::Models,
        "think" => Input::ToggleThinking,
        "history" => Input::History,
        "clear" => Input::Clear,
        "stats" => Input::Stats,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

const HELP: &str = "\
  /models  list models available on the server\n\
  /think   toggle reasoning visibility\n\
  /history replay the conversation so far\n\
  /clear   drop the conversation history\n\
  /stats   message counts for this session\n\
  /help    this text\n\
  /quit    exit";

/// Run the interactive chat loop until `/quit` or end of input.
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let client = OllamaClient::from_config(&config)?;
    let mut session = ChatSession::new(config.show_reasoning);

    tracing::info!(session_id = %session.id(), model = %config.model, "session started");

    println!("{} (model: {})", "localchat".bold(), config.model);
    startup_check(&client, &config.model).await;
    println!("{}", "type a message, or /help for commands".dim());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("{} ", "›".bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // end of input
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(cmd) => {
                println!("unknown command: /{cmd}");
                println!("{HELP}");
            }
            Input::Models => {
                let models = client.list_models().await;
                if models.is_empty() {
                    println!("no models found (is the server running at {}?)", client.base_url());
                } else {
                    for m in models {
                        println!("  {}  {}", m.name, format_model_details(&m.parameter_size, &m.quantization_level).dim());
                    }
                }
            }
            Input::ToggleThinking => {
                session.show_reasoning = !session.show_reasoning;
                println!(
                    "reasoning {}",
                    if session.show_reasoning { "shown" } else { "hidden" }
                );
            }
            Input::History => {
                for turn in session.turns() {
                    print_turn(turn, session.show_reasoning);
                }
            }
            Input::Clear => {
                session.clear();
                println!("history cleared");
            }
            Input::Stats => {
                println!(
                    "{} user / {} assistant messages",
                    session.user_turn_count(),
                    session.assistant_turn_count()
                );
            }
            Input::Prompt(text) => {
                run_turn(&client, &config, &mut session, &text).await;
            }
        }
    }

    tracing::info!(session_id = %session.id(), turns = session.turns().len(), "session ended");
    Ok(())
}

fn format_model_details(parameter_size: &str, quantization: &str) -> String {
    match (parameter_size.is_empty(), quantization.is_empty()) {
        (true, true) => String::new(),
        (false, true) => parameter_size.to_string(),
        (true, false) => quantization.to_string(),
        (false, false) => format!("{parameter_size} {quantization}"),
    }
}

/// Startup connection check: probe the server, then verify the configured
/// model is present in the catalog.
async fn startup_check(client: &OllamaClient, model: &str) {
    if !client.check_availability().await {
        println!(
            "{}",
            format!(
                "server unreachable at {} (start it with `ollama serve`)",
                client.base_url()
            )
            .yellow()
        );
        return;
    }

    let models = client.list_models().await;
    if models.iter().any(|m| m.name == model) {
        println!("{}", "connected".green());
    } else {
        println!(
            "{}",
            format!("model '{model}' not found on the server (run `ollama pull {model}`)").yellow()
        );
    }
}

/// Drive one full inference call: append the user turn, stream the response
/// while rendering incrementally, and record the assistant turn.
async fn run_turn(
    client: &OllamaClient,
    config: &ClientConfig,
    session: &mut ChatSession,
    text: &str,
) {
    session.push_user(text);
    let messages = session.build_messages();

    let started = Instant::now();
    let stream = client
        .chat_stream(&config.model, messages, config.options.clone())
        .await;
    pin_mut!(stream);

    let mut accumulated = String::new();
    let mut renderer = TurnRenderer::new(session.show_reasoning);

    while let Some(fragment) = stream.next().await {
        accumulated.push_str(&fragment);
        renderer.render(&split_response(&accumulated));
    }

    let split = session.record_response(&accumulated);
    renderer.finish(&split, &accumulated, started.elapsed());

    tracing::info!(
        session_id = %session.id(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        response_chars = accumulated.len(),
        had_reasoning = !split.reasoning.is_empty(),
        "turn complete"
    );
}

// ─── Incremental rendering ───────────────────────────────────────────────────

/// Renders the two response regions as the accumulated text grows.
///
/// The reasoning block is printed once, when it first closes. The answer
/// region is printed as a growing suffix; if a late reasoning block rewrites
/// text already on screen, the full answer is reprinted on a fresh line.
struct TurnRenderer {
    show_reasoning: bool,
    reasoning_printed: bool,
    printed_answer: String,
}

impl TurnRenderer {
    fn new(show_reasoning: bool) -> Self {
        Self {
            show_reasoning,
            reasoning_printed: false,
            printed_answer: String::new(),
        }
    }

    fn render(&mut self, split: &SplitResponse) {
        if !split.reasoning.is_empty() && !self.reasoning_printed {
            self.reasoning_printed = true;
            if self.show_reasoning {
                print_reasoning(&split.reasoning);
            }
        }

        if split.answer.is_empty() {
            return;
        }
        if let Some(delta) = split.answer.strip_prefix(self.printed_answer.as_str()) {
            print!("{delta}");
        } else {
            // Text already on screen changed (a reasoning block closed over
            // it); reprint the whole answer region
            println!();
            print!("{}", split.answer);
        }
        let _ = std::io::stdout().flush();
        self.printed_answer = split.answer.clone();
    }

    fn finish(&mut self, split: &SplitResponse, raw: &str, elapsed: Duration) {
        // A response with no answer region (stream died mid-block, or a bare
        // reasoning block) is still shown, matching what gets recorded
        if self.printed_answer.is_empty() {
            let fallback = if split.answer.is_empty() {
                raw.trim()
            } else {
                &split.answer
            };
            print!("{fallback}");
        }
        println!();
        println!("{}", format!("({:.1}s)", elapsed.as_secs_f64()).dim());
    }
}

fn print_reasoning(reasoning: &str) {
    println!("{}", "┌─ thinking".dim());
    for line in reasoning.lines() {
        println!("{} {}", "│".dim(), line.dim());
    }
    println!("{}", "└─".dim());
}

/// Render a previously recorded turn for the `/history` replay.
fn print_turn(turn: &crate::chat::ConversationTurn, show_reasoning: bool) {
    match turn.role {
        Role::User => println!("{} {}", "›".bold(), turn.content),
        Role::Assistant => {
            if show_reasoning {
                if let Some(reasoning) = &turn.reasoning {
                    print_reasoning(reasoning);
                }
            }
            println!("{}", turn.content);
        }
        Role::System => {}
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
