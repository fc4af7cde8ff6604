//! Pitchside terminal host.
//!
//! Runs one chat session on stdin/stdout. Plain lines are submitted as
//! questions; slash commands drive the widget. Session events are forwarded
//! from a subscribed listener into the main loop, which renders them.

mod cli;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use pitchside_chat::{ChatError, ChatSession, Message};
use pitchside_core::config::PitchsideConfig;
use pitchside_core::events::ChatEvent;
use pitchside_core::types::{MessageRole, Visibility};

use cli::{CliArgs, Command};

fn print_message(message: &Message) {
    let speaker = match message.role() {
        MessageRole::User => "you",
        MessageRole::Assistant => "analyst",
    };
    println!("[{}] {}: {}", message.time_label(), speaker, message.content());
}

fn print_history(session: &ChatSession) {
    for message in session.messages() {
        print_message(&message);
    }
}

fn print_help() {
    println!("Type a question and press enter, or use a command:");
    println!("  /open /close /min /expand /toggle");
    println!("  /quick [n]   list suggested questions or ask number n");
    println!("  /history     show the whole conversation");
    println!("  /cancel      drop the reply being prepared");
    println!("  /quit");
}

fn render_event(session: &ChatSession, event: &ChatEvent) {
    match event {
        ChatEvent::MessageAppended {
            message_id,
            role: MessageRole::Assistant,
            ..
        } => match session.visibility() {
            Visibility::Expanded => {
                if let Some(message) = session.message(*message_id) {
                    print_message(&message);
                }
            }
            Visibility::Minimized => println!("(new reply, /expand to read)"),
            Visibility::Closed => {}
        },
        ChatEvent::PhaseChanged { awaiting: true, .. } => {
            if session.visibility() == Visibility::Expanded {
                println!("analyst is typing...");
            }
        }
        ChatEvent::VisibilityChanged { visibility, .. } => match visibility {
            Visibility::Expanded => print_history(session),
            other => println!("[chat {}]", other),
        },
        ChatEvent::ResponseCancelled { .. } => println!("(reply cancelled)"),
        _ => {}
    }
}

fn report(result: Result<u64, ChatError>) {
    match result {
        Ok(id) => tracing::debug!(message_id = id, "Question submitted"),
        // A blank line is a no-op.
        Err(ChatError::EmptySubmission) => {}
        Err(e) => println!("({})", e),
    }
}

fn run_command(session: &ChatSession, command: Command) {
    match command {
        Command::Submit(text) => {
            if !session.visibility().is_open() {
                println!("(chat is closed, /open first)");
                return;
            }
            report(session.submit(&text));
        }
        Command::Open => {
            session.open();
        }
        Command::Close => {
            session.close();
        }
        Command::Minimize => {
            session.minimize();
        }
        Command::Expand => {
            session.expand();
        }
        Command::Toggle => {
            session.toggle_minimize();
        }
        Command::Quick(None) => {
            for (i, question) in session.quick_questions().iter().enumerate() {
                println!("  {}. {}", i + 1, question);
            }
        }
        Command::Quick(Some(n)) => {
            let result = match n.checked_sub(1) {
                Some(index) => session.quick_question(index).map(str::to_string),
                None => None,
            };
            match result {
                Some(question) => report(session.ask(&question)),
                None => report(Err(ChatError::QuickQuestionOutOfRange(n))),
            }
        }
        Command::History => print_history(session),
        Command::Cancel => {
            if !session.cancel_pending() {
                println!("(nothing to cancel)");
            }
        }
        Command::Help => print_help(),
        Command::Unknown(input) => println!("(unknown command {}, try /help)", input),
        Command::Quit => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_file = args.resolve_config_path();
    // Read before tracing is installed so the file's log level can apply;
    // the outcome is logged below.
    let loaded = PitchsideConfig::load(&config_file);

    // Tracing.
    let level = args.resolve_log_level(
        loaded
            .as_ref()
            .ok()
            .map(|config| config.general.log_level.as_str()),
    );
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Pitchside v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let mut config = match loaded {
        Ok(config) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Failed to load config, using defaults"
            );
            PitchsideConfig::default()
        }
    };
    if let Some(delay) = args.delay_ms {
        config.chat.response_delay_ms = delay;
    }

    if args.write_config {
        config.save(&config_file)?;
        println!("Wrote {}", config_file.display());
        return Ok(());
    }

    // Session.
    let session = ChatSession::new(&config.chat)?;
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ChatEvent>();
    let _subscription = session.subscribe(move |event: &ChatEvent| {
        let _ = events_tx.send(event.clone());
    });
    tracing::info!(
        session_id = %session.id(),
        delay_ms = config.chat.response_delay_ms,
        "Chat session ready"
    );

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Stdin closed: let the pending reply land, then stop.
                    session.wait_idle().await;
                    while let Ok(event) = events_rx.try_recv() {
                        render_event(&session, &event);
                    }
                    break;
                };
                match Command::parse(&line) {
                    Command::Quit => {
                        session.cancel_pending();
                        break;
                    }
                    command => run_command(&session, command),
                }
            }
            Some(event) = events_rx.recv() => render_event(&session, &event),
        }
    }

    tracing::info!(messages = session.message_count(), "Pitchside stopped");
    Ok(())
}
