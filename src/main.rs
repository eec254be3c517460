use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use std::future::Future;
use std::io::Stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use duki::client::HttpCommandClient;
use duki::config::{Config, DEFAULT_CONFIG_PATH};
use duki::prompt::{HELP, PromptInput};
use duki::render::{Renderer, Ui, UiEvent};
use duki::speech::{
    ProcessRecognizer, ProcessSynthesizer, Recognizer, SilentSynthesizer, Synthesizer,
    UnavailableRecognizer,
};
use duki::{CommandDispatcher, DictationOutcome, DispatchOutcome, Modality, VoiceSession};

#[derive(Parser)]
#[command(name = "duki", version, about = "Talk to the Duki assistant from a terminal")]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Server root, overrides endpoint.base_url
    #[arg(long, global = true)]
    url: Option<String>,

    /// Client-side deadline in seconds (0 disables it)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Send one typed command and exit
    Ask {
        #[arg(required = true, num_args = 1..)]
        texto: Vec<String>,
    },
    /// Dictate one command and exit
    Listen,
    /// Check that the server is up
    Health,
}

const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<ExitCode> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_overrides(cli.url, cli.timeout)?;
    tracing::info!(
        endpoint = %config.endpoint.command_url(),
        timeout_secs = config.endpoint.timeout_secs,
        locale = %config.speech.locale,
        "config loaded"
    );

    let client = Arc::new(HttpCommandClient::new(&config.endpoint));

    let (ui, ui_rx) = Ui::new();
    let view = Arc::new(ui.clone());
    let dispatcher = Arc::new(
        CommandDispatcher::new(client.clone(), view.clone(), build_synthesizer(&config))
            .with_locale(config.speech.locale.clone())
            .with_timeout(config.endpoint.timeout()),
    );
    let voice = Arc::new(
        VoiceSession::new(build_recognizer(&config), dispatcher.clone(), view)
            .with_locale(config.speech.locale.clone()),
    );
    let mut renderer = Renderer::stdout();

    match cli.action {
        Some(Action::Ask { texto }) => {
            let text = texto.join(" ");
            let outcome =
                drive(dispatcher.submit(Modality::Text, &text), &ui_rx, &mut renderer).await;
            Ok(exit_code(&outcome))
        }
        Some(Action::Listen) => {
            let outcome = drive(voice.dictate(), &ui_rx, &mut renderer).await;
            Ok(match outcome {
                DictationOutcome::Dispatched { outcome, .. } => exit_code(&outcome),
                DictationOutcome::NothingHeard => ExitCode::SUCCESS,
                DictationOutcome::Failed(_) | DictationOutcome::Busy => ExitCode::FAILURE,
            })
        }
        Some(Action::Health) => run_health(&client).await,
        None => {
            println!(
                "{} listo en {}. Escribe /ayuda para ver los comandos.\n",
                config.name,
                config.endpoint.base_url
            );
            run_prompt(ui, ui_rx, renderer, dispatcher, voice).await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Filter used when RUST_LOG is unset
fn log_directive(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,duki={}", level)
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_synthesizer(config: &Config) -> Arc<dyn Synthesizer> {
    match &config.speech.synthesizer {
        Some(program) => {
            tracing::info!(program = %program.program, "TTS: external program");
            Arc::new(ProcessSynthesizer::new(program.clone()))
        }
        None => Arc::new(SilentSynthesizer),
    }
}

fn build_recognizer(config: &Config) -> Arc<dyn Recognizer> {
    match &config.speech.recognizer {
        Some(program) => {
            tracing::info!(program = %program.program, "STT: external program");
            Arc::new(ProcessRecognizer::new(program.clone()))
        }
        None => Arc::new(UnavailableRecognizer),
    }
}

fn exit_code(outcome: &DispatchOutcome) -> ExitCode {
    match outcome {
        DispatchOutcome::Answered(_) | DispatchOutcome::Ignored => ExitCode::SUCCESS,
        DispatchOutcome::Failed(_) | DispatchOutcome::Busy => ExitCode::FAILURE,
    }
}

fn render(renderer: &mut Renderer<Stdout>, event: UiEvent) {
    if let Err(e) = renderer.handle(event) {
        tracing::error!("terminal write failed: {}", e);
    }
}

/// Run one future to completion while keeping the terminal drawn
async fn drive<F: Future>(
    fut: F,
    ui_rx: &flume::Receiver<UiEvent>,
    renderer: &mut Renderer<Stdout>,
) -> F::Output {
    tokio::pin!(fut);
    let mut tick = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            output = &mut fut => {
                for event in ui_rx.try_iter() {
                    render(renderer, event);
                }
                return output;
            }
            Ok(event) = ui_rx.recv_async() => render(renderer, event),
            _ = tick.tick() => render(renderer, UiEvent::Tick),
        }
    }
}

async fn run_prompt(
    ui: Ui,
    ui_rx: flume::Receiver<UiEvent>,
    mut renderer: Renderer<Stdout>,
    dispatcher: Arc<CommandDispatcher>,
    voice: Arc<VoiceSession>,
) {
    let (input_tx, input_rx) = flume::unbounded::<String>();

    // Readline thread
    thread::spawn(move || {
        use rustyline::DefaultEditor;
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("failed to create readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = rl.add_history_entry(&line);
                    }
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut tick = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            biased;

            line = input_rx.recv_async() => {
                // Readline closed (Ctrl-D / Ctrl-C)
                let Ok(line) = line else { break };

                match PromptInput::parse(&line) {
                    PromptInput::Submit(text) => {
                        let dispatcher = dispatcher.clone();
                        tokio::spawn(async move {
                            dispatcher.submit(Modality::Text, &text).await;
                        });
                    }
                    PromptInput::Dictate => {
                        let voice = voice.clone();
                        tokio::spawn(async move {
                            voice.dictate().await;
                        });
                    }
                    PromptInput::Help => ui.notice(HELP),
                    PromptInput::Unknown(cmd) => {
                        ui.notice(format!("Comando desconocido: {}. Escribe /ayuda.", cmd));
                    }
                    PromptInput::Quit => break,
                }
            }

            Ok(event) = ui_rx.recv_async() => render(&mut renderer, event),

            _ = tick.tick() => render(&mut renderer, UiEvent::Tick),
        }
    }

    if dispatcher.is_busy() {
        tracing::info!("exiting with a command still in flight");
    }
}

async fn run_health(client: &HttpCommandClient) -> Result<ExitCode> {
    let report = client
        .health()
        .await
        .with_context(|| format!("health check against {}", client.health_url()))?;

    println!("ok:         {}", report.ok);
    if let Some(enabled) = report.hf_enabled {
        println!("hf_enabled: {}", enabled);
    }
    if let Some(model) = &report.model {
        println!("model:      {}", model);
    }
    if let Some(timeout) = report.timeout {
        println!("timeout:    {}s", timeout);
    }

    if !report.ok {
        bail!("server reported ok: false");
    }
    Ok(ExitCode::SUCCESS)
}
