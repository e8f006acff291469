use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor::Hide,
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use tunacard::app::{cli::Args, config::AppConfig, config::ConfigError, events::AppEvent, logging, App};
use tunacard::artwork::{ArtworkRenderer, ArtworkState, LoadedArt};
use tunacard::overlay::RenderSnapshot;
use tunacard::poller::{PollOutcome, Poller};
use tunacard::source::TunaSource;
use tunacard::theme::Theme;
use tunacard::ui;

/// ~60 FPS redraw for the terminal preview
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Where presentation state goes.
enum Output {
    Terminal(Tui),
    Snapshots(Stdout),
}

impl Output {
    fn is_terminal(&self) -> bool {
        matches!(self, Output::Terminal(_))
    }

    /// JSON line per transition in headless mode. The terminal picks snapshots
    /// up on the next frame instead.
    fn emit(&mut self, snap: &RenderSnapshot) -> Result<()> {
        if let Output::Snapshots(out) = self {
            serde_json::to_writer(&mut *out, snap)?;
            writeln!(out)?;
            out.flush()?;
        }
        Ok(())
    }

    fn draw(&mut self, app: &mut App, now: Duration) -> Result<()> {
        if let Output::Terminal(terminal) = self {
            terminal.draw(|f| ui::ui(f, &mut app.view(now)))?;
        }
        Ok(())
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Show the issue list until any key is pressed.
async fn show_config_error(err: &ConfigError) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let theme = Theme::new(Default::default());
    let mut reader = EventStream::new();

    loop {
        terminal.draw(|f| ui::ui_config_error(f, err, &theme))?;
        match reader.next().await {
            Some(Ok(Event::Key(_))) | Some(Err(_)) | None => break,
            // Resize and friends: redraw
            Some(Ok(_)) => {}
        }
    }

    restore_terminal(&mut terminal)
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

async fn run(
    app: &mut App,
    poller: &mut Poller<TunaSource>,
    renderer: Arc<ArtworkRenderer>,
    out: &mut Output,
) -> Result<()> {
    let started = Instant::now();
    let (tx, mut rx) = mpsc::channel(32);

    // 1. Input Event Task
    if out.is_terminal() {
        let tx_input = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(Ok(event)) = reader.next().await {
                if tx_input.send(AppEvent::Input(event)).await.is_err() {
                    break;
                }
            }
        });
    }

    // 2. Poll + frame clocks
    let mut poll = tokio::time::interval(app.config.refresh_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frame = tokio::time::interval(FRAME_INTERVAL);
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    out.emit(&app.snapshot)?;

    while app.is_running {
        let deadline = app.sequencer.next_deadline().map(|d| started + d);

        tokio::select! {
            _ = poll.tick() => {
                match poller.poll(&app.sequencer).await {
                    PollOutcome::Changed(track) => {
                        if let Some(snap) = app.present(track, started.elapsed()) {
                            out.emit(&snap)?;
                        }
                    }
                    outcome => debug!(?outcome, "poll"),
                }
            }
            _ = sleep_until(deadline) => {
                for snap in app.advance(started.elapsed()) {
                    out.emit(&snap)?;
                }
            }
            _ = frame.tick(), if out.is_terminal() => {
                out.draw(app, started.elapsed())?;
            }
            Some(event) = rx.recv() => match event {
                AppEvent::Input(Event::Key(key)) => app.handle_key(key),
                AppEvent::Input(_) => {}
                AppEvent::ArtworkUpdate(layer, state) => app.on_artwork(layer, state),
            },
            _ = tokio::signal::ctrl_c() => {
                app.is_running = false;
            }
        }

        // 3. Artwork Fetch Tasks 🖼️ (the headless consumer loads its own)
        if out.is_terminal() {
            for layer in app.missing_artwork() {
                let tx_art = tx.clone();
                let renderer = renderer.clone();
                tokio::spawn(async move {
                    let state = match renderer.load(&layer.art).await {
                        Ok(img) => ArtworkState::Loaded(LoadedArt::new(img)),
                        Err(e) => {
                            warn!(art = layer.art.as_str(), error = %e, "artwork load failed");
                            ArtworkState::Failed
                        }
                    };
                    let _ = tx_art.send(AppEvent::ArtworkUpdate(layer, state)).await;
                });
            }
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    human_panic::setup_panic!();
    let args = Args::parse();

    if args.generate_config {
        print!("{}", AppConfig::generate_default());
        return Ok(());
    }

    let _log_guard = match logging::init(&AppConfig::get_log_dir(), args.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    // 1. Configuration (all-or-nothing)
    let config = match AppConfig::load(args.config.as_deref(), args.query.as_deref(), &args.set) {
        Ok(config) => config,
        Err(err) => {
            warn!(issues = err.issues.len(), "configuration rejected");
            if args.snapshots {
                eprintln!("{}", err);
                for issue in &err.issues {
                    eprintln!("  {}", issue);
                }
            } else {
                show_config_error(&err).await?;
            }
            drop(_log_guard);
            std::process::exit(1);
        }
    };

    // 2. Shared HTTP client, bounded so a stuck fetch cannot stall the loop
    let client = reqwest::Client::builder()
        .user_agent(concat!("tunacard/", env!("CARGO_PKG_VERSION")))
        .timeout(config.refresh_interval.max(Duration::from_secs(1)))
        .build()?;

    let endpoint = config.endpoint();
    info!(%endpoint, always_show = config.always_show, "starting");

    let mut poller = Poller::new(TunaSource::new(client.clone(), endpoint), config.use_local_file);
    let renderer = Arc::new(ArtworkRenderer::new(client));
    let mut app = App::new(config)?;

    // 3. Output
    let mut out = if args.snapshots {
        Output::Snapshots(io::stdout())
    } else {
        Output::Terminal(setup_terminal()?)
    };

    let result = run(&mut app, &mut poller, renderer, &mut out).await;

    if let Output::Terminal(terminal) = &mut out {
        restore_terminal(terminal)?;
    }
    info!(fetches = poller.fetch_count(), "stopped");

    result
}
