mod app;
mod braille;
mod config;
mod export;
mod percolation;
mod presets;
mod settings;
mod stats;
mod ui;
mod union_find;

use app::App;
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use presets::{Preset, PresetManager};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::ConfidenceLevel;
use stats::PercolationStats;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "percolation-sim")]
#[command(about = "Estimate the site percolation threshold by Monte Carlo simulation")]
struct Args {
    /// Grid size N (the grid is N x N sites)
    #[arg(value_name = "N")]
    grid_size: Option<usize>,

    /// Number of independent trials T
    #[arg(value_name = "T")]
    trials: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Confidence level for the interval (90, 95, 99)
    #[arg(long, value_parser = parse_confidence)]
    confidence: Option<ConfidenceLevel>,

    // === Presets / Config ===
    /// Start from a named preset (see --list-presets)
    #[arg(long)]
    preset: Option<String>,

    /// Print available presets and exit
    #[arg(long = "list-presets", default_value = "false")]
    list_presets: bool,

    /// Save the effective settings as a user preset with this name
    #[arg(long = "save-preset")]
    save_preset: Option<String>,

    /// Delete the named user preset and exit
    #[arg(long = "delete-preset")]
    delete_preset: Option<String>,

    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to a JSON file
    #[arg(long = "export-config")]
    export_config: Option<PathBuf>,

    // === Output modes ===
    /// Watch trials run in the terminal instead of printing statistics
    #[arg(long, default_value = "false")]
    watch: bool,

    /// Sites opened per frame while watching (1-50)
    #[arg(long)]
    speed: Option<usize>,

    /// Save a PNG of one percolated trial
    #[arg(long)]
    png: Option<PathBuf>,

    /// Save an animated GIF of one trial
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Pixels per site for --png and --gif
    #[arg(long, default_value = "4")]
    scale: u32,
}

fn parse_confidence(s: &str) -> Result<ConfidenceLevel, String> {
    ConfidenceLevel::parse(s)
        .ok_or_else(|| format!("unsupported confidence level '{}' (use 90, 95 or 99)", s))
}

/// Defaults, then preset, then config file, then explicit flags
fn resolve_config(args: &Args, presets: &PresetManager) -> Result<AppConfig, String> {
    let mut config = AppConfig::default();

    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .ok_or_else(|| format!("Unknown preset '{}'", name))?;
        config.settings = preset.settings.clone();
    }

    if let Some(path) = &args.config {
        config = AppConfig::load_from_file(path)?;
    }

    if let Some(n) = args.grid_size {
        config.settings.grid_size = n;
    }
    if let Some(t) = args.trials {
        config.settings.trials = t;
    }
    if args.seed.is_some() {
        config.settings.seed = args.seed;
    }
    if let Some(level) = args.confidence {
        config.settings.confidence = level;
    }
    if let Some(speed) = args.speed {
        config.steps_per_frame = speed.clamp(1, app::MAX_STEPS_PER_FRAME);
    }

    Ok(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// The three result lines printed after a statistics run
fn summary(stats: &PercolationStats) -> String {
    format!(
        concat!(
            "mean                    = {}\n",
            "stddev                  = {}\n",
            "{} confidence interval = [{}, {}]"
        ),
        stats.mean(),
        stats.stddev(),
        stats.confidence().name(),
        stats.confidence_lo(),
        stats.confidence_hi()
    )
}

fn main() {
    if let Err(err) = run(Args::parse()) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // The viewer owns the terminal, so only log in the line-oriented modes
    if !args.watch {
        init_logging();
    }

    let mut presets = PresetManager::new();

    if args.list_presets {
        for preset in presets.all_presets() {
            println!(
                "{:<10} {:>5} x {:<5} {:>6} trials  {}",
                preset.name,
                preset.settings.grid_size,
                preset.settings.grid_size,
                preset.settings.trials,
                preset.description
            );
        }
        return Ok(());
    }

    if let Some(name) = &args.delete_preset {
        presets.delete_preset(name)?;
        info!(name = %name, "deleted preset");
        return Ok(());
    }

    let config = resolve_config(&args, &presets)?;

    if let Some(path) = &args.export_config {
        config.save_to_file(path)?;
        info!(path = %path.display(), "exported config");
    }

    if let Some(name) = &args.save_preset {
        let preset = Preset::new(
            name.clone(),
            "saved from command line",
            config.settings.clone(),
        );
        presets.save_preset(preset)?;
        info!(name = %name, "saved preset");
    }

    if args.watch {
        return run_viewer(config);
    }

    let settings = &config.settings;

    if args.png.is_some() || args.gif.is_some() {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        if let Some(path) = &args.png {
            let threshold =
                export::save_trial_png(settings.grid_size, args.scale, &mut rng, path)?;
            println!("threshold               = {}", threshold);
        }
        if let Some(path) = &args.gif {
            let threshold =
                export::record_trial_gif(settings.grid_size, args.scale, &mut rng, path)?;
            println!("threshold               = {}", threshold);
        }
        return Ok(());
    }

    let timer = Instant::now();
    let stats = PercolationStats::from_settings(settings)?;

    println!("{}", summary(&stats));
    info!(elapsed = ?timer.elapsed(), "finished");

    Ok(())
}

fn run_viewer(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Build the app first so a bad grid size fails before touching the terminal
    let mut app = App::new(config.settings, config.steps_per_frame)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char(' ') => app.toggle_pause(),
                    KeyCode::Char('r') | KeyCode::Char('R') => app.reset()?,
                    KeyCode::Char('n') | KeyCode::Char('N') => app.next_trial()?,
                    KeyCode::Char('a') | KeyCode::Char('A') => app.toggle_auto_advance(),
                    KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                    KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                        app.toggle_help()
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') => app.increase_speed(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.decrease_speed(),
                    KeyCode::Char('[') => app.adjust_grid_size(-10)?,
                    KeyCode::Char(']') => app.adjust_grid_size(10)?,
                    KeyCode::Char('<') | KeyCode::Char(',') => app.adjust_trials(-10),
                    KeyCode::Char('>') | KeyCode::Char('.') => app.adjust_trials(10),
                    KeyCode::Char('c') => app.cycle_confidence(),
                    KeyCode::Char('C') => app.cycle_confidence_prev(),
                    KeyCode::Esc if app.show_help => app.toggle_help(),
                    KeyCode::Char('j') | KeyCode::Char('J') if app.show_help => {
                        app.scroll_help_down(ui::HELP_CONTENT_LINES)
                    }
                    KeyCode::Char('k') | KeyCode::Char('K') if app.show_help => {
                        app.scroll_help_up()
                    }
                    _ => {}
                }
            }
        }

        app.tick()?;
    }
}
