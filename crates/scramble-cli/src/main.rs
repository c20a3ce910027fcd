#![forbid(unsafe_code)]

//! `scramble`: play a text scramble animation inline in the terminal.
//!
//! ```text
//! scramble "HELLO WORLD" --speed 0.5 --overdrive '*' --replays 2
//! RUST_LOG=scramble_core=debug scramble --config scramble.json
//! ```

use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context as _, bail};
use clap::Parser;
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use scramble_core::{
    CharRange, DEFAULT_REFRESH_INTERVAL, FrameHandle, FrameScheduler, Overdrive, RenderSink,
    ScrambleConfig, ScrambleEngine,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scramble", version, about = "Animate text from random characters into place")]
struct Cli {
    /// Target text. Overrides the config file's text.
    text: Option<String>,

    /// JSON configuration file. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame-rate multiplier (0 freezes).
    #[arg(long)]
    speed: Option<f64>,

    /// Run a tick only on every Nth accepted frame.
    #[arg(long)]
    tick: Option<u32>,

    /// Characters launched per tick.
    #[arg(long)]
    step: Option<usize>,

    /// Probability that a character scrambles before settling.
    #[arg(long)]
    chance: Option<f64>,

    /// Re-arm attempts per tick ahead of the frontier.
    #[arg(long)]
    seed: Option<usize>,

    /// Base scramble duration in frames.
    #[arg(long)]
    scramble: Option<u32>,

    /// Characters that never scramble.
    #[arg(long)]
    ignore: Option<String>,

    /// Random characters as an inclusive range: `A-Z` or `65-125`.
    #[arg(long, value_parser = parse_range, conflicts_with = "charset")]
    range: Option<CharRange>,

    /// Random characters as an explicit set.
    #[arg(long)]
    charset: Option<String>,

    /// Overdrive flash: `off`, `on`, or a filler character.
    #[arg(long, value_parser = parse_overdrive)]
    overdrive: Option<Overdrive>,

    /// Do not retain cells across replays.
    #[arg(long, default_value_t = false)]
    no_overflow: bool,

    /// Show the final text without animating the first cycle.
    #[arg(long, default_value_t = false)]
    no_play: bool,

    /// Seed for reproducible animations.
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Replay the animation this many times after the first cycle.
    #[arg(long, default_value_t = 0)]
    replays: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = build_config(&cli)?;
    config.validate().context("invalid configuration")?;
    if config.is_frozen() {
        tracing::warn!(speed = config.speed, "speed is 0; nothing will animate");
    }
    run(config, cli.replays)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn build_config(cli: &Cli) -> anyhow::Result<ScrambleConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            serde_json::from_str::<ScrambleConfig>(&raw)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => match &cli.text {
            Some(_) => ScrambleConfig::default(),
            None => bail!("no text given; pass TEXT or --config"),
        },
    };

    if let Some(text) = &cli.text {
        config.text.clone_from(text);
    }
    if let Some(speed) = cli.speed {
        config.speed = speed;
    }
    if let Some(tick) = cli.tick {
        config.tick = tick;
    }
    if let Some(step) = cli.step {
        config.step = step;
    }
    if let Some(chance) = cli.chance {
        config.chance = chance;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(scramble) = cli.scramble {
        config.scramble = scramble;
    }
    if let Some(ignore) = &cli.ignore {
        config.ignore = ignore.chars().collect();
    }
    if let Some(range) = &cli.range {
        config.range = range.clone();
    }
    if let Some(charset) = &cli.charset {
        config.range = CharRange::from_chars(charset);
    }
    if let Some(overdrive) = cli.overdrive {
        config.overdrive = overdrive;
    }
    if cli.no_overflow {
        config.overflow = false;
    }
    if cli.no_play {
        config.play_on_mount = false;
    }
    if let Some(seed) = cli.rng_seed {
        config.rng_seed = Some(seed);
    }
    Ok(config)
}

fn parse_range(s: &str) -> Result<CharRange, String> {
    let chars: Vec<char> = s.chars().collect();
    if let [lo, '-', hi] = chars.as_slice() {
        return Ok(CharRange::between(*lo, *hi));
    }
    let (lo, hi) = s
        .split_once('-')
        .ok_or_else(|| format!("expected MIN-MAX, got '{s}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|err| format!("bad code point '{part}': {err}"))
    };
    Ok(CharRange::Interval {
        min: parse(lo)?,
        max: parse(hi)?,
    })
}

fn parse_overdrive(s: &str) -> Result<Overdrive, String> {
    match s {
        "off" | "false" => Ok(Overdrive::Off),
        "on" | "true" => Ok(Overdrive::Generic),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Overdrive::Char(c)),
                _ => Err(format!("expected off, on, or one character, got '{s}'")),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Wall-clock scheduler: one outstanding request, delivered after a
/// refresh interval of real time.
#[derive(Debug)]
struct ClockScheduler {
    origin: Instant,
    refresh: Duration,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl ClockScheduler {
    fn new(refresh: Duration) -> Self {
        Self {
            origin: Instant::now(),
            refresh,
            next_id: 0,
            pending: None,
        }
    }

    /// Sleep one refresh and hand back the due frame with its timestamp.
    fn wait(&mut self) -> Option<(FrameHandle, Duration)> {
        let handle = self.pending.take()?;
        thread::sleep(self.refresh);
        Some((handle, self.origin.elapsed()))
    }
}

impl FrameScheduler for ClockScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Rewrites the current terminal line with each frame.
struct TerminalSink {
    out: Stdout,
}

impl RenderSink for TerminalSink {
    fn render(&mut self, frame: &str) {
        let result = queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(frame)
        )
        .and_then(|()| self.out.flush());
        if let Err(err) = result {
            tracing::warn!(%err, "failed to write frame");
        }
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(config: ScrambleConfig, replays: u32) -> anyhow::Result<()> {
    let sink = TerminalSink { out: io::stdout() };
    let mut engine = ScrambleEngine::new(config, ClockScheduler::new(DEFAULT_REFRESH_INTERVAL))
        .with_sink(sink)
        .on_animation_end(|| tracing::debug!("animation finished"));

    engine.on_activate();
    let mut frames = drive(&mut engine);
    for cycle in 1..=replays {
        tracing::info!(cycle, "replaying");
        engine.replay();
        frames += drive(&mut engine);
    }
    engine.on_deactivate();
    tracing::info!(frames, "done");

    writeln!(io::stdout()).context("write to stdout")?;
    Ok(())
}

/// Deliver frames until the engine stops requesting them.
fn drive(engine: &mut ScrambleEngine<ClockScheduler>) -> u64 {
    let mut delivered = 0;
    while let Some((handle, now)) = engine.scheduler_mut().wait() {
        engine.on_frame(handle, now);
        delivered += 1;
    }
    delivered
}
