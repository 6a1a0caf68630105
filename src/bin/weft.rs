use std::{fs, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use weft::{Engine, Redraw, TimeMs};

#[derive(Parser, Debug)]
#[command(name = "weft", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile-check a scene description and print a layer summary.
    Check(CheckArgs),
    /// Evaluate a single frame and dump its draw commands as JSON.
    Frame(FrameArgs),
    /// Simulate a span of frames and print sequencer activity.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Scene description path; defaults to the built-in illustration.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene description path; defaults to the built-in illustration.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Wall-clock sample in milliseconds since start.
    #[arg(long)]
    at: u64,

    /// Surface size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1080x1920")]
    size: String,

    /// Sequencer seed for deterministic output.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Scene description path; defaults to the built-in illustration.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Simulated duration in milliseconds.
    #[arg(long, default_value_t = 60_000)]
    duration: u64,

    /// Milliseconds between simulated frames.
    #[arg(long, default_value_t = 16)]
    step: u64,

    /// Sequencer seed for deterministic output.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn load_scene_text(path: &Option<PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(p) => {
            fs::read_to_string(p).with_context(|| format!("read scene '{}'", p.display()))
        }
        None => Ok(weft::builtin::KITTY_SCENE.to_string()),
    }
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let text = load_scene_text(&args.in_path)?;
    let scene = weft::compile_scene(&text).context("compile scene")?;
    println!("layers: {}", scene.layers.len());
    for layer in &scene.layers {
        println!(
            "  {:<14} ribbons={:<3} reveal_end={}ms",
            layer.id,
            layer.ribbons.len(),
            layer.reveal_end()
        );
    }
    println!("scene reveal: {}ms", scene.reveal_end());
    Ok(())
}

fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("size '{s}' must be WIDTHxHEIGHT"))?;
    Ok((w.parse().context("width")?, h.parse().context("height")?))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let text = load_scene_text(&args.in_path)?;
    let scene = weft::compile_scene(&text).context("compile scene")?;
    let (width, height) = parse_size(&args.size)?;

    let mut engine = Engine::with_seed(scene, args.seed)?;
    engine.initialize(width, height)?;
    // Pin the epoch at zero, then evaluate the requested sample.
    engine.on_frame(TimeMs(0))?;
    let frame = engine.on_frame(TimeMs(args.at))?;

    serde_json::to_writer_pretty(std::io::stdout().lock(), &frame)
        .context("serialize frame")?;
    println!();
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let text = load_scene_text(&args.in_path)?;
    let scene = weft::compile_scene(&text).context("compile scene")?;

    let mut engine = Engine::with_seed(scene, args.seed)?;
    engine.initialize(1080, 1920)?;

    let mut now = 0u64;
    let mut frames = 0u64;
    let mut commands = 0usize;
    while now <= args.duration {
        let frame = engine.on_frame(TimeMs(now))?;
        frames += 1;
        commands += frame.commands.len();
        match frame.request {
            Redraw::Now => now += args.step,
            Redraw::At(t) => {
                println!(
                    "{now:>8}ms {:?} complete, sleeping until {}ms",
                    frame.state, t.0
                );
                now = t.0;
            }
            Redraw::Idle => break,
        }
    }
    println!("simulated {frames} frames, {commands} draw commands");
    Ok(())
}
