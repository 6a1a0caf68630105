use weft::{Engine, TimeMs};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut engine = Engine::with_seed(weft::builtin::kitty_scene()?, 0)?;
    engine.initialize(1080, 1920)?;

    for ms in [0u64, 100, 500, 1_000, 5_000, 27_500] {
        let frame = engine.on_frame(TimeMs(ms))?;
        println!(
            "{ms}ms {:?}: {} commands, request {:?}",
            frame.state,
            frame.commands.len(),
            frame.request
        );
    }

    Ok(())
}
