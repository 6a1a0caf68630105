//! The crate's built-in illustration: a transcription of the 2012 Hello
//! Kitty live wallpaper artwork into the scene description format.

use crate::{compile::compile_scene, error::WeftResult, model::Scene};

/// Source text of the built-in scene description.
pub const KITTY_SCENE: &str = include_str!("../data/kitty.scene");

/// Compiles the built-in scene. The result carries every layer the
/// sequencer targets (eyes, bow, paws).
pub fn kitty_scene() -> WeftResult<Scene> {
    compile_scene(KITTY_SCENE)
}
