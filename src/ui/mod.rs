/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use realignlib::dialogue::AdvanceDialogue;
use realignlib::interact::InteractPressed;
use realignlib::player::MoveInput;
use realignlib::quiz::AnswerSubmitted;

mod hud;
mod panels;

/// Keyboard front-end. Everything downstream runs on messages, so the
/// bindings live in exactly one place.
fn read_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    mut interact: MessageWriter<InteractPressed>,
    mut answers: MessageWriter<AnswerSubmitted>,
    mut advance: MessageWriter<AdvanceDialogue>,
    mut moves: MessageWriter<MoveInput>,
) {
    if keys.just_pressed(KeyCode::KeyE) {
        interact.write(InteractPressed);
    }
    if keys.just_pressed(KeyCode::KeyT) {
        answers.write(AnswerSubmitted(true));
    }
    if keys.just_pressed(KeyCode::KeyF) {
        answers.write(AnswerSubmitted(false));
    }
    if keys.just_pressed(KeyCode::Space) {
        advance.write(AdvanceDialogue);
    }

    let mut dir = IVec2::ZERO;
    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        dir.y += 1;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        dir.y -= 1;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        dir.x += 1;
    }
    if dir != IVec2::ZERO {
        moves.write(MoveInput(dir));
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (hud::spawn_hud, panels::spawn_panels))
            .add_systems(
                Update,
                (
                    read_keyboard,
                    hud::sync_hud,
                    panels::sync_dialogue_panel,
                    panels::sync_quiz_panel,
                    panels::sync_outcome_panel,
                ),
            );
    }
}
