/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use realignlib::actors::LevelPiece;
use realignlib::dialogue::DialogueRunner;
use realignlib::map::{FactoryGrid, LevelSeed};
use realignlib::outcome::{GameOutcome, OutcomeLedger};
use realignlib::player::PlayerControlLock;
use realignlib::quiz::{QuizLibrary, QuizState};
use realignlib::world::{assign_directives, spawn_level};

/// Set by the input layer once an outcome screen is up and the player
/// asks to go again.
#[derive(Resource, Debug, Default)]
pub struct RestartRequested(pub bool);

fn request_restart(
    keys: Res<ButtonInput<KeyCode>>,
    outcome: Res<GameOutcome>,
    mut requested: ResMut<RestartRequested>,
) {
    if outcome.result.is_some() && keys.just_pressed(KeyCode::Enter) {
        requested.0 = true;
    }
}

/// Tears the level down and rebuilds it from the original seed. Commands
/// are applied in order, so the despawn lands before the respawn.
fn perform_restart(
    mut commands: Commands,
    mut requested: ResMut<RestartRequested>,
    grid: Res<FactoryGrid>,
    seed: Res<LevelSeed>,
    quizzes: Res<QuizLibrary>,
    mut ledger: ResMut<OutcomeLedger>,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
    q_level: Query<Entity, With<LevelPiece>>,
) {
    if !requested.0 {
        return;
    }
    requested.0 = false;

    for e in q_level.iter() {
        commands.entity(e).despawn();
    }
    let directives = assign_directives(&quizzes, seed.robots.len());
    spawn_level(&mut commands, &grid, &seed, &directives);

    ledger.reset();
    commands.insert_resource(GameOutcome::default());
    commands.insert_resource(QuizState::default());
    commands.insert_resource(DialogueRunner::default());

    virt.unpause();
    lock.0 = false;
    info!("Session restarted");
}

pub struct RestartPlugin;

impl Plugin for RestartPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RestartRequested>()
            .add_systems(Update, (request_restart, perform_restart).chain());
    }
}
