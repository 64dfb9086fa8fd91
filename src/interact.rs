/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use crate::actors::TILE_SIZE;
use crate::dialogue::{DialogueLibrary, DialogueRunner};
use crate::outcome::OutcomeLedger;
use crate::player::{Player, PlayerControlLock};
use crate::robots::{EnemyRobot, RobotMove, RobotState, SeekState};

pub const INTERACT_RANGE_TILES: f32 = 1.5;

/// Discrete "interact" input from the player.
#[derive(Clone, Copy, Debug, Message)]
pub struct InteractPressed;

/// Handoff into the quiz, either directly or after the scripted
/// dialogue.
#[derive(Clone, Copy, Debug, Message)]
pub struct BeginQuiz {
    pub robot: Entity,
}

/// Player interaction entry point. Finds the nearest robot in range that
/// will accept an interaction, freezes the simulation, and routes to
/// dialogue (first time this session) or straight to the quiz.
pub fn handle_interact(
    mut commands: Commands,
    mut presses: MessageReader<InteractPressed>,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
    mut ledger: ResMut<OutcomeLedger>,
    mut runner: ResMut<DialogueRunner>,
    library: Res<DialogueLibrary>,
    mut begin_quiz: MessageWriter<BeginQuiz>,
    q_player: Query<&Transform, With<Player>>,
    mut q_robots: Query<(Entity, &mut EnemyRobot, &Transform, &mut SeekState)>,
) {
    if presses.read().next().is_none() {
        return;
    }

    // Mid-dialogue, mid-quiz, intro, or a decided session: the clock is
    // paused and re-entry is silently rejected.
    if virt.is_paused() {
        return;
    }

    let Some(player_tf) = q_player.iter().next() else {
        warn!("interact pressed but no player exists");
        return;
    };
    let player_pos = player_tf.translation.truncate();

    let range = INTERACT_RANGE_TILES * TILE_SIZE;
    let mut nearest: Option<(f32, Entity)> = None;
    for (e, robot, tf, _) in q_robots.iter() {
        if !robot.can_interact() {
            continue;
        }
        let dist = tf.translation.truncate().distance(player_pos);
        if dist <= range && nearest.map(|(d, _)| dist < d).unwrap_or(true) {
            nearest = Some((dist, e));
        }
    }

    let Some((_, target)) = nearest else {
        return;
    };
    let Ok((_, mut robot, _, mut seek)) = q_robots.get_mut(target) else {
        return;
    };

    // Freeze the simulation; dialogue and quiz run on real time.
    virt.pause();
    lock.0 = true;
    ledger.saved_player_pos = Some(player_tf.translation);

    // Cancel in-flight seek behavior so nothing resumes underneath the
    // quiz.
    seek.cancel();
    commands.entity(target).remove::<RobotMove>();

    if ledger.first_dialogue_shown() {
        robot.state = RobotState::InQuiz;
        begin_quiz.write(BeginQuiz { robot: target });
    } else {
        ledger.set_first_dialogue_shown();
        robot.state = RobotState::InDialogue;
        info!("{} begins first-contact dialogue", robot.id);
        runner.start(target, library.corrupted_robot.clone());
    }
}

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<InteractPressed>()
            .add_message::<BeginQuiz>()
            .add_systems(Update, handle_interact);
    }
}
