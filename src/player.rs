/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use crate::actors::{TILE_SIZE, TilePos, tile_to_world, world_to_tile};
use crate::factory::Obstacle;
use crate::map::FactoryGrid;

const PLAYER_SPEED_TPS: f32 = 4.0;

#[derive(Component)]
pub struct Player;

/// True while dialogue, quiz, intro, or an outcome screen owns the
/// input.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerControlLock(pub bool);

/// Held-direction input from the binary's input layer, one per frame at
/// most.
#[derive(Clone, Copy, Debug, Message)]
pub struct MoveInput(pub IVec2);

/// In-flight tile step. The player commits to one tile at a time and
/// new input is ignored until arrival.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlayerMove {
    pub target: Vec2,
}

pub fn player_move(
    mut commands: Commands,
    time: Res<Time>,
    lock: Res<PlayerControlLock>,
    grid: Option<Res<FactoryGrid>>,
    mut inputs: MessageReader<MoveInput>,
    q_machines: Query<&TilePos, With<Obstacle>>,
    mut q_player: Query<(Entity, &mut Transform, Option<&PlayerMove>), With<Player>>,
) {
    if lock.0 {
        inputs.clear();
        return;
    }
    let Some(grid) = grid else {
        return;
    };
    let Some((e, mut tf, moving)) = q_player.iter_mut().next() else {
        inputs.clear();
        return;
    };

    if let Some(mv) = moving {
        let pos = tf.translation.truncate();
        let to = mv.target - pos;
        let step = PLAYER_SPEED_TPS * TILE_SIZE * time.delta_secs();

        if to.length() <= step {
            tf.translation.x = mv.target.x;
            tf.translation.y = mv.target.y;
            commands.entity(e).remove::<PlayerMove>();
        } else {
            let dir = to.normalize_or_zero();
            tf.translation.x += dir.x * step;
            tf.translation.y += dir.y * step;
        }
        inputs.clear();
        return;
    }

    let Some(MoveInput(mut dir)) = inputs.read().last().copied() else {
        return;
    };
    // One axis at a time, horizontal wins a diagonal press.
    if dir.x != 0 {
        dir.y = 0;
    }
    if dir == IVec2::ZERO {
        return;
    }

    // Screen up is -tile-y.
    let step = IVec2::new(dir.x, -dir.y);
    let target = world_to_tile(tf.translation.truncate()) + step;

    if !grid.walkable(target) {
        return;
    }
    if q_machines.iter().any(|tp| tp.0 == target) {
        return;
    }

    let target_world = tile_to_world(target, tf.translation.z);
    commands.entity(e).insert(PlayerMove {
        target: target_world.truncate(),
    });
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerControlLock>()
            .add_message::<MoveInput>()
            .add_systems(FixedUpdate, player_move);
    }
}
