/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use crate::actors::{TILE_SIZE, TilePos, tile_to_world, world_to_tile};
use crate::factory::{FactoryInventory, Obstacle, ObstacleHit, apply_obstacle_hits};
use crate::map::FactoryGrid;
use crate::outcome::session_running;
use crate::robots::{EnemyRobot, RobotMove, RobotState, RobotTunings, SeekState, sync_robot_color};

const AI_TIC_SECS: f32 = 1.0 / 30.0;
const STOPPING_DIST_TILES: f32 = 0.15;
const DETOUR_ARRIVE_TILES: f32 = 0.3;
/// Look-ahead for the walkability probe, just past the tile boundary.
const PROBE_TILES: f32 = 0.55;

#[derive(Resource, Debug, Default)]
pub struct AiTicker {
    accum: f32,
}

/// Manhattan distance plus a penalty per existing hit, so robots spread
/// their attention toward less-damaged machines.
pub fn score_target(from: IVec2, to: IVec2, hits: u8, penalty: i32) -> i32 {
    manhattan(from, to) + hits as i32 * penalty
}

pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Lowest score wins; earlier candidate wins ties (stable selection).
pub fn pick_best_target<T: Copy>(
    from: IVec2,
    candidates: &[(T, IVec2, u8)],
    penalty: i32,
) -> Option<T> {
    let mut best: Option<(i32, T)> = None;
    for &(id, tile, hits) in candidates {
        let score = score_target(from, tile, hits, penalty);
        if best.map(|(bs, _)| score < bs).unwrap_or(true) {
            best = Some((score, id));
        }
    }
    best.map(|(_, id)| id)
}

fn random_detour(around: Vec2, radius_tiles: f32) -> Vec2 {
    let angle = rand::random::<f32>() * std::f32::consts::TAU;
    let r = radius_tiles * TILE_SIZE * (0.5 + 0.5 * rand::random::<f32>());
    around + Vec2::new(angle.cos(), angle.sin()) * r
}

fn axis_sign(v: f32) -> f32 {
    if v > f32::EPSILON {
        1.0
    } else if v < -f32::EPSILON {
        -1.0
    } else {
        0.0
    }
}

/// Axis-dominant steering constrained by the grid: the longer axis is
/// tried first, the other axis when that step heads into a solid tile,
/// neither when both are blocked. Ties broken randomly.
fn steer_direction(pos: Vec2, target: Vec2, grid: &FactoryGrid) -> Vec2 {
    let diff = target - pos;
    let x_dir = Vec2::new(axis_sign(diff.x), 0.0);
    let y_dir = Vec2::new(0.0, axis_sign(diff.y));

    let (primary, secondary) = if diff.x.abs() > diff.y.abs() {
        (x_dir, y_dir)
    } else if diff.y.abs() > diff.x.abs() {
        (y_dir, x_dir)
    } else if rand::random::<f32>() > 0.5 {
        (x_dir, y_dir)
    } else {
        (y_dir, x_dir)
    };

    for dir in [primary, secondary] {
        if dir == Vec2::ZERO {
            continue;
        }
        if grid.walkable(world_to_tile(pos + dir * (PROBE_TILES * TILE_SIZE))) {
            return dir;
        }
    }
    Vec2::ZERO
}

/// Accumulates stall time while displacement since the last tic stays
/// under `min_step`; returns true exactly when the stall threshold is
/// crossed, resetting the accumulator.
fn note_stall(seek: &mut SeekState, pos: Vec2, min_step: f32, stuck_after: f32) -> bool {
    if pos.distance(seek.last_pos) < min_step {
        seek.stuck_secs += AI_TIC_SECS;
    } else {
        seek.stuck_secs = 0.0;
    }
    seek.last_pos = pos;

    if seek.stuck_secs >= stuck_after {
        seek.stuck_secs = 0.0;
        return true;
    }
    false
}

fn attach_robot_ai(
    mut commands: Commands,
    tunings: Res<RobotTunings>,
    q_new: Query<(Entity, &Transform), (Added<EnemyRobot>, Without<SeekState>)>,
) {
    for (e, tf) in q_new.iter() {
        commands.entity(e).insert(SeekState {
            cooldown: tunings.spawn_delay_secs,
            last_pos: tf.translation.truncate(),
            ..default()
        });
    }
}

pub fn robot_ai_tick(
    mut commands: Commands,
    time: Res<Time>,
    mut ticker: ResMut<AiTicker>,
    tunings: Res<RobotTunings>,
    q_machines: Query<(Entity, &TilePos, &FactoryInventory), With<Obstacle>>,
    mut hits: MessageWriter<ObstacleHit>,
    mut q_robots: Query<(
        Entity,
        &mut EnemyRobot,
        &mut SeekState,
        &Transform,
        Option<&RobotMove>,
    )>,
) {
    ticker.accum += time.delta_secs();

    while ticker.accum >= AI_TIC_SECS {
        ticker.accum -= AI_TIC_SECS;

        // Snapshot of live machines this tic.
        let machines: Vec<(Entity, IVec2, u8)> = q_machines
            .iter()
            .map(|(e, tp, inv)| (e, tp.0, inv.hits()))
            .collect();

        for (e, mut robot, mut seek, tf, moving) in q_robots.iter_mut() {
            let pos = tf.translation.truncate();

            match robot.state {
                RobotState::Idle => {
                    seek.cooldown -= AI_TIC_SECS;
                    if seek.cooldown > 0.0 {
                        continue;
                    }

                    if machines.is_empty() {
                        // Nothing left to wreck; the outcome watcher owns
                        // the game-end decision. Retry later regardless.
                        seek.cooldown = tunings.idle_retry_secs;
                        continue;
                    }

                    robot.state = RobotState::Seeking;
                }
                RobotState::Seeking => {}
                // Dialogue/quiz/fixed robots do not run the seek loop.
                _ => continue,
            }

            // Post-hit re-target delay.
            if seek.cooldown > 0.0 {
                seek.cooldown -= AI_TIC_SECS;
                continue;
            }

            // Stall detection: while under a movement order, accumulate
            // time without meaningful displacement. A robot whose every
            // step is wall-blocked displaces nothing and lands here.
            if moving.is_some() {
                let min_step = tunings.move_speed_tps * TILE_SIZE * AI_TIC_SECS * 0.25;
                if note_stall(&mut seek, pos, min_step, tunings.stuck_secs) {
                    let detour = random_detour(pos, tunings.detour_radius_tiles);
                    info!("{}: stuck, detouring to {:.0?}", robot.id, detour);
                    seek.detour = Some(detour);
                }
            } else {
                seek.last_pos = pos;
            }

            // Detour takes priority until reached.
            if let Some(detour) = seek.detour {
                if pos.distance(detour) < DETOUR_ARRIVE_TILES * TILE_SIZE {
                    seek.detour = None;
                } else {
                    commands.entity(e).insert(RobotMove {
                        target: detour,
                        speed_tps: tunings.move_speed_tps,
                    });
                    continue;
                }
            }

            // Validate or re-select the target machine.
            if let Some(t) = seek.target {
                if !machines.iter().any(|&(me, _, _)| me == t) {
                    seek.target = None;
                }
            }
            if seek.target.is_none() {
                seek.target = pick_best_target(
                    world_to_tile(pos),
                    &machines,
                    tunings.hit_score_penalty,
                );
            }

            let Some(target) = seek.target else {
                // No reachable machine: idle briefly and retry.
                robot.state = RobotState::Idle;
                seek.cooldown = tunings.idle_retry_secs;
                commands.entity(e).remove::<RobotMove>();
                continue;
            };

            let target_tile = machines
                .iter()
                .find(|&&(me, _, _)| me == target)
                .map(|&(_, tile, _)| tile)
                .unwrap_or_default();
            let target_pos = tile_to_world(target_tile, 0.0).truncate();

            if pos.distance(target_pos) <= tunings.proximity_tiles * TILE_SIZE {
                hits.write(ObstacleHit { target });
                seek.target = None;
                seek.cooldown = tunings.retarget_delay_secs;
                commands.entity(e).remove::<RobotMove>();
            } else {
                commands.entity(e).insert(RobotMove {
                    target: target_pos,
                    speed_tps: tunings.move_speed_tps,
                });
            }
        }
    }
}

/// Applies movement orders one grid-constrained axis step at a time.
pub fn robot_move(
    mut commands: Commands,
    time: Res<Time>,
    grid: Option<Res<FactoryGrid>>,
    mut q: Query<(Entity, &RobotMove, &mut Transform)>,
) {
    let Some(grid) = grid else {
        return;
    };
    let dt = time.delta_secs();

    for (e, mv, mut tf) in q.iter_mut() {
        let pos = tf.translation.truncate();

        if (mv.target - pos).length() < STOPPING_DIST_TILES * TILE_SIZE {
            commands.entity(e).remove::<RobotMove>();
            continue;
        }

        // A robot boxed in by walls takes no step; the stall detector
        // turns that into a detour.
        let step = steer_direction(pos, mv.target, &grid) * mv.speed_tps * TILE_SIZE * dt;
        tf.translation.x += step.x;
        tf.translation.y += step.y;
    }
}

pub struct FactoryAiPlugin;

impl Plugin for FactoryAiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AiTicker>()
            .insert_resource(RobotTunings::baseline())
            .add_message::<ObstacleHit>()
            .add_systems(Update, (attach_robot_ai, sync_robot_color))
            .add_systems(
                FixedUpdate,
                (robot_ai_tick, robot_move, apply_obstacle_hits)
                    .chain()
                    .run_if(session_running),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_prefers_closer_machines() {
        let from = IVec2::new(0, 0);
        let near = score_target(from, IVec2::new(2, 1), 0, 4);
        let far = score_target(from, IVec2::new(5, 5), 0, 4);
        assert!(near < far);
    }

    #[test]
    fn score_penalizes_damaged_machines() {
        let from = IVec2::new(0, 0);
        let pristine = score_target(from, IVec2::new(4, 0), 0, 4);
        let damaged = score_target(from, IVec2::new(3, 0), 1, 4);
        // One tile closer but one hit in: the pristine machine wins.
        assert!(pristine < damaged);
    }

    #[test]
    fn picks_lowest_scored_target() {
        let from = IVec2::new(0, 0);
        let candidates = [
            (0usize, IVec2::new(6, 0), 0u8),
            (1usize, IVec2::new(2, 0), 1u8),
            (2usize, IVec2::new(3, 0), 0u8),
        ];
        // Scores: 6, 2+4=6, 3. Candidate 2 wins.
        assert_eq!(pick_best_target(from, &candidates, 4), Some(2));
    }

    #[test]
    fn no_candidates_no_target() {
        let none: Option<usize> = pick_best_target(IVec2::ZERO, &[], 4);
        assert_eq!(none, None);
    }

    #[test]
    fn steering_prefers_dominant_axis_on_open_floor() {
        let (grid, _) = FactoryGrid::from_ascii(&[
            "#####",
            "#...#",
            "#...#",
            "#####",
        ]);
        let pos = tile_to_world(IVec2::new(1, 1), 0.0).truncate();
        let target = tile_to_world(IVec2::new(3, 2), 0.0).truncate();
        assert_eq!(steer_direction(pos, target, &grid), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn steering_falls_back_to_free_axis() {
        // The dominant +x step heads into a wall; the y axis is open.
        let (grid, _) = FactoryGrid::from_ascii(&[
            "#####",
            "#.#.#",
            "#...#",
            "#####",
        ]);
        let pos = tile_to_world(IVec2::new(1, 1), 0.0).truncate();
        let target = tile_to_world(IVec2::new(3, 2), 0.0).truncate();
        assert_eq!(steer_direction(pos, target, &grid), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn boxed_in_robot_cannot_step() {
        let (grid, _) = FactoryGrid::from_ascii(&[
            "###",
            "#.#",
            "###",
        ]);
        let pos = tile_to_world(IVec2::new(1, 1), 0.0).truncate();
        let target = pos + Vec2::new(200.0, -100.0);
        assert_eq!(steer_direction(pos, target, &grid), Vec2::ZERO);
    }

    #[test]
    fn blocked_robot_stalls_into_detour() {
        let pos = Vec2::new(10.0, 10.0);
        let mut seek = SeekState {
            last_pos: pos,
            ..default()
        };

        // Zero displacement tic after tic crosses the stall threshold.
        let tics = (1.5 / AI_TIC_SECS).ceil() as usize + 1;
        let mut stalled = false;
        for _ in 0..tics {
            if note_stall(&mut seek, pos, 1.0, 1.5) {
                stalled = true;
                break;
            }
        }
        assert!(stalled);
        assert_eq!(seek.stuck_secs, 0.0);

        // Real displacement clears the accumulator.
        note_stall(&mut seek, pos, 1.0, 1.5);
        assert!(!note_stall(&mut seek, Vec2::new(50.0, 10.0), 1.0, 1.5));
        assert_eq!(seek.stuck_secs, 0.0);
    }
}
