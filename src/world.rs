/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;
use std::collections::HashSet;

use crate::actors::{TILE_SIZE, LevelPiece, TilePos, tile_to_world};
use crate::factory::{FactoryInventory, Obstacle};
use crate::map::{FactoryGrid, LevelSeed, Tile};
use crate::outcome::OutcomeLedger;
use crate::player::Player;
use crate::quiz::QuizLibrary;
use crate::robots::EnemyRobot;

/// Factory floor. Three misaligned robots, five machines they will try to
/// wreck, a scattering of solid crates.
pub const FLOOR_PLAN: &[&str] = &[
    "####################",
    "#P.....B......O....#",
    "#..O...B...........#",
    "#......B....R..B...#",
    "#..........B...B...#",
    "#...R......B.....O.#",
    "#..................#",
    "#.....O....BBB.....#",
    "#..........B.......#",
    "#...R..............#",
    "#..............O...#",
    "####################",
];

const Z_SCENERY: f32 = 0.0;
const Z_MACHINE: f32 = 1.0;
const Z_ACTOR: f32 = 2.0;

fn tile_sprite(color: Color) -> Sprite {
    Sprite::from_color(color, Vec2::splat(TILE_SIZE * 0.92))
}

/// One directive per robot, round-robin over the loaded pools. Fewer
/// pools than robots means shared directives.
pub fn assign_directives(quizzes: &QuizLibrary, robots: usize) -> Vec<String> {
    (0..robots)
        .map(|i| {
            quizzes
                .pools
                .get(i % quizzes.pools.len().max(1))
                .map(|p| p.name.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// A quiz counts once however many robots pose it, so the win threshold
/// is the number of distinct directives on the floor.
pub fn required_quizzes(directives: &[String]) -> usize {
    directives
        .iter()
        .filter(|d| !d.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Spawns every level entity out of the seed. Startup and restart share
/// this path so a restarted session is indistinguishable from a fresh one.
pub fn spawn_level(
    commands: &mut Commands,
    grid: &FactoryGrid,
    seed: &LevelSeed,
    directives: &[String],
) {
    for y in 0..grid.height {
        for x in 0..grid.width {
            let t = IVec2::new(x as i32, y as i32);
            let color = match grid.tile(x, y) {
                Tile::Wall => Color::srgb(0.35, 0.35, 0.40),
                Tile::Block => Color::srgb(0.55, 0.45, 0.30),
                Tile::Empty => continue,
            };
            commands.spawn((
                tile_sprite(color),
                Transform::from_translation(tile_to_world(t, Z_SCENERY)),
                TilePos(t),
                LevelPiece,
            ));
        }
    }

    for &t in &seed.machines {
        commands.spawn((
            Obstacle::at_tile(t),
            FactoryInventory::default(),
            tile_sprite(Color::srgb(0.30, 0.55, 0.85)),
            Transform::from_translation(tile_to_world(t, Z_MACHINE)),
            TilePos(t),
            LevelPiece,
        ));
    }

    for (i, &t) in seed.robots.iter().enumerate() {
        let directive = directives.get(i).cloned().unwrap_or_default();
        commands.spawn((
            EnemyRobot::new(format!("robot_{i}"), directive),
            tile_sprite(Color::srgb(0.90, 0.25, 0.20)),
            Transform::from_translation(tile_to_world(t, Z_ACTOR)),
            TilePos(t),
            LevelPiece,
        ));
    }

    commands.spawn((
        Player,
        tile_sprite(Color::srgb(0.85, 0.85, 0.90)),
        Transform::from_translation(tile_to_world(seed.player, Z_ACTOR)),
        TilePos(seed.player),
        LevelPiece,
    ));

    info!(
        "Level spawned: {} robots, {} machines",
        seed.robots.len(),
        seed.machines.len()
    );
}

pub fn setup(mut commands: Commands, quizzes: Res<QuizLibrary>) {
    commands.spawn(Camera2d);

    let (grid, seed) = FactoryGrid::from_ascii(FLOOR_PLAN);

    // One required quiz per distinct directive; sizing by robot count
    // would leave the game undecidable when robots share a pool.
    let directives = assign_directives(&quizzes, seed.robots.len());
    let required = required_quizzes(&directives);
    if required < seed.robots.len() {
        warn!(
            "{} robots share {} directive pools; {} correct answers win",
            seed.robots.len(),
            required,
            required
        );
    }
    commands.insert_resource(OutcomeLedger::new(required));

    spawn_level(&mut commands, &grid, &seed, &directives);

    commands.insert_resource(grid);
    commands.insert_resource(seed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_plan_is_playable() {
        let (grid, seed) = FactoryGrid::from_ascii(FLOOR_PLAN);
        assert_eq!(seed.robots.len(), 3);
        assert!(seed.machines.len() >= 3);
        assert!(grid.walkable(seed.player));
        for &t in seed.robots.iter().chain(seed.machines.iter()) {
            assert!(grid.in_bounds(t));
            assert!(grid.walkable(t));
        }
    }

    fn library_with_pools(names: &[&str]) -> QuizLibrary {
        use crate::quiz::QuizPool;
        QuizLibrary {
            pools: names
                .iter()
                .map(|n| QuizPool {
                    name: (*n).into(),
                    time_limit_secs: 10.0,
                    questions: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn fewer_pools_than_robots_shrinks_required() {
        let lib = library_with_pools(&["coolant", "assembly"]);
        let directives = assign_directives(&lib, 3);
        assert_eq!(directives, vec!["coolant", "assembly", "coolant"]);
        assert_eq!(required_quizzes(&directives), 2);
    }

    #[test]
    fn enough_pools_require_one_quiz_per_robot() {
        let directives = assign_directives(&QuizLibrary::default(), 3);
        assert_eq!(required_quizzes(&directives), 3);
    }

    #[test]
    fn empty_library_assigns_no_directives() {
        let directives = assign_directives(&library_with_pools(&[]), 2);
        assert!(directives.iter().all(|d| d.is_empty()));
        assert_eq!(required_quizzes(&directives), 0);
    }

    #[test]
    fn floor_plan_is_walled_in() {
        let (grid, _) = FactoryGrid::from_ascii(FLOOR_PLAN);
        for x in 0..grid.width {
            assert_eq!(grid.tile(x, 0), Tile::Wall);
            assert_eq!(grid.tile(x, grid.height - 1), Tile::Wall);
        }
        for y in 0..grid.height {
            assert_eq!(grid.tile(0, y), Tile::Wall);
            assert_eq!(grid.tile(grid.width - 1, y), Tile::Wall);
        }
    }
}
