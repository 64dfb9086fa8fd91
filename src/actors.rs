/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

pub const TILE_SIZE: f32 = 32.0;

/// Tile an actor logically occupies (obstacles and spawn points; moving
/// actors track continuous positions through their `Transform`).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePos(pub IVec2);

/// Static level geometry (wall/floor sprites) despawned on restart.
#[derive(Component)]
pub struct LevelPiece;

pub fn tile_to_world(t: IVec2, z: f32) -> Vec3 {
    Vec3::new(t.x as f32 * TILE_SIZE, -(t.y as f32) * TILE_SIZE, z)
}

pub fn world_to_tile(p: Vec2) -> IVec2 {
    IVec2::new(
        (p.x / TILE_SIZE + 0.5).floor() as i32,
        (-p.y / TILE_SIZE + 0.5).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_world_round_trip() {
        for t in [IVec2::new(0, 0), IVec2::new(3, 7), IVec2::new(12, 1)] {
            let w = tile_to_world(t, 0.0);
            assert_eq!(world_to_tile(Vec2::new(w.x, w.y)), t);
        }
    }
}
