/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

use crate::actors::TilePos;

pub const MACHINE_MAX_HITS: u8 = 2;

/// Destructible factory machine. The `id` is stable across the session
/// (derived from the spawn tile) so logs and bookkeeping can name it.
#[derive(Component, Debug, Clone)]
pub struct Obstacle {
    pub id: String,
}

impl Obstacle {
    pub fn at_tile(t: IVec2) -> Self {
        Self {
            id: format!("factory_{}_{}", t.x, t.y),
        }
    }
}

/// Per-machine hit counter. A machine is destroyed exactly when the
/// count reaches `max_hits`; once destroyed further hits are no-ops.
#[derive(Component, Debug, Clone, Copy)]
pub struct FactoryInventory {
    hits: u8,
    max_hits: u8,
}

impl Default for FactoryInventory {
    fn default() -> Self {
        Self::new(MACHINE_MAX_HITS)
    }
}

impl FactoryInventory {
    pub fn new(max_hits: u8) -> Self {
        Self { hits: 0, max_hits }
    }

    pub fn hits(&self) -> u8 {
        self.hits
    }

    pub fn destroyed(&self) -> bool {
        self.hits >= self.max_hits
    }

    /// Registers one hit. Returns true only on the hit that destroys the
    /// machine.
    pub fn add_hit(&mut self) -> bool {
        if self.destroyed() {
            return false;
        }
        self.hits += 1;
        self.destroyed()
    }
}

#[derive(Clone, Copy, Debug, Message)]
pub struct ObstacleHit {
    pub target: Entity,
}

pub fn apply_obstacle_hits(
    mut commands: Commands,
    mut hits: MessageReader<ObstacleHit>,
    mut q_machines: Query<(Entity, &Obstacle, &mut FactoryInventory, Option<&TilePos>)>,
) {
    for ev in hits.read() {
        // Target may already be gone if two robots struck the same tick.
        let Ok((e, obstacle, mut inv, _)) = q_machines.get_mut(ev.target) else {
            continue;
        };

        if inv.add_hit() {
            info!("{} destroyed after {} hits", obstacle.id, inv.hits());
            commands.entity(e).despawn();
        } else {
            info!("{} hit ({}/{})", obstacle.id, inv.hits(), MACHINE_MAX_HITS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroyed_exactly_at_max_hits() {
        let mut inv = FactoryInventory::new(2);
        assert!(!inv.destroyed());
        assert!(!inv.add_hit());
        assert!(!inv.destroyed());
        assert!(inv.add_hit());
        assert!(inv.destroyed());
        assert_eq!(inv.hits(), 2);
    }

    #[test]
    fn hits_do_not_accumulate_past_destruction() {
        let mut inv = FactoryInventory::new(2);
        inv.add_hit();
        inv.add_hit();
        assert!(!inv.add_hit());
        assert!(!inv.add_hit());
        assert_eq!(inv.hits(), 2);
        assert!(inv.destroyed());
    }

    #[test]
    fn obstacle_id_is_stable_per_tile() {
        let a = Obstacle::at_tile(IVec2::new(4, 9));
        let b = Obstacle::at_tile(IVec2::new(4, 9));
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "factory_4_9");
    }
}
