/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Wall,
    /// Solid scenery. Blocks movement like a wall but is never a robot
    /// target; only machines with a hit counter are.
    Block,
}

#[derive(Resource, Debug, Clone)]
pub struct FactoryGrid {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Tile>,
}

/// Spawn points parsed out of the ASCII floor plan.
#[derive(Resource, Debug, Clone)]
pub struct LevelSeed {
    pub player: IVec2,
    pub machines: Vec<IVec2>,
    pub robots: Vec<IVec2>,
}

impl FactoryGrid {
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn tile(&self, x: usize, y: usize) -> Tile {
        self.tiles[self.idx(x, y)]
    }

    pub fn in_bounds(&self, t: IVec2) -> bool {
        t.x >= 0 && t.y >= 0 && (t.x as usize) < self.width && (t.y as usize) < self.height
    }

    pub fn walkable(&self, t: IVec2) -> bool {
        self.in_bounds(t) && self.tile(t.x as usize, t.y as usize) == Tile::Empty
    }

    /// Legend: '#' = wall, 'B' = block, 'O' = machine, 'R' = robot spawn,
    /// 'P' = player spawn, '.' or ' ' = floor.
    pub fn from_ascii(lines: &[&str]) -> (Self, LevelSeed) {
        let height = lines.len();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut tiles: Vec<Tile> = Vec::with_capacity(width * height);

        let mut player: Option<IVec2> = None;
        let mut machines: Vec<IVec2> = Vec::new();
        let mut robots: Vec<IVec2> = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let mut chars = line.chars().collect::<Vec<_>>();
            while chars.len() < width {
                chars.push(' ');
            }

            for (x, c) in chars.into_iter().enumerate() {
                let t = IVec2::new(x as i32, y as i32);
                match c {
                    '#' => tiles.push(Tile::Wall),
                    'B' => tiles.push(Tile::Block),
                    'O' => {
                        tiles.push(Tile::Empty);
                        machines.push(t);
                    }
                    'R' => {
                        tiles.push(Tile::Empty);
                        robots.push(t);
                    }
                    'P' => {
                        tiles.push(Tile::Empty);
                        player = Some(t);
                    }
                    _ => tiles.push(Tile::Empty),
                }
            }
        }

        if player.is_none() {
            warn!("FactoryGrid::from_ascii: no 'P' spawn in floor plan, defaulting to (1,1)");
        }

        (
            Self {
                width,
                height,
                tiles,
            },
            LevelSeed {
                player: player.unwrap_or(IVec2::new(1, 1)),
                machines,
                robots,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spawns_and_solids() {
        let (grid, seed) = FactoryGrid::from_ascii(&[
            "#####",
            "#P.O#",
            "#RB.#",
            "#####",
        ]);

        assert_eq!(grid.width, 5);
        assert_eq!(grid.height, 4);
        assert_eq!(seed.player, IVec2::new(1, 1));
        assert_eq!(seed.machines, vec![IVec2::new(3, 1)]);
        assert_eq!(seed.robots, vec![IVec2::new(1, 2)]);

        assert!(!grid.walkable(IVec2::new(0, 0)));
        assert!(!grid.walkable(IVec2::new(2, 2))); // block
        assert!(grid.walkable(IVec2::new(2, 1)));
        assert!(!grid.walkable(IVec2::new(-1, 1)));
    }
}
