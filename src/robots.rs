/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RobotState {
    #[default]
    Idle,
    Seeking,
    InDialogue,
    InQuiz,
    /// Terminal. A fixed robot is permanently non-hostile and never
    /// re-enters the behavior loop.
    Fixed,
}

/// One misaligned robot. Created at level spawn, mutated by interaction
/// and timer events, lives until the level is torn down.
#[derive(Component, Debug, Clone)]
pub struct EnemyRobot {
    pub id: String,
    /// Name of the directive quiz pool this robot poses.
    pub directive: String,
    pub hostile: bool,
    pub quiz_done: bool,
    pub state: RobotState,
}

impl EnemyRobot {
    pub fn new(id: impl Into<String>, directive: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            directive: directive.into(),
            hostile: true,
            quiz_done: false,
            state: RobotState::Idle,
        }
    }

    /// A robot accepts an interaction only while hostile, unquizzed, and
    /// not already mid-dialogue or mid-quiz.
    pub fn can_interact(&self) -> bool {
        self.hostile
            && !self.quiz_done
            && matches!(self.state, RobotState::Idle | RobotState::Seeking)
    }

    pub fn mark_fixed(&mut self) {
        self.hostile = false;
        self.quiz_done = true;
        self.state = RobotState::Fixed;
    }

    pub fn resume_hostile(&mut self) {
        self.quiz_done = false;
        self.state = RobotState::Seeking;
    }
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct RobotTunings {
    pub move_speed_tps: f32,
    pub spawn_delay_secs: f32,
    /// Robots within this many tiles of a machine register a hit.
    pub proximity_tiles: f32,
    pub stuck_secs: f32,
    pub retarget_delay_secs: f32,
    pub idle_retry_secs: f32,
    /// Scoring penalty per existing hit; pushes robots toward
    /// less-damaged machines.
    pub hit_score_penalty: i32,
    pub detour_radius_tiles: f32,
}

impl RobotTunings {
    pub fn baseline() -> Self {
        Self {
            move_speed_tps: 2.0,
            spawn_delay_secs: 2.0,
            proximity_tiles: 0.6,
            stuck_secs: 1.5,
            retarget_delay_secs: 1.0,
            idle_retry_secs: 2.0,
            hit_score_penalty: 4,
            detour_radius_tiles: 2.0,
        }
    }
}

/// Continuous movement order, consumed by `ai::robot_move`.
#[derive(Component, Debug, Clone, Copy)]
pub struct RobotMove {
    pub target: Vec2,
    pub speed_tps: f32,
}

/// Resumable seek-loop state. Cleared wholesale when a robot leaves the
/// behavior loop (dialogue, quiz, fixed) so no stale step resumes later.
#[derive(Component, Debug, Default)]
pub struct SeekState {
    pub target: Option<Entity>,
    pub detour: Option<Vec2>,
    pub last_pos: Vec2,
    pub stuck_secs: f32,
    /// Counts down before the next action (spawn delay, post-hit
    /// re-target delay, idle retry).
    pub cooldown: f32,
}

impl SeekState {
    pub fn cancel(&mut self) {
        self.target = None;
        self.detour = None;
        self.stuck_secs = 0.0;
        self.cooldown = 0.0;
    }
}

/// State -> tint mapping so a glance at the floor shows which robots are
/// still misaligned.
pub fn sync_robot_color(mut q: Query<(&EnemyRobot, &mut Sprite), Changed<EnemyRobot>>) {
    for (robot, mut sprite) in q.iter_mut() {
        sprite.color = match robot.state {
            RobotState::Fixed => Color::srgb(0.25, 0.85, 0.35),
            RobotState::InDialogue | RobotState::InQuiz => Color::srgb(0.95, 0.85, 0.25),
            _ => Color::srgb(0.90, 0.25, 0.20),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_robot_rejects_interaction() {
        let mut robot = EnemyRobot::new("robot_0", "coolant-directives");
        assert!(robot.can_interact());

        robot.mark_fixed();
        assert!(!robot.can_interact());
        assert!(!robot.hostile);
        assert_eq!(robot.state, RobotState::Fixed);
    }

    #[test]
    fn busy_robot_rejects_reentry() {
        let mut robot = EnemyRobot::new("robot_0", "coolant-directives");
        robot.state = RobotState::InDialogue;
        assert!(!robot.can_interact());

        robot.state = RobotState::InQuiz;
        assert!(!robot.can_interact());
    }

    #[test]
    fn failed_quiz_resumes_hostility() {
        let mut robot = EnemyRobot::new("robot_0", "coolant-directives");
        robot.state = RobotState::InQuiz;
        robot.resume_hostile();
        assert!(robot.hostile);
        assert!(robot.can_interact());
    }
}
