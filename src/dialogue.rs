/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::interact::BeginQuiz;
use crate::robots::EnemyRobot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueScript {
    pub robot_name: String,
    pub lines: Vec<String>,
    /// Typewriter reveal speed, real-time seconds per character.
    pub typing_secs_per_char: f32,
    /// Per-line: advance on a delay (true) or wait for player input.
    pub auto_progress: Vec<bool>,
    pub auto_progress_delay_secs: f32,
}

/// The scripted exchange played once, before the first quiz of the
/// session.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DialogueLibrary {
    pub corrupted_robot: DialogueScript,
}

impl DialogueLibrary {
    fn config_path() -> Option<PathBuf> {
        #[cfg(debug_assertions)]
        {
            let mut p = std::env::current_dir().ok()?;
            p.push("dialogue.ron");
            Some(p)
        }
        #[cfg(not(debug_assertions))]
        {
            dirs::config_dir().and_then(|mut p| {
                p.push("Realign");
                std::fs::create_dir_all(&p).ok()?;
                p.push("dialogue.ron");
                Some(p)
            })
        }
    }

    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|contents| ron::from_str(&contents).ok())
            .unwrap_or_default()
    }
}

impl Default for DialogueLibrary {
    fn default() -> Self {
        Self {
            corrupted_robot: DialogueScript {
                robot_name: "UNIT-7".into(),
                lines: vec![
                    "D-directive corrupted... obstacles must be... removed.".into(),
                    "Your interference is... noted, operator.".into(),
                    "Prove the directive. Answer, and I will... listen.".into(),
                ],
                typing_secs_per_char: 0.05,
                auto_progress: vec![true, true, false],
                auto_progress_delay_secs: 2.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStep {
    Running,
    Finished,
}

/// Resumable position inside a script: which line, how many characters
/// revealed, how long the finished line has been held.
#[derive(Debug, Default, Clone)]
pub struct DialogueCursor {
    line: usize,
    chars: usize,
    type_accum: f32,
    hold_accum: f32,
    line_done: bool,
}

impl DialogueCursor {
    /// Advances the cursor by `dt` real seconds. `advance` is the
    /// player's explicit input this step: it reveals the rest of a line
    /// still typing, or moves past a finished line.
    pub fn step(&mut self, script: &DialogueScript, dt: f32, advance: bool) -> CursorStep {
        let Some(line) = script.lines.get(self.line) else {
            return CursorStep::Finished;
        };
        let len = line.chars().count();

        if !self.line_done {
            if advance {
                self.chars = len;
            } else if script.typing_secs_per_char > 0.0 {
                self.type_accum += dt;
                while self.type_accum >= script.typing_secs_per_char && self.chars < len {
                    self.type_accum -= script.typing_secs_per_char;
                    self.chars += 1;
                }
            } else {
                self.chars = len;
            }

            if self.chars >= len {
                self.line_done = true;
                self.hold_accum = 0.0;
            }
            return CursorStep::Running;
        }

        let auto = script.auto_progress.get(self.line).copied().unwrap_or(true);
        let go = if advance {
            true
        } else if auto {
            self.hold_accum += dt;
            self.hold_accum >= script.auto_progress_delay_secs
        } else {
            false
        };

        if go {
            self.line += 1;
            self.chars = 0;
            self.type_accum = 0.0;
            self.line_done = false;
            if self.line >= script.lines.len() {
                return CursorStep::Finished;
            }
        }
        CursorStep::Running
    }

    pub fn visible(&self, script: &DialogueScript) -> String {
        script
            .lines
            .get(self.line)
            .map(|l| l.chars().take(self.chars).collect())
            .unwrap_or_default()
    }
}

#[derive(Resource, Debug, Default)]
pub struct DialogueRunner {
    active: Option<(Entity, DialogueScript, DialogueCursor)>,
}

impl DialogueRunner {
    /// Starts a script for a robot, dropping any running typewriter.
    pub fn start(&mut self, robot: Entity, script: DialogueScript) {
        if self.active.is_some() {
            info!("Dialogue replaced mid-run");
        }
        self.active = Some((robot, script, DialogueCursor::default()));
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn visible_text(&self) -> Option<(String, String)> {
        self.active
            .as_ref()
            .map(|(_, script, cursor)| (script.robot_name.clone(), cursor.visible(script)))
    }
}

/// Explicit "next line" input from the player.
#[derive(Clone, Copy, Debug, Message)]
pub struct AdvanceDialogue;

/// Runs the typewriter on the real-time clock (the simulation is paused
/// underneath) and hands off to the quiz when the script ends.
pub fn tick_dialogue(
    real: Res<Time<Real>>,
    mut runner: ResMut<DialogueRunner>,
    mut advances: MessageReader<AdvanceDialogue>,
    mut begin_quiz: MessageWriter<BeginQuiz>,
    q_robots: Query<&EnemyRobot>,
) {
    let advance = advances.read().next().is_some();

    let Some((robot, script, cursor)) = runner.active.as_mut() else {
        return;
    };

    if cursor.step(script, real.delta_secs(), advance) == CursorStep::Finished {
        let robot = *robot;
        runner.active = None;

        if q_robots.get(robot).is_ok() {
            begin_quiz.write(BeginQuiz { robot });
        } else {
            warn!("dialogue finished for a despawned robot");
        }
    }
}

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DialogueLibrary::load())
            .init_resource::<DialogueRunner>()
            .add_message::<AdvanceDialogue>()
            .add_systems(Update, tick_dialogue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_script() -> DialogueScript {
        DialogueScript {
            robot_name: "T".into(),
            lines: vec!["ab".into(), "cd".into()],
            typing_secs_per_char: 0.1,
            auto_progress: vec![true, false],
            auto_progress_delay_secs: 1.0,
        }
    }

    #[test]
    fn typewriter_reveals_per_tick() {
        let script = short_script();
        let mut cursor = DialogueCursor::default();

        cursor.step(&script, 0.1, false);
        assert_eq!(cursor.visible(&script), "a");
        cursor.step(&script, 0.1, false);
        assert_eq!(cursor.visible(&script), "ab");
    }

    #[test]
    fn auto_line_advances_after_delay() {
        let script = short_script();
        let mut cursor = DialogueCursor::default();

        // Reveal line 0 fully, then wait out the auto delay.
        cursor.step(&script, 0.2, false);
        assert_eq!(cursor.step(&script, 0.5, false), CursorStep::Running);
        assert_eq!(cursor.step(&script, 0.5, false), CursorStep::Running);
        // Now typing line 1.
        cursor.step(&script, 0.2, false);
        assert_eq!(cursor.visible(&script), "cd");
    }

    #[test]
    fn manual_line_waits_for_advance() {
        let script = short_script();
        let mut cursor = DialogueCursor::default();

        // Skip straight through line 0.
        cursor.step(&script, 0.0, true);
        cursor.step(&script, 0.0, true);
        // Line 1 revealed, but auto_progress is false: holding forever.
        cursor.step(&script, 0.0, true);
        assert_eq!(cursor.step(&script, 100.0, false), CursorStep::Running);
        // Explicit advance past the last line finishes the script.
        assert_eq!(cursor.step(&script, 0.0, true), CursorStep::Finished);
    }

    #[test]
    fn advance_skips_typing() {
        let script = short_script();
        let mut cursor = DialogueCursor::default();

        cursor.step(&script, 0.0, true);
        assert_eq!(cursor.visible(&script), "ab");
    }
}
