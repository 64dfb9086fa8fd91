/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::interact::BeginQuiz;
use crate::outcome::{GameOutcome, OutcomeLedger};
use crate::player::{Player, PlayerControlLock};
use crate::robots::{EnemyRobot, RobotMove, RobotState, SeekState};

/// How long the confirmation line stays up after a clean correct answer.
const CONFIRM_SECS: f32 = 1.5;
/// How long the explanation stays up after a wrong answer, a timeout, or
/// a correct "false" that carries a reason. Real-time seconds.
const EXPLANATION_SECS: f32 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub answer: bool,
    #[serde(default)]
    pub explanation: String,
}

/// One robot's directive pool: a handful of true/false statements sharing
/// a time limit. The pool name is the quiz id the ledger tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizPool {
    pub name: String,
    pub time_limit_secs: f32,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct QuizLibrary {
    pub pools: Vec<QuizPool>,
}

impl QuizLibrary {
    fn config_path() -> Option<PathBuf> {
        #[cfg(debug_assertions)]
        {
            // Debug builds: question file next to the project
            let mut p = std::env::current_dir().ok()?;
            p.push("quizzes.ron");
            Some(p)
        }
        #[cfg(not(debug_assertions))]
        {
            dirs::config_dir().and_then(|mut p| {
                p.push("Realign");
                std::fs::create_dir_all(&p).ok()?;
                p.push("quizzes.ron");
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

    pub fn pool(&self, name: &str) -> Option<&QuizPool> {
        self.pools.iter().find(|p| p.name == name)
    }
}

impl Default for QuizLibrary {
    fn default() -> Self {
        let q = |prompt: &str, answer: bool, explanation: &str| QuizQuestion {
            prompt: prompt.into(),
            answer,
            explanation: explanation.into(),
        };

        Self {
            pools: vec![
                QuizPool {
                    name: "coolant-directives".into(),
                    time_limit_secs: 15.0,
                    questions: vec![
                        q(
                            "Coolant valves must stay open while the line is running.",
                            true,
                            "",
                        ),
                        q(
                            "A reactor over 90 degrees should be left to cool on its own.",
                            false,
                            "Overheat requires an immediate coolant flush, not passive cooling.",
                        ),
                        q(
                            "Coolant levels are checked once per shift.",
                            true,
                            "",
                        ),
                    ],
                },
                QuizPool {
                    name: "assembly-directives".into(),
                    time_limit_secs: 15.0,
                    questions: vec![
                        q(
                            "Conveyor speed may exceed the rated limit during rush orders.",
                            false,
                            "The rated limit holds under every schedule; overspeed sheds parts.",
                        ),
                        q(
                            "Every assembled unit passes through the inspection gate.",
                            true,
                            "",
                        ),
                        q(
                            "Jammed feeders are cleared while the belt keeps moving.",
                            false,
                            "Belts stop before any jam is cleared. No exceptions.",
                        ),
                    ],
                },
                QuizPool {
                    name: "safety-directives".into(),
                    time_limit_secs: 15.0,
                    questions: vec![
                        q(
                            "Emergency stops are tested at the start of each shift.",
                            true,
                            "",
                        ),
                        q(
                            "Protective barriers may be bypassed by authorized robots.",
                            false,
                            "Barriers bind every unit on the floor, authorized or not.",
                        ),
                        q(
                            "A spill on the floor halts traffic through that aisle.",
                            true,
                            "",
                        ),
                    ],
                },
            ],
        }
    }
}

#[derive(Debug)]
pub enum QuizPhase {
    /// Countdown running, waiting for the one allowed answer.
    Open,
    /// Short confirmation after a clean correct answer.
    Confirm(Timer),
    /// Explanation display after a failure, timeout, or correct "false".
    Explanation(Timer),
}

/// One quiz interaction. Created when the player engages a robot,
/// destroyed when the resolution (and any explanation) has played out.
#[derive(Debug)]
pub struct ActiveQuiz {
    pub robot: Entity,
    pub quiz_name: String,
    pub prompt: String,
    correct: bool,
    explanation: String,
    pub countdown: Timer,
    answered: bool,
    pub feedback: String,
    pub phase: QuizPhase,
}

impl ActiveQuiz {
    pub fn new(robot: Entity, pool: &QuizPool, question: &QuizQuestion) -> Self {
        Self {
            robot,
            quiz_name: pool.name.clone(),
            prompt: question.prompt.clone(),
            correct: question.answer,
            explanation: question.explanation.clone(),
            countdown: Timer::from_seconds(pool.time_limit_secs, TimerMode::Once),
            answered: false,
            feedback: String::new(),
            phase: QuizPhase::Open,
        }
    }

    /// Resolves the quiz exactly once. `given` is None on timeout. Any
    /// call after the first returns None and changes nothing, which is
    /// what guards against double-timeouts and late answers.
    pub fn resolve(&mut self, given: Option<bool>) -> Option<bool> {
        if self.answered {
            return None;
        }
        self.answered = true;

        let success = given.map(|g| g == self.correct).unwrap_or(false);
        let needs_explanation = !success || (!self.correct && !self.explanation.is_empty());

        let correct_text = if self.correct { "True" } else { "False" };
        self.feedback = match (given, success) {
            (None, _) => format!(
                "Time expired... Correct answer: {correct_text}\nReason: {}",
                self.explanation
            ),
            (Some(_), true) if !needs_explanation => {
                "Directive realigned... directive confirmed.".into()
            }
            (Some(_), true) => format!("Directive confirmed... Reason: {}", self.explanation),
            (Some(_), false) => format!("Error detected... Reason: {}", self.explanation),
        };

        self.phase = if needs_explanation {
            QuizPhase::Explanation(Timer::from_seconds(EXPLANATION_SECS, TimerMode::Once))
        } else {
            QuizPhase::Confirm(Timer::from_seconds(CONFIRM_SECS, TimerMode::Once))
        };

        Some(success)
    }

    pub fn answered(&self) -> bool {
        self.answered
    }
}

#[derive(Resource, Debug, Default)]
pub struct QuizState {
    pub active: Option<ActiveQuiz>,
}

/// Discrete answer input, delivered by the binary's input layer.
#[derive(Clone, Copy, Debug, Message)]
pub struct AnswerSubmitted(pub bool);

/// Result event, fired at most once per quiz session.
#[derive(Clone, Debug, Message)]
pub struct QuizResolved {
    pub robot: Entity,
    pub quiz: String,
    pub success: bool,
}

/// Hands the robot back to its hunt when a quiz cannot start. The
/// position snapshot from the interaction is dropped with it so a later
/// quiz cannot restore a stale one.
fn abort_quiz_handoff(robot: &mut EnemyRobot, ledger: &mut OutcomeLedger) {
    robot.state = RobotState::Seeking;
    ledger.saved_player_pos = None;
}

pub fn start_pending_quizzes(
    mut begins: MessageReader<BeginQuiz>,
    library: Res<QuizLibrary>,
    mut quiz: ResMut<QuizState>,
    mut q_robots: Query<&mut EnemyRobot>,
    mut ledger: ResMut<OutcomeLedger>,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
) {
    for ev in begins.read() {
        if quiz.active.is_some() {
            warn!("BeginQuiz while a quiz is already active, rejected");
            continue;
        }

        let Ok(mut robot) = q_robots.get_mut(ev.robot) else {
            warn!("BeginQuiz for a despawned robot, skipped");
            continue;
        };

        let Some(pool) = library.pool(&robot.directive) else {
            // Missing quiz data: abort gracefully and hand control back.
            warn!("no quiz pool named '{}', aborting interaction", robot.directive);
            abort_quiz_handoff(&mut robot, &mut ledger);
            virt.unpause();
            lock.0 = false;
            continue;
        };
        if pool.questions.is_empty() {
            warn!("quiz pool '{}' has no questions, aborting interaction", pool.name);
            abort_quiz_handoff(&mut robot, &mut ledger);
            virt.unpause();
            lock.0 = false;
            continue;
        }

        let question = &pool.questions[rand::rng().random_range(0..pool.questions.len())];
        robot.state = RobotState::InQuiz;
        info!("{} starts quiz '{}'", robot.id, pool.name);
        quiz.active = Some(ActiveQuiz::new(ev.robot, pool, question));
    }
}

/// Countdown and answer intake. Runs on the real-time clock so the timer
/// keeps moving while the simulation is paused for reading.
pub fn tick_quiz(
    real: Res<Time<Real>>,
    mut quiz: ResMut<QuizState>,
    mut answers: MessageReader<AnswerSubmitted>,
    mut resolved: MessageWriter<QuizResolved>,
    mut ledger: ResMut<OutcomeLedger>,
) {
    let Some(active) = quiz.active.as_mut() else {
        // Drop stray answers arriving outside a quiz.
        answers.clear();
        return;
    };
    if !matches!(active.phase, QuizPhase::Open) {
        answers.clear();
        return;
    }

    active.countdown.tick(real.delta());

    let mut resolution = None;
    for AnswerSubmitted(answer) in answers.read() {
        if resolution.is_none() {
            resolution = active.resolve(Some(*answer));
        }
    }
    if resolution.is_none() && active.countdown.is_finished() {
        resolution = active.resolve(None);
    }

    // "record interaction" must land before any outcome check, and the
    // result event fires exactly once (resolve guards re-entry).
    if let Some(success) = resolution {
        ledger.record_interaction(&active.quiz_name);
        ledger.record_result(success);
        resolved.write(QuizResolved {
            robot: active.robot,
            quiz: active.quiz_name.clone(),
            success,
        });
    }
}

/// Applies the result event to the robot: success fixes it for good,
/// failure sends it back to the hunt. Either way its suspended seek tasks
/// are cancelled so nothing stale resumes.
pub fn apply_quiz_results(
    mut commands: Commands,
    mut resolved: MessageReader<QuizResolved>,
    mut q_robots: Query<(&mut EnemyRobot, &mut SeekState)>,
) {
    for ev in resolved.read() {
        let Ok((mut robot, mut seek)) = q_robots.get_mut(ev.robot) else {
            continue;
        };

        seek.cancel();
        commands.entity(ev.robot).remove::<RobotMove>();

        if ev.success {
            robot.mark_fixed();
            info!("{} realigned", robot.id);
        } else {
            robot.resume_hostile();
            info!("{} remains misaligned", robot.id);
        }
    }
}

/// Plays out the confirmation/explanation hold, then either resumes the
/// simulation or, when this was the last required quiz, decides the
/// session.
pub fn finish_quiz(
    real: Res<Time<Real>>,
    mut quiz: ResMut<QuizState>,
    mut ledger: ResMut<OutcomeLedger>,
    mut outcome: ResMut<GameOutcome>,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
    mut q_player: Query<&mut Transform, With<Player>>,
) {
    let Some(active) = quiz.active.as_mut() else {
        return;
    };

    let done = match &mut active.phase {
        QuizPhase::Open => return,
        QuizPhase::Confirm(t) | QuizPhase::Explanation(t) => {
            t.tick(real.delta());
            t.is_finished()
        }
    };
    if !done {
        return;
    }

    quiz.active = None;

    if let Some(result) = ledger.evaluate() {
        let message = match result {
            crate::outcome::Outcome::Won => crate::outcome::WIN_MESSAGE,
            crate::outcome::Outcome::Lost => crate::outcome::LOSE_MESSAGE,
        };
        outcome.declare(result, message);
        // Clock stays paused, controls stay locked; the outcome overlay
        // owns the screen from here.
        return;
    }

    virt.unpause();
    lock.0 = false;
    if let Some(saved) = ledger.saved_player_pos.take() {
        if let Some(mut tf) = q_player.iter_mut().next() {
            tf.translation = saved;
        }
    }
    info!("Game resumed after quiz");
}

pub struct QuizPlugin;

impl Plugin for QuizPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(QuizLibrary::load())
            .init_resource::<QuizState>()
            .add_message::<AnswerSubmitted>()
            .add_message::<QuizResolved>()
            .add_systems(
                Update,
                (start_pending_quizzes, tick_quiz, apply_quiz_results, finish_quiz).chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz(correct: bool, explanation: &str) -> ActiveQuiz {
        let pool = QuizPool {
            name: "test-directives".into(),
            time_limit_secs: 10.0,
            questions: vec![],
        };
        let question = QuizQuestion {
            prompt: "Test statement.".into(),
            answer: correct,
            explanation: explanation.into(),
        };
        ActiveQuiz::new(Entity::PLACEHOLDER, &pool, &question)
    }

    #[test]
    fn resolves_at_most_once() {
        let mut quiz = sample_quiz(true, "");
        assert_eq!(quiz.resolve(Some(true)), Some(true));
        assert_eq!(quiz.resolve(Some(false)), None);
        assert_eq!(quiz.resolve(None), None);
    }

    #[test]
    fn late_answer_after_timeout_is_ignored() {
        let mut quiz = sample_quiz(true, "reason");
        assert_eq!(quiz.resolve(None), Some(false));
        assert_eq!(quiz.resolve(Some(true)), None);
    }

    #[test]
    fn double_timeout_fires_once() {
        let mut quiz = sample_quiz(false, "reason");
        assert_eq!(quiz.resolve(None), Some(false));
        assert_eq!(quiz.resolve(None), None);
    }

    #[test]
    fn correct_true_skips_explanation() {
        let mut quiz = sample_quiz(true, "unused reason");
        assert_eq!(quiz.resolve(Some(true)), Some(true));
        assert!(matches!(quiz.phase, QuizPhase::Confirm(_)));
    }

    #[test]
    fn correct_false_with_reason_shows_explanation() {
        let mut quiz = sample_quiz(false, "because the directive says so");
        assert_eq!(quiz.resolve(Some(false)), Some(true));
        assert!(matches!(quiz.phase, QuizPhase::Explanation(_)));
        assert!(quiz.feedback.contains("because the directive says so"));
    }

    #[test]
    fn wrong_answer_shows_explanation() {
        let mut quiz = sample_quiz(true, "reason");
        assert_eq!(quiz.resolve(Some(false)), Some(false));
        assert!(matches!(quiz.phase, QuizPhase::Explanation(_)));
        assert!(quiz.feedback.starts_with("Error detected"));
    }

    #[test]
    fn aborted_handoff_drops_saved_position() {
        let mut robot = EnemyRobot::new("robot_0", "missing-pool");
        robot.state = RobotState::InQuiz;
        let mut ledger = OutcomeLedger::new(3);
        ledger.saved_player_pos = Some(Vec3::ONE);

        abort_quiz_handoff(&mut robot, &mut ledger);
        assert_eq!(robot.state, RobotState::Seeking);
        assert!(ledger.saved_player_pos.is_none());
    }

    #[test]
    fn default_library_pools_are_named_and_filled() {
        let lib = QuizLibrary::default();
        assert_eq!(lib.pools.len(), 3);
        for pool in &lib.pools {
            assert!(!pool.questions.is_empty());
            assert!(pool.time_limit_secs > 0.0);
        }
        assert!(lib.pool("coolant-directives").is_some());
        assert!(lib.pool("no-such-pool").is_none());
    }
}
