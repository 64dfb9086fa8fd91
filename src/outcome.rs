/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
use bevy::prelude::*;
use std::collections::HashSet;

use crate::factory::Obstacle;
use crate::player::PlayerControlLock;

pub const WIN_MESSAGE: &str = "All directives correctly executed. Factory saved!";
pub const LOSE_MESSAGE: &str =
    "Not all directives followed. Factory chaos initiated! Factory meltdown.";
pub const MELTDOWN_MESSAGE: &str =
    "All obstacles were destroyed before all directives were followed. Factory meltdown.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Latched end-of-session state. Once set it stays set until restart.
#[derive(Resource, Debug, Clone, Default)]
pub struct GameOutcome {
    pub result: Option<Outcome>,
    pub message: String,
}

impl GameOutcome {
    pub fn declare(&mut self, result: Outcome, message: &str) {
        if self.result.is_some() {
            return;
        }
        match result {
            Outcome::Won => info!("Player wins: {message}"),
            Outcome::Lost => info!("Player loses: {message}"),
        }
        self.result = Some(result);
        self.message = message.to_string();
    }
}

/// Session-wide quiz bookkeeping. Owned by the app as an explicitly
/// constructed resource; every consumer takes it by reference instead of
/// reaching for an ambient singleton.
#[derive(Resource, Debug, Clone)]
pub struct OutcomeLedger {
    required: usize,
    interacted: HashSet<String>,
    passed: u32,
    failed: u32,
    first_dialogue_shown: bool,
    pub saved_player_pos: Option<Vec3>,
}

impl Default for OutcomeLedger {
    fn default() -> Self {
        Self::new(3)
    }
}

impl OutcomeLedger {
    pub fn new(required: usize) -> Self {
        Self {
            required,
            interacted: HashSet::new(),
            passed: 0,
            failed: 0,
            first_dialogue_shown: false,
            saved_player_pos: None,
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn interacted_count(&self) -> usize {
        self.interacted.len()
    }

    pub fn passed(&self) -> u32 {
        self.passed
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    /// Idempotent: re-recording a quiz id is a no-op. Returns true when
    /// the id was newly inserted.
    pub fn record_interaction(&mut self, quiz: &str) -> bool {
        let new = self.interacted.insert(quiz.to_string());
        if new {
            info!(
                "Quiz interacted: {quiz} ({}/{})",
                self.interacted.len(),
                self.required
            );
        }
        new
    }

    /// Tallies a result only; deciding the outcome is `evaluate`'s job.
    pub fn record_result(&mut self, success: bool) {
        if success {
            self.passed += 1;
            info!("Quiz passed (total passed: {})", self.passed);
        } else {
            self.failed += 1;
            info!("Quiz failed (total failed: {})", self.failed);
        }
    }

    pub fn all_interacted(&self) -> bool {
        self.interacted.len() >= self.required
    }

    /// None until every required quiz has been interacted with; then any
    /// failure loses, otherwise the session is won.
    pub fn evaluate(&self) -> Option<Outcome> {
        if !self.all_interacted() {
            return None;
        }
        if self.failed > 0 {
            Some(Outcome::Lost)
        } else {
            Some(Outcome::Won)
        }
    }

    pub fn first_dialogue_shown(&self) -> bool {
        self.first_dialogue_shown
    }

    pub fn set_first_dialogue_shown(&mut self) {
        self.first_dialogue_shown = true;
    }

    pub fn reset(&mut self) {
        self.interacted.clear();
        self.passed = 0;
        self.failed = 0;
        self.first_dialogue_shown = false;
        self.saved_player_pos = None;
        info!("Quiz counters reset");
    }
}

/// Run condition: gameplay systems stop once the session is decided.
pub fn session_running(outcome: Res<GameOutcome>) -> bool {
    outcome.result.is_none()
}

/// Alternate failure path: every machine destroyed before every directive
/// was even attempted forces an immediate loss, whatever the pass/fail
/// tallies say.
pub fn force_lose_due_to_obstacles(machines_standing: usize, ledger: &OutcomeLedger) -> bool {
    machines_standing == 0 && !ledger.all_interacted()
}

pub fn watch_obstacles(
    q_machines: Query<(), With<Obstacle>>,
    ledger: Res<OutcomeLedger>,
    mut outcome: ResMut<GameOutcome>,
    mut virt: ResMut<Time<Virtual>>,
    mut lock: ResMut<PlayerControlLock>,
) {
    if outcome.result.is_some() {
        return;
    }
    if force_lose_due_to_obstacles(q_machines.iter().count(), &ledger) {
        outcome.declare(Outcome::Lost, MELTDOWN_MESSAGE);
        virt.pause();
        lock.0 = true;
    }
}

pub struct OutcomePlugin;

impl Plugin for OutcomePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameOutcome>()
            .init_resource::<OutcomeLedger>()
            .add_systems(Update, watch_obstacles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_recording_is_idempotent() {
        let mut ledger = OutcomeLedger::new(3);
        assert!(ledger.record_interaction("q1"));
        assert!(!ledger.record_interaction("q1"));
        assert!(!ledger.record_interaction("q1"));
        assert!(ledger.record_interaction("q2"));
        assert_eq!(ledger.interacted_count(), 2);
    }

    #[test]
    fn evaluate_noop_below_required() {
        let mut ledger = OutcomeLedger::new(3);
        ledger.record_interaction("q1");
        ledger.record_result(false);
        assert_eq!(ledger.evaluate(), None);

        ledger.record_interaction("q2");
        assert_eq!(ledger.evaluate(), None);
    }

    #[test]
    fn all_passed_wins() {
        let mut ledger = OutcomeLedger::new(2);
        for q in ["q1", "q2"] {
            ledger.record_interaction(q);
            ledger.record_result(true);
        }
        assert_eq!(ledger.evaluate(), Some(Outcome::Won));
    }

    #[test]
    fn one_failure_loses_despite_passes() {
        // required=3, two passed, one failed: still a loss.
        let mut ledger = OutcomeLedger::new(3);
        ledger.record_interaction("q1");
        ledger.record_result(true);
        ledger.record_interaction("q2");
        ledger.record_result(true);
        ledger.record_interaction("q3");
        ledger.record_result(false);
        assert_eq!(ledger.evaluate(), Some(Outcome::Lost));
    }

    #[test]
    fn meltdown_forces_loss_before_all_interacted() {
        let mut ledger = OutcomeLedger::new(3);
        ledger.record_interaction("q1");
        ledger.record_result(true);
        assert!(force_lose_due_to_obstacles(0, &ledger));
        assert!(!force_lose_due_to_obstacles(2, &ledger));
    }

    #[test]
    fn no_meltdown_once_all_interacted() {
        let mut ledger = OutcomeLedger::new(1);
        ledger.record_interaction("q1");
        assert!(!force_lose_due_to_obstacles(0, &ledger));
    }

    #[test]
    fn reset_clears_everything() {
        let mut ledger = OutcomeLedger::new(3);
        ledger.record_interaction("q1");
        ledger.record_result(true);
        ledger.record_result(false);
        ledger.set_first_dialogue_shown();
        ledger.saved_player_pos = Some(Vec3::ONE);

        ledger.reset();
        assert_eq!(ledger.interacted_count(), 0);
        assert_eq!(ledger.passed(), 0);
        assert_eq!(ledger.failed(), 0);
        assert!(!ledger.first_dialogue_shown());
        assert!(ledger.saved_player_pos.is_none());
    }
}
