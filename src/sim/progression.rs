//! Game progression: phase, score, health, waves and combo
//!
//! All mutation goes through the named operations below; fields are private.

use serde::{Deserialize, Serialize};

use super::question::{Difficulty, Question};
use crate::consts::START_HEALTH;

/// Top-level game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    #[default]
    Menu,
    Playing,
    Paused,
    GameOver,
    /// Restricted practice mode, entered only from the menu
    Tutorial,
}

impl GamePhase {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (*self, next),
            (Menu, Playing)
                | (Menu, Tutorial)
                | (Playing, Paused)
                | (Playing, GameOver)
                | (Playing, Menu)
                | (Paused, Playing)
                | (Paused, Menu)
                | (GameOver, Menu)
                | (GameOver, Playing)
                | (Tutorial, Menu)
                | (Tutorial, Playing)
        )
    }
}

/// Score multiplier for a combo streak: +1 for every 5 in a row
#[inline]
pub fn combo_multiplier(combo: u32) -> u64 {
    (combo / 5) as u64 + 1
}

/// Session progression record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    phase: GamePhase,
    score: u64,
    health: u32,
    max_health: u32,
    wave: u32,
    combo: u32,
    max_combo: u32,
    questions_answered: u32,
    correct_answers: u32,
    wrong_answers: u32,
    /// Questions resolved (answered or timed out) since the last wave boundary
    questions_this_wave: u32,
    time_elapsed_ms: f64,
    difficulty: Difficulty,
    current_question: Option<Question>,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(Difficulty::Easy, START_HEALTH)
    }
}

impl Progression {
    pub fn new(difficulty: Difficulty, max_health: u32) -> Self {
        let max_health = max_health.max(1);
        Self {
            phase: GamePhase::Menu,
            score: 0,
            health: max_health,
            max_health,
            wave: 1,
            combo: 0,
            max_combo: 0,
            questions_answered: 0,
            correct_answers: 0,
            wrong_answers: 0,
            questions_this_wave: 0,
            time_elapsed_ms: 0.0,
            difficulty,
            current_question: None,
        }
    }

    // --- Transitions ---

    /// Move to another phase. Illegal transitions are ignored and return
    /// false. Starting play from the menu, game over or tutorial begins a
    /// fresh game; returning to the menu resets everything.
    pub fn set_phase(&mut self, next: GamePhase) -> bool {
        if next == self.phase {
            return true;
        }
        if !self.phase.can_transition_to(next) {
            log::debug!("Ignoring phase change {:?} -> {:?}", self.phase, next);
            return false;
        }

        let starts_new_game = next == GamePhase::Playing && self.phase != GamePhase::Paused;
        if next == GamePhase::Menu || starts_new_game {
            self.reset_counters();
        }

        log::info!("Phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        true
    }

    /// Restore every counter to its start-of-game value and return to the menu
    pub fn reset_game(&mut self) {
        self.reset_counters();
        self.phase = GamePhase::Menu;
    }

    fn reset_counters(&mut self) {
        *self = Self {
            phase: self.phase,
            ..Self::new(self.difficulty, self.max_health)
        };
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn set_current_question(&mut self, question: Option<Question>) {
        self.current_question = question;
    }

    /// Clear the pending question and count it toward the wave quota
    pub fn complete_question(&mut self) -> Option<Question> {
        let question = self.current_question.take();
        if question.is_some() {
            self.questions_this_wave += 1;
        }
        question
    }

    /// Check an answer against the pending question.
    ///
    /// A match extends the combo and awards `base_points × multiplier`; a
    /// miss zeroes the combo. The question stays pending either way. With
    /// no pending question nothing changes and false is returned.
    pub fn answer_question(&mut self, submitted: i64) -> bool {
        let Some(question) = self.current_question.as_ref() else {
            log::debug!("answer_question with no pending question");
            return false;
        };

        let correct = question.is_correct(submitted);
        self.questions_answered += 1;
        if correct {
            self.correct_answers += 1;
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
            let points = self.difficulty.base_points() * combo_multiplier(self.combo);
            self.score += points;
            log::debug!("Correct: +{points} (combo {})", self.combo);
        } else {
            self.wrong_answers += 1;
            self.combo = 0;
        }
        correct
    }

    /// Parse a raw answer string first; non-numeric input is rejected without
    /// touching any state
    pub fn answer_text(&mut self, raw: &str) -> Option<bool> {
        let parsed = raw.trim().parse::<i64>().ok()?;
        Some(self.answer_question(parsed))
    }

    /// Lose health (floored at 0). Always breaks the combo; empty health ends
    /// the game only where the phase table allows it (from `Playing`).
    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
        self.combo = 0;
        if self.health == 0 && self.phase.can_transition_to(GamePhase::GameOver) {
            log::info!("Game over at wave {} with score {}", self.wave, self.score);
            self.phase = GamePhase::GameOver;
        }
    }

    /// Restore health up to the maximum
    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Advance to the next wave. Score, health and combo carry over; the
    /// caller is responsible for clearing the engine's monsters.
    pub fn next_wave(&mut self) {
        self.wave += 1;
        self.questions_this_wave = 0;
        log::info!("Wave {} begins (score {})", self.wave, self.score);
    }

    /// Accumulate play time; only counts while playing
    pub fn advance_time(&mut self, dt_ms: f64) {
        if self.phase == GamePhase::Playing {
            self.time_elapsed_ms += dt_ms.max(0.0);
        }
    }

    // --- Accessors ---

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn questions_answered(&self) -> u32 {
        self.questions_answered
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    pub fn questions_this_wave(&self) -> u32 {
        self.questions_this_wave
    }

    pub fn time_elapsed_ms(&self) -> f64 {
        self.time_elapsed_ms
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// Share of answers that were correct, 0 when nothing was answered
    pub fn accuracy(&self) -> f32 {
        if self.questions_answered == 0 {
            0.0
        } else {
            self.correct_answers as f32 / self.questions_answered as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::question::QuestionCategory;
    use proptest::prelude::*;

    fn question(answer: i64) -> Question {
        Question {
            id: 1,
            text: format!("{answer} + 0 = ?"),
            answer,
            difficulty: Difficulty::Easy,
            category: QuestionCategory::Addition,
            operands: vec![answer, 0],
        }
    }

    fn playing() -> Progression {
        let mut p = Progression::default();
        assert!(p.set_phase(GamePhase::Playing));
        p.set_current_question(Some(question(7)));
        p
    }

    #[test]
    fn test_combo_multiplier_steps() {
        for combo in 0..5 {
            assert_eq!(combo_multiplier(combo), 1);
        }
        for combo in 5..10 {
            assert_eq!(combo_multiplier(combo), 2);
        }
    }

    #[test]
    fn test_combo_24_correct_on_easy() {
        let mut p = playing();
        for _ in 0..24 {
            assert!(p.answer_question(7));
        }
        let before = p.score();
        assert!(p.answer_question(7));
        assert_eq!(p.combo(), 25);
        assert_eq!(p.score() - before, 60);
        assert_eq!(p.max_combo(), 25);
    }

    #[test]
    fn test_wrong_answer_zeroes_combo_and_keeps_question() {
        let mut p = playing();
        p.answer_question(7);
        p.answer_question(7);
        let score = p.score();
        assert!(!p.answer_question(8));
        assert_eq!(p.combo(), 0);
        assert_eq!(p.score(), score);
        assert_eq!(p.wrong_answers(), 1);
        assert!(p.current_question().is_some());
    }

    #[test]
    fn test_answer_without_question_is_noop() {
        let mut p = Progression::default();
        p.set_phase(GamePhase::Playing);
        assert!(!p.answer_question(3));
        assert_eq!(p.questions_answered(), 0);
    }

    #[test]
    fn test_non_numeric_answer_rejected() {
        let mut p = playing();
        p.answer_question(7);
        assert_eq!(p.answer_text("seven"), None);
        assert_eq!(p.combo(), 1);
        assert_eq!(p.answer_text(" 7 "), Some(true));
    }

    #[test]
    fn test_lethal_damage_ends_game() {
        let mut p = playing();
        p.answer_question(7);
        let health = p.health();
        p.take_damage(health);
        assert_eq!(p.health(), 0);
        assert_eq!(p.combo(), 0);
        assert_eq!(p.phase(), GamePhase::GameOver);
        p.take_damage(5);
        assert_eq!(p.health(), 0);
    }

    #[test]
    fn test_lethal_damage_outside_play_keeps_phase() {
        let mut p = Progression::default();
        p.take_damage(100);
        assert_eq!(p.health(), 0);
        assert_eq!(p.phase(), GamePhase::Menu);

        let mut p = Progression::default();
        assert!(p.set_phase(GamePhase::Tutorial));
        p.take_damage(100);
        assert_eq!(p.phase(), GamePhase::Tutorial);
    }

    #[test]
    fn test_add_score_saturates() {
        let mut p = playing();
        p.add_score(u64::MAX - 1);
        p.add_score(5);
        assert_eq!(p.score(), u64::MAX);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut p = playing();
        p.take_damage(3);
        p.heal(100);
        assert_eq!(p.health(), p.max_health());
        assert_eq!(p.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_next_wave_keeps_score_health_combo() {
        let mut p = playing();
        p.answer_question(7);
        p.complete_question();
        p.take_damage(1);
        p.set_current_question(Some(question(2)));
        p.answer_question(2);
        let (score, health, combo) = (p.score(), p.health(), p.combo());
        assert_eq!(p.questions_this_wave(), 1);

        p.next_wave();
        assert_eq!(p.wave(), 2);
        assert_eq!(p.questions_this_wave(), 0);
        assert_eq!((p.score(), p.health(), p.combo()), (score, health, combo));
    }

    #[test]
    fn test_phase_rules() {
        let mut p = Progression::default();
        assert!(!p.set_phase(GamePhase::Paused));
        assert!(!p.set_phase(GamePhase::GameOver));
        assert!(p.set_phase(GamePhase::Tutorial));
        assert!(!p.set_phase(GamePhase::Paused));
        assert!(p.set_phase(GamePhase::Menu));
        assert!(p.set_phase(GamePhase::Playing));
        assert!(p.set_phase(GamePhase::Paused));
        assert!(!p.set_phase(GamePhase::Tutorial));
        assert!(p.set_phase(GamePhase::Playing));
    }

    #[test]
    fn test_pause_resume_keeps_counters() {
        let mut p = playing();
        p.answer_question(7);
        p.set_phase(GamePhase::Paused);
        p.set_phase(GamePhase::Playing);
        assert_eq!(p.combo(), 1);
        assert!(p.current_question().is_some());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut p = playing();
        p.set_difficulty(Difficulty::Hard);
        p.answer_question(7);
        p.next_wave();
        p.take_damage(2);
        p.advance_time(1234.0);
        p.reset_game();

        assert_eq!(p.phase(), GamePhase::Menu);
        assert_eq!(p.score(), 0);
        assert_eq!(p.wave(), 1);
        assert_eq!(p.health(), p.max_health());
        assert_eq!(p.combo(), 0);
        assert_eq!(p.questions_answered(), 0);
        assert_eq!(p.time_elapsed_ms(), 0.0);
        assert!(p.current_question().is_none());
        assert_eq!(p.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn test_time_only_counts_while_playing() {
        let mut p = playing();
        p.advance_time(100.0);
        p.set_phase(GamePhase::Paused);
        p.advance_time(100.0);
        assert_eq!(p.time_elapsed_ms(), 100.0);
    }

    proptest! {
        #[test]
        fn correct_answers_never_lower_score(answers in proptest::collection::vec(any::<bool>(), 1..60)) {
            let mut p = playing();
            for correct in answers {
                let (score, combo) = (p.score(), p.combo());
                let submitted = if correct { 7 } else { 8 };
                prop_assert_eq!(p.answer_question(submitted), correct);
                if correct {
                    prop_assert_eq!(p.combo(), combo + 1);
                    prop_assert!(p.score() > score);
                } else {
                    prop_assert_eq!(p.combo(), 0);
                    prop_assert_eq!(p.score(), score);
                }
            }
        }

        #[test]
        fn damage_always_zeroes_combo(streak in 0u32..30, amount in 0u32..20) {
            let mut p = playing();
            for _ in 0..streak {
                p.answer_question(7);
            }
            p.take_damage(amount);
            prop_assert_eq!(p.combo(), 0);
            prop_assert_eq!(p.phase() == GamePhase::GameOver, p.health() == 0);
        }
    }
}
