//! Session orchestration
//!
//! Wires the engine, progression and question generator together:
//! - one pending question at a time, each carried by one monster
//! - answers route to destroy calls on the tagged monster
//! - contact damage and timeouts feed back into progression
//! - wave completion is checked after every answer, removal and contact
//!
//! Deferred effects (feedback clear, wave advance) are expiry times on the
//! engine clock, checked on tick. Each records the state it was scheduled
//! against and is dropped if that state no longer holds when it comes due.

use serde::Serialize;

use super::engine::{Engine, EngineEvent, EngineSnapshot};
use super::progression::{GamePhase, Progression};
use super::question::{Difficulty, QuestionGenerator};
use crate::settings::Settings;

/// Result of submitting an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnswerOutcome {
    /// Nothing to answer, not accepting answers, or input was not a number
    Ignored,
    /// Matched the pending question
    Correct { points: u64 },
    /// Did not match; the question stays pending
    Wrong,
}

/// Answer feedback currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Feedback {
    pub correct: bool,
    pub question_id: u32,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy)]
struct WaveAdvance {
    due_at: f64,
    wave: u32,
}

/// One game session
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    engine: Engine,
    progression: Progression,
    questions: QuestionGenerator,
    /// Monster carrying the pending question
    question_monster: Option<u32>,
    feedback: Option<Feedback>,
    wave_advance: Option<WaveAdvance>,
    next_spawn_at: f64,
}

impl Session {
    /// New session sitting at the menu. Invalid settings are replaced by the
    /// defaults.
    pub fn new(settings: Settings) -> Self {
        let settings = settings.or_default();
        let engine = Engine::new(&settings);
        let progression = Progression::new(settings.difficulty, settings.start_health);
        let questions = QuestionGenerator::new(settings.seed);
        Self {
            settings,
            engine,
            progression,
            questions,
            question_monster: None,
            feedback: None,
            wave_advance: None,
            next_spawn_at: 0.0,
        }
    }

    fn now(&self) -> f64 {
        self.engine.clock_ms()
    }

    fn clear_schedule(&mut self) {
        self.question_monster = None;
        self.feedback = None;
        self.wave_advance = None;
        self.next_spawn_at = self.now();
    }

    // --- Phase control ---

    /// Start a fresh game from the menu, game over or tutorial
    pub fn start_game(&mut self) -> bool {
        let phase = self.progression.phase();
        if matches!(phase, GamePhase::Playing | GamePhase::Paused) || !self.progression.set_phase(GamePhase::Playing) {
            return false;
        }
        self.engine.stop();
        self.engine.drain_events();
        self.clear_schedule();
        self.engine.start();
        true
    }

    /// Enter the tutorial from the menu
    pub fn start_tutorial(&mut self) -> bool {
        if self.progression.phase() == GamePhase::Tutorial || !self.progression.set_phase(GamePhase::Tutorial) {
            return false;
        }
        self.engine.stop();
        self.engine.drain_events();
        self.clear_schedule();
        self.engine.start();
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.progression.phase() != GamePhase::Playing {
            return false;
        }
        self.progression.set_phase(GamePhase::Paused);
        self.engine.pause();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.progression.phase() != GamePhase::Paused {
            return false;
        }
        self.progression.set_phase(GamePhase::Playing);
        self.engine.start();
        true
    }

    /// Abandon the current game (or tutorial) and reset everything
    pub fn return_to_menu(&mut self) {
        self.progression.set_phase(GamePhase::Menu);
        self.engine.stop();
        self.engine.drain_events();
        self.clear_schedule();
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
        self.progression.set_difficulty(difficulty);
    }

    // --- Tick ---

    fn is_active(&self) -> bool {
        matches!(self.progression.phase(), GamePhase::Playing | GamePhase::Tutorial)
    }

    /// Host frame callback (timestamp in ms)
    pub fn tick(&mut self, now_ms: f64) {
        if !self.is_active() {
            return;
        }
        let before = self.engine.clock_ms();
        self.engine.tick(now_ms);
        self.progression.advance_time(self.engine.clock_ms() - before);

        self.handle_engine_events();
        if !self.is_active() {
            return;
        }
        self.run_timers();
        self.maybe_spawn();
    }

    fn handle_engine_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::MonsterReachedPlayer { id, damage } => self.on_monster_reached(id, damage),
                EngineEvent::MonsterDestroyed { id } => log::debug!("Monster {id} removed"),
                EngineEvent::StateUpdated => {}
            }
            if self.progression.phase() == GamePhase::GameOver {
                return;
            }
            self.check_wave_complete();
        }
    }

    fn on_monster_reached(&mut self, id: u32, damage: u32) {
        if self.question_monster == Some(id) {
            // Timed out: the question goes with its monster
            self.question_monster = None;
            self.feedback = None;
            self.progression.complete_question();
            self.next_spawn_at = self.now() + self.settings.spawn_delay_ms as f64;
        }

        if self.progression.phase() != GamePhase::Playing {
            return;
        }
        self.progression.take_damage(damage);
        if self.progression.phase() == GamePhase::GameOver {
            self.engine.stop();
            self.engine.drain_events();
            self.clear_schedule();
        }
    }

    fn run_timers(&mut self) {
        let now = self.now();

        if let Some(feedback) = self.feedback.filter(|f| f.expires_at <= now) {
            self.feedback = None;
            let still_pending = self
                .progression
                .current_question()
                .is_some_and(|q| q.id == feedback.question_id);
            if feedback.correct && still_pending {
                self.progression.complete_question();
                self.next_spawn_at = now + self.settings.spawn_delay_ms as f64;
                self.check_wave_complete();
            }
        }

        if let Some(advance) = self.wave_advance.filter(|a| a.due_at <= now) {
            self.wave_advance = None;
            let current = self.progression.phase() == GamePhase::Playing && self.progression.wave() == advance.wave;
            if current {
                self.next_wave();
            } else {
                log::debug!("Dropping stale wave advance for wave {}", advance.wave);
            }
        }
    }

    /// Start the next wave: bump the counter, clear the field and drop
    /// whatever question was pending. Only while playing.
    pub fn next_wave(&mut self) -> bool {
        if self.progression.phase() != GamePhase::Playing {
            return false;
        }
        self.progression.next_wave();
        self.progression.set_current_question(None);
        self.engine.clear_monsters();
        self.engine.drain_events();
        self.question_monster = None;
        self.feedback = None;
        self.wave_advance = None;
        self.next_spawn_at = self.now() + self.settings.spawn_delay_ms as f64;
        true
    }

    fn check_wave_complete(&mut self) {
        if self.progression.phase() != GamePhase::Playing || self.wave_advance.is_some() {
            return;
        }
        let quota_met = self.progression.questions_this_wave() >= self.settings.questions_per_wave;
        let field_clear = self.engine.active_count() == 0;
        let nothing_pending = self.progression.current_question().is_none();
        if quota_met && field_clear && nothing_pending {
            let wave = self.progression.wave();
            log::info!("Wave {wave} complete");
            self.wave_advance = Some(WaveAdvance {
                due_at: self.now() + self.settings.wave_advance_ms as f64,
                wave,
            });
        }
    }

    fn maybe_spawn(&mut self) {
        if self.progression.current_question().is_some() || self.wave_advance.is_some() {
            return;
        }
        let tutorial = self.progression.phase() == GamePhase::Tutorial;
        if !tutorial && self.progression.questions_this_wave() >= self.settings.questions_per_wave {
            return;
        }
        if self.now() < self.next_spawn_at {
            return;
        }

        let wave = self.progression.wave();
        let difficulty = self.progression.difficulty();
        let question = self.questions.generate(difficulty, wave);
        let id = self
            .engine
            .spawn_monster(wave, difficulty, Some(question.text.clone()), Some(question.answer));
        log::debug!("Question {} '{}' on monster {id}", question.id, question.text);
        self.progression.set_current_question(Some(question));
        self.question_monster = Some(id);
    }

    // --- Answers ---

    /// Submit raw player input for the pending question
    pub fn submit_answer(&mut self, raw: &str) -> AnswerOutcome {
        if !self.is_active() {
            return AnswerOutcome::Ignored;
        }
        // Already solved, waiting for feedback to clear
        if self.feedback.is_some_and(|f| f.correct) {
            return AnswerOutcome::Ignored;
        }
        let Some(question_id) = self.progression.current_question().map(|q| q.id) else {
            return AnswerOutcome::Ignored;
        };

        let score_before = self.progression.score();
        let Some(correct) = self.progression.answer_text(raw) else {
            log::debug!("Ignoring non-numeric answer {raw:?}");
            return AnswerOutcome::Ignored;
        };

        self.feedback = Some(Feedback {
            correct,
            question_id,
            expires_at: self.now() + self.settings.feedback_clear_ms as f64,
        });

        if !correct {
            return AnswerOutcome::Wrong;
        }

        if let Some(id) = self.question_monster.take() {
            self.engine.destroy_monster(id, true);
        }
        self.check_wave_complete();
        AnswerOutcome::Correct {
            points: self.progression.score() - score_before,
        }
    }

    // --- Accessors ---

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.engine.snapshot()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    /// Monster carrying the pending question, if any
    pub fn question_monster(&self) -> Option<u32> {
        self.question_monster
    }

    /// True while a completed wave waits to advance
    pub fn wave_advance_pending(&self) -> bool {
        self.wave_advance.is_some()
    }
}
