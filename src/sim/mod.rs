//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Seeded RNG only
//! - Time comes from the host (`tick(now_ms)`) or an explicit delta
//! - Stable iteration order (monster insertion order)
//! - No rendering or platform dependencies beyond the vertex contract

pub mod engine;
pub mod factory;
pub mod monster;
pub mod progression;
pub mod question;
pub mod session;

pub use engine::{Engine, EngineEvent, EngineObserver, EngineSnapshot, EngineStatus};
pub use factory::{MonsterFactory, eligible_types, scaled_health};
pub use monster::{Monster, MonsterType};
pub use progression::{GamePhase, Progression, combo_multiplier};
pub use question::{Difficulty, Question, QuestionCategory, QuestionGenerator, adjust_difficulty_for_wave};
pub use session::{AnswerOutcome, Feedback, Session};
