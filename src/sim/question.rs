//! Arithmetic question generation
//!
//! Questions are produced from a (difficulty, wave) pair. The wave overrides
//! the requested difficulty through a fixed step function, then an operation
//! is picked uniformly from the resolved tier's menu:
//!
//! | tier   | operations                                      |
//! |--------|-------------------------------------------------|
//! | easy   | addition, subtraction                           |
//! | medium | addition, subtraction, multiplication, division |
//! | hard   | the medium set plus mixed (`a ± b × c`)         |

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Question difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Points for a correct answer before the combo multiplier
    pub fn base_points(&self) -> u64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 20,
            Difficulty::Hard => 30,
        }
    }

    /// Monster health scaling in percent (easy ×0.8, medium ×1.0, hard ×1.2)
    pub fn health_percent(&self) -> u32 {
        match self {
            Difficulty::Easy => 80,
            Difficulty::Medium => 100,
            Difficulty::Hard => 120,
        }
    }

    /// Operations a question at this tier may use
    pub fn categories(&self) -> &'static [QuestionCategory] {
        use QuestionCategory::*;
        match self {
            Difficulty::Easy => &[Addition, Subtraction],
            Difficulty::Medium => &[Addition, Subtraction, Multiplication, Division],
            Difficulty::Hard => &[Addition, Subtraction, Multiplication, Division, Mixed],
        }
    }

    fn ranges(&self) -> &'static OperandRanges {
        match self {
            Difficulty::Easy => &EASY_RANGES,
            Difficulty::Medium => &MEDIUM_RANGES,
            Difficulty::Hard => &HARD_RANGES,
        }
    }
}

/// Resolve the difficulty actually used for a wave.
///
/// Waves 1-3 are always easy, 4-6 cap at medium, 7-10 bump everything up a
/// tier (easy becomes medium, the rest hard) and 11+ are always hard.
pub fn adjust_difficulty_for_wave(requested: Difficulty, wave: u32) -> Difficulty {
    if wave <= 3 {
        Difficulty::Easy
    } else if wave <= 6 {
        requested.min(Difficulty::Medium)
    } else if wave <= 10 {
        match requested {
            Difficulty::Easy => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    } else {
        Difficulty::Hard
    }
}

/// Kind of arithmetic a question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    /// `a + b × c` or `a - b × c`, multiplication binding first
    Mixed,
}

/// A generated question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub answer: i64,
    pub difficulty: Difficulty,
    pub category: QuestionCategory,
    /// Operands in the order they appear in `text`
    pub operands: Vec<i64>,
}

impl Question {
    /// Compare a submitted answer against the expected one
    pub fn is_correct(&self, submitted: i64) -> bool {
        submitted == self.answer
    }
}

/// Inclusive operand bounds for one difficulty tier.
///
/// Each tier's ranges contain the ranges of the tier below it.
#[derive(Debug)]
struct OperandRanges {
    add: (i64, i64),
    factor: (i64, i64),
    divisor: (i64, i64),
    quotient: (i64, i64),
}

const EASY_RANGES: OperandRanges = OperandRanges {
    add: (1, 10),
    factor: (1, 5),
    divisor: (1, 5),
    quotient: (1, 5),
};

const MEDIUM_RANGES: OperandRanges = OperandRanges {
    add: (1, 50),
    factor: (1, 10),
    divisor: (1, 10),
    quotient: (1, 10),
};

const HARD_RANGES: OperandRanges = OperandRanges {
    add: (1, 100),
    factor: (1, 12),
    divisor: (1, 12),
    quotient: (1, 15),
};

/// Stateless question generator apart from its RNG and id counter
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    rng: Pcg32,
    next_id: u32,
}

impl QuestionGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Generate a question for the given requested difficulty and wave
    pub fn generate(&mut self, difficulty: Difficulty, wave: u32) -> Question {
        let difficulty = adjust_difficulty_for_wave(difficulty, wave);
        let menu = difficulty.categories();
        let category = menu[self.rng.random_range(0..menu.len())];
        self.generate_category(difficulty, category)
    }

    /// Generate a question of a specific category at a resolved difficulty
    pub fn generate_category(&mut self, difficulty: Difficulty, category: QuestionCategory) -> Question {
        let ranges = difficulty.ranges();
        let (operands, answer, text, category) = match category {
            QuestionCategory::Addition => self.addition(ranges),
            QuestionCategory::Subtraction => self.subtraction(ranges),
            QuestionCategory::Multiplication => self.multiplication(ranges),
            QuestionCategory::Division => self.division(ranges),
            QuestionCategory::Mixed => self.mixed(ranges),
        };

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        Question {
            id,
            text,
            answer,
            difficulty,
            category,
            operands,
        }
    }

    fn pick(&mut self, (lo, hi): (i64, i64)) -> i64 {
        self.rng.random_range(lo..=hi)
    }

    fn addition(&mut self, r: &OperandRanges) -> (Vec<i64>, i64, String, QuestionCategory) {
        let a = self.pick(r.add);
        let b = self.pick(r.add);
        (vec![a, b], a + b, format!("{a} + {b} = ?"), QuestionCategory::Addition)
    }

    fn subtraction(&mut self, r: &OperandRanges) -> (Vec<i64>, i64, String, QuestionCategory) {
        let mut a = self.pick(r.add);
        let mut b = self.pick(r.add);
        if b > a {
            std::mem::swap(&mut a, &mut b);
        }
        (vec![a, b], a - b, format!("{a} - {b} = ?"), QuestionCategory::Subtraction)
    }

    fn multiplication(&mut self, r: &OperandRanges) -> (Vec<i64>, i64, String, QuestionCategory) {
        let a = self.pick(r.factor);
        let b = self.pick(r.factor);
        (vec![a, b], a * b, format!("{a} × {b} = ?"), QuestionCategory::Multiplication)
    }

    fn division(&mut self, r: &OperandRanges) -> (Vec<i64>, i64, String, QuestionCategory) {
        let divisor = self.pick(r.divisor);
        let quotient = self.pick(r.quotient);
        let dividend = divisor * quotient;
        (
            vec![dividend, divisor],
            quotient,
            format!("{dividend} ÷ {divisor} = ?"),
            QuestionCategory::Division,
        )
    }

    fn mixed(&mut self, r: &OperandRanges) -> (Vec<i64>, i64, String, QuestionCategory) {
        let a = self.pick(r.add);
        let b = self.pick(r.factor);
        let c = self.pick(r.factor);
        let product = b * c;

        if self.rng.random_bool(0.5) {
            (vec![a, b, c], a + product, format!("{a} + {b} × {c} = ?"), QuestionCategory::Mixed)
        } else if a - product >= 0 {
            (vec![a, b, c], a - product, format!("{a} - {b} × {c} = ?"), QuestionCategory::Mixed)
        } else {
            self.addition(r)
        }
    }
}
