//! Math Monsters headless demo
//!
//! Runs a seeded session at 60 Hz with a simulated player and prints a JSON
//! summary of how far it got.
//!
//! Usage: `math-monsters [seed] [seconds] [settings.json]`

fn main() {
    use math_monsters::consts::FRAME_DT_MS;
    use math_monsters::sim::{AnswerOutcome, GamePhase};
    use math_monsters::{Session, Settings};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Time the simulated player takes to read and answer a question (ms)
    const REACTION_MS: f64 = 1800.0;
    /// Chance the simulated player gets an answer right
    const ACCURACY: f64 = 0.85;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut settings = match args.get(2) {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Some(seed) = args.first().and_then(|s| s.parse::<u64>().ok()) {
        settings.seed = seed;
    }
    let seconds = args.get(1).and_then(|s| s.parse::<f64>().ok()).unwrap_or(120.0);
    let seed = settings.seed;

    log::info!("Math Monsters (headless) seed={seed} for {seconds}s");

    let mut player = Pcg32::seed_from_u64(seed.rotate_left(17));
    let mut session = Session::new(settings);
    session.start_game();

    let mut seen_monster = None;
    let mut seen_at = 0.0;
    let mut outcomes = (0u32, 0u32);
    let end_ms = seconds * 1000.0;
    let mut now = 0.0;

    while now <= end_ms {
        session.tick(now);
        if session.progression().phase() == GamePhase::GameOver {
            log::info!("Game over at {:.1}s", now / 1000.0);
            break;
        }

        if session.question_monster() != seen_monster {
            seen_monster = session.question_monster();
            seen_at = now;
        }
        let answer = session.progression().current_question().map(|q| q.answer);
        if let (Some(answer), Some(_)) = (answer, seen_monster) {
            if now - seen_at >= REACTION_MS {
                let guess = if player.random_bool(ACCURACY) {
                    answer
                } else {
                    answer + player.random_range(1..=3)
                };
                match session.submit_answer(&guess.to_string()) {
                    AnswerOutcome::Correct { .. } => outcomes.0 += 1,
                    AnswerOutcome::Wrong => outcomes.1 += 1,
                    AnswerOutcome::Ignored => {}
                }
                // Think again before the next attempt
                seen_at = now;
            }
        }

        now += FRAME_DT_MS as f64;
    }

    let progression = session.progression();
    let summary = serde_json::json!({
        "seed": seed,
        "simulated_seconds": (now / 1000.0).min(seconds),
        "phase": progression.phase(),
        "wave": progression.wave(),
        "score": progression.score(),
        "health": progression.health(),
        "max_combo": progression.max_combo(),
        "correct": outcomes.0,
        "wrong": outcomes.1,
        "accuracy": progression.accuracy(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(e) => log::error!("Failed to serialize summary: {e}"),
    }
}
