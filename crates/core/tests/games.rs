//! End-to-end classification over full games.
//!
//! Uses a deterministic material-counting evaluator in place of a real
//! engine. The Stockfish test at the bottom is ignored by default.
//! Run it with: `cargo test -p blunder-check-core --test games -- --ignored`

use std::time::Duration;

use blunder_check_core::{
    classify_game, engine::Line, parse_pgn_string, read_game, AnalysisConfig, EngineError,
    Evaluator, PgnGame, Score, SideTally, Tally,
};
use shakmaty::{Chess, Color, Position, Role};

const GREEK_GIFT: &str = r#"[Event "Rated Blitz game"]
[Site "https://lichess.org/EEjpsPHx"]
[White "dkol"]
[Black "happydogue"]
[Result "1-0"]

1. e4 c5 2. b4 e6 3. bxc5 Bxc5 4. d4 Bb6 5. Nf3 Nf6 6. e5 Nd5 7. c4 Ne7 8. Bd3 O-O 9. Bxh7+ Kxh7 10. Ng5+ Kg6 11. Qg4 Ba5+ 12. Kf1 Qb6 13. Nxe6+ Kh7 14. Qxg7# 1-0
"#;

const SAVITSKY_BOTVINNIK: &str = r#"[Event "USSR Championship"]
[Site "https://lichess.org/5kFoQLlu"]
[White "Leonid Savitsky"]
[Black "Mikhail Botvinnik"]
[Result "0-1"]

1. d4 Nf6 2. Nf3 b6 3. g3 Bb7 4. c4 e5 5. dxe5 Ng4 6. Bg2 Nxe5 7. Nbd2 Be7 8. O-O Ng6 9. Nb1 O-O 10. Nc3 Na6 11. h4 Bf6 12. h5 Ne7 13. Qc2 Nc5 14. Be3 Re8 15. Rad1 Bxc3 16. Bxc5 Bf6 17. Bd4 Bxd4 18. Rxd4 Nc6 19. Rg4 Qf6 20. Ng5 Qh6 21. Bd5 Re7 22. Qf5 Rf8 23. Be4 Re5 24. Qxh7+ Qxh7 25. Bxh7+ Kh8 26. Bd3 Nb4 27. f4 Re7 28. h6 gxh6 29. Rh4 Kg7 30. Nf3 Nxd3 31. exd3 Re3 32. Nd4 f5 33. g4 fxg4 34. Rxg4+ Kh7 35. Nc2 Re2 36. Re1 Rxc2 0-1
"#;

const SCANDINAVIAN: &str = r#"[Event "Rated Bullet game"]
[Site "https://lichess.org/juoWnjn3"]
[White "dkol"]
[Black "Lepidipidi_la_mmatau"]
[Result "0-1"]

1. e4 d5 2. exd5 Qxd5 3. Nf3 Bg4 4. Be2 Nf6 5. O-O c6 6. h3 h5 7. hxg4 hxg4 8. Nc3 Qd6 9. Ng5 Qh2# 0-1
"#;

/// Scores positions by material, and sees mates in one.
#[derive(Default)]
struct MaterialEvaluator {
    calls: usize,
}

impl MaterialEvaluator {
    fn material(position: &Chess, side: Color) -> i32 {
        let board = position.board();
        [
            (Role::Pawn, 100),
            (Role::Knight, 300),
            (Role::Bishop, 300),
            (Role::Rook, 500),
            (Role::Queen, 900),
        ]
        .iter()
        .map(|&(role, value)| (board.by_color(side) & board.by_role(role)).count() as i32 * value)
        .sum()
    }

    fn has_mate_in_one(position: &Chess) -> bool {
        position.legal_moves().into_iter().any(|m| {
            position
                .clone()
                .play(m)
                .map(|after| after.is_checkmate())
                .unwrap_or(false)
        })
    }
}

impl Evaluator for MaterialEvaluator {
    fn evaluate(&mut self, line: &Line<'_>, _budget: Duration) -> Result<Score, EngineError> {
        self.calls += 1;
        let position = line.position;
        let us = position.turn();
        if Self::has_mate_in_one(position) {
            return Ok(Score::mate(1, us));
        }
        let balance = Self::material(position, us) - Self::material(position, !us);
        Ok(Score::cp(balance, us))
    }
}

fn classify(game: &PgnGame) -> (Tally, usize) {
    let mut evaluator = MaterialEvaluator::default();
    let tally = classify_game(game, &mut evaluator, &AnalysisConfig::default()).unwrap();
    (tally, evaluator.calls)
}

#[test]
fn test_allowing_mate_in_one_is_a_blunder() {
    let game = read_game(SCANDINAVIAN).unwrap();
    assert_eq!(game.move_count(), 18);

    let (tally, calls) = classify(&game);

    // 9. Ng5 lets Qh2# in; the mating move itself is never scored
    assert_eq!(calls, 17);
    assert_eq!(tally.white, SideTally { inaccuracies: 0, mistakes: 0, blunders: 1 });
    assert_eq!(tally.black, SideTally::default());
}

#[test]
fn test_game_ending_in_mate_skips_last_ply() {
    let game = read_game(GREEK_GIFT).unwrap();
    assert!(game.final_position().is_checkmate());

    let (_, calls) = classify(&game);
    assert_eq!(calls, game.move_count() - 1);
}

#[test]
fn test_game_without_mate_scores_every_ply() {
    let game = read_game(SAVITSKY_BOTVINNIK).unwrap();
    assert_eq!(game.move_count(), 72);

    let (_, calls) = classify(&game);
    assert_eq!(calls, 72);
}

#[test]
fn test_repeat_runs_agree() {
    let pgn = format!("{}\n{}\n{}", GREEK_GIFT, SAVITSKY_BOTVINNIK, SCANDINAVIAN);
    let games = parse_pgn_string(&pgn).unwrap();
    assert_eq!(games.len(), 3);

    for game in &games {
        let (first, _) = classify(game);
        let (second, _) = classify(game);
        assert_eq!(first, second, "{}", game.summary());
    }
}

/// Check if Stockfish is available in PATH.
fn stockfish_available() -> bool {
    std::process::Command::new("stockfish")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

#[test]
#[ignore = "requires Stockfish"]
fn test_stockfish_scandinavian() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let config = AnalysisConfig {
        engine_path: "stockfish".into(),
        move_time_secs: 0.1,
        ..AnalysisConfig::default()
    };
    let tally = blunder_check_core::analyze_game(SCANDINAVIAN, &config).unwrap();

    // Ng5?? hangs mate in one
    assert!(tally.white.blunders >= 1);
}
