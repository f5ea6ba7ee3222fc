//! PGN file parsing functionality

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Move, Position};
use std::fs;
use std::io::{self, Cursor};
use std::ops::ControlFlow;
use std::path::Path;
use thiserror::Error;

/// Represents a parsed chess game
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub event: Option<String>,
    pub site: Option<String>,
    pub date: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,
    pub white_elo: Option<u16>,
    pub black_elo: Option<u16>,
    /// Main line in SAN, as written in the record
    pub moves: Vec<String>,
    pub start_position: Chess,
    played: Vec<Move>,
}

impl PgnGame {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn summary(&self) -> String {
        let white = self.white.as_deref().unwrap_or("Unknown");
        let black = self.black.as_deref().unwrap_or("Unknown");
        let result = self.result.as_deref().unwrap_or("*");
        format!("{} vs {} - {}", white, black, result)
    }

    /// Positions after each main-line move, in play order.
    ///
    /// Every call starts again from the initial position.
    pub fn positions(&self) -> Positions<'_> {
        Positions {
            position: self.start_position.clone(),
            moves: self.played.iter(),
        }
    }

    /// Main-line moves, validated against the position they were played in
    pub fn played(&self) -> &[Move] {
        &self.played
    }

    pub fn final_position(&self) -> Chess {
        self.positions().last().unwrap_or_else(|| self.start_position.clone())
    }
}

/// Lazy walk over a game's main line
pub struct Positions<'a> {
    position: Chess,
    moves: std::slice::Iter<'a, Move>,
}

impl Iterator for Positions<'_> {
    type Item = Chess;

    fn next(&mut self) -> Option<Chess> {
        let mv = self.moves.next()?;
        // Moves were checked for legality while parsing
        self.position = self.position.clone().play(mv.clone()).ok()?;
        Some(self.position.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.moves.size_hint()
    }
}

#[derive(Debug, Error)]
pub enum PgnError {
    #[error("File error: {0}")]
    FileError(#[from] io::Error),
    #[error("No valid games found in PGN")]
    NoGamesFound,
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Default)]
struct GameTags {
    event: Option<String>,
    site: Option<String>,
    date: Option<String>,
    white: Option<String>,
    black: Option<String>,
    result: Option<String>,
    white_elo: Option<u16>,
    black_elo: Option<u16>,
    fen: Option<String>,
}

struct GameMoves {
    tags: GameTags,
    moves: Vec<String>,
    played: Vec<Move>,
    start_position: Chess,
    current_position: Chess,
    error: Option<String>,
}

struct GameParser;

impl Visitor for GameParser {
    type Tags = GameTags;
    type Movetext = GameMoves;
    type Output = Result<PgnGame, PgnError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let name_str = String::from_utf8_lossy(name);
        let value_str = value.decode_utf8_lossy().to_string();

        match name_str.as_ref() {
            "Event" => tags.event = Some(value_str),
            "Site" => tags.site = Some(value_str),
            "Date" => tags.date = Some(value_str),
            "White" => tags.white = Some(value_str),
            "Black" => tags.black = Some(value_str),
            "Result" => tags.result = Some(value_str),
            "WhiteElo" => tags.white_elo = value_str.parse().ok(),
            "BlackElo" => tags.black_elo = value_str.parse().ok(),
            "FEN" => tags.fen = Some(value_str),
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let (start_position, error) = match tags.fen.as_deref().map(setup_position) {
            None => (Chess::default(), None),
            Some(Ok(pos)) => (pos, None),
            Some(Err(e)) => (Chess::default(), Some(e)),
        };

        ControlFlow::Continue(GameMoves {
            tags,
            moves: Vec::new(),
            played: Vec::new(),
            current_position: start_position.clone(),
            start_position,
            error,
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        if movetext.error.is_some() {
            return ControlFlow::Continue(());
        }

        let ply = movetext.moves.len() + 1;
        let san_str = san.san.to_string();

        let result = san
            .san
            .to_move(&movetext.current_position)
            .map_err(|e| e.to_string())
            .and_then(|m| {
                movetext
                    .current_position
                    .clone()
                    .play(m.clone())
                    .map(|pos| (m, pos))
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok((m, new_pos)) => {
                movetext.current_position = new_pos;
                movetext.played.push(m);
                movetext.moves.push(san_str);
            }
            Err(e) => {
                movetext.error = Some(format!("illegal move '{}' at ply {}: {}", san_str, ply, e));
            }
        }

        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        if let Some(e) = movetext.error {
            return Err(PgnError::ParseError(e));
        }

        Ok(PgnGame {
            event: movetext.tags.event,
            site: movetext.tags.site,
            date: movetext.tags.date,
            white: movetext.tags.white,
            black: movetext.tags.black,
            result: movetext.tags.result,
            white_elo: movetext.tags.white_elo,
            black_elo: movetext.tags.black_elo,
            moves: movetext.moves,
            start_position: movetext.start_position,
            played: movetext.played,
        })
    }
}

fn setup_position(fen: &str) -> Result<Chess, String> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| format!("invalid FEN tag '{}': {}", fen, e))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| format!("illegal FEN position '{}': {}", fen, e))
}

pub fn parse_pgn_file<P: AsRef<Path>>(path: P) -> Result<Vec<PgnGame>, PgnError> {
    let contents = fs::read_to_string(path)?;
    parse_pgn_string(&contents)
}

/// Parses every game in `pgn`. Fails on the first malformed game.
pub fn parse_pgn_string(pgn: &str) -> Result<Vec<PgnGame>, PgnError> {
    let mut parser = GameParser;
    let mut games: Vec<PgnGame> = Vec::new();

    let cursor = Cursor::new(pgn.as_bytes());
    let mut reader = pgn_reader::Reader::new(cursor);

    loop {
        match reader.read_game(&mut parser) {
            Ok(Some(game)) => games.push(game?),
            Ok(None) => break,
            Err(e) => return Err(PgnError::ParseError(e.to_string())),
        }
    }

    if games.is_empty() {
        Err(PgnError::NoGamesFound)
    } else {
        Ok(games)
    }
}

/// Parses the first game in `pgn`.
pub fn read_game(pgn: &str) -> Result<PgnGame, PgnError> {
    let mut parser = GameParser;
    let mut reader = pgn_reader::Reader::new(Cursor::new(pgn.as_bytes()));

    match reader.read_game(&mut parser) {
        Ok(Some(game)) => game,
        Ok(None) => Err(PgnError::NoGamesFound),
        Err(e) => Err(PgnError::ParseError(e.to_string())),
    }
}
