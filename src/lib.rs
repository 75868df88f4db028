use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use anyhow::{Result, bail, ensure};

pub mod group;
pub mod hand;
pub mod solver;
#[cfg(any(target_arch = "wasm32", test))]
pub mod wasm_api;

pub use group::{GroupKind, QuadKind, TileGroup};
pub use hand::{ClaimKind, ClaimOption, Hand};
pub use solver::Decomposition;

/// Tile family. Declaration order is the canonical sort order of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Wind,
    Dragon,
}

impl Suit {
    pub fn is_numbered(self) -> bool {
        matches!(self, Suit::Man | Suit::Pin | Suit::Sou)
    }

    /// Valid ranks for the suit. Dragons are numbered 5-7, after the winds.
    pub fn ranks(self) -> RangeInclusive<u8> {
        match self {
            Suit::Man | Suit::Pin | Suit::Sou => 1..=9,
            Suit::Wind => 1..=4,
            Suit::Dragon => 5..=7,
        }
    }

    /// Letter used by the text encoding. Winds and dragons share `z`.
    pub fn letter(self) -> char {
        match self {
            Suit::Man => 'm',
            Suit::Pin => 'p',
            Suit::Sou => 's',
            Suit::Wind | Suit::Dragon => 'z',
        }
    }
}

/// A single tile.
///
/// Equality, hashing and ordering cover the red flag as well, so a red five and
/// a plain five are different values. Use [`Tile::same`] when only the face
/// matters. Tiles sort by suit, then rank, with the plain five before the red one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    suit: Suit,
    rank: u8,
    red: bool,
}

impl Tile {
    pub const TON: Tile = Tile::honor(Suit::Wind, 1);
    pub const NAN: Tile = Tile::honor(Suit::Wind, 2);
    pub const SHA: Tile = Tile::honor(Suit::Wind, 3);
    pub const PEI: Tile = Tile::honor(Suit::Wind, 4);
    pub const HAKU: Tile = Tile::honor(Suit::Dragon, 5);
    pub const HATSU: Tile = Tile::honor(Suit::Dragon, 6);
    pub const CHUN: Tile = Tile::honor(Suit::Dragon, 7);

    pub const EAST: Tile = Tile::TON;
    pub const SOUTH: Tile = Tile::NAN;
    pub const WEST: Tile = Tile::SHA;
    pub const NORTH: Tile = Tile::PEI;
    pub const WHITE: Tile = Tile::HAKU;
    pub const GREEN: Tile = Tile::HATSU;
    pub const RED: Tile = Tile::CHUN;

    const fn honor(suit: Suit, rank: u8) -> Self {
        Tile { suit, rank, red: false }
    }

    /// Create a plain tile. Panics if `rank` is outside the suit's range.
    pub fn new(rank: u8, suit: Suit) -> Self {
        assert!(
            suit.ranks().contains(&rank),
            "rank {} out of range for {:?}",
            rank,
            suit
        );
        Tile { suit, rank, red: false }
    }

    /// Create the red five of a numbered suit.
    pub fn red_five(suit: Suit) -> Self {
        assert!(suit.is_numbered(), "only numbered suits have a red five");
        Tile { suit, rank: 5, red: true }
    }

    /// Characters tile; rank 0 is the red five.
    pub fn man(rank: u8) -> Self {
        Self::numbered(rank, Suit::Man)
    }

    /// Circles tile; rank 0 is the red five.
    pub fn pin(rank: u8) -> Self {
        Self::numbered(rank, Suit::Pin)
    }

    /// Bamboo tile; rank 0 is the red five.
    pub fn sou(rank: u8) -> Self {
        Self::numbered(rank, Suit::Sou)
    }

    fn numbered(rank: u8, suit: Suit) -> Self {
        if rank == 0 {
            Self::red_five(suit)
        } else {
            Self::new(rank, suit)
        }
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn is_red(&self) -> bool {
        self.red
    }

    /// Same face: rank and suit match, the red flag is ignored.
    pub fn same(&self, other: &Tile) -> bool {
        self.rank == other.rank && self.suit == other.suit
    }

    /// The tile indicated as bonus when `self` is the indicator.
    ///
    /// Each suit cycles through its own rank range, so 9m -> 1m, 4z -> 1z and
    /// 7z -> 5z. The result is never red.
    pub fn dora(&self) -> Tile {
        let ranks = self.suit.ranks();
        let rank = if self.rank >= *ranks.end() {
            *ranks.start()
        } else {
            self.rank + 1
        };
        Tile { suit: self.suit, rank, red: false }
    }

    pub fn is_numbered(&self) -> bool {
        self.suit.is_numbered()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_numbered() && (self.rank == 1 || self.rank == 9)
    }

    pub fn is_wind(&self) -> bool {
        self.suit == Suit::Wind
    }

    pub fn is_dragon(&self) -> bool {
        self.suit == Suit::Dragon
    }

    pub fn is_honor(&self) -> bool {
        !self.is_numbered()
    }

    /// Parse the two character encoding, e.g. "3m", "0p" (red five), "1z", "7z".
    ///
    /// `z` is shared by winds and dragons: ranks up to 4 are winds, above are
    /// dragons and keep their rank as written.
    pub fn from_text(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        ensure!(bytes.len() == 2, "tile {s:?} must be exactly two characters");
        ensure!(bytes[0].is_ascii_digit(), "tile {s:?} has a non-numeric rank");
        let rank = bytes[0] - b'0';

        let suit = match bytes[1] {
            b'm' => Suit::Man,
            b'p' => Suit::Pin,
            b's' => Suit::Sou,
            b'z' if rank <= 4 => Suit::Wind,
            b'z' => Suit::Dragon,
            other => bail!("tile {s:?} has unknown suit letter {:?}", other as char),
        };

        if rank == 0 {
            ensure!(suit.is_numbered(), "tile {s:?}: only numbered suits have a red five");
            return Ok(Self::red_five(suit));
        }
        ensure!(
            suit.ranks().contains(&rank),
            "tile {s:?}: rank {rank} out of range for {suit:?}"
        );
        Ok(Tile { suit, rank, red: false })
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digit = if self.red { 0 } else { self.rank };
        write!(f, "{}{}", digit, self.suit.letter())
    }
}

impl FromStr for Tile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Tile::from_text(s)
    }
}

/// Read compact tile notation such as "123m055p77z".
///
/// Digits accumulate until a suit letter, which applies to all of them.
/// Whitespace is ignored.
pub fn parse_tiles(s: &str) -> Result<Vec<Tile>> {
    ensure!(s.is_ascii(), "tiles {s:?} contain non-ascii content");

    let mut tiles = vec![];
    let mut pending = String::with_capacity(2);
    for c in s.chars() {
        match c {
            '0'..='9' => pending.push(c),
            'm' | 'p' | 's' | 'z' => {
                ensure!(!pending.is_empty(), "suit letter {c:?} without ranks in {s:?}");
                for digit in pending.drain(..) {
                    tiles.push(Tile::from_text(&format!("{digit}{c}"))?);
                }
            }
            _ if c.is_ascii_whitespace() => (),
            _ => bail!("unexpected character {c:?} in {s:?}"),
        }
    }
    ensure!(pending.is_empty(), "ranks {pending:?} in {s:?} have no suit letter");

    Ok(tiles)
}

/// Relative seat a claimed tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSource {
    /// Not taken from a discard.
    None,
    Left,
    Across,
    Right,
}

/// A tile in a group together with where it was claimed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalledTile {
    pub tile: Tile,
    pub source: CallSource,
}

impl CalledTile {
    pub fn new(tile: Tile, source: CallSource) -> Self {
        CalledTile { tile, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tile_equality_and_hash() {
        let t1 = Tile::man(1);
        let t2 = Tile::new(1, Suit::Man);
        let t3 = Tile::man(2);
        let t4 = Tile::pin(1);

        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
        assert_ne!(t1, t4);

        let set: HashSet<Tile> = [t1, t2, t3, t4].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_red_five_is_distinct_but_same() {
        let red = Tile::man(0);
        let plain = Tile::man(5);

        assert!(red.is_red());
        assert_eq!(red.rank(), 5);
        assert_eq!(red.suit(), Suit::Man);
        assert_ne!(red, plain);
        assert!(red.same(&plain));
        assert!(!red.same(&Tile::pin(5)));
        assert!(plain < red);
        assert!(red < Tile::man(6));
    }

    #[test]
    fn test_ordering_by_suit_then_rank() {
        let mut tiles = vec![Tile::CHUN, Tile::sou(1), Tile::TON, Tile::man(9), Tile::pin(3), Tile::man(2)];
        tiles.sort();
        assert_eq!(
            tiles,
            vec![Tile::man(2), Tile::man(9), Tile::pin(3), Tile::sou(1), Tile::TON, Tile::CHUN]
        );
    }

    #[test]
    fn test_honor_aliases() {
        assert_eq!(Tile::EAST, Tile::TON);
        assert_eq!(Tile::NORTH, Tile::PEI);
        assert_eq!(Tile::WHITE, Tile::HAKU);
        assert_eq!(Tile::RED, Tile::CHUN);
        assert_eq!(Tile::TON.to_string(), "1z");
        assert_eq!(Tile::PEI.to_string(), "4z");
        assert_eq!(Tile::HAKU.to_string(), "5z");
        assert_eq!(Tile::CHUN.to_string(), "7z");
        assert!(Tile::SHA.is_wind());
        assert!(Tile::HATSU.is_dragon());
        assert!(Tile::HATSU.is_honor());
    }

    #[test]
    fn test_dora_indicator() {
        let cases = [
            (Tile::pin(3), Tile::pin(4)),
            (Tile::man(8), Tile::man(9)),
            (Tile::sou(9), Tile::sou(1)),
            (Tile::man(0), Tile::man(6)),
            (Tile::pin(4), Tile::pin(5)),
            (Tile::TON, Tile::NAN),
            (Tile::SHA, Tile::PEI),
            (Tile::PEI, Tile::TON),
            (Tile::HAKU, Tile::HATSU),
            (Tile::HATSU, Tile::CHUN),
            (Tile::CHUN, Tile::HAKU),
        ];
        for (indicator, expected) in cases {
            assert_eq!(indicator.dora(), expected, "indicator {}", indicator);
        }
    }

    #[test]
    fn test_dora_cycle_lengths() {
        for suit in [Suit::Man, Suit::Pin, Suit::Sou, Suit::Wind, Suit::Dragon] {
            let period = suit.ranks().count();
            for rank in suit.ranks() {
                let start = Tile::new(rank, suit);
                let mut tile = start;
                for step in 1..=period {
                    tile = tile.dora();
                    assert_eq!(tile.suit(), suit);
                    if step < period {
                        assert_ne!(tile, start, "{start} returned after {step} steps");
                    }
                }
                assert_eq!(tile, start, "{start} did not return after {period} steps");
            }
        }
    }

    #[test]
    fn test_is_terminal() {
        assert!(Tile::man(1).is_terminal());
        assert!(Tile::pin(9).is_terminal());
        assert!(Tile::sou(1).is_terminal());
        assert!(!Tile::man(2).is_terminal());
        assert!(!Tile::man(0).is_terminal());
        assert!(!Tile::TON.is_terminal());
        assert!(!Tile::HAKU.is_terminal());
    }

    #[test]
    fn test_from_text() {
        assert_eq!(Tile::from_text("3m").unwrap(), Tile::man(3));
        assert_eq!(Tile::from_text("9p").unwrap(), Tile::pin(9));
        assert_eq!(Tile::from_text("0s").unwrap(), Tile::sou(0));
        assert_eq!(Tile::from_text("1z").unwrap(), Tile::TON);
        assert_eq!(Tile::from_text("4z").unwrap(), Tile::PEI);
        assert_eq!(Tile::from_text("5z").unwrap(), Tile::HAKU);
        assert_eq!(Tile::from_text("7z").unwrap(), Tile::CHUN);
        assert_eq!("6m".parse::<Tile>().unwrap(), Tile::man(6));

        assert!(Tile::from_text("").is_err());
        assert!(Tile::from_text("3").is_err());
        assert!(Tile::from_text("13m").is_err());
        assert!(Tile::from_text("xm").is_err());
        assert!(Tile::from_text("3x").is_err());
        assert!(Tile::from_text("8z").is_err());
        assert!(Tile::from_text("0z").is_err());
    }

    #[test]
    fn test_display_round_trips_red_five() {
        for text in ["0m", "5m", "0p", "9s", "2z", "6z"] {
            assert_eq!(Tile::from_text(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_parse_tiles() {
        let tiles = parse_tiles("123m 05p 77z").unwrap();
        assert_eq!(
            tiles,
            vec![
                Tile::man(1),
                Tile::man(2),
                Tile::man(3),
                Tile::pin(0),
                Tile::pin(5),
                Tile::CHUN,
                Tile::CHUN,
            ]
        );

        assert!(parse_tiles("12").is_err());
        assert!(parse_tiles("m").is_err());
        assert!(parse_tiles("12q").is_err());
        assert!(parse_tiles("89z").is_err());
    }
}
