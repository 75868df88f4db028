use crate::{CalledTile, Tile};

/// How a quad was formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadKind {
    /// Declared from four concealed tiles.
    Closed,
    /// Three concealed tiles plus a claimed discard.
    Open,
    /// An open triplet upgraded with a fourth tile.
    AddedOpen,
}

/// Type of a tile group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// The pair: two of the same tile
    Head,
    /// Three consecutive ranks of one numbered suit
    Sequence,
    /// Three of the same tile
    Triplet,
    /// Four of the same tile
    Quad(QuadKind),
}

/// A group of tiles, either formed by a claim or found by the decomposition search.
///
/// Construction does not check the shape; call [`TileGroup::is_valid`] before
/// relying on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileGroup {
    pub kind: GroupKind,
    /// Always sorted.
    pub tiles: Vec<Tile>,
    pub called: Option<CalledTile>,
}

impl TileGroup {
    /// Create a new group. The tiles are stored sorted.
    pub fn new(kind: GroupKind, tiles: impl IntoIterator<Item = Tile>, called: Option<CalledTile>) -> Self {
        let mut tiles: Vec<Tile> = tiles.into_iter().collect();
        tiles.sort();
        TileGroup { kind, tiles, called }
    }

    pub fn head(tiles: impl IntoIterator<Item = Tile>) -> Self {
        Self::new(GroupKind::Head, tiles, None)
    }

    pub fn sequence(tiles: impl IntoIterator<Item = Tile>, called: Option<CalledTile>) -> Self {
        Self::new(GroupKind::Sequence, tiles, called)
    }

    pub fn triplet(tiles: impl IntoIterator<Item = Tile>, called: Option<CalledTile>) -> Self {
        Self::new(GroupKind::Triplet, tiles, called)
    }

    pub fn quad(kind: QuadKind, tiles: impl IntoIterator<Item = Tile>, called: Option<CalledTile>) -> Self {
        Self::new(GroupKind::Quad(kind), tiles, called)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether the tiles and call annotation form a legal group of this kind.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            GroupKind::Head => self.called.is_none() && self.tiles.len() == 2 && self.all_same(),
            GroupKind::Sequence => self.tiles.len() == 3 && self.called_is_member() && self.is_run(),
            GroupKind::Triplet => self.tiles.len() == 3 && self.called_is_member() && self.all_same(),
            GroupKind::Quad(QuadKind::Closed) => {
                self.tiles.len() == 4 && self.called.is_none() && self.all_same()
            }
            GroupKind::Quad(_) => {
                self.tiles.len() == 4 && self.called.is_some() && self.called_is_member() && self.all_same()
            }
        }
    }

    /// The called tile, if any, is one of the group's tiles.
    fn called_is_member(&self) -> bool {
        self.called.is_none_or(|called| self.tiles.contains(&called.tile))
    }

    /// Every tile has the same face as the first. Red fives mix with plain fives.
    fn all_same(&self) -> bool {
        match self.tiles.split_first() {
            Some((first, rest)) => rest.iter().all(|tile| tile.same(first)),
            None => false,
        }
    }

    /// One numbered suit with ranks stepping by exactly one.
    fn is_run(&self) -> bool {
        let Some(first) = self.tiles.first() else {
            return false;
        };
        if !first.is_numbered() || self.tiles.iter().any(|tile| tile.suit() != first.suit()) {
            return false;
        }
        self.tiles
            .windows(2)
            .all(|pair| pair[1].rank() == pair[0].rank() + 1)
    }
}
