use std::collections::{BTreeMap, BTreeSet};
use std::iter::once;

use anyhow::{Context, Result};
use log::debug;

use crate::group::{GroupKind, QuadKind, TileGroup};
use crate::{CallSource, CalledTile, Tile};

/// Copies of each face in a full tile set, red fives included.
pub const MAX_COPIES: usize = 4;
/// Most concealed tiles a hand can hold: a full hand plus one drawn tile.
pub const MAX_CONCEALED: usize = 14;

/// Kind of claim a hand can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaimKind {
    /// Chi: two concealed tiles plus the discard make a run
    Sequence,
    /// Pon: two concealed tiles plus the discard
    Triplet,
    /// Open kan: three concealed tiles plus the discard
    OpenQuad,
    /// Upgrade an open triplet to a quad
    AddedQuad,
    /// Four concealed tiles, no discard involved
    ClosedQuad,
}

impl ClaimKind {
    /// Kind of the group the claim produces.
    pub fn group_kind(self) -> GroupKind {
        match self {
            ClaimKind::Sequence => GroupKind::Sequence,
            ClaimKind::Triplet => GroupKind::Triplet,
            ClaimKind::OpenQuad => GroupKind::Quad(QuadKind::Open),
            ClaimKind::AddedQuad => GroupKind::Quad(QuadKind::AddedOpen),
            ClaimKind::ClosedQuad => GroupKind::Quad(QuadKind::Closed),
        }
    }
}

/// A claim the hand could make, with the tiles it needs.
///
/// For [`ClaimKind::AddedQuad`] `tiles` are the tiles of the triplet being
/// upgraded; for every other kind they come from the concealed tiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimOption {
    pub kind: ClaimKind,
    pub tiles: Vec<Tile>,
}

impl ClaimOption {
    fn new(kind: ClaimKind, tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut tiles: Vec<Tile> = tiles.into_iter().collect();
        tiles.sort();
        ClaimOption { kind, tiles }
    }
}

/// A player's holdings: concealed tiles and the groups already formed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hand {
    concealed: BTreeMap<Tile, u8>,
    melds: Vec<TileGroup>,
}

impl Hand {
    /// Create a new empty hand
    pub fn new() -> Self {
        Hand::default()
    }

    /// Rebuild a hand from its concealed tiles and formed groups.
    pub fn from_parts(concealed: impl IntoIterator<Item = Tile>, melds: Vec<TileGroup>) -> Self {
        let mut hand = Hand { concealed: BTreeMap::new(), melds };
        for tile in concealed {
            hand.add_tile(tile);
        }
        hand
    }

    /// Add a drawn or dealt tile. The per-tile count saturates at `u8::MAX`.
    pub fn add_tile(&mut self, tile: Tile) {
        let count = self.concealed.entry(tile).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Remove one instance of exactly this tile (red flag included).
    pub fn remove_tile(&mut self, tile: &Tile) -> bool {
        if let Some(count) = self.concealed.get_mut(tile) {
            *count -= 1;
            if *count == 0 {
                self.concealed.remove(tile);
            }
            return true;
        }
        false
    }

    /// Get the count of a specific tile
    pub fn count(&self, tile: &Tile) -> u8 {
        self.concealed.get(tile).copied().unwrap_or(0)
    }

    /// Number of concealed tiles.
    pub fn tile_count(&self) -> usize {
        self.concealed.values().map(|&count| count as usize).sum()
    }

    /// Concealed tiles in sorted order, one entry per instance.
    pub fn concealed(&self) -> Vec<Tile> {
        self.concealed
            .iter()
            .flat_map(|(&tile, &count)| std::iter::repeat_n(tile, count as usize))
            .collect()
    }

    pub fn melds(&self) -> &[TileGroup] {
        &self.melds
    }

    /// Every claim this hand could make on `discard`. Does not modify the hand.
    pub fn call_acceptable_list(&self, discard: &Tile) -> Vec<ClaimOption> {
        let mut options = BTreeSet::new();

        if discard.is_numbered() {
            let rank = discard.rank();
            let windows = [
                (rank.checked_add(1), rank.checked_add(2)),
                (rank.checked_sub(1), rank.checked_add(1)),
                (rank.checked_sub(2), rank.checked_sub(1)),
            ];
            for (low, high) in windows {
                let (Some(low), Some(high)) = (low, high) else {
                    continue;
                };
                if !(1..=9).contains(&low) || !(1..=9).contains(&high) {
                    continue;
                }
                for first in self.faces(discard, low) {
                    for second in self.faces(discard, high) {
                        options.insert(ClaimOption::new(ClaimKind::Sequence, [first, second]));
                    }
                }
            }
        }

        let matching: Vec<Tile> = self
            .concealed()
            .into_iter()
            .filter(|tile| tile.same(discard))
            .collect();
        for pair in combinations(&matching, 2) {
            options.insert(ClaimOption::new(ClaimKind::Triplet, pair));
        }
        for triple in combinations(&matching, 3) {
            options.insert(ClaimOption::new(ClaimKind::OpenQuad, triple));
        }

        for meld in &self.melds {
            let upgradable = meld.kind == GroupKind::Triplet
                && meld.called.is_some_and(|called| called.tile.same(discard));
            if upgradable {
                options.insert(ClaimOption::new(ClaimKind::AddedQuad, meld.tiles.iter().copied()));
            }
        }

        options.into_iter().collect()
    }

    /// Execute a claim.
    ///
    /// For open claims `tile` is the discard and `matching` the concealed tiles
    /// joining it. A closed quad takes `matching` (and `tile`, if given) from the
    /// concealed tiles. An added quad takes `tile` from the concealed tiles and
    /// adds it to the open triplet whose tiles equal `matching`.
    ///
    /// On error the hand is unchanged.
    pub fn call(&mut self, kind: ClaimKind, tile: Option<Tile>, matching: &[Tile], source: CallSource) -> Result<()> {
        let outcome = match kind {
            ClaimKind::AddedQuad => self.add_to_triplet(tile, matching, source),
            _ => self.form_group(kind, tile, matching, source),
        };
        match &outcome {
            Ok(()) => debug!("{:?} claim with {} formed", kind, describe(matching)),
            Err(err) => debug!("{:?} claim with {} rejected: {:#}", kind, describe(matching), err),
        }
        outcome
    }

    fn form_group(&mut self, kind: ClaimKind, tile: Option<Tile>, matching: &[Tile], source: CallSource) -> Result<()> {
        let (consumed, tiles, called) = if kind == ClaimKind::ClosedQuad {
            let consumed: Vec<Tile> = matching.iter().copied().chain(tile).collect();
            (consumed.clone(), consumed, None)
        } else {
            let tile = tile.with_context(|| format!("{kind:?} claim needs the discarded tile"))?;
            let tiles = matching.iter().copied().chain(once(tile)).collect();
            (matching.to_vec(), tiles, Some(CalledTile::new(tile, source)))
        };

        self.concealed = self.without(&consumed)?;
        self.melds.push(TileGroup::new(kind.group_kind(), tiles, called));
        Ok(())
    }

    fn add_to_triplet(&mut self, tile: Option<Tile>, matching: &[Tile], source: CallSource) -> Result<()> {
        let tile = tile.context("an added quad needs the tile being added")?;
        let concealed = self.without(&[tile])?;

        let mut wanted = matching.to_vec();
        wanted.sort();
        let index = self
            .melds
            .iter()
            .position(|meld| meld.kind == GroupKind::Triplet && meld.called.is_some() && meld.tiles == wanted)
            .with_context(|| format!("no open triplet of {}", describe(&wanted)))?;

        let tiles = self.melds[index].tiles.iter().copied().chain(once(tile));
        self.melds[index] = TileGroup::quad(QuadKind::AddedOpen, tiles, Some(CalledTile::new(tile, source)));
        self.concealed = concealed;
        Ok(())
    }

    /// The concealed tiles with one instance of each of `tiles` removed.
    fn without(&self, tiles: &[Tile]) -> Result<BTreeMap<Tile, u8>> {
        let mut remaining = self.concealed.clone();
        for tile in tiles {
            let count = remaining
                .get_mut(tile)
                .with_context(|| format!("{tile} is not among the concealed tiles"))?;
            *count -= 1;
            if *count == 0 {
                remaining.remove(tile);
            }
        }
        Ok(remaining)
    }

    /// Distinct concealed tiles of the discard's suit with the given rank.
    fn faces<'a>(&'a self, discard: &'a Tile, rank: u8) -> impl Iterator<Item = Tile> + 'a {
        self.concealed
            .keys()
            .filter(move |tile| tile.suit() == discard.suit() && tile.rank() == rank)
            .copied()
    }
}

/// All ways to pick `k` of `tiles` by position.
fn combinations(tiles: &[Tile], k: usize) -> Vec<Vec<Tile>> {
    let mut result = Vec::new();
    let mut current = Vec::with_capacity(k);
    combinations_helper(tiles, k, 0, &mut current, &mut result);
    result
}

fn combinations_helper(tiles: &[Tile], k: usize, start: usize, current: &mut Vec<Tile>, result: &mut Vec<Vec<Tile>>) {
    if current.len() == k {
        result.push(current.clone());
        return;
    }
    for i in start..tiles.len() {
        current.push(tiles[i]);
        combinations_helper(tiles, k, i + 1, current, result);
        current.pop();
    }
}

fn describe(tiles: &[Tile]) -> String {
    let names: Vec<String> = tiles.iter().map(|tile| tile.to_string()).collect();
    format!("[{}]", names.join(" "))
}
