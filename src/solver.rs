use crate::{Hand, Tile, TileGroup};
use log::trace;
use std::collections::{HashSet, VecDeque};

/// One way of grouping a hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decomposition {
    /// The hand's existing melds followed by the groups found in the concealed tiles
    pub groups: Vec<TileGroup>,
    /// Concealed tiles this grouping could not place
    pub leftover: Vec<Tile>,
}

impl Decomposition {
    /// Groups plus unplaced tiles, each leftover tile counting as one.
    /// Lower is closer to a finished hand.
    pub fn group_count(&self) -> usize {
        self.groups.len() + self.leftover.len()
    }

    /// Every concealed tile was placed in a group
    pub fn is_complete(&self) -> bool {
        self.leftover.is_empty()
    }
}

/// Two tiles waiting for a third
#[derive(Debug, Clone, Copy)]
enum Proto {
    /// A pair. Becomes the head or, with a third copy, a triplet.
    Head(Tile, Tile),
    /// Two consecutive ranks waiting for the next one.
    Run(Tile, Tile),
}

/// State of one search branch. Every successor is a fresh copy.
#[derive(Debug, Clone, Default)]
struct Branch {
    next: usize,
    single: Option<Tile>,
    pair: Option<Proto>,
    head: Option<TileGroup>,
    completed: Vec<TileGroup>,
    leftover: Vec<Tile>,
}

impl Branch {
    fn advance(&self) -> Branch {
        let mut branch = self.clone();
        branch.next += 1;
        branch
    }

    /// Park `tile` as the waiting single. Only the latest single is kept.
    fn hold_single(&mut self, tile: Tile) {
        if let Some(previous) = self.single.replace(tile) {
            self.leftover.push(previous);
        }
    }

    /// Replace the waiting single with a two-tile proto-group.
    fn hold_pair(&mut self, proto: Proto) {
        self.single = None;
        self.settle_pair();
        self.pair = Some(proto);
    }

    /// Retire the waiting pair: the first pair becomes the head, anything else is left over.
    fn settle_pair(&mut self) {
        match self.pair.take() {
            Some(Proto::Head(a, b)) if self.head.is_none() => {
                self.head = Some(TileGroup::head([a, b]));
            }
            Some(Proto::Head(a, b) | Proto::Run(a, b)) => self.leftover.extend([a, b]),
            None => {}
        }
    }

    /// Every state reachable by consuming `tile`.
    fn successors(&self, tile: Tile) -> Vec<Branch> {
        let mut successors = Vec::with_capacity(3);

        let mut skip = self.advance();
        skip.hold_single(tile);
        successors.push(skip);

        if let Some(previous) = self.single {
            let proto = if continues_run(&previous, &tile) {
                Some(Proto::Run(previous, tile))
            } else if previous.same(&tile) {
                Some(Proto::Head(previous, tile))
            } else {
                None
            };
            if let Some(proto) = proto {
                let mut paired = self.advance();
                paired.hold_pair(proto);
                successors.push(paired);
            }
        }

        let group = match self.pair {
            Some(Proto::Head(a, b)) if a.same(&tile) => Some(TileGroup::triplet([a, b, tile], None)),
            Some(Proto::Run(a, b)) if continues_run(&b, &tile) => Some(TileGroup::sequence([a, b, tile], None)),
            _ => None,
        };
        if let Some(group) = group {
            let mut closed = self.advance();
            closed.pair = None;
            closed.completed.push(group);
            successors.push(closed);
        }

        successors
    }

    fn finish(mut self, melds: &[TileGroup]) -> Decomposition {
        if let Some(single) = self.single.take() {
            self.leftover.push(single);
        }
        self.settle_pair();

        let groups = melds
            .iter()
            .cloned()
            .chain(self.completed)
            .chain(self.head)
            .collect();
        Decomposition { groups, leftover: self.leftover }
    }
}

/// `next` is the tile one rank above `previous` in the same numbered suit.
fn continues_run(previous: &Tile, next: &Tile) -> bool {
    previous.is_numbered() && previous.suit() == next.suit() && previous.rank() + 1 == next.rank()
}

impl Hand {
    /// Find every way to group the concealed tiles into heads, sequences and triplets.
    ///
    /// This is a breadth-first search over the sorted concealed tiles. Each tile
    /// may wait as a single, join the waiting single as a pair, or complete the
    /// waiting pair; every choice forks a new branch. At most one head is kept
    /// per branch. Existing melds lead every result unchanged.
    ///
    /// Branches that end in the same grouping are reported once. Results are
    /// ordered by [`Decomposition::group_count`], best first.
    pub fn parse(&self) -> Vec<Decomposition> {
        let tiles = self.concealed();
        let melds = self.melds();

        let mut frontier = VecDeque::from([Branch::default()]);
        let mut results = Vec::new();
        let mut widest = 0;

        while let Some(branch) = frontier.pop_front() {
            match tiles.get(branch.next) {
                Some(&tile) => frontier.extend(branch.successors(tile)),
                None => results.push(branch.finish(melds)),
            }
            widest = widest.max(frontier.len());
        }

        let branches = results.len();
        let mut seen = HashSet::new();
        results.retain(|decomposition| seen.insert(decomposition.clone()));
        results.sort_by_key(Decomposition::group_count);
        trace!(
            "parsed {} tiles into {} groupings from {} branches (widest frontier {})",
            tiles.len(),
            results.len(),
            branches,
            widest
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupKind;
    use crate::hand::ClaimKind;
    use crate::{CallSource, parse_tiles};

    fn hand(s: &str) -> Hand {
        Hand::from_parts(parse_tiles(s).unwrap(), Vec::new())
    }

    fn tiles(s: &str) -> Vec<Tile> {
        parse_tiles(s).unwrap()
    }

    #[test]
    fn test_three_triplets_sort_first() {
        let results = hand("222333444m").parse();
        assert!(!results.is_empty());

        let best = &results[0];
        assert_eq!(best.group_count(), 3);
        assert!(best.is_complete());
        assert_eq!(
            best.groups,
            vec![
                TileGroup::triplet(tiles("222m"), None),
                TileGroup::triplet(tiles("333m"), None),
                TileGroup::triplet(tiles("444m"), None),
            ]
        );
        assert!(results.iter().all(|d| d.group_count() >= 3));
    }

    #[test]
    fn test_each_grouping_reported_once() {
        for text in ["222333444m", "1123455m789p99s", "1122z"] {
            let results = hand(text).parse();
            let distinct: HashSet<_> = results.iter().collect();
            assert_eq!(distinct.len(), results.len(), "{text}");
        }
        let results = hand("222333444m").parse();
        let triplets = vec![
            TileGroup::triplet(tiles("222m"), None),
            TileGroup::triplet(tiles("333m"), None),
            TileGroup::triplet(tiles("444m"), None),
        ];
        assert_eq!(results.iter().filter(|d| d.groups == triplets).count(), 1);
    }

    #[test]
    fn test_results_sorted_by_group_count() {
        let results = hand("123m456p11z").parse();
        assert!(results.windows(2).all(|w| w[0].group_count() <= w[1].group_count()));
    }

    #[test]
    fn test_sequences_and_head() {
        let results = hand("123m456p11z").parse();
        let best = &results[0];
        assert!(best.is_complete());
        assert_eq!(
            best.groups,
            vec![
                TileGroup::sequence(tiles("123m"), None),
                TileGroup::sequence(tiles("456p"), None),
                TileGroup::head(tiles("11z")),
            ]
        );
        assert!(best.groups.iter().all(TileGroup::is_valid));
    }

    #[test]
    fn test_head_before_run_survives() {
        let results = hand("11234m").parse();
        let best = &results[0];
        assert!(best.is_complete());
        assert_eq!(best.group_count(), 2);
        assert!(best.groups.contains(&TileGroup::head(tiles("11m"))));
        assert!(best.groups.contains(&TileGroup::sequence(tiles("234m"), None)));
    }

    #[test]
    fn test_at_most_one_head() {
        for decomposition in hand("1122z").parse() {
            let heads = decomposition
                .groups
                .iter()
                .filter(|g| g.kind == GroupKind::Head)
                .count();
            assert!(heads <= 1);
        }
        let best = &hand("1122z").parse()[0];
        assert!(!best.is_complete());
        assert_eq!(best.group_count(), 3);
    }

    #[test]
    fn test_red_five_joins_triplet() {
        let results = hand("550m").parse();
        let best = &results[0];
        assert!(best.is_complete());
        assert_eq!(best.groups, vec![TileGroup::triplet(tiles("550m"), None)]);
        assert!(best.groups[0].is_valid());
    }

    #[test]
    fn test_honors_do_not_run() {
        let results = hand("123z").parse();
        assert!(results.iter().all(|d| !d.is_complete()));
        assert!(
            results
                .iter()
                .flat_map(|d| &d.groups)
                .all(|g| g.kind != GroupKind::Sequence)
        );
    }

    #[test]
    fn test_every_tile_accounted_for() {
        let h = hand("1123455m789p99s");
        let total = h.tile_count();
        for decomposition in h.parse() {
            let placed: usize = decomposition.groups.iter().map(TileGroup::len).sum();
            assert_eq!(placed + decomposition.leftover.len(), total);
        }
    }

    #[test]
    fn test_melds_lead_every_result() {
        let mut h = hand("77z234m55p");
        h.call(ClaimKind::Triplet, Some(Tile::CHUN), &tiles("77z"), CallSource::Across)
            .unwrap();
        let meld = h.melds()[0].clone();

        let results = h.parse();
        assert!(results.iter().all(|d| d.groups[0] == meld));

        let best = &results[0];
        assert!(best.is_complete());
        assert_eq!(best.group_count(), 3);
        assert!(best.groups.contains(&TileGroup::sequence(tiles("234m"), None)));
        assert!(best.groups.contains(&TileGroup::head(tiles("55p"))));
        // Search does not touch the hand.
        assert_eq!(h.concealed(), tiles("234m55p"));
    }

    #[test]
    fn test_empty_hand() {
        let results = Hand::new().parse();
        assert_eq!(results.len(), 1);
        assert!(results[0].groups.is_empty());
        assert!(results[0].is_complete());
    }
}
