use crate::{
    CallSource, CalledTile, ClaimKind, ClaimOption, Decomposition, GroupKind, Hand, QuadKind, Tile, TileGroup,
};
use crate::hand::{MAX_CONCEALED, MAX_COPIES};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// JSON-serializable representation of a hand
#[derive(Debug, Serialize, Deserialize)]
pub struct HandJson {
    pub concealed: Vec<String>,
    #[serde(default)]
    pub melds: Vec<GroupJson>,
}

/// JSON-serializable representation of a tile group
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupJson {
    pub kind: GroupKindJson,
    pub tiles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub called: Option<CalledJson>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKindJson {
    Head,
    Sequence,
    Triplet,
    ClosedQuad,
    OpenQuad,
    AddedOpenQuad,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalledJson {
    pub tile: String,
    pub source: SourceJson,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceJson {
    #[default]
    None,
    Left,
    Across,
    Right,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKindJson {
    Sequence,
    Triplet,
    OpenQuad,
    AddedQuad,
    ClosedQuad,
}

/// A claim option, or a claim to execute
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimJson {
    pub kind: ClaimKindJson,
    /// Discarded (or added) tile; absent for closed quads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile: Option<String>,
    pub tiles: Vec<String>,
    #[serde(default)]
    pub source: SourceJson,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecompositionJson {
    pub groups: Vec<GroupJson>,
    pub leftover: Vec<String>,
    pub complete: bool,
}

/// Result envelope of every API call
#[derive(Serialize)]
pub struct ApiResult<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every decomposition of the hand, best first
///
/// # Arguments
/// * `hand_json` - e.g. `{"concealed": ["2m", "3m", "4m"], "melds": []}`
#[wasm_bindgen]
pub fn decompose_hand(hand_json: &str) -> String {
    respond(decompose_internal(hand_json))
}

/// Claims the hand could make on `discard` (tile text such as "5m")
#[wasm_bindgen]
pub fn acceptable_claims(hand_json: &str, discard: &str) -> String {
    respond(acceptable_claims_internal(hand_json, discard))
}

/// Execute a claim and return the updated hand
///
/// # Arguments
/// * `claim_json` - e.g. `{"kind": "triplet", "tile": "5m", "tiles": ["5m", "5m"], "source": "left"}`
#[wasm_bindgen]
pub fn apply_claim(hand_json: &str, claim_json: &str) -> String {
    respond(apply_claim_internal(hand_json, claim_json))
}

/// Bonus tile indicated by `indicator`
#[wasm_bindgen]
pub fn dora_of(indicator: &str) -> String {
    respond(Tile::from_text(indicator).map(|tile| tile.dora().to_string()))
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    let envelope = match result {
        Ok(data) => ApiResult { success: true, data: Some(data), error: None },
        Err(e) => ApiResult { success: false, data: None, error: Some(format!("{e:#}")) },
    };
    serde_json::to_string(&envelope)
        .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"Serialization error: {}"}}"#, e))
}

fn decompose_internal(hand_json: &str) -> Result<Vec<DecompositionJson>> {
    let hand = hand_from_json(hand_json)?;
    Ok(hand.parse().iter().map(decomposition_to_json).collect())
}

fn acceptable_claims_internal(hand_json: &str, discard: &str) -> Result<Vec<ClaimJson>> {
    let hand = hand_from_json(hand_json)?;
    let discard = Tile::from_text(discard).context("invalid discard")?;
    Ok(hand
        .call_acceptable_list(&discard)
        .iter()
        .map(|option| option_to_json(option, discard))
        .collect())
}

fn apply_claim_internal(hand_json: &str, claim_json: &str) -> Result<HandJson> {
    let mut hand = hand_from_json(hand_json)?;
    let claim: ClaimJson = serde_json::from_str(claim_json).context("invalid claim JSON")?;

    let tile = claim.tile.as_deref().map(Tile::from_text).transpose()?;
    let tiles = parse_all(&claim.tiles)?;
    hand.call(claim.kind.into(), tile, &tiles, claim.source.into())?;

    Ok(hand_to_json(&hand))
}

fn hand_from_json(hand_json: &str) -> Result<Hand> {
    let json: HandJson = serde_json::from_str(hand_json).context("invalid hand JSON")?;
    let concealed = parse_all(&json.concealed)?;
    ensure!(
        concealed.len() <= MAX_CONCEALED,
        "hand has {} concealed tiles, at most {} allowed",
        concealed.len(),
        MAX_CONCEALED
    );
    for tile in &concealed {
        let copies = concealed.iter().filter(|other| other.same(tile)).count();
        ensure!(copies <= MAX_COPIES, "hand has {copies} copies of {tile}, at most {MAX_COPIES} allowed");
    }
    let melds = json.melds.into_iter().map(group_from_json).collect::<Result<Vec<_>>>()?;
    Ok(Hand::from_parts(concealed, melds))
}

fn parse_all(tiles: &[String]) -> Result<Vec<Tile>> {
    tiles.iter().map(|tile| Tile::from_text(tile)).collect()
}

fn tile_strings(tiles: &[Tile]) -> Vec<String> {
    tiles.iter().map(|tile| tile.to_string()).collect()
}

fn group_from_json(json: GroupJson) -> Result<TileGroup> {
    let kind = match json.kind {
        GroupKindJson::Head => GroupKind::Head,
        GroupKindJson::Sequence => GroupKind::Sequence,
        GroupKindJson::Triplet => GroupKind::Triplet,
        GroupKindJson::ClosedQuad => GroupKind::Quad(QuadKind::Closed),
        GroupKindJson::OpenQuad => GroupKind::Quad(QuadKind::Open),
        GroupKindJson::AddedOpenQuad => GroupKind::Quad(QuadKind::AddedOpen),
    };
    let called = match json.called {
        Some(called) => Some(CalledTile::new(Tile::from_text(&called.tile)?, called.source.into())),
        None => None,
    };
    Ok(TileGroup::new(kind, parse_all(&json.tiles)?, called))
}

fn group_to_json(group: &TileGroup) -> GroupJson {
    let kind = match group.kind {
        GroupKind::Head => GroupKindJson::Head,
        GroupKind::Sequence => GroupKindJson::Sequence,
        GroupKind::Triplet => GroupKindJson::Triplet,
        GroupKind::Quad(QuadKind::Closed) => GroupKindJson::ClosedQuad,
        GroupKind::Quad(QuadKind::Open) => GroupKindJson::OpenQuad,
        GroupKind::Quad(QuadKind::AddedOpen) => GroupKindJson::AddedOpenQuad,
    };
    GroupJson {
        kind,
        tiles: tile_strings(&group.tiles),
        called: group.called.map(|called| CalledJson {
            tile: called.tile.to_string(),
            source: called.source.into(),
        }),
    }
}

fn hand_to_json(hand: &Hand) -> HandJson {
    HandJson {
        concealed: tile_strings(&hand.concealed()),
        melds: hand.melds().iter().map(group_to_json).collect(),
    }
}

fn decomposition_to_json(decomposition: &Decomposition) -> DecompositionJson {
    DecompositionJson {
        groups: decomposition.groups.iter().map(group_to_json).collect(),
        leftover: tile_strings(&decomposition.leftover),
        complete: decomposition.is_complete(),
    }
}

fn option_to_json(option: &ClaimOption, discard: Tile) -> ClaimJson {
    ClaimJson {
        kind: option.kind.into(),
        tile: Some(discard.to_string()),
        tiles: tile_strings(&option.tiles),
        source: SourceJson::None,
    }
}

impl From<SourceJson> for CallSource {
    fn from(source: SourceJson) -> Self {
        match source {
            SourceJson::None => CallSource::None,
            SourceJson::Left => CallSource::Left,
            SourceJson::Across => CallSource::Across,
            SourceJson::Right => CallSource::Right,
        }
    }
}

impl From<CallSource> for SourceJson {
    fn from(source: CallSource) -> Self {
        match source {
            CallSource::None => SourceJson::None,
            CallSource::Left => SourceJson::Left,
            CallSource::Across => SourceJson::Across,
            CallSource::Right => SourceJson::Right,
        }
    }
}

impl From<ClaimKindJson> for ClaimKind {
    fn from(kind: ClaimKindJson) -> Self {
        match kind {
            ClaimKindJson::Sequence => ClaimKind::Sequence,
            ClaimKindJson::Triplet => ClaimKind::Triplet,
            ClaimKindJson::OpenQuad => ClaimKind::OpenQuad,
            ClaimKindJson::AddedQuad => ClaimKind::AddedQuad,
            ClaimKindJson::ClosedQuad => ClaimKind::ClosedQuad,
        }
    }
}

impl From<ClaimKind> for ClaimKindJson {
    fn from(kind: ClaimKind) -> Self {
        match kind {
            ClaimKind::Sequence => ClaimKindJson::Sequence,
            ClaimKind::Triplet => ClaimKindJson::Triplet,
            ClaimKind::OpenQuad => ClaimKindJson::OpenQuad,
            ClaimKind::AddedQuad => ClaimKindJson::AddedQuad,
            ClaimKind::ClosedQuad => ClaimKindJson::ClosedQuad,
        }
    }
}
