//! Match record representation for the preprocessing transform
//!
//! A match is described by the attributes of both players plus the match
//! context. The outcome column is always absent at inference time.

use serde::{Deserialize, Serialize};

use super::row::{CellValue, FeatureRow};
use crate::Side;

/// Attributes of one player
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub age: Option<f64>,
    /// Dominant hand code (e.g. "R", "L")
    pub hand: Option<String>,
    /// Height in centimetres
    pub height: Option<f64>,
    /// IOC country code
    pub country: Option<String>,
    pub rank: Option<u32>,
    pub rank_points: Option<f64>,
}

impl PlayerAttributes {
    pub fn new(
        age: f64,
        hand: &str,
        height: f64,
        country: &str,
        rank: u32,
        rank_points: f64,
    ) -> Self {
        PlayerAttributes {
            age: Some(age),
            hand: Some(hand.to_string()),
            height: Some(height),
            country: Some(country.to_string()),
            rank: Some(rank),
            rank_points: Some(rank_points),
        }
    }
}

/// Match-level attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchContext {
    /// Match number within the tournament
    pub match_num: Option<u32>,
    pub round: Option<String>,
    pub surface: Option<String>,
    pub tourney_level: Option<String>,
}

impl MatchContext {
    pub fn new(match_num: u32, round: &str, surface: &str, tourney_level: &str) -> Self {
        MatchContext {
            match_num: Some(match_num),
            round: Some(round.to_string()),
            surface: Some(surface.to_string()),
            tourney_level: Some(tourney_level.to_string()),
        }
    }
}

/// A candidate match, player 1 vs player 2
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    pub player1: PlayerAttributes,
    pub player2: PlayerAttributes,
    pub context: MatchContext,
}

impl MatchRecord {
    /// Outcome column, unknown at inference time
    pub const TARGET: &'static str = "is_player1_winner";

    /// Column order of the assembled row
    pub const COLUMNS: [&'static str; 17] = [
        "player1_age",
        "player1_hand",
        "player1_ht",
        "player1_ioc",
        "player1_rank",
        "player1_rank_points",
        "player2_age",
        "player2_hand",
        "player2_ht",
        "player2_ioc",
        "player2_rank",
        "player2_rank_points",
        "match_num",
        "round",
        "surface",
        "tourney_level",
        Self::TARGET,
    ];

    pub fn new(player1: PlayerAttributes, player2: PlayerAttributes, context: MatchContext) -> Self {
        MatchRecord {
            player1,
            player2,
            context,
        }
    }

    pub fn player(&self, side: Side) -> &PlayerAttributes {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    /// Assemble the single-row feature record in `COLUMNS` order
    pub fn to_row(&self) -> FeatureRow {
        let mut row = FeatureRow::new();
        for side in [Side::Player1, Side::Player2] {
            let player = self.player(side);
            let prefix = side.prefix();
            row.push(format!("{}_age", prefix), player.age);
            row.push(format!("{}_hand", prefix), player.hand.as_deref());
            row.push(format!("{}_ht", prefix), player.height);
            row.push(format!("{}_ioc", prefix), player.country.as_deref());
            row.push(format!("{}_rank", prefix), player.rank.map(f64::from));
            row.push(format!("{}_rank_points", prefix), player.rank_points);
        }
        row.push("match_num", self.context.match_num.map(f64::from));
        row.push("round", self.context.round.as_deref());
        row.push("surface", self.context.surface.as_deref());
        row.push("tourney_level", self.context.tourney_level.as_deref());
        row.push(Self::TARGET, CellValue::Missing);
        row
    }

    /// The same match seen from the other side of the net
    pub fn swapped(&self) -> Self {
        MatchRecord {
            player1: self.player2.clone(),
            player2: self.player1.clone(),
            context: self.context.clone(),
        }
    }
}
