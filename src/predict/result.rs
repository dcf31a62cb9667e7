//! Two-outcome prediction result and its display

use serde::Serialize;

use crate::{LabelConfig, Result, Side, TennisError};

/// One row of the two-outcome distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub side: Side,
    pub label: String,
    /// Win chance in percent, two decimals
    pub percent: f64,
}

/// Win chances for both players
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub player1: Outcome,
    pub player2: Outcome,
    pub favored: Side,
    /// Raw model probability that player 1 wins
    pub probability: f64,
}

/// Round to two decimals
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl PredictionResult {
    /// Build the distribution from P(player 1 wins).
    ///
    /// Player 1 is favored when both chances are equal.
    pub fn from_probability(probability: f64, labels: &LabelConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(TennisError::Inference(format!(
                "probability {} is outside [0, 1]",
                probability
            )));
        }

        let percent1 = round2(100.0 * probability);
        let percent2 = round2(100.0 - percent1);
        let favored = if percent1 >= percent2 {
            Side::Player1
        } else {
            Side::Player2
        };

        Ok(PredictionResult {
            player1: Outcome {
                side: Side::Player1,
                label: labels.label(Side::Player1).to_string(),
                percent: percent1,
            },
            player2: Outcome {
                side: Side::Player2,
                label: labels.label(Side::Player2).to_string(),
                percent: percent2,
            },
            favored,
            probability,
        })
    }

    pub fn outcome(&self, side: Side) -> &Outcome {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    /// Both rows in fixed order, player 1 first
    pub fn outcomes(&self) -> [&Outcome; 2] {
        [&self.player1, &self.player2]
    }

    /// Both rows, favored first
    pub fn ranked(&self) -> [&Outcome; 2] {
        [self.outcome(self.favored), self.outcome(self.favored.other())]
    }

    pub fn favored_label(&self) -> &str {
        &self.outcome(self.favored).label
    }

    /// One-line verdict
    pub fn headline(&self) -> String {
        format!(
            "It looks like {} is more likely to win ({:.2}%)",
            self.favored_label(),
            self.outcome(self.favored).percent
        )
    }
}

const BAR_WIDTH: usize = 30;

/// Format a prediction for display
pub fn format_prediction(result: &PredictionResult) -> String {
    let name_width = result
        .outcomes()
        .iter()
        .map(|o| o.label.chars().count())
        .max()
        .unwrap_or(0);

    let rows: Vec<String> = result
        .outcomes()
        .iter()
        .map(|o| {
            let filled = ((o.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
            let filled = filled.min(BAR_WIDTH);
            format!(
                "│  {:<width$}  {}{}  {:>6.2}%",
                o.label,
                "█".repeat(filled),
                "░".repeat(BAR_WIDTH - filled),
                o.percent,
                width = name_width
            )
        })
        .collect();

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
{}
├─────────────────────────────────────────────────┤
│  {}
└─────────────────────────────────────────────────┘
"#,
        result.player1.label,
        result.player2.label,
        rows.join("\n"),
        result.headline()
    )
}
