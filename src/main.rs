//! Tennis match prediction CLI
//!
//! Predicts each player's chance of winning from player and match attributes.

use clap::{Parser, Subcommand};
use tennis::{Config, Result};

#[derive(Parser)]
#[command(name = "tennis")]
#[command(about = "Tennis match winner prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the winner of a match
    Predict {
        #[command(flatten)]
        players: PlayerArgs,
        #[command(flatten)]
        context: ContextArgs,
        /// Predict every match in a JSON file (object or array of objects)
        #[arg(long)]
        input: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
        /// Print the transformed feature row before the prediction
        #[arg(long)]
        show_features: bool,
    },
    /// List permitted values for each categorical field
    Vocab,
    /// Load and validate the artifacts
    Check,
    /// Initialize a new project with default config
    Init,
}

#[derive(clap::Args, Debug)]
struct PlayerArgs {
    /// Display name for player 1
    #[arg(long)]
    name1: Option<String>,
    /// Display name for player 2
    #[arg(long)]
    name2: Option<String>,
    /// Age of player 1
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(10..=80))]
    age1: u32,
    /// Age of player 2
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(10..=80))]
    age2: u32,
    /// Height of player 1 (cm)
    #[arg(long, default_value_t = 180, value_parser = clap::value_parser!(u32).range(50..=250))]
    height1: u32,
    /// Height of player 2 (cm)
    #[arg(long, default_value_t = 180, value_parser = clap::value_parser!(u32).range(50..=250))]
    height2: u32,
    /// Ranking of player 1
    #[arg(long, default_value_t = 0)]
    rank1: u32,
    /// Ranking of player 2
    #[arg(long, default_value_t = 0)]
    rank2: u32,
    /// Ranking points of player 1
    #[arg(long, default_value_t = 0.0, value_parser = non_negative)]
    points1: f64,
    /// Ranking points of player 2
    #[arg(long, default_value_t = 0.0, value_parser = non_negative)]
    points2: f64,
    /// Dominant hand of player 1 (default: first permitted value)
    #[arg(long)]
    hand1: Option<String>,
    /// Dominant hand of player 2 (default: second permitted value)
    #[arg(long)]
    hand2: Option<String>,
    /// Country (IOC code) of player 1 (default: first permitted value)
    #[arg(long)]
    country1: Option<String>,
    /// Country (IOC code) of player 2 (default: second permitted value)
    #[arg(long)]
    country2: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ContextArgs {
    /// Match number within the tournament
    #[arg(long, default_value_t = 0)]
    match_num: u32,
    /// Round (default: first permitted value)
    #[arg(long)]
    round: Option<String>,
    /// Surface (default: first permitted value)
    #[arg(long)]
    surface: Option<String>,
    /// Tournament level (default: first permitted value)
    #[arg(long)]
    tourney_level: Option<String>,
}

fn non_negative(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{} is not a non-negative number", s))
    }
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        log::debug!("No config at {}, using defaults", cli.config);
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Predict {
            players,
            context,
            input,
            format,
            show_features,
        } => commands::predict(&config, players, context, input, format, show_features),
        Commands::Vocab => commands::vocab(&config),
        Commands::Check => commands::check(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use tennis::artifacts::{CategoryVocabulary, SchemaDescriptor};
    use tennis::features::FeatureRow;
    use tennis::predict::{format_prediction, PredictionResult};
    use tennis::preprocess::TransformedRecord;
    use tennis::{MatchContext, MatchRecord, PlayerAttributes, Predictor, TennisError};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("artifacts/model")?;
        println!("Created artifacts/model/ directory");

        println!("\nNext steps:");
        println!("  1. Copy the trained model, transform and vocabulary into artifacts/model/");
        println!("  2. Run 'tennis check' to validate them");
        println!("  3. Run 'tennis predict --rank1 1 --rank2 40' to make predictions");

        Ok(())
    }

    pub fn check(config: &Config) -> Result<()> {
        let predictor = Predictor::load(config)?;
        let artifacts = predictor.artifacts();
        let schema = artifacts.schema();

        println!("Artifacts OK");
        println!("───────────────────────────────");
        println!("  Model:        {} ({})", config.artifacts.model_path, artifacts.model().kind());
        println!("  Transform:    {}", config.artifacts.transform_path);
        println!("  Schema:       v{}", schema.version);
        println!("  Numeric:      {}", schema.numeric.len());
        println!("  Categorical:  {}", schema.categorical.len());
        println!("  Vocabulary:   {} fields", artifacts.vocabulary().len());

        Ok(())
    }

    pub fn vocab(config: &Config) -> Result<()> {
        let predictor = Predictor::load(config)?;
        for (field, values) in predictor.artifacts().vocabulary().fields() {
            println!("{}: {}", field, values.join(", "));
        }
        Ok(())
    }

    /// Explicit choice if permitted, otherwise the vocabulary entry at `index`
    fn choose(
        vocabulary: &CategoryVocabulary,
        field: &str,
        value: Option<String>,
        index: usize,
    ) -> Result<Option<String>> {
        match value {
            Some(v) => {
                if vocabulary.choices(field).is_some() && !vocabulary.contains(field, &v) {
                    return Err(TennisError::SchemaMismatch(format!(
                        "'{}' is not a permitted value for {} (see 'tennis vocab')",
                        v, field
                    )));
                }
                Ok(Some(v))
            }
            None => {
                let default = vocabulary.choice_or_first(field, index).map(str::to_string);
                if default.is_none() {
                    log::warn!("No permitted values for {}, leaving it to imputation", field);
                }
                Ok(default)
            }
        }
    }

    fn build_record(
        vocabulary: &CategoryVocabulary,
        players: &PlayerArgs,
        context: &ContextArgs,
    ) -> Result<MatchRecord> {
        let player1 = PlayerAttributes {
            age: Some(players.age1 as f64),
            hand: choose(vocabulary, "player1_hand", players.hand1.clone(), 0)?,
            height: Some(players.height1 as f64),
            country: choose(vocabulary, "player1_ioc", players.country1.clone(), 0)?,
            rank: Some(players.rank1),
            rank_points: Some(players.points1),
        };
        let player2 = PlayerAttributes {
            age: Some(players.age2 as f64),
            hand: choose(vocabulary, "player2_hand", players.hand2.clone(), 1)?,
            height: Some(players.height2 as f64),
            country: choose(vocabulary, "player2_ioc", players.country2.clone(), 1)?,
            rank: Some(players.rank2),
            rank_points: Some(players.points2),
        };
        let context = MatchContext {
            match_num: Some(context.match_num),
            round: choose(vocabulary, "round", context.round.clone(), 0)?,
            surface: choose(vocabulary, "surface", context.surface.clone(), 0)?,
            tourney_level: choose(vocabulary, "tourney_level", context.tourney_level.clone(), 0)?,
        };
        Ok(MatchRecord::new(player1, player2, context))
    }

    fn read_rows(path: &str) -> Result<Vec<FeatureRow>> {
        let content = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let objects = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        objects
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let object = item.as_object().ok_or_else(|| {
                    TennisError::SchemaMismatch(format!("match {} in {} is not an object", i, path))
                })?;
                FeatureRow::from_json_object(object, &MatchRecord::COLUMNS)
            })
            .collect()
    }

    fn print_features(record: &TransformedRecord, schema: &SchemaDescriptor) {
        println!("Transformed features");
        println!("───────────────────────────────");
        for name in record.column_names() {
            match record.get(name) {
                // Ordinal codes
                Some(value) if schema.is_categorical(name) => {
                    println!("  {:<22} {:>10.0}", name, value)
                }
                Some(value) => println!("  {:<22} {:>10.4}", name, value),
                None => println!("  {:<22} {:>10}", name, "-"),
            }
        }
    }

    fn print_result(result: &PredictionResult, format: &OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => print!("{}", format_prediction(result)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        }
        Ok(())
    }

    pub fn predict(
        config: &Config,
        players: PlayerArgs,
        context: ContextArgs,
        input: Option<String>,
        format: OutputFormat,
        show_features: bool,
    ) -> Result<()> {
        let mut config = config.clone();
        if let Some(name) = &players.name1 {
            config.labels.player1 = name.clone();
        }
        if let Some(name) = &players.name2 {
            config.labels.player2 = name.clone();
        }

        let predictor = Predictor::load(&config)?;

        // Batch prediction from file
        if let Some(path) = input {
            let rows = read_rows(&path)?;
            println!("Predicting {} matches from {}", rows.len(), path);
            let mut failures = 0;
            for (i, (row, result)) in rows.iter().zip(predictor.predict_batch(&rows)).enumerate() {
                match result {
                    Ok(result) => {
                        if show_features {
                            print_features(&predictor.transform_row(row)?, predictor.artifacts().schema());
                        }
                        print_result(&result, &format)?;
                    }
                    Err(e) => {
                        failures += 1;
                        eprintln!("Match {}: {}", i, e);
                    }
                }
            }
            if failures > 0 {
                return Err(TennisError::Inference(format!(
                    "{} of {} matches could not be predicted",
                    failures,
                    rows.len()
                )));
            }
            return Ok(());
        }

        // Single match prediction
        let record = build_record(predictor.artifacts().vocabulary(), &players, &context)?;
        if show_features {
            print_features(&predictor.transform(&record)?, predictor.artifacts().schema());
        }
        let result = predictor.predict(&record)?;
        print_result(&result, &format)
    }
}
