use anyhow::{Context, Result};
use clap::Parser;
use grid_snake::game::GameConfig;
use grid_snake::logging::{self, LogLevel};
use grid_snake::modes::HumanMode;
use grid_snake::storage::{FileHighScoreStore, HighScoreStore, MemoryHighScoreStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Snake in the terminal")]
struct Cli {
    /// Cells per side of the square grid
    #[arg(long, default_value = "20")]
    tiles: usize,

    /// Starting speed in ticks per second
    #[arg(long, default_value = "7.0")]
    speed: f32,

    /// Speed ceiling in ticks per second
    #[arg(long, default_value = "15.0")]
    max_speed: f32,

    /// Seed for reproducible food placement
    #[arg(long)]
    seed: Option<u64>,

    /// File holding the best score between runs
    #[arg(long, default_value = ".grid_snake_high_score.json")]
    high_score_file: PathBuf,

    /// Keep the best score in memory only
    #[arg(long)]
    no_persist: bool,

    /// Where log records are written
    #[arg(long, default_value = "grid_snake.log")]
    log_file: PathBuf,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = GameConfig::new(self.tiles);
        config.initial_speed = self.speed;
        config.max_speed = self.max_speed;
        config.seed = self.seed;
        config.validate().context("Invalid game configuration")?;
        Ok(config)
    }

    fn high_score_store(&self) -> Box<dyn HighScoreStore> {
        if self.no_persist {
            Box::new(MemoryHighScoreStore::new())
        } else {
            Box::new(FileHighScoreStore::new(&self.high_score_file))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_file, cli.log_level)?;

    let config = cli.game_config()?;
    log::debug!("Game configuration: {:?}", config);

    let mut human_mode = HumanMode::new(config, cli.high_score_store());
    human_mode.run().await?;

    Ok(())
}
