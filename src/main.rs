use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgGroup, Args, Parser, Subcommand};
use reqwest::Client;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

mod analysis;
mod classifier;
mod config;
mod dashboard;
mod db;
mod emotion;
mod error;
mod lexicon;
mod models;
mod music;

use crate::analysis::ChatAnalyzer;
use crate::config::Config;
use crate::emotion::Emotion;
use crate::models::{DiaryAnalysis, DiaryEntry, DiaryFilter, DiaryUpdate, NewDiary, Track};
use crate::music::{MusicCatalog, Recommendation};

#[derive(Parser)]
#[command(name = "emotion-diary")]
#[command(
    about = "Diary journal with emotion analysis and music recommendations",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .args(["text", "file"])
        .required(true)
        .multiple(false)
))]
struct TextInput {
    /// Diary text
    #[arg(long)]
    text: Option<String>,
    /// Read the diary text from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TextInput {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            (None, None) => bail!("either --text or --file is required"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo user with sample diary entries
    Seed,
    /// Import diary entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Classify diary text without saving it
    Analyze {
        #[command(flatten)]
        input: TextInput,
        /// Print the score of every emotion
        #[arg(long)]
        explain: bool,
        /// Ask the chat-completion model as well
        #[arg(long)]
        remote: bool,
        /// Record the analysis for this user
        #[arg(long)]
        email: Option<String>,
    },
    /// Write a diary entry, classify it and recommend music
    Write {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        title: String,
        #[command(flatten)]
        input: TextInput,
        /// Store this emotion instead of the classified one
        #[arg(long)]
        emotion: Option<Emotion>,
        #[arg(long)]
        no_music: bool,
    },
    /// Show one diary entry
    Show {
        #[arg(long)]
        email: String,
        #[arg(long)]
        id: Uuid,
    },
    /// Edit a diary entry
    Edit {
        #[arg(long)]
        email: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        emotion: Option<Emotion>,
    },
    /// Delete a diary entry
    Delete {
        #[arg(long)]
        email: String,
        #[arg(long)]
        id: Uuid,
    },
    /// List diary entries, newest first
    #[command(group(
        ArgGroup::new("filter")
            .args(["recent_days", "month", "emotion"])
            .multiple(false)
    ))]
    List {
        #[arg(long)]
        email: String,
        #[arg(long)]
        recent_days: Option<i64>,
        /// Month as YYYY-MM
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        emotion: Option<Emotion>,
    },
    /// Recommend tracks for an emotion
    Recommend {
        #[arg(long)]
        emotion: Emotion,
        #[arg(long, default_value_t = 9)]
        limit: usize,
        /// Bypass the track cache
        #[arg(long)]
        refresh: bool,
        /// Record the recommendation for this user
        #[arg(long)]
        email: Option<String>,
    },
    /// Print entry statistics for a user
    Stats {
        #[arg(long)]
        email: String,
    },
    /// Generate a markdown mood dashboard
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value = "mood-report.md")]
        out: PathBuf,
    },
    /// Print the description shown for an emotion label
    Describe { label: String },
    /// Show which external services are configured
    Health,
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

fn parse_month(value: &str) -> anyhow::Result<DiaryFilter> {
    let (year, month) = value
        .split_once('-')
        .with_context(|| format!("month must look like YYYY-MM, got {value:?}"))?;
    let year: i32 = year.parse().context("invalid year")?;
    let month: u32 = month.parse().context("invalid month")?;
    db::month_bounds(year, month)?;
    Ok(DiaryFilter::Month { year, month })
}

fn print_entry(entry: &DiaryEntry) {
    println!(
        "{} | {} | [{}] {}",
        entry.id,
        entry.created_at.format("%Y-%m-%d %H:%M"),
        entry.emotion,
        entry.title
    );
}

/// Built-in fallback picks are shown but never stored as recommendations.
async fn record_if_catalog(
    pool: &PgPool,
    user_id: Uuid,
    emotion: Emotion,
    recommendation: &Recommendation,
) -> anyhow::Result<()> {
    if !recommendation.source.is_catalog_data() {
        info!("skipping record of built-in tracks for {emotion}");
        return Ok(());
    }
    db::record_recommendations(pool, user_id, emotion, &recommendation.tracks).await
}

fn print_tracks(tracks: &[Track]) {
    for track in tracks {
        let link = track.track_view_url.as_deref().unwrap_or("-");
        println!("- {} / {} ({})", track.track_name, track.artist_name, link);
    }
}

fn print_analysis(analysis: &DiaryAnalysis) {
    println!("Emotion: {}", analysis.emotion);
    println!("Analysis: {}", analysis.analysis);
    println!("Advice: {}", analysis.advice);
    println!("Encouragement: {}", analysis.encouragement);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let http = Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            let inserted = db::seed(&pool, config.max_diary_chars).await?;
            println!("Seed data inserted ({inserted} new entries).");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let inserted = db::import_csv(&pool, &csv, config.max_diary_chars).await?;
            println!("Inserted {inserted} diary entries from {}.", csv.display());
        }
        Commands::Analyze {
            input,
            explain,
            remote,
            email,
        } => {
            let text = input.read()?;
            let scores = classifier::score(&text);
            let emotion = classifier::resolve(&scores);

            println!("{emotion}: {}", emotion.description());
            if explain {
                for (candidate, score) in scores.iter() {
                    println!("  {candidate}: {score:.2}");
                }
            }

            let mut model_answer = None;
            if remote {
                let analyzer = ChatAnalyzer::new(
                    http.clone(),
                    &config.openai_base_url,
                    &config.openai_model,
                    config.openai_api_key.clone(),
                );
                println!();
                match analyzer.analyze(&text).await {
                    Ok(Some(answer)) => {
                        print_analysis(&answer);
                        model_answer = Some(answer);
                    }
                    Ok(None) => {
                        print_analysis(&analysis::fallback_analysis("API 키가 설정되지 않았습니다."))
                    }
                    Err(e) => {
                        warn!("chat analysis failed: {e}");
                        print_analysis(&analysis::fallback_analysis(
                            "일기를 분석하는 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.",
                        ));
                    }
                }
            }

            if let Some(email) = email {
                let pool = connect(&config).await?;
                let user = db::upsert_user(&pool, &email, None).await?;
                let (analysis, kind) = analysis::analysis_to_record(emotion, model_answer);
                db::record_analysis(&pool, user.id, &text, &analysis, kind).await?;
                info!("analysis recorded for {}", user.email);
            }
        }
        Commands::Write {
            email,
            title,
            input,
            emotion,
            no_music,
        } => {
            let content = input.read()?;
            let pool = connect(&config).await?;
            let user = db::upsert_user(&pool, &email, None).await?;
            let diary = NewDiary {
                title,
                content,
                emotion,
                created_at: None,
            };
            let entry = db::create_diary(&pool, user.id, &diary, config.max_diary_chars).await?;

            print_entry(&entry);
            println!("{}", entry.emotion.description());

            if !no_music {
                let catalog =
                    MusicCatalog::new(http.clone(), &config.itunes_base_url, config.music_cache_ttl);
                let recommendation =
                    catalog.recommend(Some(&pool), entry.emotion, 9, false).await?;
                println!();
                println!("Recommended tracks:");
                print_tracks(&recommendation.tracks);
                record_if_catalog(&pool, user.id, entry.emotion, &recommendation).await?;
            }
        }
        Commands::Show { email, id } => {
            let pool = connect(&config).await?;
            let user = db::find_user(&pool, &email).await?;
            let entry = db::get_diary(&pool, user.id, id).await?;
            print_entry(&entry);
            println!();
            println!("{}", entry.content);
        }
        Commands::Edit {
            email,
            id,
            title,
            content,
            emotion,
        } => {
            let pool = connect(&config).await?;
            let user = db::find_user(&pool, &email).await?;
            let update = DiaryUpdate {
                title,
                content,
                emotion,
            };
            let entry =
                db::update_diary(&pool, user.id, id, &update, config.max_diary_chars).await?;
            print_entry(&entry);
        }
        Commands::Delete { email, id } => {
            let pool = connect(&config).await?;
            let user = db::find_user(&pool, &email).await?;
            db::delete_diary(&pool, user.id, id).await?;
            println!("Diary {id} deleted.");
        }
        Commands::List {
            email,
            recent_days,
            month,
            emotion,
        } => {
            let filter = match (recent_days, month, emotion) {
                (Some(days), _, _) => DiaryFilter::RecentDays(days),
                (_, Some(month), _) => parse_month(&month)?,
                (_, _, Some(emotion)) => DiaryFilter::Emotion(emotion),
                _ => DiaryFilter::All,
            };
            let pool = connect(&config).await?;
            let user = db::find_user(&pool, &email).await?;
            let entries = db::list_diaries(&pool, user.id, filter).await?;

            if entries.is_empty() {
                println!("No diary entries found.");
                return Ok(());
            }
            for entry in entries.iter() {
                print_entry(entry);
            }
        }
        Commands::Recommend {
            emotion,
            limit,
            refresh,
            email,
        } => {
            let pool = if config.database_url.is_some() {
                Some(connect(&config).await?)
            } else {
                None
            };
            let catalog =
                MusicCatalog::new(http.clone(), &config.itunes_base_url, config.music_cache_ttl);
            let recommendation = catalog.recommend(pool.as_ref(), emotion, limit, refresh).await?;
            println!("{emotion}: {}", emotion.description());
            print_tracks(&recommendation.tracks);

            if let Some(email) = email {
                let pool = match pool {
                    Some(pool) => pool,
                    None => connect(&config).await?,
                };
                let user = db::upsert_user(&pool, &email, None).await?;
                record_if_catalog(&pool, user.id, emotion, &recommendation).await?;
            }
        }
        Commands::Stats { email } => {
            let pool = connect(&config).await?;
            let user = db::find_user(&pool, &email).await?;
            let entries = db::list_diaries(&pool, user.id, DiaryFilter::All).await?;
            let epoch = chrono::DateTime::from_timestamp(0, 0).context("invalid epoch")?;
            let history = db::fetch_mood_history(&pool, user.id, epoch).await?;

            println!("Total entries: {}", entries.len());
            println!("By emotion:");
            for summary in dashboard::summarize_by_emotion(&history) {
                println!("- {}: {}", summary.emotion, summary.count);
            }
            println!("By month:");
            for month in dashboard::monthly_counts(&entries) {
                println!("- {}: {}", month.month, month.count);
            }
            println!("Recent entries:");
            for entry in entries.iter().take(5) {
                print_entry(entry);
            }
        }
        Commands::Report {
            email,
            since_days,
            out,
        } => {
            let pool = connect(&config).await?;
            let user = db::find_user(&pool, &email).await?;
            let entries =
                db::list_diaries(&pool, user.id, DiaryFilter::RecentDays(since_days)).await?;
            let cutoff = dashboard::cutoff(since_days);
            let history = db::fetch_mood_history(&pool, user.id, cutoff).await?;
            let label = format!("{} <{}>", user.display_name, user.email);
            let report = dashboard::build_report(&label, since_days, cutoff, &entries, &history);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Describe { label } => {
            println!("{}", emotion::describe(&label));
        }
        Commands::Health => {
            let configured = |value: bool| if value { "configured" } else { "not configured" };
            println!("Database: {}", configured(config.database_url.is_some()));
            println!("Chat analysis: {}", configured(config.openai_api_key.is_some()));
            println!("Music catalog: {} (no key required)", config.itunes_base_url);
        }
    }

    Ok(())
}
