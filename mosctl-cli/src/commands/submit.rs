//! Scripted submission from a ratings file

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mosctl_core::{
    EvaluationDocument, MosError, ParticipantIdentity, Rating, RatingEntry, RatingSession, Store,
    ValidationError,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Participant name
    #[arg(long)]
    pub name: String,

    /// Participant contact e-mail
    #[arg(long)]
    pub email: String,

    /// JSON file with a `ratings` array (`-` reads stdin)
    #[arg(long, value_name = "FILE")]
    pub ratings: PathBuf,

    /// Submit even if this e-mail has submitted before
    #[arg(long)]
    pub force: bool,
}

pub async fn run_submit(store: &Store, args: SubmitArgs) -> Result<()> {
    let identity = ParticipantIdentity::new(&args.name, &args.email).map_err(MosError::from)?;
    let document = read_document(&args.ratings)?;

    store.ensure_schema().await?;

    if let Some(existing) = store.find_participant_by_contact(identity.contact()).await? {
        println!(
            "⚠️  {} already submitted as \"{}\" (participant #{}).",
            identity.contact(),
            existing.name,
            existing.id
        );
        if !args.force
            && !super::confirm("Submit another evaluation?", "pass --force to submit again")?
        {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let receipt = store.submit(&identity, &document).await?;
    println!(
        "✅ Saved {} ratings for {} (participant #{}, evaluation #{})",
        receipt.rating_count,
        identity.name(),
        receipt.participant_id,
        receipt.evaluation_id
    );
    Ok(())
}

/// Ratings file as written by hand; values are checked when converted.
#[derive(Debug, Deserialize)]
struct RatingsFile {
    ratings: Vec<RatingsFileEntry>,
}

#[derive(Debug, Deserialize)]
struct RatingsFileEntry {
    sample_type: String,
    sample_index: u32,
    model_id: String,
    model_name: String,
    rating: i64,
    #[serde(default)]
    audio_path: Option<String>,
    #[serde(default)]
    original_text: Option<String>,
}

impl RatingsFileEntry {
    fn into_entry(self) -> Result<RatingEntry, ValidationError> {
        Ok(RatingEntry {
            sample_type: self.sample_type.parse()?,
            sample_index: self.sample_index,
            model_id: self.model_id,
            model_name: self.model_name,
            rating: Rating::new(self.rating)?,
            audio_path: self.audio_path,
            original_text: self.original_text,
        })
    }
}

/// Parse the ratings file and collapse re-rated slots, keeping the last rating.
fn read_document(path: &PathBuf) -> Result<EvaluationDocument> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read ratings from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ratings file {}", path.display()))?
    };

    let parsed: RatingsFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid ratings document in {}", path.display()))?;
    let submitted = parsed.ratings.len();

    let entries = parsed
        .ratings
        .into_iter()
        .map(RatingsFileEntry::into_entry)
        .collect::<Result<Vec<_>, _>>()
        .map_err(MosError::from)?;
    let session: RatingSession = entries.into_iter().collect();
    if session.len() < submitted {
        warn!(
            submitted,
            kept = session.len(),
            "duplicate rating slots in file; keeping the last rating for each"
        );
    }

    let document = session.into_document();
    document.validate().map_err(MosError::from)?;
    Ok(document)
}
