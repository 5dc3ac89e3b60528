//! Review listings and statistics

use anyhow::Result;
use clap::Args;
use mosctl_core::{
    EvaluationDocument, EvaluationWithParticipant, ParticipantWithCount, Rating, SampleCategory,
    Statistics, Store,
};
use serde::Serialize;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn run_evaluations(store: &Store, args: ReportArgs) -> Result<()> {
    let rows = store.list_evaluations_with_participant().await?;
    match args.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            print!("{}", render_evaluations(&rows));
            Ok(())
        }
    }
}

pub async fn run_participants(store: &Store, args: ReportArgs) -> Result<()> {
    let rows = store.list_participants_with_counts().await?;
    match args.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            print!("{}", render_participants(&rows));
            Ok(())
        }
    }
}

pub async fn run_stats(store: &Store, args: ReportArgs) -> Result<()> {
    let statistics = store.compute_statistics().await?;
    match args.format {
        OutputFormat::Json => print_json(&StatsReport::from(&statistics)),
        OutputFormat::Text => {
            print!("{}", render_stats(&statistics));
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct StatsReport<'a> {
    #[serde(flatten)]
    statistics: &'a Statistics,
    total_ratings: i64,
    overall_average: Option<f64>,
}

impl<'a> From<&'a Statistics> for StatsReport<'a> {
    fn from(statistics: &'a Statistics) -> Self {
        Self {
            statistics,
            total_ratings: statistics.total_ratings(),
            overall_average: statistics.overall_average(),
        }
    }
}

fn render_evaluations(rows: &[EvaluationWithParticipant]) -> String {
    if rows.is_empty() {
        return "No evaluations yet.\n".to_string();
    }

    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "#{:<5} {}  {} <{}>  {} ratings\n",
            row.id,
            row.created_at.format(TIMESTAMP_FORMAT),
            row.participant_name,
            row.participant_email,
            row.document.len()
        ));
        out.push_str(&render_category_summary(&row.document));
    }
    out.push_str(&format!("\n{} evaluation documents\n", rows.len()));
    out
}

/// One line per category present in the document: count and mean score.
fn render_category_summary(document: &EvaluationDocument) -> String {
    let mut out = String::new();
    for category in SampleCategory::ALL {
        let scores: Vec<u8> = document
            .ratings
            .iter()
            .filter(|entry| entry.sample_type == category)
            .map(|entry| entry.rating.value())
            .collect();
        if scores.is_empty() {
            continue;
        }

        let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;
        let label = Rating::new(mean.round() as i64)
            .map(Rating::label)
            .unwrap_or("-");
        out.push_str(&format!(
            "       {:<11} {:>3} ratings  mean {:.2} ({})\n",
            category.as_str(),
            scores.len(),
            mean,
            label
        ));
    }
    out
}

fn render_participants(rows: &[ParticipantWithCount]) -> String {
    if rows.is_empty() {
        return "No participants yet.\n".to_string();
    }

    let mut out = format!(
        "{:<6} {:<24} {:<32} {:<19} {}\n",
        "ID", "NAME", "EMAIL", "REGISTERED", "EVALUATIONS"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<6} {:<24} {:<32} {:<19} {}\n",
            row.id,
            row.name,
            row.email,
            row.created_at.format(TIMESTAMP_FORMAT),
            row.evaluation_count
        ));
    }
    out
}

fn render_stats(statistics: &Statistics) -> String {
    let mut out = format!(
        "Participants:         {}\nEvaluation documents: {}\nRatings:              {}\n",
        statistics.total_participants,
        statistics.total_evaluation_documents,
        statistics.total_ratings()
    );
    match statistics.overall_average() {
        Some(avg) => out.push_str(&format!("Overall average:      {:.2}\n", avg)),
        None => out.push_str("Overall average:      -\n"),
    }

    if statistics.per_model.is_empty() {
        out.push_str("\nNo ratings yet.\n");
        return out;
    }

    out.push_str(&format!(
        "\n{:<6} {:<28} {:>6} {:>7} {:>4} {:>4}\n",
        "MODEL", "NAME", "COUNT", "AVG", "MIN", "MAX"
    ));
    for model in &statistics.per_model {
        out.push_str(&format!(
            "{:<6} {:<28} {:>6} {:>7.2} {:>4} {:>4}\n",
            model.model_id, model.model_name, model.count, model.average, model.min, model.max
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosctl_core::ModelStatistics;

    fn stats(per_model: Vec<ModelStatistics>) -> Statistics {
        Statistics {
            per_model,
            total_participants: 2,
            total_evaluation_documents: 2,
        }
    }

    #[test]
    fn test_render_stats_lists_models() {
        let out = render_stats(&stats(vec![ModelStatistics {
            model_id: "A".into(),
            model_name: "Model A".into(),
            count: 2,
            average: 4.5,
            min: 4,
            max: 5,
        }]));
        assert!(out.contains("Overall average:      4.50"));
        assert!(out.contains("Model A"));
        assert!(out.contains("4.50"));
    }

    #[test]
    fn test_render_stats_empty() {
        let out = render_stats(&stats(Vec::new()));
        assert!(out.contains("Overall average:      -"));
        assert!(out.contains("No ratings yet."));
    }

    #[test]
    fn test_stats_json_includes_derived_totals() {
        let statistics = stats(Vec::new());
        let value = serde_json::to_value(StatsReport::from(&statistics)).unwrap();
        assert_eq!(value["total_participants"], 2);
        assert_eq!(value["total_ratings"], 0);
        assert!(value["overall_average"].is_null());
        assert!(value["per_model"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_category_summary_labels_mean_score() {
        let entry = |sample_type, rating| mosctl_core::RatingEntry {
            sample_type,
            sample_index: 0,
            model_id: "A".into(),
            model_name: "Model A".into(),
            rating: Rating::new(rating).unwrap(),
            audio_path: None,
            original_text: None,
        };
        let document = EvaluationDocument::new(vec![
            entry(SampleCategory::Sunda, 4),
            entry(SampleCategory::Sunda, 5),
            entry(SampleCategory::Sunda, 4),
        ]);

        let out = render_category_summary(&document);
        assert!(out.contains("sunda"));
        assert!(out.contains("mean 4.33 (Good)"));
        assert!(!out.contains("indonesian"));
    }

    #[test]
    fn test_render_empty_listings() {
        assert_eq!(render_evaluations(&[]), "No evaluations yet.\n");
        assert_eq!(render_participants(&[]), "No participants yet.\n");
    }
}
