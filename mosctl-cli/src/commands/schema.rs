//! Schema setup and legacy migration commands

use anyhow::Result;
use clap::Args;
use mosctl_core::{MigrationOutcome, Store};
use tracing::info;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn run_init(store: &Store) -> Result<()> {
    println!("🗄️  Database: {}", store.config().describe());
    let status = store.ensure_schema().await?;

    if status.legacy_detected {
        println!("⚠️  Legacy per-rating evaluations table detected.");
        println!("   Run `mosctl migrate` to convert it into documents.");
    } else {
        println!("✅ Schema ready");
    }
    Ok(())
}

pub async fn run_migrate(store: &Store, args: MigrateArgs) -> Result<()> {
    let inspection = store.inspect_legacy_schema().await?;
    if !inspection.legacy_detected {
        println!("✅ Evaluations are already stored as documents; nothing to migrate.");
        return Ok(());
    }

    println!("🗄️  Database: {}", store.config().describe());
    println!(
        "Found {} legacy rating rows, to be folded into {} evaluation documents.",
        inspection.rating_rows, inspection.documents
    );
    println!("The legacy table is kept as a backup copy; the live table is rebuilt.");
    println!("Stop anything else writing to this database before continuing.");

    if !args.yes && !super::confirm("Migrate now?", "pass --yes to migrate")? {
        println!("Cancelled.");
        return Ok(());
    }

    match store.migrate_legacy_schema().await? {
        MigrationOutcome::AlreadyMigrated => {
            println!("✅ Nothing to migrate (already converted).");
        }
        MigrationOutcome::Migrated {
            documents,
            ratings,
            backup_table,
        } => {
            info!(documents, ratings, backup = %backup_table, "legacy migration finished");
            println!(
                "✅ Migrated {} ratings into {} documents (backup: {})",
                ratings, documents, backup_table
            );
        }
    }
    Ok(())
}
