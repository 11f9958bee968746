use anyhow::Context;
use attendee_import::utils::logger;
use attendee_import::{
    CliArgs, CommitRequest, ImportEngine, ImportError, ImportPlanFile, ImportSession,
    InMemoryStore,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    logger::init_cli_logger(args.verbose);

    tracing::info!("Starting attendee-import CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let plan = match ImportPlanFile::from_file(&args.plan) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("❌ Failed to load import plan '{}': {}", args.plan.display(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML");
            std::process::exit(1);
        }
    };
    let config = match plan.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let store = if args.store.exists() {
        tracing::info!("loading store snapshot from {}", args.store.display());
        InMemoryStore::load_snapshot(&args.store)
            .with_context(|| format!("cannot load store snapshot {}", args.store.display()))?
    } else {
        tracing::info!("no snapshot at {}, starting with an empty store", args.store.display());
        InMemoryStore::new()
    };
    let engine = ImportEngine::new(store);

    let csv_bytes = std::fs::read(&args.csv)
        .with_context(|| format!("cannot read CSV file {}", args.csv.display()))?;

    let headers = match engine.extract_headers(&csv_bytes) {
        Ok(headers) => headers,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if args.headers_only {
        println!("📋 Headers in {}:", args.csv.display());
        for header in &headers {
            println!("  {}", header);
        }
        return Ok(());
    }

    let session = ImportSession::new().headers_extracted(headers.clone())?;

    let analysis = match engine.analyze(&csv_bytes, &config).await {
        Ok(analysis) => analysis,
        Err(e @ ImportError::Configuration { .. }) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 Fix the column mapping in {} and re-run", args.plan.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("analysis failed"),
    };
    let session = session.analysis_completed(analysis.clone())?;

    for warning in &analysis.warnings {
        tracing::warn!("⚠️ {}", warning);
    }
    println!("📊 Analysis of {} rows:", analysis.rows_read);
    println!("  create:  {}", analysis.attendees_to_create.len());
    println!("  update:  {}", analysis.attendees_to_update.len());
    println!("  invalid: {}", analysis.invalid_rows.len());
    println!("  skipped: {}", analysis.skipped_duplicates);
    if !analysis.new_attributes_to_create.is_empty() {
        println!("  new attributes: {}", analysis.new_attributes_to_create.join(", "));
    }

    std::fs::create_dir_all(&args.output_path)
        .with_context(|| format!("cannot create output directory {}", args.output_path.display()))?;

    let analysis_path = args.output_path.join("analysis.json");
    std::fs::write(&analysis_path, serde_json::to_string_pretty(&analysis)?)?;
    tracing::info!("📁 Analysis written to {}", analysis_path.display());

    if !analysis.invalid_rows.is_empty() {
        let report = engine.error_report(&headers, &analysis.invalid_rows)?;
        let report_path = args.output_path.join("errors.csv");
        std::fs::write(&report_path, report)?;
        println!("📁 Error report written to {}", report_path.display());
    }

    if !args.commit {
        println!("✅ Review complete; re-run with --commit to apply");
        return Ok(());
    }

    let batch = CommitRequest::approving(&analysis);
    if batch.is_empty() {
        println!("✅ Nothing to commit");
        return Ok(());
    }

    match engine.commit(&batch).await {
        Ok(outcome) => {
            let _session = session.commit_completed(outcome)?;
            engine.store().save_snapshot(&args.store).await?;
            println!(
                "✅ Committed {} records ({} created, {} updated, {} new attributes)",
                outcome.committed(),
                outcome.created,
                outcome.updated,
                outcome.attributes_created
            );
            println!("📁 Store snapshot saved to {}", args.store.display());
        }
        Err(e @ ImportError::Conflict { .. }) => {
            tracing::error!("commit aborted, nothing was saved: {}", e);
            eprintln!("❌ {}", e);
            eprintln!("💡 The roster changed since analysis; re-run against fresh state");
            std::process::exit(2);
        }
        Err(e @ ImportError::Persistence { .. }) => {
            eprintln!("❌ Commit failed: {}", e);
            eprintln!("💡 Nothing was saved; retry once the store is reachable");
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("❌ Commit failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
