use clap::Parser;
use product_image_etl::adapters::csv_io::read_dataset;
use product_image_etl::domain::model::RunStatus;
use product_image_etl::utils::error::{EnrichError, ErrorSeverity};
use product_image_etl::utils::{logger, validation::Validate};
use product_image_etl::{summarize, CliConfig, EnrichEngine, LocalStorage, StateStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting product-image-etl");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(&config).await {
        report_and_exit(&e);
    }

    Ok(())
}

async fn run(config: &CliConfig) -> Result<(), EnrichError> {
    config.validate()?;
    let enricher_config = config.load_enricher_config()?;

    let input = tokio::fs::read(&config.input).await?;
    let dataset = read_dataset(&input)?;
    println!(
        "Loaded {}: {} rows, {} columns",
        config.input,
        dataset.len(),
        dataset.columns.len()
    );

    let selected_columns = config.selected_columns(&dataset.columns);
    let store = StateStore::new(LocalStorage::new("."), config.state_file.clone());
    let engine = EnrichEngine::from_config(&enricher_config, store, config.output.clone())?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received; stopping after the current row");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let state = engine
        .enrich(&dataset, selected_columns, config.fresh, || {
            stop.load(Ordering::SeqCst)
        })
        .await?;

    let summary = summarize(&state);
    match summary.status {
        RunStatus::Completed => {
            println!("✅ Image links have been added to the dataset.");
            println!("📁 Output saved to: {}", engine.output_path());
        }
        _ => println!(
            "⏸  Stopped at row {}/{}; run the same command again to resume.",
            state.cursor,
            state.total()
        ),
    }
    println!("Products with images: {}", summary.products_with_images);
    println!("Products without images: {}", summary.products_without_images);
    println!("Time elapsed: {:.2} seconds", summary.elapsed_seconds);

    Ok(())
}

fn report_and_exit(e: &EnrichError) -> ! {
    tracing::error!(
        "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
