use company_enricher::driver::{EnrichmentDriver, SessionPolicy};
use company_enricher::llm::{model_from_config, CompanyEnricher, EnrichmentEvent};
use company_enricher::storage::{load_company_names, store_from_config};
use company_enricher::{Config, ResultStore};
use log::info;
use std::error::Error;
use tokio::sync::mpsc;

fn configure_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();
}

fn print_event(event: EnrichmentEvent) {
    match event {
        EnrichmentEvent::Starting { total } => println!("🚀 Enriching {} companies", total),
        EnrichmentEvent::Enriched { index, record, .. } => match serde_json::to_string(&record) {
            Ok(json) => println!("{} {}", index, json),
            Err(e) => println!("{} <unprintable record: {}>", index, e),
        },
        EnrichmentEvent::Skipped { index, reason, .. } => println!("{} {}", index, reason),
        EnrichmentEvent::Finished { succeeded, failed } => {
            println!("✅ Done: {} enriched, {} skipped", succeeded, failed)
        }
        EnrichmentEvent::Analyzing { .. } | EnrichmentEvent::Extracting { .. } => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    configure_logging();

    let config = Config::from_env()?;
    info!(
        "Using {} model '{}' (temperature {})",
        config.model.provider, config.model.model, config.model.temperature
    );

    let store = store_from_config(&config.source);
    let companies = load_company_names(store.as_ref(), &config.companies_key).await?;

    let mut enricher = CompanyEnricher::new(model_from_config(&config.model))?;
    if config.few_shot {
        enricher = enricher.with_default_examples();
    }
    let policy = if config.shared_session {
        SessionPolicy::Shared
    } else {
        SessionPolicy::PerCompany
    };

    let (tx, mut rx) = mpsc::channel(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(event);
        }
    });

    let report = EnrichmentDriver::new(enricher, ResultStore::new(&config.output_path))
        .with_session_policy(policy)
        .with_progress(tx)
        .run(&companies)
        .await;
    printer.await?;
    let report = report?;

    info!(
        "Wrote {} records to {}",
        report.records.len(),
        config.output_path.display()
    );
    Ok(())
}
