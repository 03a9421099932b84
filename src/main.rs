use clap::Parser;
use price_compare::config::products::load_products;
use price_compare::core::ConfigProvider;
use price_compare::utils::{logger, validation::Validate};
use price_compare::{build_orchestrator, CliConfig, LocalStorage, PriceConfig, PriceEngine, PriceError};

fn fail(e: &PriceError) -> ! {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting price-compare");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    let mut config = PriceConfig::from_file(&cli.config).unwrap_or_else(|e| fail(&e));
    cli.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        fail(&e);
    }

    let products = load_products(&cli.products).unwrap_or_else(|e| fail(&e));
    tracing::info!("📋 Loaded {} products from {}", products.len(), cli.products);

    let orchestrator = build_orchestrator(&config).unwrap_or_else(|e| fail(&e));

    if cli.dry_run {
        println!("Run: {}", config.run.name);
        println!("Sources (tie-break order):");
        for source_id in orchestrator.source_ids() {
            println!("  - {}", source_id);
        }
        println!("Products:");
        for product in &products {
            println!("  - {} → {}", product.name, price_compare::extract(&product.name));
        }
        return;
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = PriceEngine::from_config(orchestrator, storage, &config).unwrap_or_else(|e| fail(&e));

    match engine.run(products).await {
        Ok(report) => {
            let priced = report
                .records
                .iter()
                .filter(|record| record.best_offer().is_some())
                .count();
            println!(
                "✅ Compared {} products, {} with at least one price",
                report.records.len(),
                priced
            );
            for path in &report.written {
                println!("📁 Output saved to: {}", path);
            }
        }
        Err(e) => fail(&e),
    }
}
