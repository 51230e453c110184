use clap::Parser;
use shift_report_etl::core::{ConfigProvider, InboundMessage};
use shift_report_etl::utils::error::{EtlError, ErrorSeverity};
use shift_report_etl::utils::{logger, validation::Validate};
use shift_report_etl::{
    parse_message, CliConfig, EtlEngine, LineReplyClient, LocalStorage, ReportPipeline,
    TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting shift-report-etl CLI");

    if let Err(e) = config.validate() {
        exit_with(&e, "Configuration validation failed");
    }

    let result = match config.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let toml_config = match TomlConfig::from_file(&path) {
                Ok(toml_config) => toml_config,
                Err(e) => exit_with(&e, "Failed to load config file"),
            };
            if let Err(e) = toml_config.validate() {
                exit_with(&e, "Configuration validation failed");
            }
            tracing::info!("Running as service '{}'", toml_config.service_name());
            run(&config, toml_config).await
        }
        None => run(&config, config.clone()).await,
    };

    if let Err(e) = result {
        exit_with(&e, "Report processing failed");
    }

    Ok(())
}

async fn run<C: ConfigProvider>(cli: &CliConfig, config: C) -> shift_report_etl::Result<()> {
    let input_path = cli
        .payload
        .as_deref()
        .or(cli.message.as_deref())
        .unwrap_or_default();
    let input = std::fs::read_to_string(input_path)?;

    if cli.dry_run {
        let text = match &cli.payload {
            Some(_) => shift_report_etl::core::webhook::WebhookPayload::from_json(&input)?
                .into_message()?
                .text,
            None => input,
        };
        let report = parse_message(&text)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let replier = LineReplyClient::from_config(&config);
    let engine = EtlEngine::new(ReportPipeline::new(storage, config, replier));

    let summary = match &cli.payload {
        Some(_) => engine.run(&input).await?,
        None => engine.process(InboundMessage::new(input)).await?,
    };

    println!("✅ Report saved");
    println!(
        "📁 {} row(s) -> {}/{}",
        summary.main_rows,
        engine.pipeline().config().output_path(),
        summary.main_sheet
    );
    if summary.sub_entry_rows > 0 {
        println!(
            "📁 {} row(s) -> {}/{}",
            summary.sub_entry_rows,
            engine.pipeline().config().output_path(),
            summary.report_sheet
        );
    }

    Ok(())
}

fn exit_with(e: &EtlError, context: &str) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
