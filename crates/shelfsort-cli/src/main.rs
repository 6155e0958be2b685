use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use shelfsort_core::category::{LocalReason, Tier};
use shelfsort_core::config::Config;
use shelfsort_core::{
    load_products, ClassificationResult, Classifier, ProductInput, ReclassifyDecision,
    ReclassifyReport, Reclassifier, Result, ShelfsortError,
};

mod args;
use args::{Cli, Commands, ConfigAction, ProductArgs, RulesAction, Shell};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);

    let result = match cli.command {
        Commands::Classify {
            product,
            vision,
            json,
            top,
        } => handle_classify(&base_dir, product, vision, json, top).await,
        Commands::Batch {
            file,
            vision,
            min_confidence,
            json,
        } => handle_batch(&base_dir, &file, vision, min_confidence, json).await,
        Commands::Rules { action } => handle_rules(action, &base_dir),
        Commands::Config { action } => handle_config(action, &base_dir),
        Commands::Completions { shell } => {
            handle_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "shelfsort", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("SHELFSORT_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".shelfsort"))
        .unwrap_or_else(|| PathBuf::from(".shelfsort"))
}

/// Classifier for the configured registry, with vision wired when asked.
///
/// Returns the API key to use alongside it; `None` disables escalation.
fn build_classifier(
    config: &Config,
    base_dir: &Path,
    vision: bool,
) -> Result<(Classifier, Option<String>)> {
    let registry = Arc::new(config.build_registry(base_dir)?);
    let classifier = Classifier::local(registry);

    if !vision {
        return Ok((classifier, None));
    }

    let command = config
        .vision_command()
        .ok_or_else(|| ShelfsortError::InvalidConfigValue {
            key: "vision.command".to_string(),
            message: "not set (see `shelfsort config set vision.command <program>`)".to_string(),
        })?;

    let api_key = config.api_key();
    if api_key.is_none() {
        tracing::warn!(
            env = %config.vision.api_key_env,
            "no API key found; vision escalation disabled"
        );
    }

    tracing::debug!(
        program = command.program(),
        rules = classifier.registry().len(),
        "vision escalation enabled"
    );

    Ok((classifier.with_vision(Arc::new(command)), api_key))
}

/// Cancel outstanding vision calls on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; finishing with local results");
            trigger.cancel();
        }
    });
    token
}

fn read_product(args: ProductArgs) -> Result<ProductInput> {
    if let Some(path) = args.file {
        let content = fs::read_to_string(&path)?;
        return serde_json::from_str(&content).map_err(|e| ShelfsortError::ProductParse {
            path,
            message: e.to_string(),
        });
    }

    Ok(ProductInput {
        name: args.name.unwrap_or_default(),
        name_ar: args.name_ar.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
        breadcrumbs: args.breadcrumb,
        url: args.url.unwrap_or_default(),
        image_urls: args.image,
    })
}

async fn handle_classify(
    base_dir: &Path,
    product: ProductArgs,
    vision: bool,
    json: bool,
    top: usize,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let (classifier, api_key) = build_classifier(&config, base_dir, vision)?;
    let product = read_product(product)?;

    if !vision {
        let result = classifier.classify(&product);
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result, top);
            println!();
        }
        return Ok(());
    }

    let cancel = cancel_on_ctrl_c();
    let outcome = classifier
        .classify_with_vision_cancellable(&product, api_key.as_deref(), &cancel)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_result(&outcome.result, top);
    let tier = match (outcome.tier, outcome.local_reason) {
        (Tier::Escalated, _) => format!("escalated (tags: {})", outcome.tags.join(", ")),
        (Tier::Local, Some(reason)) => format!("local ({})", describe_reason(reason)),
        (Tier::Local, None) => "local".to_string(),
    };
    println!("{:<12}{}", "Tier:", tier);
    println!();
    Ok(())
}

fn print_result(result: &ClassificationResult, top: usize) {
    println!();
    let category = if result.is_uncategorized() {
        result.category_id.yellow()
    } else {
        result.category_id.green().bold()
    };
    println!("{:<12}{}", "Category:", category);
    println!("{:<12}{}", "Confidence:", result.confidence);
    println!(
        "{:<12}{}",
        "Ambiguous:",
        if result.is_ambiguous {
            "yes".yellow()
        } else {
            "no".normal()
        }
    );

    let ranked = result.ranked_scores();
    if top > 0 && !ranked.is_empty() {
        println!();
        println!("Scores:");
        for (id, score) in ranked.into_iter().take(top) {
            println!("  {:<20} {:>5}", id.cyan(), score);
        }
    }
}

fn describe_reason(reason: LocalReason) -> &'static str {
    match reason {
        LocalReason::Confident => "confident",
        LocalReason::NoApiKey => "no API key",
        LocalReason::NoImage => "no usable image",
        LocalReason::NoTags => "vision returned no tags",
        LocalReason::VisionFailed => "vision failed",
        LocalReason::Cancelled => "cancelled",
    }
}

async fn handle_batch(
    base_dir: &Path,
    file: &Path,
    vision: bool,
    min_confidence: Option<i64>,
    json: bool,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let (classifier, api_key) = build_classifier(&config, base_dir, vision)?;
    let products = load_products(file)?;

    let reclassifier = Reclassifier::new(classifier)
        .with_min_confidence(min_confidence.unwrap_or(config.reclassify.min_confidence));

    let report = if vision {
        let cancel = cancel_on_ctrl_c();
        reclassifier
            .run_with_vision(&products, api_key.as_deref(), &cancel)
            .await
    } else {
        reclassifier.run_local(&products)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &ReclassifyReport) {
    println!();
    for entry in &report.entries {
        let marker = if entry.tier == Tier::Escalated { " [vision]" } else { "" };
        match &entry.decision {
            ReclassifyDecision::Apply { category_id } => println!(
                "  {} #{:<4} {} -> {} ({}){}",
                "[apply]".green(),
                entry.index,
                entry.name,
                category_id.bold(),
                entry.result.confidence,
                marker
            ),
            ReclassifyDecision::Skip { reason } => println!(
                "  {}  #{:<4} {} ({:?}, confidence {}){}",
                "[skip]".dimmed(),
                entry.index,
                entry.name,
                reason,
                entry.result.confidence,
                marker
            ),
        }
    }

    let summary = report.summary;
    println!();
    println!(
        "{} {} products, {} updated, {} skipped, {} escalated",
        "Processed:".green(),
        summary.processed,
        summary.updated,
        summary.skipped,
        summary.escalated
    );
    println!();
}

fn handle_rules(action: RulesAction, base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;
    let registry = config.build_registry(base_dir)?;

    match action {
        RulesAction::List => {
            println!();
            for (position, rule) in registry.iter().enumerate() {
                println!(
                    "  {:>2}. {:<20} weight {:>3}  {} keywords",
                    position + 1,
                    rule.id.cyan(),
                    rule.weight,
                    rule.keywords.len()
                );
            }
            println!();
        }
        RulesAction::Show { id } => {
            let rule = registry
                .get(&id)
                .ok_or(ShelfsortError::RuleNotFound { id: id.clone() })?;
            println!();
            println!("{} {}", "Rule:".green(), rule.id.bold());
            println!("  weight:        {}", rule.weight);
            println!("  keywords:      {}", rule.keywords.join(", "));
            if !rule.weak_keywords.is_empty() {
                println!("  weak keywords: {}", rule.weak_keywords.join(", "));
            }
            if !rule.negative.is_empty() {
                println!("  negative:      {}", rule.negative.join(", "));
            }
            println!();
        }
    }

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(ShelfsortError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
