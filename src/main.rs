// Command-line front end: loads one image, runs one analysis in the chosen
// mode, prints the features and recommendations, and writes whatever outputs
// were asked for.

use anyhow::{Context, bail};
use collage_advisor::config::{self, AppConfig};
use collage_advisor::decision_log::Decision;
use collage_advisor::proxy::HttpProxy;
use collage_advisor::{AnalysisMode, AnalysisSession, OverlayOutcome};
use log::info;
use std::env;
use std::path::PathBuf;

const USAGE: &str = "Usage: collage_advisor <image> [--mode general|direct|diffuse|edit] [--seed N] \
[--config file.json] [--out out.png] [--log log.csv] [--decision accept|skip] \
[--features-json file.json] [--history file.json] [--describe]";

#[derive(Debug, Default)]
struct CliArgs {
    image: PathBuf,
    mode: AnalysisMode,
    seed: Option<u64>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    log: Option<PathBuf>,
    decision: Option<Decision>,
    features_json: Option<PathBuf>,
    history: Option<PathBuf>,
    describe: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut image = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--mode" => parsed.mode = value("--mode")?.parse().map_err(anyhow::Error::msg)?,
            "--seed" => parsed.seed = Some(value("--seed")?.parse().context("--seed must be an integer")?),
            "--config" => parsed.config = Some(value("--config")?.into()),
            "--out" => parsed.out = Some(value("--out")?.into()),
            "--log" => parsed.log = Some(value("--log")?.into()),
            "--decision" => parsed.decision = Some(value("--decision")?.parse().map_err(anyhow::Error::msg)?),
            "--features-json" => parsed.features_json = Some(value("--features-json")?.into()),
            "--history" => parsed.history = Some(value("--history")?.into()),
            "--describe" => parsed.describe = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            path if image.is_none() => image = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument {extra}\n{USAGE}"),
        }
    }
    parsed.image = image.with_context(|| USAGE.to_string())?;
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let mut app_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    if cli.seed.is_some() {
        app_config.seed = cli.seed;
    }

    // --- 2. Session Initialization ---
    let proxy = HttpProxy::new(&app_config.proxy).context("failed to build HTTP client")?;
    let mut session = AnalysisSession::new(app_config, proxy);
    if let Some(path) = &cli.history {
        session.history_mut().load(path)?;
    }
    session
        .load_image(&cli.image)
        .with_context(|| format!("failed to load {}", cli.image.display()))?;

    // --- 3. Analysis ---
    let outcome = session.run(cli.mode).await?;
    let record = session
        .last_analysis()
        .context("analysis produced no record")?;

    let f = &record.features;
    println!("temperature: {}", f.temperature);
    println!("colorfulness: {:.3}", f.colorfulness);
    println!("contrast: {:.3}", f.contrast);
    println!("edge_density: {:.3}", f.edge_density);
    println!("entropy: {:.3}", f.entropy);
    println!("suggested_region: {}", f.suggested_region);
    println!();
    for phrase in &record.recommendations.phrases {
        println!("- {phrase}");
    }

    match &outcome {
        OverlayOutcome::Untouched => {}
        OverlayOutcome::Synthetic(_) => println!("\n{} overlay added.", record.overlay),
        OverlayOutcome::Generated(_) => println!("\nGenerated overlay added."),
        OverlayOutcome::Edited => println!("\nCanvas replaced by edited image."),
        OverlayOutcome::Fallback { reason, .. } => {
            println!("\nGeneration unavailable ({reason}); used local {} overlay.", record.overlay)
        }
    }

    if let Some(path) = &cli.features_json {
        std::fs::write(path, record.features.to_json()?)?;
        info!("features written to {}", path.display());
    }

    // --- 4. Follow-up Actions ---
    if cli.describe {
        match session.describe_canvas().await? {
            Ok(description) => println!("\ndescription: {description:?}"),
            Err(error) => println!("\ndescription unavailable: {error}"),
        }
    }
    if let Some(decision) = cli.decision {
        session.submit_decision(decision)?;
    }
    if let Some(path) = &cli.log {
        session.export_csv(path)?;
        println!("Decision log written to {}", path.display());
    }
    if let Some(path) = &cli.out {
        session.save_canvas(path)?;
        println!("Canvas written to {}", path.display());
    }
    if let Some(path) = &cli.history {
        session.history().save(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_every_flag() {
        let cli = parse_args(&args(&[
            "in.png",
            "--mode",
            "direct",
            "--seed",
            "42",
            "--decision",
            "skip",
            "--out",
            "out.png",
            "--describe",
        ]))
        .unwrap();
        assert_eq!(cli.image, PathBuf::from("in.png"));
        assert_eq!(cli.mode, AnalysisMode::Direct);
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.decision, Some(Decision::Skip));
        assert_eq!(cli.out, Some(PathBuf::from("out.png")));
        assert!(cli.describe);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["in.png", "--mode", "sideways"])).is_err());
        assert!(parse_args(&args(&["in.png", "--seed"])).is_err());
        assert!(parse_args(&args(&["in.png", "--bogus"])).is_err());
        assert!(parse_args(&args(&["a.png", "b.png"])).is_err());
    }
}
