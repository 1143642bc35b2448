use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use locator_forge::{DocumentQuery, LocatorConfig, LocatorError, Query, SmartLocator, StaticDocument};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn cli() -> Command {
    let source_args = [
        Arg::new("html")
            .long("html")
            .value_name("FILE")
            .help("Read the document from an HTML file")
            .conflicts_with("url"),
        Arg::new("url")
            .long("url")
            .value_name("URL")
            .help("Load the document in headless Chrome"),
        Arg::new("show-browser")
            .long("show-browser")
            .help("Run Chrome with a visible window")
            .action(ArgAction::SetTrue),
    ];

    Command::new("locator-forge")
        .about("Generate, validate and rank element locators")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("JSON locator configuration"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info")
                .global(true)
                .help("Log level when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate strategies for the first element matching a selector")
                .args(source_args.clone())
                .arg(Arg::new("selector").long("selector").required(true))
                .arg(
                    Arg::new("validate")
                        .long("validate")
                        .help("Validate strategies against the document")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("describe")
                .about("Report all and valid strategies for a selector, or alternatives if it is broken")
                .args(source_args.clone())
                .arg(Arg::new("selector").long("selector").required(true)),
        )
        .subcommand(
            Command::new("find")
                .about("Build a composite locator from visible text")
                .args(source_args)
                .arg(
                    Arg::new("text")
                        .long("text")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Target text; repeat for alternative phrasings"),
                )
                .arg(
                    Arg::new("related")
                        .long("related")
                        .help("Unique text sharing a container with the target"),
                ),
        )
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<LocatorConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => LocatorConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path)),
        None => Ok(LocatorConfig::default()),
    }
}

async fn open_document(matches: &ArgMatches) -> Result<Box<dyn DocumentQuery>> {
    if let Some(path) = matches.get_one::<String>("html") {
        let document = StaticDocument::from_file(path)
            .with_context(|| format!("failed to read {}", path))?;
        info!("Parsed {} ({} elements)", path, document.tree().len());
        return Ok(Box::new(document));
    }

    if let Some(raw) = matches.get_one::<String>("url") {
        let url = url::Url::parse(raw).with_context(|| format!("invalid URL '{}'", raw))?;
        return open_url(&url, !matches.get_flag("show-browser")).await;
    }

    bail!("either --html or --url is required")
}

#[cfg(feature = "chrome")]
async fn open_url(url: &url::Url, headless: bool) -> Result<Box<dyn DocumentQuery>> {
    let document = locator_forge::ChromeDocument::launch(url.as_str(), headless).await?;
    Ok(Box::new(document))
}

#[cfg(not(feature = "chrome"))]
async fn open_url(url: &url::Url, _headless: bool) -> Result<Box<dyn DocumentQuery>> {
    bail!("cannot load {}: built without the chrome feature", url)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn first_match(document: &dyn DocumentQuery, selector: &str) -> Result<locator_forge::ElementHandle> {
    let query = Query::parse(selector)?;
    document
        .query(&query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| LocatorError::ElementNotFound(selector.to_string()).into())
}

async fn generate(locator: &SmartLocator, matches: &ArgMatches) -> Result<()> {
    let document = open_document(matches).await?;
    let selector = matches
        .get_one::<String>("selector")
        .context("--selector is required")?;
    let handle = first_match(document.as_ref(), selector).await?;

    let result = if matches.get_flag("validate") {
        locator.locate(document.as_ref(), handle).await?
    } else {
        let snapshot = document.capture_snapshot(handle).await?;
        locator.generate_strategies(&snapshot)
    };
    print_json(&result)
}

async fn describe(locator: &SmartLocator, matches: &ArgMatches) -> Result<()> {
    let document = open_document(matches).await?;
    let selector = matches
        .get_one::<String>("selector")
        .context("--selector is required")?;

    match locator.describe_strategies(document.as_ref(), selector).await {
        Ok(report) => print_json(&report),
        Err(LocatorError::ElementNotFound(_)) => {
            warn!("'{}' matches nothing, searching for alternatives", selector);
            let alternatives = locator.suggest_alternatives(document.as_ref(), selector).await;
            if alternatives.is_empty() {
                bail!("'{}' matches nothing and no alternative resolves", selector);
            }
            print_json(&alternatives)
        }
        Err(e) => Err(e.into()),
    }
}

async fn find(locator: &SmartLocator, matches: &ArgMatches) -> Result<()> {
    let document = open_document(matches).await?;
    let texts: Vec<String> = matches
        .get_many::<String>("text")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let composite = match matches.get_one::<String>("related") {
        Some(related) => {
            let target = texts.first().context("--text is required")?;
            locator
                .find_by_related_text(document.as_ref(), target, related, None)
                .await?
        }
        None => locator.find_by_text(document.as_ref(), &texts).await?,
    };

    let resolved = composite.resolve(document.as_ref()).await?;
    info!("Composite locator resolves to {:?}", resolved);
    print_json(&composite.selectors())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    init_logging(level);

    let config = load_config(&matches)?;
    let locator = SmartLocator::new(config);

    match matches.subcommand() {
        Some(("generate", sub)) => generate(&locator, sub).await,
        Some(("describe", sub)) => describe(&locator, sub).await,
        Some(("find", sub)) => find(&locator, sub).await,
        _ => bail!("unknown command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_find_accepts_repeated_text() {
        let matches = cli()
            .try_get_matches_from([
                "locator-forge",
                "find",
                "--html",
                "page.html",
                "--text",
                "Sign in",
                "--text",
                "Log in",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let texts: Vec<&String> = sub.get_many::<String>("text").unwrap().collect();
        assert_eq!(texts, ["Sign in", "Log in"]);
    }

    #[test]
    fn test_html_and_url_conflict() {
        let result = cli().try_get_matches_from([
            "locator-forge",
            "describe",
            "--html",
            "page.html",
            "--url",
            "https://example.com",
            "--selector",
            "#email",
        ]);
        assert!(result.is_err());
    }
}
