use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::api::{self, MAX_RESULTS_LIMIT};
use crate::core::{
    AgeBracket, CoherenceReport, Product, Profile, RiskPreference, ShortlistEntry, SortDirection,
    SortKey, WorkerKind, sort_catalog,
};
use crate::error::{AppError, RequestError};
use crate::settings::{ServerSettings, Settings};
use crate::state::AppState;
use crate::telemetry;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliAgeBracket {
    Under35,
    #[value(name = "35-50")]
    From35To50,
    Over50,
}

impl From<CliAgeBracket> for AgeBracket {
    fn from(value: CliAgeBracket) -> Self {
        match value {
            CliAgeBracket::Under35 => AgeBracket::Under35,
            CliAgeBracket::From35To50 => AgeBracket::From35To50,
            CliAgeBracket::Over50 => AgeBracket::Over50,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskPreference {
    Low,
    Medium,
    High,
}

impl From<CliRiskPreference> for RiskPreference {
    fn from(value: CliRiskPreference) -> Self {
        match value {
            CliRiskPreference::Low => RiskPreference::Low,
            CliRiskPreference::Medium => RiskPreference::Medium,
            CliRiskPreference::High => RiskPreference::High,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliWorkerKind {
    Employee,
    PublicEmployee,
    SelfEmployed,
    Other,
}

impl From<CliWorkerKind> for WorkerKind {
    fn from(value: CliWorkerKind) -> Self {
        match value {
            CliWorkerKind::Employee => WorkerKind::Employee,
            CliWorkerKind::PublicEmployee => WorkerKind::PublicEmployee,
            CliWorkerKind::SelfEmployed => WorkerKind::SelfEmployed,
            CliWorkerKind::Other => WorkerKind::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSortDirection {
    Asc,
    Desc,
}

impl From<CliSortDirection> for SortDirection {
    fn from(value: CliSortDirection) -> Self {
        match value {
            CliSortDirection::Asc => SortDirection::Asc,
            CliSortDirection::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fundmatch",
    about = "Supplementary pension fund matching: coherence scores, shortlists and fund tables",
    version
)]
struct Cli {
    /// Product catalog JSON; overrides FUNDMATCH_CATALOG
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Rule set JSON; overrides FUNDMATCH_RULES
    #[arg(long, global = true)]
    rules: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank the funds that fit a profile
    Shortlist(ShortlistArgs),
    /// Score how well a category fits a profile
    Coherence(CoherenceArgs),
    /// List the catalog, optionally sorted
    Funds(FundsArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Default)]
struct ProfileArgs {
    #[arg(long, value_enum)]
    age_bracket: Option<CliAgeBracket>,
    #[arg(long, help = "Years until retirement")]
    horizon_years: Option<u32>,
    #[arg(long, value_enum)]
    risk_preference: Option<CliRiskPreference>,
    #[arg(long, help = "Whether a contractual fund (FPN) is already held: true or false")]
    has_fpn: Option<bool>,
    #[arg(long, help = "Contractual category of the held FPN, e.g. COMMERCIO")]
    fpn_category: Option<String>,
    #[arg(long, value_enum)]
    worker_kind: Option<CliWorkerKind>,
    #[arg(long, help = "Monthly contribution in euro (informational)")]
    monthly_contribution: Option<f64>,
}

#[derive(Args, Debug)]
struct ShortlistArgs {
    #[command(flatten)]
    profile: ProfileArgs,
    #[arg(
        long,
        value_parser = clap::value_parser!(u16).range(1..=MAX_RESULTS_LIMIT as i64),
        help = "Number of funds to return; defaults to the rule set's value"
    )]
    max_results: Option<u16>,
}

#[derive(Args, Debug)]
struct CoherenceArgs {
    #[arg(long, help = "Category code, e.g. BIL", conflicts_with = "product_id")]
    category: Option<String>,
    #[arg(long, help = "Catalog product id; its category is scored")]
    product_id: Option<String>,
    #[command(flatten)]
    profile: ProfileArgs,
}

#[derive(Args, Debug)]
struct FundsArgs {
    #[arg(long, help = "Column to sort by, e.g. isc35y, return10y, name")]
    sort_key: Option<String>,
    #[arg(long, value_enum, default_value_t = CliSortDirection::Asc)]
    direction: CliSortDirection,
}

pub async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    telemetry::init(&settings.telemetry)?;

    let catalog_path = cli.catalog.or_else(|| settings.catalog_path.clone());
    let rules_path = cli.rules.or_else(|| settings.rules_path.clone());
    let state = AppState::load(catalog_path.as_deref(), rules_path.as_deref())?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => serve(args, settings.server, state).await,
        Command::Shortlist(args) => print_json(&shortlist_command(&state, &args)?),
        Command::Coherence(args) => print_json(&coherence_command(&state, &args)?),
        Command::Funds(args) => print_json(&funds_command(&state, &args)?),
    }
}

async fn serve(
    args: ServeArgs,
    mut server: ServerSettings,
    state: AppState,
) -> Result<(), AppError> {
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }
    let addr = server.socket_addr()?;
    api::run_http_server(addr, state).await?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn profile_from_args(args: &ProfileArgs) -> Result<Profile, RequestError> {
    if let Some(amount) = args.monthly_contribution {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RequestError::MonthlyContribution);
        }
    }
    Ok(Profile {
        age_bracket: args.age_bracket.map(Into::into),
        horizon_years: args.horizon_years,
        risk_preference: args.risk_preference.map(Into::into),
        has_fpn: args.has_fpn,
        fpn_category: args.fpn_category.clone(),
        worker_kind: args.worker_kind.map(Into::into),
        monthly_contribution: args.monthly_contribution,
    })
}

fn shortlist_command<'a>(
    state: &'a AppState,
    args: &ShortlistArgs,
) -> Result<Vec<ShortlistEntry<'a>>, RequestError> {
    let profile = profile_from_args(&args.profile)?;
    let max_results = args.max_results.map(usize::from);
    Ok(state
        .engine
        .shortlist(state.catalog.products(), &profile, max_results))
}

fn coherence_command(
    state: &AppState,
    args: &CoherenceArgs,
) -> Result<CoherenceReport, RequestError> {
    let profile = profile_from_args(&args.profile)?;
    let category = match &args.product_id {
        Some(id) => state
            .catalog
            .get(id)
            .ok_or_else(|| RequestError::UnknownProduct(id.clone()))?
            .category_code(),
        None => args.category.as_deref(),
    };
    Ok(state.engine.explain_coherence(category, &profile))
}

fn funds_command<'a>(
    state: &'a AppState,
    args: &FundsArgs,
) -> Result<Vec<&'a Product>, RequestError> {
    let products = state.catalog.products();
    match args.sort_key.as_deref() {
        None => Ok(products.iter().collect()),
        Some(raw) => {
            let key =
                SortKey::parse(raw).ok_or_else(|| RequestError::UnknownSortKey(raw.to_string()))?;
            Ok(sort_catalog(products, key, args.direction.into()))
        }
    }
}
