use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use cropcast_credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, USERS_DB_ENV,
};
use cropcast_model::{
    initialize, resolve_model_dir, shared_context, ArtifactPaths, ModelContext, PredictionRequest,
    StartupPolicy,
};
use cropcast_protocol::PredictResponse;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

mod http_api;
mod routes;
mod server_security;

pub use routes::{build_router, AppState};

pub const PORT_ENV: &str = "PORT";
const DEFAULT_BIND: &str = "127.0.0.1:8000";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "cropcast")]
#[command(about = "Crop yield prediction service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory holding yield_df.csv, scaler.json and model.json (overrides CROPCAST_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction API over HTTP
    Serve(ServeArgs),

    /// Predict a single yield from the command line
    Predict(PredictArgs),

    /// Check that the dataset and artifacts load
    Doctor(DoctorArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address (default 127.0.0.1:8000, or 0.0.0.0:$PORT when PORT is set)
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,

    /// Serve the browser client from this directory
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Credential table path (env: CROPCAST_USERS_DB, default users.json)
    #[arg(long)]
    users_db: Option<PathBuf>,

    /// Keep credentials in memory only
    #[arg(long, conflicts_with = "users_db")]
    ephemeral_users: bool,

    /// Exit instead of serving when the dataset or an artifact fails to load
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long)]
    area: String,

    #[arg(long)]
    item: String,

    #[arg(long)]
    year: i64,

    /// Average rainfall, mm per year
    #[arg(long)]
    rainfall: f64,

    /// Pesticide use, tonnes
    #[arg(long)]
    pesticides: f64,

    /// Average temperature, °C
    #[arg(long)]
    temp: f64,
}

#[derive(Args)]
struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for machine-readable output.
    if matches!(&cli.command, Commands::Doctor(args) if args.json) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let paths = ArtifactPaths::from_model_dir(resolve_model_dir(cli.model_dir.as_deref()));

    match cli.command {
        Commands::Serve(args) => serve_http(args, paths).await?,
        Commands::Predict(args) => run_predict(args, &paths)?,
        Commands::Doctor(args) => run_doctor(args, &paths)?,
    }

    Ok(())
}

/// `--bind` wins; otherwise `PORT` selects a public bind on every interface.
fn resolve_bind(args: &ServeArgs) -> Result<(String, bool)> {
    if let Some(bind) = &args.bind {
        return Ok((bind.clone(), args.public));
    }
    match std::env::var(PORT_ENV) {
        Ok(port) if !port.trim().is_empty() => {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {PORT_ENV} value: {port}"))?;
            Ok((format!("0.0.0.0:{port}"), true))
        }
        _ => Ok((DEFAULT_BIND.to_string(), args.public)),
    }
}

fn credential_store(args: &ServeArgs) -> Arc<dyn CredentialStore> {
    if args.ephemeral_users {
        log::warn!("Credentials are kept in memory and will be lost on restart");
        return Arc::new(MemoryCredentialStore::new());
    }
    let store = match &args.users_db {
        Some(path) => FileCredentialStore::new(path),
        None => FileCredentialStore::from_env(),
    };
    log::info!(
        "Credential table: {} (override with --users-db or {USERS_DB_ENV})",
        store.path().display()
    );
    Arc::new(store)
}

fn static_dir(args: &ServeArgs) -> Option<PathBuf> {
    let dir = args.static_dir.clone()?;
    if dir.is_dir() {
        log::info!("Serving static files from {}", dir.display());
        Some(dir)
    } else {
        log::warn!(
            "Static directory {} does not exist; static hosting disabled",
            dir.display()
        );
        None
    }
}

async fn serve_http(args: ServeArgs, paths: ArtifactPaths) -> Result<()> {
    let (bind, public) = resolve_bind(&args)?;
    let addrs = server_security::resolve_guarded_bind_addrs(&bind, public).await?;
    let addr = server_security::choose_preferred_bind_addr(&addrs)
        .ok_or_else(|| anyhow::anyhow!("Bind address resolved to zero socket addrs: {bind}"))?;

    let policy = if args.strict {
        StartupPolicy::Strict
    } else {
        StartupPolicy::Degraded
    };
    let model = shared_context(&paths, policy).context("Model initialization failed")?;

    let state = AppState {
        model,
        credentials: credential_store(&args),
        static_dir: static_dir(&args),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving prediction API: {base_url}/predict"))?;
    print_stdout(&format!("Health endpoint: {base_url}/health"))?;
    if public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!("Public bind enabled. Resolved addresses: {addrs}"))?;
    }
    print_stdout(&format!("Try: curl {base_url}/config"))?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn load_context(paths: &ArtifactPaths) -> Result<ModelContext> {
    initialize(paths, StartupPolicy::Degraded).context("Model initialization failed")
}

fn run_predict(args: PredictArgs, paths: &ArtifactPaths) -> Result<()> {
    let ctx = load_context(paths)?;
    let prediction = ctx
        .predict(&PredictionRequest {
            region: args.area,
            crop: args.item,
            year: args.year,
            rainfall: args.rainfall,
            pesticide_use: args.pesticides,
            avg_temperature: args.temp,
        })
        .context("Prediction failed")?;
    print_stdout(&serde_json::to_string_pretty(&PredictResponse { prediction })?)?;
    Ok(())
}

fn run_doctor(args: DoctorArgs, paths: &ArtifactPaths) -> Result<()> {
    let report = load_context(paths)?.status();

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        eprintln!("Model dir: {}", paths.model_dir.display());
        eprintln!("Regions: {}", report.regions);
        eprintln!("Crops: {}", report.crops);
        eprintln!(
            "Scaler: {}",
            if report.scaler_loaded { "ok" } else { "missing" }
        );
        eprintln!(
            "Model: {}",
            if report.model_loaded { "ok" } else { "missing" }
        );
        for issue in &report.issues {
            eprintln!("  - {issue}");
        }
    }

    if !report.ready {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args(bind: Option<&str>, public: bool) -> ServeArgs {
        ServeArgs {
            bind: bind.map(str::to_string),
            public,
            static_dir: None,
            users_db: None,
            ephemeral_users: false,
            strict: false,
        }
    }

    #[test]
    fn explicit_bind_ignores_port() {
        let (bind, public) = resolve_bind(&serve_args(Some("127.0.0.1:9000"), false)).unwrap();
        assert_eq!(bind, "127.0.0.1:9000");
        assert!(!public);
    }

    #[test]
    fn cli_parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "cropcast",
            "--model-dir",
            "artifacts",
            "serve",
            "--bind",
            "127.0.0.1:0",
            "--strict",
        ])
        .unwrap();
        assert_eq!(cli.model_dir, Some(PathBuf::from("artifacts")));
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert!(args.strict);
        assert_eq!(args.bind.as_deref(), Some("127.0.0.1:0"));
    }

    #[test]
    fn ephemeral_users_conflicts_with_users_db() {
        assert!(Cli::try_parse_from([
            "cropcast",
            "serve",
            "--ephemeral-users",
            "--users-db",
            "users.json",
        ])
        .is_err());
    }
}
