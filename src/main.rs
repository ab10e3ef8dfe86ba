use clap::{Parser, Subcommand};
use config::Config;
use powerwall_fleet_rs::api::{self, Client, Error};
use powerwall_fleet_rs::LogDiagnostics;
use serde::Serialize;
use std::process;
use std::sync::Arc;

const EXIT_API_ERROR: i32 = 1;
const EXIT_SETUP: i32 = 2;
const EXIT_USAGE: i32 = 3;
const EXIT_UNSUPPORTED: i32 = 4;
const EXIT_TOKEN_EXPIRED: i32 = 5;
const EXIT_RATE_LIMITED: i32 = 6;

#[derive(Clone, serde::Deserialize)]
pub struct FleetConfig {
    api_url: String,
    auth_url: String,
    client_id: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    site_id: Option<i64>,
}

impl FleetConfig {
    /// `(client_id, access_token, refresh_token)` when all three are set and non-empty.
    fn credentials(&self) -> Option<(String, String, String)> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Some((
            non_empty(&self.client_id)?,
            non_empty(&self.access_token)?,
            non_empty(&self.refresh_token)?,
        ))
    }
}

pub fn read_settings() -> Result<FleetConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("FLEET"))?
        .set_default("api_url", api::API_URL)?
        .set_default("auth_url", api::AUTH_URL)?;

    settings.try_into()
}

#[derive(Parser)]
#[command(name = "powerwall-fleet")]
#[command(version, about = "Query and control a Powerwall energy site through the Tesla Fleet API")]
#[command(
    long_about = "Query and control a Powerwall energy site through the Tesla Fleet API.\n\
    \nCredentials are read from the environment:\n  \
    FLEET_CLIENT_ID      OAuth client ID of your registered Fleet API app\n  \
    FLEET_ACCESS_TOKEN   Fleet API access token\n  \
    FLEET_REFRESH_TOKEN  Fleet API refresh token\n  \
    FLEET_SITE_ID        energy site ID (optional, the first site is used otherwise)"
)]
struct Cli {
    /// Enable debug messages
    #[arg(long)]
    debug: bool,

    /// Energy site ID (overrides FLEET_SITE_ID)
    #[arg(long)]
    site_id: Option<i64>,

    /// Print client metrics to stderr when done
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
enum Command {
    /// List energy products/sites
    Products,
    /// Real-time system status
    Status,
    /// Site configuration
    SiteInfo,
    /// Power flow per meter category
    Aggregates,
    /// Battery state of energy
    Soe,
    /// Grid connection status
    GridStatus,
    /// Raw live status snapshot
    LiveStatus,
    /// Charge telemetry between two dates (YYYY-MM-DD)
    TelemetryHistory {
        start_date: String,
        end_date: String,
        time_zone: Option<String>,
    },
    /// Energy totals per period (day, week, month, year)
    EnergyHistory {
        start_date: String,
        end_date: String,
        period: String,
        time_zone: Option<String>,
    },
    /// Backup events per period (day, week, month, year)
    BackupHistory {
        start_date: String,
        end_date: String,
        period: String,
        time_zone: Option<String>,
    },
    /// Calendar history of kind energy or backup
    CalendarHistory {
        kind: String,
        start_date: String,
        end_date: String,
        period: String,
        time_zone: Option<String>,
    },
    /// Set backup reserve percentage (0-100)
    SetBackupReserve {
        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },
    /// Enable/disable Storm Watch
    SetStormMode {
        /// `true` enables, anything else disables
        enabled: String,
    },
    /// Set site display name
    SetSiteName {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Unsupported by the Fleet API
    Operation,
    /// Unsupported by the Fleet API
    SystemStatus,
    /// Unsupported by the Fleet API
    Sitemaster,
    /// Unsupported by the Fleet API
    Networks,
    /// Unsupported by the Fleet API
    GridFaults,
    /// Unsupported by the Fleet API
    Meters {
        #[arg(default_value = "site")]
        category: String,
    },
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// Pretty-print `value` as JSON with four-space indentation.
fn write_result<T: Serialize>(value: &T) -> api::Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::Internal(format!("Error serializing result: {}", e)))?;

    println!("{}", String::from_utf8_lossy(&buffer));
    Ok(())
}

async fn run(client: &Client, command: Command) -> api::Result<()> {
    match command {
        Command::Products => write_result(&client.energy_products().await?),
        Command::Status => write_result(&client.status().await?),
        Command::SiteInfo => write_result(&client.site_info().await?),
        Command::Aggregates => write_result(&client.meters_aggregates().await?),
        Command::Soe => write_result(&client.soe().await?),
        Command::GridStatus => write_result(&client.grid_status().await?),
        Command::LiveStatus => write_result(&client.live_status().await?),
        Command::TelemetryHistory {
            start_date,
            end_date,
            time_zone,
        } => write_result(
            &client
                .telemetry_history(&start_date, &end_date, time_zone.as_deref())
                .await?,
        ),
        Command::EnergyHistory {
            start_date,
            end_date,
            period,
            time_zone,
        } => write_result(
            &client
                .energy_history(&start_date, &end_date, &period, time_zone.as_deref())
                .await?,
        ),
        Command::BackupHistory {
            start_date,
            end_date,
            period,
            time_zone,
        } => write_result(
            &client
                .backup_history(&start_date, &end_date, &period, time_zone.as_deref())
                .await?,
        ),
        Command::CalendarHistory {
            kind,
            start_date,
            end_date,
            period,
            time_zone,
        } => write_result(
            &client
                .calendar_history(&kind, &start_date, &end_date, &period, time_zone.as_deref())
                .await?,
        ),
        Command::SetBackupReserve { percent } => {
            client.set_backup_reserve(percent).await?;
            println!("Backup reserve set to {}%", percent);
            Ok(())
        }
        Command::SetStormMode { enabled } => {
            let enabled = enabled.eq_ignore_ascii_case("true");
            client.set_storm_mode(enabled).await?;
            println!("Storm mode {}", if enabled { "enabled" } else { "disabled" });
            Ok(())
        }
        Command::SetSiteName { name } => {
            let name = name.join(" ");
            client.set_site_name(&name).await?;
            println!("Site name set to: {}", name);
            Ok(())
        }
        Command::Operation => write_result(&client.operation()?),
        Command::SystemStatus => write_result(&client.system_status()?),
        Command::Sitemaster => write_result(&client.sitemaster()?),
        Command::Networks => write_result(&client.networks()?),
        Command::GridFaults => write_result(&client.grid_faults()?),
        Command::Meters { category } => write_result(&client.meters(&category)?),
    }
}

/// Report `err` on stderr and return the exit code for its kind.
fn report_error(err: &Error) -> i32 {
    match err {
        Error::Unsupported { reason, .. } => {
            eprintln!("Unsupported operation: {}", reason);
            EXIT_UNSUPPORTED
        }
        Error::TokenExpired { .. } => {
            eprintln!("Token expired: {}", err);
            eprintln!("Please refresh your FLEET_ACCESS_TOKEN and FLEET_REFRESH_TOKEN");
            EXIT_TOKEN_EXPIRED
        }
        Error::RateLimited { .. } => {
            eprintln!("Rate limit exceeded: {}", err);
            EXIT_RATE_LIMITED
        }
        _ => {
            eprintln!("API error: {}", err);
            EXIT_API_ERROR
        }
    }
}

fn missing_credentials() -> ! {
    eprintln!("Error: FLEET_ACCESS_TOKEN, FLEET_REFRESH_TOKEN, and FLEET_CLIENT_ID environment variables are required\n");
    eprintln!("Environment setup:");
    eprintln!("  export FLEET_ACCESS_TOKEN=\"your-tesla-access-token\"");
    eprintln!("  export FLEET_REFRESH_TOKEN=\"your-tesla-refresh-token\"");
    eprintln!("  export FLEET_CLIENT_ID=\"your-oauth-client-id\"");
    eprintln!("  export FLEET_SITE_ID=\"your-energy-site-id\"    # optional\n");
    eprintln!("For help: powerwall-fleet --help");
    process::exit(EXIT_SETUP);
}

/// First energy site of the account.
async fn auto_select_site(client: &Client) -> i64 {
    match client.energy_products().await {
        Ok(products) => match products.first() {
            Some(product) => {
                eprintln!(
                    "Auto-selected energy site: {} (ID: {})",
                    product.site_name, product.energy_site_id
                );
                product.energy_site_id
            }
            None => {
                eprintln!("Error: No energy products found");
                process::exit(EXIT_SETUP);
            }
        },
        Err(e) => {
            eprintln!("Error getting energy products: {}", e);
            process::exit(EXIT_SETUP);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            /* --help and --version land here too */
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_logging(cli.debug);

    let settings = match read_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(EXIT_SETUP);
        }
    };
    let (client_id, access_token, refresh_token) = match settings.credentials() {
        Some(credentials) => credentials,
        None => missing_credentials(),
    };

    let mut builder = Client::builder(client_id, access_token, refresh_token)
        .api_url(settings.api_url.clone())
        .auth_url(settings.auth_url.clone());
    if cli.debug {
        builder = builder.diagnostics(Arc::new(LogDiagnostics));
    }
    let mut client = match builder.build() {
        Ok(client) => client,
        Err(e) => process::exit(report_error(&e)),
    };

    let site_id = match cli.site_id.or(settings.site_id).filter(|id| *id != 0) {
        Some(site_id) => site_id,
        None => auto_select_site(&client).await,
    };
    client.select_energy_site(site_id);
    log::debug!("Using energy site {}", site_id);

    let code = match run(&client, cli.command).await {
        Ok(()) => 0,
        Err(e) => report_error(&e),
    };

    if cli.metrics {
        match client.metrics_text() {
            Ok(text) => eprint!("{}", text),
            Err(e) => log::warn!("Unable to render metrics: {}", e),
        }
    }

    process::exit(code);
}
