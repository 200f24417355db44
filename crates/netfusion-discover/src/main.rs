//! CLI entry point for the netfusion-discover SNMP scanner.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use netfusion_core::ScanRequest;
use netfusion_vault::{Vault, VaultConfig};

use netfusion_discover::config::{load_section, DiscoverConfig};
use netfusion_discover::import::{import_selected, ImportRequest};
use netfusion_discover::scanner::SnmpScanner;

#[derive(Parser)]
#[command(name = "netfusion-discover")]
#[command(about = "SNMP v2c subnet scanner for NetFusion")]
struct Cli {
    /// Target to scan (CIDR notation, e.g., 192.168.1.0/24).
    #[arg(short, long)]
    target: String,

    /// SNMP community string (otherwise read from config).
    #[arg(long)]
    community: Option<String>,

    /// Per-host timeout in milliseconds (otherwise read from config).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Cap on hosts probed; never above discover.max_hosts.
    #[arg(long)]
    max_hosts: Option<usize>,

    /// OID to request; repeat for several. Defaults to sysName and sysDescr.
    #[arg(long = "oid")]
    oids: Vec<String>,

    /// Import every responder into the endpoint vault after the scan.
    #[arg(long)]
    import: bool,

    /// Config file prefix (default: netfusion).
    #[arg(short, long, default_value = "netfusion")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let discover_config = DiscoverConfig::load(&cli.config)?;

    let request = ScanRequest {
        cidr: cli.target.clone(),
        community: cli
            .community
            .clone()
            .unwrap_or_else(|| discover_config.default_community.clone()),
        timeout_ms: cli.timeout_ms.unwrap_or(discover_config.default_timeout_ms),
        max_hosts: cli.max_hosts,
        oids: (!cli.oids.is_empty()).then(|| cli.oids.clone()),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling scan");
            on_signal.cancel();
        }
    });

    let scanner = SnmpScanner::new(discover_config);
    let report = scanner.scan(&request, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if cli.import && report.count > 0 {
        let vault_config: VaultConfig = load_section(&cli.config, "vault")?;
        let vault = Vault::open(&vault_config)?;

        let selected = report.results.iter().map(|r| r.ip.clone()).collect();
        let mut import = ImportRequest::new(report, selected);
        import.community = request.community;

        let summary = tokio::task::spawn_blocking(move || import_selected(&vault, &import)).await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        if summary.failed > 0 {
            anyhow::bail!("{} of {} imports failed", summary.failed, summary.results.len());
        }
    }

    Ok(())
}
