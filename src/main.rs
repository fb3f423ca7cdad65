use clap::{Args, Parser, Subcommand};
use dhcp6d::config::{self, Config};
use dhcp6d::protocol::dhcpv6::{Duid, HARDWARE_TYPE_ETHERNET};
use dhcp6d::protocol::MacAddr;
use dhcp6d::server::Dispatcher;
use dhcp6d::telemetry::{init_logging, ServerStats};
use dhcp6d::transport::{self, UdpTransport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "dhcp6d")]
#[command(about = "Stateless DHCPv6 server handing out EUI-64 addresses")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the DHCPv6 server (default)
    Run(RunArgs),
    /// Validate a config file without serving
    Validate {
        /// Path to the config file
        #[arg(short, long, default_value = "dhcp6d.toml")]
        config: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to serve on
    #[arg(short, long)]
    interface: Option<String>,

    /// IPv6 prefix to hand out addresses from
    #[arg(short, long)]
    subnet: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Validate { config }) => cmd_validate(&config),
        Some(Commands::Run(args)) => cmd_run(args),
        None => cmd_run(cli.run),
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(args: RunArgs) -> Result<(), String> {
    use tokio::runtime::Runtime;

    let mut cfg = match &args.config {
        Some(path) => {
            config::load(path).map_err(|e| format!("Failed to load {}: {}", path.display(), e))?
        }
        None => Config::default(),
    };
    if let Some(interface) = args.interface {
        cfg.interface = interface;
    }
    if let Some(subnet) = args.subnet {
        cfg.subnet = subnet;
    }

    // RUST_LOG still takes priority over [log]
    init_logging(Some(&cfg.log));

    let validation = config::validate(&cfg);
    validation.print_diagnostics();
    if validation.has_errors() {
        return Err("Validation failed with errors".to_string());
    }

    let prefix = cfg.prefix().map_err(|e| e.to_string())?;
    let server_duid = server_duid(&cfg)?;

    info!(
        interface = %cfg.interface,
        prefix = %prefix,
        server_duid = %dhcp6d::protocol::HexBytes(&server_duid.to_bytes()),
        "dhcp6d starting"
    );

    let dispatcher = Arc::new(Dispatcher::new(
        prefix,
        server_duid,
        Arc::new(ServerStats::new()),
    ));

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;

    rt.block_on(async move {
        let socket = UdpTransport::bind(&cfg.interface)
            .await
            .map_err(|e| format!("Failed to bind {}: {}", cfg.interface, e))?;
        transport::serve(Arc::new(socket), dispatcher)
            .await
            .map_err(|e| e.to_string())
    })
}

fn cmd_validate(config_path: &Path) -> Result<(), String> {
    println!("[INFO] Validating {}...", config_path.display());

    let cfg = config::load(config_path).map_err(|e| format!("Failed to parse config: {}", e))?;

    let validation = config::validate(&cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        Err("Validation failed".to_string())
    } else {
        println!("[INFO] Configuration is valid");
        Ok(())
    }
}

/// DUID-LL from `server_mac`, or from the serving interface's MAC
fn server_duid(cfg: &Config) -> Result<Duid, String> {
    let mac = match cfg.server_mac().map_err(|e| e.to_string())? {
        Some(mac) => mac,
        None => get_interface_mac(&cfg.interface)?,
    };

    Ok(Duid::Ll {
        hardware_type: HARDWARE_TYPE_ETHERNET,
        link_layer_addr: mac.0.to_vec(),
    })
}

fn get_interface_mac(name: &str) -> Result<MacAddr, String> {
    // Read MAC from /sys/class/net/{name}/address
    let path = format!("/sys/class/net/{}/address", name);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read MAC of {}: {}", name, e))?;
    content
        .trim()
        .parse()
        .map_err(|e| format!("Invalid MAC in {}: {}", path, e))
}
