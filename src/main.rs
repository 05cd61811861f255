/*
 ═══════════════════════════════════════════════════════════════════════════════
  ██████╗ ███████╗███╗   ██╗████████╗██╗███╗   ██╗███████╗██╗
 ██╔════╝ ██╔════╝████╗  ██║╚══██╔══╝██║████╗  ██║██╔════╝██║
 ███████╗ █████╗  ██╔██╗ ██║   ██║   ██║██╔██╗ ██║█████╗  ██║
 ╚════██║ ██╔══╝  ██║╚██╗██║   ██║   ██║██║╚██╗██║██╔══╝  ██║
 ███████║ ███████╗██║ ╚████║   ██║   ██║██║ ╚████║███████╗███████╗
 ╚══════╝ ╚══════╝╚═╝  ╚═══╝   ╚═╝   ╚═╝╚═╝  ╚═══╝╚══════╝╚══════╝

  SENTINEL SHIELD - EVM Bytecode Risk Scanner (Rust)

  Fetches on-chain bytecode, disassembles it, runs seven pattern
  detectors plus a deployer-reputation check, and condenses the result
  into a capped 0-100 risk score with one level of proxy resolution.

 ═══════════════════════════════════════════════════════════════════════════════
*/

use clap::Parser;

use sentinel_risk::config::Config;
use sentinel_risk::engine::Engine;

mod server;

// ═══════════════════════════════════════════════════════════════════════════════
//                              CLI ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "sentinel-scan")]
#[command(author = "SENTINEL Team")]
#[command(version = "1.0.0")]
#[command(about = "EVM bytecode risk scanner")]
struct Args {
    /// Contract address to analyze (0x-prefixed, 40 hex chars)
    #[arg(short, long)]
    address: Option<String>,

    /// Analyze a literal hex bytecode string directly, skipping RPC
    #[arg(long)]
    bytecode: Option<String>,

    /// RPC endpoint to fetch bytecode from
    #[arg(long)]
    rpc_url: Option<String>,

    /// Explorer API key for the deployer-reputation detector
    #[arg(long)]
    explorer_key: Option<String>,

    /// Output format: json or text
    #[arg(short, long, default_value = "json")]
    output: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run as HTTP server
    #[arg(long)]
    server: bool,

    /// Port for HTTP server
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

// ═══════════════════════════════════════════════════════════════════════════════
//                                  MAIN
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.server {
        let config = Config::from_env()?;
        server::run_server(args.port, config).await?;
        return Ok(());
    }

    println!(
        r#"
 ██████╗ ███████╗███╗   ██╗████████╗██╗███╗   ██╗███████╗██╗
██╔════╝ ██╔════╝████╗  ██║╚══██╔══╝██║████╗  ██║██╔════╝██║
███████╗ █████╗  ██╔██╗ ██║   ██║   ██║██╔██╗ ██║█████╗  ██║
╚════██║ ██╔══╝  ██║╚██╗██║   ██║   ██║██║╚██╗██║██╔══╝  ██║
███████║ ███████╗██║ ╚████║   ██║   ██║██║ ╚████║███████╗███████╗
╚══════╝ ╚══════╝╚═╝  ╚═══╝   ╚═╝   ╚═╝╚═╝  ╚═══╝╚══════╝╚══════╝

            EVM Bytecode Risk Scanner v1.0.0

  Usage:
    CLI:    sentinel-scan --address 0x... --rpc-url https://...
    Server: sentinel-scan --server --port 8080
"#
    );

    let config = Config::from_env().unwrap_or_else(|_| Config {
        bind_host: "0.0.0.0".to_string(),
        bind_port: args.port,
        default_rpc_url: "https://mainnet.base.org".to_string(),
        default_explorer_key: String::new(),
        cache_capacity: sentinel_risk::cache::MIN_CAPACITY,
    });
    let engine = Engine::with_capacity(config.cache_capacity);

    let result = if let Some(bytecode) = &args.bytecode {
        println!("Analyzing literal bytecode...\n");
        engine.analyze_bytecode(bytecode)?
    } else if let Some(address) = &args.address {
        let rpc_url = args.rpc_url.clone().unwrap_or(config.default_rpc_url);
        let explorer_key = args.explorer_key.clone().unwrap_or(config.default_explorer_key);
        println!("Analyzing {address}...\n");
        engine.analyze(address, &rpc_url, &explorer_key).await?
    } else {
        eprintln!("Provide --address or --bytecode, or use --server mode");
        return Ok(());
    };

    match args.output.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&server::AnalyzeResponse::from(result))?);
        }
        "text" => {
            println!("════════════════════════════════════════════════════");
            println!("                RISK ANALYSIS RESULTS");
            println!("════════════════════════════════════════════════════\n");

            println!("Address: {}", result.address);
            println!("Bytecode size: {} bytes", result.bytecode_size);
            println!("Score: {} ({})", result.score, result.level.as_str());

            println!("\nFindings:");
            for finding in &result.findings {
                println!(
                    "  [{}] {} (+{}): {}",
                    finding.severity.as_str(),
                    finding.title,
                    finding.points,
                    finding.description
                );
            }

            if let Some(implementation) = &result.implementation {
                println!("\nImplementation: {}", implementation.address);
            }
        }
        other => {
            eprintln!("Unknown output format: {other}");
        }
    }

    Ok(())
}
