//! Cribwallet CLI - inspect persisted sessions and run the balance API
//!
//! Session commands read the same documents the browser writes:
//!   cribwallet status                 → {"activeWallet": "...", ...}
//!   cribwallet history                → [{"walletType": "gem", ...}]
//!   cribwallet clear                  → Erase session + history
//!
//! Ledger helpers:
//!   cribwallet check-address <addr>   → {"kind": "xrpl", "valid": true}
//!   cribwallet balance <addr>         → {"success": true, "balance": "25.5000"}
//!   cribwallet chain                  → wallet_addEthereumChain params
//!
//! Server:
//!   cribwallet serve --port 8787 --rpc <url>
//!
//! Output format:
//!   --json     Output compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use cribwallet::config::{ChainParams, XRPL_TESTNET_JSON_RPC};
use cribwallet::server::{BalanceSource, SourceError};
use cribwallet::storage::default_root;
use cribwallet::{
    classify, create_router, init_logging, shutdown_signal, validate_xrpl_address, FileStorage,
    SessionConfig, TokioScheduler, WalletManager, WalletPorts, XrplRpcClient,
};
use serde_json::{json, Value};
use tracing::{debug, info};

const DEFAULT_PORT: u16 = 8787;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("cribwallet {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("status") => cmd_status(&opts),
        Some("history") => cmd_history(&opts),
        Some("clear") => cmd_clear(&opts),
        Some("check-address") | Some("check") => cmd_check_address(&opts),
        Some("balance") => cmd_balance(&opts),
        Some("chain") => Ok(cmd_chain()),
        Some("serve") => cmd_serve(&opts),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": e }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    target: Option<String>,
    data_dir: Option<String>,
    rpc_url: Option<String>,
    port: Option<u16>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv();

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--data-dir" | "-d" => {
                    if i + 1 < args.len() {
                        opts.data_dir = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--rpc" | "-r" => {
                    if i + 1 < args.len() {
                        opts.rpc_url = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        opts.port = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.target = positional.next();

        // Environment variables (lower priority than CLI args)
        if opts.data_dir.is_none() {
            opts.data_dir = env::var("CRIBWALLET_DATA_DIR").ok().filter(|s| !s.is_empty());
        }
        if opts.rpc_url.is_none() {
            opts.rpc_url = env::var("CRIBWALLET_XRPL_RPC").ok().filter(|s| !s.is_empty());
        }
        if opts.port.is_none() {
            opts.port = env::var("CRIBWALLET_PORT").ok().and_then(|p| p.parse().ok());
        }

        opts
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.as_ref().map(PathBuf::from).unwrap_or_else(default_root)
    }

    fn rpc_url(&self) -> String {
        self.rpc_url.clone().unwrap_or_else(|| XRPL_TESTNET_JSON_RPC.to_string())
    }

    fn target(&self, what: &str) -> Result<&str, String> {
        self.target
            .as_deref()
            .ok_or_else(|| format!("Missing {}. Usage: cribwallet {} <{}>", what, self.command.as_deref().unwrap_or(""), what))
    }
}

/// `.env` in the working directory. Existing variables win.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
}

fn print_usage() {
    println!(
        r#"cribwallet - Crypto Cribs wallet session tools

USAGE:
    cribwallet <COMMAND> [OPTIONS]

COMMANDS:
    status                 Show the persisted wallet session
    history                Show the wallet switch history (newest first)
    clear                  Erase the persisted session and history
    check-address <addr>   Classify an address and validate XRPL addresses
    balance <addr>         Look up an XRP balance over JSON-RPC
    chain                  Print the XRPL EVM sidechain parameters
    serve                  Run the balance API

OPTIONS:
    -d, --data-dir <dir>   Session directory [env: CRIBWALLET_DATA_DIR]
    -r, --rpc <url>        XRPL JSON-RPC endpoint [env: CRIBWALLET_XRPL_RPC]
    -p, --port <port>      Server port, default {DEFAULT_PORT} [env: CRIBWALLET_PORT]
        --json             Compact JSON output
        --pretty           Pretty-printed JSON output
    -h, --help             Show this help
    -V, --version          Show version"#
    );
}

// =============================================================================
// Session commands
// =============================================================================

fn open_manager(opts: &ParsedArgs) -> Result<WalletManager, String> {
    let root = opts.data_dir();
    debug!(root = %root.display(), "opening session storage");
    let storage = FileStorage::open(&root).map_err(|e| format!("Failed to open {}: {}", root.display(), e))?;
    let ports = WalletPorts::new(Rc::new(storage), Rc::new(TokioScheduler));
    let manager = WalletManager::new(SessionConfig::new(), ports);
    manager.hydrate();
    Ok(manager)
}

fn cmd_status(opts: &ParsedArgs) -> Result<Value, String> {
    let manager = open_manager(opts)?;
    serde_json::to_value(manager.snapshot()).map_err(|e| e.to_string())
}

fn cmd_history(opts: &ParsedArgs) -> Result<Value, String> {
    let manager = open_manager(opts)?;
    serde_json::to_value(manager.history()).map_err(|e| e.to_string())
}

fn cmd_clear(opts: &ParsedArgs) -> Result<Value, String> {
    let manager = open_manager(opts)?;
    manager.reset();
    info!("Session cleared");
    Ok(json!({ "status": "cleared" }))
}

// =============================================================================
// Ledger helpers
// =============================================================================

fn cmd_check_address(opts: &ParsedArgs) -> Result<Value, String> {
    let address = opts.target("address")?;
    let kind = classify(address);
    let mut out = json!({ "address": address, "kind": kind, "valid": kind.is_some() });
    if kind.is_none() {
        if let Err(e) = validate_xrpl_address(address) {
            out["error"] = json!(e.to_string());
        }
    }
    Ok(out)
}

fn cmd_balance(opts: &ParsedArgs) -> Result<Value, String> {
    let address = opts.target("address")?;
    validate_xrpl_address(address).map_err(|e| e.to_string())?;
    let client = XrplRpcClient::new(opts.rpc_url()).map_err(|e| e.to_string())?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;
    match rt.block_on(client.xrp_balance(address)) {
        Ok(balance) => Ok(json!({ "success": true, "balance": balance })),
        Err(SourceError::AccountNotFound) => Err(SourceError::AccountNotFound.to_string()),
        Err(e) => Err(format!("Balance lookup failed: {}", e)),
    }
}

fn cmd_chain() -> Value {
    let chain = ChainParams::xrpl_evm_testnet();
    json!({
        "chainId": chain.chain_id,
        "chainIdHex": chain.chain_id_hex(),
        "addChain": chain.add_chain_params(),
    })
}

// =============================================================================
// Server
// =============================================================================

fn cmd_serve(opts: &ParsedArgs) -> Result<Value, String> {
    let port = opts.port.unwrap_or(DEFAULT_PORT);
    let client = XrplRpcClient::new(opts.rpc_url()).map_err(|e| format!("Failed to build RPC client: {}", e))?;
    let upstream = client.url().to_string();
    let source: Arc<dyn BalanceSource> = Arc::new(client);

    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;

    rt.block_on(async {
        let router = create_router(source);
        let addr = format!("0.0.0.0:{}", port);

        info!("Cribwallet balance API listening on http://{}", addr);
        info!("Upstream XRPL node: {}", upstream);
        info!("Endpoints:");
        info!("  GET  /health                          - Health check");
        info!("  GET  /api/xrpl/balance?address=<r...> - XRP balance");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind: {}", e))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                info!("Shutdown signal received, stopping server...");
            })
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), String>(())
    })?;

    Ok(json!({ "status": "stopped" }))
}
