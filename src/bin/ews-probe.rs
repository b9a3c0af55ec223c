#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Pre-migration checks against an Exchange server

use clap::{Parser, Subcommand};
use ews_discovery::{
    CANDIDATE_VERSIONS, ExchangeConfig, FlagIcon, ProbeReport, SERVICE_PATH, probe_tls,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ews-probe")]
#[command(about = "Pre-migration checks against an Exchange server")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the server certificate passes the trust policy
    Tls {
        /// Port to connect to (defaults to EWS_PORT or 443)
        #[arg(long)]
        port: Option<u16>,

        /// Seconds to wait for the connection and the handshake
        #[arg(long, default_value = "10")]
        wait: u64,
    },

    /// Show the endpoint and the schema versions negotiation will try
    Versions,

    /// Translate a follow-up icon code
    Flag {
        /// Raw PidTagFollowupIcon value
        #[arg(allow_hyphen_values = true)]
        code: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Tls { port, wait } => {
            let config = ExchangeConfig::from_env()?;
            cmd_tls(&args, &config, port.unwrap_or(config.port), *wait).await?;
        }
        Command::Versions => {
            let config = ExchangeConfig::from_env()?;
            cmd_versions(&args, &config)?;
        }
        Command::Flag { code } => {
            cmd_flag(&args, *code)?;
        }
    }

    Ok(())
}

async fn cmd_tls(
    args: &Args,
    config: &ExchangeConfig,
    port: u16,
    wait: u64,
) -> anyhow::Result<()> {
    let report = probe_tls(&config.host, port, Duration::from_secs(wait)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_probe(&report);
    }

    if !report.accepted {
        anyhow::bail!("certificate of {}:{} rejected", report.host, report.port);
    }
    Ok(())
}

fn cmd_versions(args: &Args, config: &ExchangeConfig) -> anyhow::Result<()> {
    let url = format!("https://{}/{SERVICE_PATH}", config.host);
    let versions: Vec<&str> = CANDIDATE_VERSIONS.iter().map(|v| v.as_str()).collect();

    if args.json {
        let out = serde_json::json!({ "url": url, "versions": versions });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Endpoint: {url}");
        for (i, version) in versions.iter().enumerate() {
            println!("  {}. {version}", i + 1);
        }
    }
    Ok(())
}

fn cmd_flag(args: &Args, code: i32) -> anyhow::Result<()> {
    let icon = FlagIcon::from_code(code);

    if args.json {
        let out = serde_json::json!({
            "code": code,
            "icon": icon.as_str(),
            "canonical": icon.code(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{code} => {icon} (canonical code {})", icon.code());
    }
    Ok(())
}

fn print_probe(report: &ProbeReport) {
    println!("Host:     {}:{}", report.host, report.port);
    println!(
        "Verdict:  {}",
        if report.accepted { "accepted" } else { "rejected" }
    );
    if let Some(protocol) = &report.protocol {
        println!("Protocol: {protocol}");
    }
    if let Some(detail) = &report.detail {
        println!("Detail:   {detail}");
    }
}
