use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use onramp_models::{validation, OnrampParams, OnrampUrlBuilder};
use onramp_sdk::{SdkError, SessionClient};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "onramp-cli")]
#[command(about = "Check destination addresses and generate onramp links")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check an address against a network
    Validate {
        /// Destination address
        address: String,
        /// Network identifier (ex: base, solana)
        #[arg(short, long)]
        network: String,
    },
    /// Guess the network an address belongs to
    Infer {
        /// Destination address
        address: String,
    },
    /// Show the expected address format for a network
    Example {
        /// Network identifier
        network: String,
    },
    /// Build an onramp link
    Link(LinkArgs),
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Session service base URL (session mode, preferred over --app-id)
    #[arg(long, env = "ONRAMP_SESSION_URL")]
    pub session_url: Option<String>,

    /// Provider app id (legacy mode)
    #[arg(long, env = "ONRAMP_APP_ID")]
    pub app_id: Option<String>,

    /// Destination address
    #[arg(short, long)]
    pub address: String,

    /// Network; inferred from the address when omitted
    #[arg(short, long)]
    pub network: Option<String>,

    /// Asset symbol (ex: USDC)
    #[arg(long)]
    pub asset: Option<String>,

    /// Fiat amount (ex: 25)
    #[arg(long)]
    pub amount: Option<String>,

    /// Payment method (ex: card)
    #[arg(long)]
    pub payment_method: Option<String>,

    /// Fiat currency (ex: USD)
    #[arg(long)]
    pub currency: Option<String>,

    /// Where the provider sends the user afterwards
    #[arg(long)]
    pub redirect_url: Option<String>,

    /// ISO country code
    #[arg(long)]
    pub country: Option<String>,

    /// Country subdivision (US state)
    #[arg(long)]
    pub subdivision: Option<String>,

    /// Allow guest checkout (legacy mode only)
    #[arg(long)]
    pub guest_checkout: bool,
}

impl LinkArgs {
    fn params(&self) -> OnrampParams {
        OnrampParams {
            asset: self.asset.clone(),
            amount: self.amount.clone(),
            network: self.network.clone(),
            payment_method: self.payment_method.clone(),
            payment_currency: self.currency.clone(),
            address: Some(self.address.clone()),
            redirect_url: self.redirect_url.clone(),
            country: self.country.clone(),
            subdivision: self.subdivision.clone(),
            enable_guest_checkout: self.guest_checkout.then_some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_validate(address: &str, network: &str, json: bool) -> anyhow::Result<()> {
    let outcome = validation::validate(address, network);
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.is_valid {
        println!("✓ valid {network} address");
    } else {
        println!("✗ {}", outcome.error.as_deref().unwrap_or("invalid address"));
        if let Some(suggestion) = &outcome.suggestion {
            println!("{suggestion}");
        }
    }

    if !outcome.is_valid {
        bail!("address rejected");
    }
    Ok(())
}

fn run_infer(address: &str, json: bool) -> anyhow::Result<()> {
    let network = validation::infer_network(address);
    if json {
        println!("{}", serde_json::json!({ "network": network }));
    } else {
        println!("{network}");
    }
    Ok(())
}

fn run_example(network: &str, json: bool) -> anyhow::Result<()> {
    let example = validation::example_address(network);
    let format = validation::format_description(network);
    if json {
        println!(
            "{}",
            serde_json::json!({ "network": network, "format": format, "example": example })
        );
    } else {
        println!("Expected: {format}");
        println!("Example:  {example}");
    }
    Ok(())
}

/// Build the link in whichever mode the arguments select.
async fn build_link(args: &LinkArgs) -> anyhow::Result<String> {
    let params = args.params();

    if let Some(session_url) = &args.session_url {
        info!(session_url = %session_url, "requesting session token");
        let client = SessionClient::new(session_url)?;
        return client.create_onramp_link(&params).await.map_err(|e| {
            let hint = e.suggestion().map(str::to_string);
            let err = anyhow::Error::new(e);
            match hint {
                Some(hint) => err.context(hint),
                None => err,
            }
        });
    }

    let Some(app_id) = &args.app_id else {
        bail!("either --session-url or --app-id (ONRAMP_APP_ID) is required");
    };

    // Legacy links carry the address in clear; refuse obvious mistakes.
    if let Some(network) = &args.network {
        let outcome = validation::validate(&args.address, network);
        if !outcome.is_valid {
            return Err(SdkError::Validation(onramp_models::AddressRejection {
                address: args.address.clone(),
                blockchain: Some(network.clone()),
                reason: outcome.error.unwrap_or_default(),
                suggestion: outcome.suggestion,
            })
            .into());
        }
    }

    debug!("building legacy link");
    OnrampUrlBuilder::legacy(app_id.as_str())
        .params(params)
        .build()
        .context("failed to build onramp link")
}

async fn run_link(args: &LinkArgs, json: bool) -> anyhow::Result<()> {
    let link = build_link(args).await?;
    if json {
        println!("{}", serde_json::json!({ "url": link }));
    } else {
        println!("{link}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Validate { address, network } => run_validate(address, network, cli.json),
        Commands::Infer { address } => run_infer(address, cli.json),
        Commands::Example { network } => run_example(network, cli.json),
        Commands::Link(args) => run_link(args, cli.json).await,
    }
}
