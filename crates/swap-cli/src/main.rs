use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use swap_aggregator::{AggregatorApi, HttpAggregator};
use swap_approval::ApprovalCoordinator;
use swap_config::{AppConfig, ConfigLoader};
use swap_core::{QuoteWatcher, SwapOrchestrator, SwapOutcome, SwapRequest};
use swap_types::{amount, Address, EventBus, Preset, QuoteParams, SwapEvent, Token, B256};
use swap_wallet::{LocalWallet, WalletService};
use tokio::io::AsyncBufReadExt;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "swap")]
#[command(about = "Cross-chain atomic swap CLI", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "SWAP_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Args)]
struct PairArgs {
	#[arg(long)]
	src_chain: u64,
	#[arg(long)]
	dst_chain: u64,
	#[arg(long)]
	src_token: Address,
	#[arg(long)]
	dst_token: Address,
	#[arg(long, default_value_t = 18)]
	src_decimals: u8,
	#[arg(long, default_value_t = 18)]
	dst_decimals: u8,
	/// Human-readable source amount, e.g. "1.5".
	#[arg(long)]
	amount: String,
	#[arg(long, default_value = "fast")]
	preset: Preset,
}

#[derive(Subcommand)]
enum Commands {
	/// Fetch a quote for a pair without starting a swap
	Quote(PairArgs),
	/// Keep quoting a pair, re-quoting as new amounts are typed
	Watch(PairArgs),
	/// Run a swap attempt end to end
	Swap(PairArgs),
	/// Look up the relayer-side status of a submitted order
	Status {
		#[arg(long)]
		order_hash: B256,
	},
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("failed to load configuration")?;

	match cli.command {
		Commands::Quote(args) => quote(config, args).await,
		Commands::Watch(args) => watch(config, args).await,
		Commands::Swap(args) => swap(config, args).await,
		Commands::Status { order_hash } => status(config, order_hash).await,
		Commands::Validate => validate(config),
	}
}

fn aggregator(config: &AppConfig) -> Arc<dyn AggregatorApi> {
	Arc::new(
		HttpAggregator::new(&config.aggregator.base_url, &config.aggregator.api_key)
			.with_submit_timeout(Duration::from_secs(config.aggregator.submit_timeout_secs)),
	)
}

fn wallet(config: &AppConfig) -> Result<Arc<WalletService>> {
	let wallet = LocalWallet::new(
		&config.wallet.private_key,
		config.wallet.endpoint_map(),
		config.wallet.default_chain,
	)
	.context("failed to initialize wallet")?;
	Ok(Arc::new(WalletService::new(Box::new(wallet))))
}

async fn quote(config: AppConfig, args: PairArgs) -> Result<()> {
	let wallet = wallet(&config)?;
	let amount_units = amount::parse_units(&args.amount, args.src_decimals)
		.context("invalid amount")?;
	let params = QuoteParams {
		src_chain: args.src_chain,
		dst_chain: args.dst_chain,
		src_token_address: args.src_token,
		dst_token_address: args.dst_token,
		amount: amount_units,
		wallet_address: wallet.address(),
		enable_estimate: true,
	};

	let quote = aggregator(&config)
		.get_quote(&params)
		.await
		.context("quote request failed")?;

	println!("quote id:           {}", quote.quote_id);
	println!(
		"estimated received: {}",
		amount::format_units(quote.dst_token_amount, args.dst_decimals, 6)
	);
	if let Some(preset) = quote.recommended_preset {
		println!("recommended preset: {}", preset);
	}
	println!(
		"secrets required:   {}",
		quote.secrets_count(args.preset)
	);
	Ok(())
}

async fn watch(config: AppConfig, args: PairArgs) -> Result<()> {
	let wallet = wallet(&config)?;
	let events = EventBus::default();
	let watcher = QuoteWatcher::spawn(
		aggregator(&config),
		events.clone(),
		Duration::from_millis(config.swap.quote_debounce_ms),
	);

	let mut rx = events.subscribe();
	let printer = tokio::spawn(async move {
		while let Ok(event) = rx.recv().await {
			report(&event);
		}
	});

	let mut params = QuoteParams {
		src_chain: args.src_chain,
		dst_chain: args.dst_chain,
		src_token_address: args.src_token,
		dst_token_address: args.dst_token,
		amount: amount::parse_units(&args.amount, args.src_decimals)
			.context("invalid amount")?,
		wallet_address: wallet.address(),
		enable_estimate: true,
	};
	watcher.update(params.clone());

	println!("type a new amount to re-quote, Ctrl-C to exit");
	let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
	loop {
		tokio::select! {
			line = lines.next_line() => match line? {
				Some(text) => {
					let text = text.trim();
					if text.is_empty() {
						continue;
					}
					match amount::parse_units(text, args.src_decimals) {
						Ok(units) => {
							params.amount = units;
							watcher.update(params.clone());
						}
						Err(err) => warn!(%err, "ignoring input"),
					}
				}
				None => break,
			},
			signal = signal::ctrl_c() => {
				signal.context("failed to listen for Ctrl-C")?;
				break;
			}
		}
	}
	printer.abort();
	Ok(())
}

async fn swap(config: AppConfig, args: PairArgs) -> Result<()> {
	let wallet = wallet(&config)?;
	let events = EventBus::default();
	let approvals = ApprovalCoordinator::new(wallet.clone(), events.clone())
		.with_policy(config.approval.policy)
		.with_receipt_timeout(Duration::from_secs(config.approval.receipt_timeout_secs));
	let orchestrator = Arc::new(
		SwapOrchestrator::new(aggregator(&config), wallet, approvals, events)
			.with_poll_interval(Duration::from_secs(config.swap.poll_interval_secs))
			.with_monitoring_timeout(Duration::from_secs(config.swap.monitoring_timeout_secs)),
	);

	let mut events = orchestrator.events().subscribe();
	let printer = tokio::spawn(async move {
		while let Ok(event) = events.recv().await {
			report(&event);
		}
	});

	let request = SwapRequest {
		src_chain: args.src_chain,
		dst_chain: args.dst_chain,
		src_token: Token {
			address: args.src_token,
			symbol: String::new(),
			decimals: args.src_decimals,
		},
		dst_token: Token {
			address: args.dst_token,
			symbol: String::new(),
			decimals: args.dst_decimals,
		},
		amount: args.amount,
		preset: args.preset,
	};

	// Ctrl-C stops fill monitoring; the order itself stays live with the
	// relayer.
	let exec = orchestrator.execute(&request);
	tokio::pin!(exec);
	let outcome = loop {
		tokio::select! {
			result = &mut exec => break result,
			signal = signal::ctrl_c() => {
				signal.context("failed to listen for Ctrl-C")?;
				warn!("interrupt received, stopping fill monitoring");
				orchestrator.cancel();
			}
		}
	};
	printer.abort();

	match outcome.context("swap attempt failed")? {
		SwapOutcome::Confirmed {
			order_hash,
			secrets_revealed,
		} => {
			println!("swap confirmed: order {} ({} secret(s) revealed)", order_hash, secrets_revealed);
		}
		SwapOutcome::Cancelled { order_hash } => {
			println!("monitoring stopped; order {} is still live", order_hash);
			println!("check it later with: swap status --order-hash {}", order_hash);
		}
	}
	Ok(())
}

async fn status(config: AppConfig, order_hash: B256) -> Result<()> {
	let status = aggregator(&config)
		.order_status(&order_hash)
		.await
		.context("status request failed")?;
	println!("order {}: {:?}", order_hash, status);
	Ok(())
}

fn validate(config: AppConfig) -> Result<()> {
	info!("configuration is valid");
	info!("aggregator: {}", config.aggregator.base_url);
	info!("default chain: {}", config.wallet.default_chain);
	for endpoint in &config.wallet.endpoints {
		info!("  endpoint: chain {} -> {}", endpoint.chain_id, endpoint.url);
	}
	info!("approval policy: {:?}", config.approval.policy);
	Ok(())
}

fn report(event: &SwapEvent) {
	match event {
		SwapEvent::StageChanged { stage } => info!("stage: {}", stage),
		SwapEvent::QuoteUpdated {
			quote_id,
			dst_token_amount,
		} => info!(%quote_id, %dst_token_amount, "quote updated"),
		SwapEvent::QuoteFailed { reason, transient } => {
			warn!(%reason, transient, "quote failed")
		}
		SwapEvent::ApprovalPending { tx_hash } => info!(%tx_hash, "approval broadcast"),
		SwapEvent::ApprovalConfirming { tx_hash } => info!(%tx_hash, "approval confirming"),
		SwapEvent::ApprovalCompleted { already_sufficient } => {
			if *already_sufficient {
				info!("allowance already sufficient");
			} else {
				info!("approval confirmed");
			}
		}
		SwapEvent::SecretRevealed {
			order_hash,
			fill_idx,
		} => info!(%order_hash, fill_idx, "secret revealed"),
	}
}

fn setup_tracing(log_level: &str) {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();
}
