use campus_pass::infra::algorand::{AlgodClient, IndexerClient, LedgerService};
use campus_pass::infra::config::{CampusPassConfig, LedgerMode};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads (from the environment or .env):\n\
           ALGOD_SERVER, ALGOD_TOKEN, INDEXER_SERVER, INDEXER_TOKEN\n\
         Optional feature switches:\n\
           IDENTITY_APP_ID, PERMISSION_APP_ID, DEFAULT_EVENT_ASSET_ID\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = CampusPassConfig::from_env()?;

    println!("> Preflight:");
    println!("  ALGOD_SERVER={}", config.algod_server);
    println!("  INDEXER_SERVER={}", config.indexer_server);
    println!("  CONFIRMATION_ROUNDS={}", config.confirmation_rounds);
    for (feature, id) in config.feature_summary() {
        match id {
            Some(id) => println!("  {}: enabled ({})", feature, id),
            None => println!("  {}: disabled", feature),
        }
    }

    if config.ledger_mode == LedgerMode::Simulated {
        println!("> LEDGER_MODE=simulated, skipping network checks.");
        return Ok(());
    }

    let algod = AlgodClient::new(&config.algod_server, &config.algod_token);
    let round = algod
        .last_round()
        .await
        .map_err(|e| anyhow::anyhow!("algod unreachable at {}: {}", config.algod_server, e))?;
    println!("  algod last round: {}", round);

    let params = algod
        .transaction_params()
        .await
        .map_err(|e| anyhow::anyhow!("algod params request failed: {}", e))?;
    println!("  genesis: {} (min fee {})", params.genesis_id, params.min_fee);

    let indexer = IndexerClient::new(&config.indexer_server, &config.indexer_token);
    indexer
        .health()
        .await
        .map_err(|e| anyhow::anyhow!("indexer unreachable at {}: {}", config.indexer_server, e))?;
    println!("  indexer: healthy");

    println!("> Preflight OK.");
    Ok(())
}
