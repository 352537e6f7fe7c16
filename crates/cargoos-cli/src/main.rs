mod landed_cost;
mod rfq;
mod search;

use clap::{Parser, Subcommand};

use crate::landed_cost::LandedCostArgs;
use crate::rfq::RfqArgs;
use crate::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "cargoos-cli")]
#[command(about = "CargoOS supplier sourcing command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search marketplace listings for factory suppliers
    Search(SearchArgs),
    /// Compute delivered-duty-paid landed cost for an order
    LandedCost(LandedCostArgs),
    /// Generate a request-for-quotation text
    Rfq(RfqArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cargoos_core::load_app_config()?;

    match cli.command {
        Commands::Search(args) => search::run_search(&config, &args).await,
        Commands::LandedCost(args) => landed_cost::run_landed_cost(&config, &args).await,
        Commands::Rfq(args) => rfq::run_rfq(&config, &args),
    }
}
