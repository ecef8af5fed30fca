use clap::{Parser, Subcommand};
use scancart_app::{
    config::{AppConfig, LoggingConfig},
    context::AppContext,
};

mod auth;
mod cart;
mod products;
mod recognize;
mod table;

#[derive(Debug, Parser)]
#[command(name = "scancart", about = "Scancart CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up catalog products
    Products(products::ProductsCommand),

    /// Identify the product in a photo
    Recognize(recognize::RecognizeArgs),

    /// Show and change the active cart
    Cart(cart::CartCommand),

    /// Manage the signed-in account
    Auth(auth::AuthCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.config.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let context = AppContext::from_config(&self.config)
            .await
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Products(command) => products::run(&context, command).await,
            Commands::Recognize(args) => recognize::run(&context, args).await,
            Commands::Cart(command) => cart::run(&context, command).await,
            Commands::Auth(command) => auth::run(&context, command).await,
        }
    }
}
