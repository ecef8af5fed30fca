use clap::{Args, Subcommand};
use scancart_app::{context::AppContext, domain::products::ProductsServiceError};

use crate::cli::table;

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// Products whose name contains a term
    Search {
        /// Case-insensitive name fragment
        term: String,
    },

    /// The product with a barcode
    Barcode {
        barcode: String,
    },

    /// Products in a category
    Category {
        category: String,
    },
}

pub(crate) async fn run(context: &AppContext, command: ProductsCommand) -> Result<(), String> {
    let products = match command.command {
        ProductsSubcommand::Search { term } => context.products.search_products(&term).await,
        ProductsSubcommand::Barcode { barcode } => context
            .products
            .find_by_barcode(&barcode)
            .await
            .map(|product| vec![product]),
        ProductsSubcommand::Category { category } => {
            context.products.list_by_category(&category).await
        }
    };

    let products = match products {
        Ok(products) => products,
        Err(ProductsServiceError::NotFound) => Vec::new(),
        Err(error) => return Err(format!("product lookup failed: {error}")),
    };

    if products.is_empty() {
        println!("no products found");
        return Ok(());
    }

    println!("{}", table::products(&products));

    Ok(())
}
