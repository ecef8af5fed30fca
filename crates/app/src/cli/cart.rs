use clap::{Args, Subcommand};
use scancart_app::{
    context::AppContext,
    domain::{carts::CartsServiceError, products::Product},
};
use uuid::Uuid;

use crate::cli::table;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the active cart
    Show {
        /// Reload from the backend instead of using the last known cart
        #[arg(long)]
        refresh: bool,
    },

    /// Add a product to the cart
    Add(AddArgs),

    /// Set an item's quantity; zero removes it
    Set {
        /// Cart item id, as shown by `cart show`
        item: Uuid,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove an item
    Remove {
        /// Cart item id, as shown by `cart show`
        item: Uuid,
    },

    /// Complete the cart and record the payment
    Checkout {
        /// Payment method, e.g. "card"
        #[arg(long, default_value = "card")]
        method: String,
    },
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    product: ProductSelector,

    #[arg(short, long, default_value_t = 1_u32)]
    quantity: u32,
}

/// Exactly one way of naming the product.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct ProductSelector {
    /// Catalog product id
    #[arg(long)]
    id: Option<Uuid>,

    /// Product barcode
    #[arg(long)]
    barcode: Option<String>,

    /// First product whose name contains this term
    #[arg(long)]
    name: Option<String>,
}

fn failed(action: &str) -> impl Fn(CartsServiceError) -> String + '_ {
    move |error| format!("failed to {action}: {error}")
}

async fn product(context: &AppContext, selector: &ProductSelector) -> Result<Product, String> {
    let lookup = if let Some(id) = selector.id {
        context.products.get_product(id.into()).await
    } else if let Some(barcode) = &selector.barcode {
        context.products.find_by_barcode(barcode).await
    } else {
        let term = selector.name.as_deref().unwrap_or_default();

        return context
            .products
            .search_products(term)
            .await
            .map_err(|error| format!("product lookup failed: {error}"))?
            .into_iter()
            .next()
            .ok_or_else(|| format!("no product matches \"{term}\""));
    };

    lookup.map_err(|error| format!("product lookup failed: {error}"))
}

pub(crate) async fn run(context: &AppContext, command: CartCommand) -> Result<(), String> {
    let cart = match command.command {
        CartSubcommand::Show { refresh } => {
            let cart = if refresh {
                context.carts.refresh().await
            } else {
                context.carts.get_active_cart().await
            };

            cart.map_err(failed("load the cart"))?
        }
        CartSubcommand::Add(args) => {
            let product = product(context, &args.product).await?;

            context
                .carts
                .add_item(product, args.quantity)
                .await
                .map_err(failed("add the item"))?
        }
        CartSubcommand::Set { item, quantity } => context
            .carts
            .update_quantity(item.into(), quantity)
            .await
            .map_err(failed("update the item"))?,
        CartSubcommand::Remove { item } => context
            .carts
            .remove_item(item.into())
            .await
            .map_err(failed("remove the item"))?,
        CartSubcommand::Checkout { method } => {
            let cart = context
                .carts
                .get_active_cart()
                .await
                .map_err(failed("load the cart"))?;

            let receipt = context
                .carts
                .checkout(cart.cart.uuid, &method)
                .await
                .map_err(failed("check out"))?;

            println!("{}", table::items(&receipt.items, receipt.payment.amount));
            println!(
                "paid {} by {} ({})",
                receipt.payment.amount.round_dp(2),
                receipt.payment.payment_method,
                receipt.payment.uuid,
            );

            return Ok(());
        }
    };

    if cart.stale {
        println!("(offline, showing the last saved cart)");
    }

    if cart.items.is_empty() {
        println!("cart is empty");
        return Ok(());
    }

    println!("{}", table::cart(&cart));

    Ok(())
}
