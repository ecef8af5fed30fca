use std::{fs, path::PathBuf, sync::Arc};

use clap::Args;
use scancart_app::{
    context::AppContext,
    recognition::RecognizedItem,
    vision::{SampleVisionClient, encode_image},
};

use crate::cli::table;

#[derive(Debug, Args)]
pub(crate) struct RecognizeArgs {
    /// Photo of the product
    image: PathBuf,

    /// Use the fixed sample annotations instead of calling the vision API
    #[arg(long)]
    mock: bool,

    /// Add one of the recognized product to the cart
    #[arg(long)]
    add: bool,
}

pub(crate) async fn run(context: &AppContext, args: RecognizeArgs) -> Result<(), String> {
    let bytes = fs::read(&args.image)
        .map_err(|error| format!("failed to read {}: {error}", args.image.display()))?;

    let recognizer = if args.mock {
        context.recognizer_with(Arc::new(SampleVisionClient))
    } else {
        context.recognizer()
    };

    let recognition = recognizer
        .recognize(&encode_image(&bytes))
        .await
        .map_err(|error| format!("recognition failed: {error}"))?;

    if recognition.used_sample {
        println!("(vision unavailable, showing sample result)");
    }

    let item = recognition.item();

    println!("{item}");

    let RecognizedItem::Matched(matched) = item else {
        return Ok(());
    };

    println!("{}", table::products(std::slice::from_ref(&matched.product)));

    if args.add {
        let cart = context
            .carts
            .add_item(matched.product.clone(), 1)
            .await
            .map_err(|error| format!("failed to add to cart: {error}"))?;

        println!("{}", table::cart(&cart));
    }

    Ok(())
}
