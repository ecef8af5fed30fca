use rust_decimal::Decimal;
use scancart_app::domain::{
    carts::models::{CartItem, CartSnapshot},
    products::Product,
};
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Color, Style, object::Columns, object::Rows},
};

fn finish(builder: Builder, numeric: std::ops::Range<usize>) -> Table {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(numeric), Alignment::right());

    table
}

fn price(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

pub(crate) fn products(products: &[Product]) -> Table {
    let mut builder = Builder::default();

    builder.push_record(["Name", "Category", "Barcode", "Price", "Id"]);

    for product in products {
        builder.push_record([
            product.name.clone(),
            product.category.clone().unwrap_or_default(),
            product.barcode.clone().unwrap_or_default(),
            price(product.price),
            product.uuid.to_string(),
        ]);
    }

    finish(builder, 3..4)
}

fn item_row(item: &CartItem) -> [String; 5] {
    [
        item.display_name().to_string(),
        item.quantity.to_string(),
        item.product
            .as_ref()
            .map_or_else(String::new, |product| price(product.price)),
        price(item.line_total()),
        item.uuid.to_string(),
    ]
}

pub(crate) fn cart(snapshot: &CartSnapshot) -> Table {
    items(&snapshot.items, snapshot.total())
}

pub(crate) fn items(items: &[CartItem], total: Decimal) -> Table {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Price", "Total", "Id"]);

    for item in items {
        builder.push_record(item_row(item));
    }

    builder.push_record([
        "Total".to_string(),
        String::new(),
        String::new(),
        price(total),
        String::new(),
    ]);

    finish(builder, 1..4)
}
