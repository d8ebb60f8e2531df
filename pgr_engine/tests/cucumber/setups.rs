use cucumber::given;
use pgr_engine::InventoryStore;

use crate::{cucumber::PaymentWorld, support::setup};

#[given("a fresh install")]
async fn fresh_database(world: &mut PaymentWorld) {
    let system = setup().await;
    world.system = Some(system);
}

#[given(expr = "{int} '{word}' in stock")]
async fn stock_product(world: &mut PaymentWorld, quantity: i64, product: String) {
    world.system().db.set_stock_level(&product, quantity).await.expect("Error setting stock level");
}
