use locator_forge::testing::TestHelper;
use locator_forge::{DocumentQuery, SmartLocator};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let document = TestHelper::product_table();
    let locator = SmartLocator::default();

    info!("Two rows carry an 'Add to Cart' button; anchoring on 'iPhone 15 Pro'");
    let composite = locator
        .find_by_related_text(&document, "Add to Cart", "iPhone 15 Pro", None)
        .await?;

    for strategy in composite.strategies() {
        let hits = document.query_by_strategy(strategy).await?;
        info!(
            "  [{:>2}] {:<14} {} -> {} match(es)",
            strategy.priority,
            strategy.kind.name(),
            strategy.selector,
            hits.len()
        );
    }

    let handle = composite.resolve(&document).await?;
    let snapshot = document.capture_snapshot(handle).await?;
    info!(
        "Resolved to <{}> value={:?}",
        snapshot.tag_name,
        snapshot.attribute("value")
    );

    println!("{}", serde_json::to_string_pretty(&composite)?);
    Ok(())
}
