use tasbih_kit::TasbihKit;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let kit = TasbihKit::from_env()?;

    println!("=== First load ===");
    let start = std::time::Instant::now();
    let items = kit.load_all("post-prayer").await?;
    let duration1 = start.elapsed();
    println!("Loaded {} items in {:?}", items.len(), duration1);

    println!("\n=== Cached load ===");
    let start = std::time::Instant::now();
    kit.load_all("Post-Prayer ").await?;
    let duration2 = start.elapsed();
    println!("Cached load took: {:?}", duration2);

    println!("\n=== Searching ===");
    let first = kit.search_by_id("post-prayer", 1).await?;
    println!("By id 1: {:?}", first.label());
    for item in kit.search_by_label("post-prayer", "allah").await? {
        println!("Label match {}: {:?}", item.id(), item.label());
    }
    for item in kit.search_by_translation("post-prayer", "god").await? {
        println!("Translation match {}: {:?}", item.id(), item.translation());
    }

    println!("\nCache stats: {:?}", kit.cache_stats());
    kit.clear_cache();
    println!("Cache stats after clear: {:?}", kit.cache_stats());

    Ok(())
}
