//! Logger pool usage example
//!
//! Demonstrates named loggers, service labels, level gates and TTL control
//! with the console transport.
//!
//! Run with: cargo run --example pool_usage

use relay_logger_pool::prelude::*;
use relay_logger_pool::{info, warning};
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Relay Logger Pool - Usage Example ===\n");

    let mut pool = LoggerPool::builder()
        .transport(ConsoleTransport::new())
        .default_service_name("file-server")
        .ttl(Duration::from_secs(600))
        .build()?;

    println!("1. Explicit logger with debug enabled:");
    let id = pool.create_logger("uploader", true, true, true);
    let uploader = pool
        .logger(id.as_str())
        .ok_or_else(|| PoolError::not_found(id.as_str()))?;
    uploader.debug("Chunk 1/3 received")?;
    info!(uploader, "File uploaded: {}", "a1b2")?;

    println!("\n2. Service label with default gates (debug hidden):");
    let importer = pool.service_logger("url-importer");
    importer.debug("Resolving host (hidden)")?;
    warning!(importer, "Slow response: {} ms", 1520)?;
    importer.error_with(
        "Import failed",
        LogMetadata::new().with_field("url", "http://example.org/file.bin"),
    )?;

    println!("\n3. Reconfiguring a service:");
    pool.configure_service("url-importer", &LevelUpdate::new().debug(true));
    importer.debug("Resolving host (visible now)")?;

    println!("\n4. Default logger and level names:");
    pool.log_service(LogLevel::Info, "Server started", None, None)?;
    pool.log_str(id.as_str(), "warn", "Disk usage at 85%", None)?;

    std::thread::sleep(Duration::from_millis(100));

    println!("\n5. Pool state:");
    let status = pool.ttl_status();
    println!(
        "   ttl={}s cleanup={} loggers={}",
        status.ttl_seconds, status.enabled, status.pool_size
    );
    println!("   cleanup toggled -> {}", pool.set_ttl_enabled(None));
    println!("{}", serde_json::to_string_pretty(&pool.list_services())?);

    pool.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
