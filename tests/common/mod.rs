#![allow(dead_code)]

use orderflow::application::engine::DispatchEngine;
use orderflow::domain::order::Order;
use std::io::{Error, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

pub fn write_orders_csv(rows: &[(&str, &str, &str)]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "order_id, priority, processing_time")?;
    for (order_id, priority, processing_time) in rows {
        writeln!(file, "{}, {}, {}", order_id, priority, processing_time)?;
    }
    file.flush()?;
    Ok(file)
}

pub fn generate_orders_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["order_id", "priority", "processing_time"])?;

    for i in 1..=rows {
        let priority = if i % 3 == 0 { "High" } else { "Normal" };
        wtr.write_record([format!("ORD-{i}").as_str(), priority, "1"])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Polls until the order leaves Pending and returns it.
pub async fn wait_terminal(engine: &DispatchEngine, order_id: &str) -> Order {
    loop {
        let order = engine.get_order(order_id).await.unwrap();
        if order.status.is_terminal() {
            return order;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
