use crate::domain::order::Priority;
use crate::error::{OrderError, Result};
use serde::Deserialize;
use std::io::Read;

/// One order submission as read from the input file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OrderRequest {
    pub order_id: String,
    pub priority: Priority,
    pub processing_time: u32,
}

impl OrderRequest {
    /// Rejects empty identifiers and zero processing times.
    pub fn validate(self) -> Result<Self> {
        if self.order_id.is_empty() {
            return Err(OrderError::ValidationError(
                "order_id must not be empty".to_string(),
            ));
        }
        if self.processing_time == 0 {
            return Err(OrderError::ValidationError(format!(
                "processing_time of order {} must be at least 1",
                self.order_id
            )));
        }
        Ok(self)
    }
}

/// Reads order submissions from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over validated
/// `Result<OrderRequest>`. It handles whitespace trimming and flexible record lengths.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    /// Creates a new `OrderReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates submissions.
    pub fn orders(self) -> impl Iterator<Item = Result<OrderRequest>> {
        self.reader
            .into_deserialize::<OrderRequest>()
            .map(|result| result.map_err(OrderError::from).and_then(OrderRequest::validate))
    }
}
