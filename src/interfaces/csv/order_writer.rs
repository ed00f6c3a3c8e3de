use crate::domain::order::{Order, OrderStatus, Priority, dispatch_order};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow<'a> {
    order_id: &'a str,
    priority: Priority,
    status: OrderStatus,
    processing_time: u32,
    locked: bool,
}

impl<'a> From<&'a Order> for OrderRow<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            order_id: &order.order_id,
            priority: order.priority,
            status: order.status,
            processing_time: order.processing_time,
            locked: order.lock,
        }
    }
}

/// Writes final order states as CSV, in dispatch order.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, mut orders: Vec<Order>) -> Result<()> {
        orders.sort_by(dispatch_order);
        for order in &orders {
            self.writer.serialize(OrderRow::from(order))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
