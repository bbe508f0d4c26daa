use crate::domain::flow::FlowState;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct OutcomeRecord<'a> {
    order_id: &'a str,
    outcome: &'a str,
    merchant_transaction_id: &'a str,
    token_number: &'a str,
    message: &'a str,
}

/// Writes one CSV row per finished payment flow.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Records the terminal state of the flow started for `order_id`.
    pub fn write_outcome(&mut self, order_id: &str, state: &FlowState) -> Result<()> {
        let details = state.details();
        self.writer.serialize(OutcomeRecord {
            order_id,
            outcome: state.name(),
            merchant_transaction_id: details
                .and_then(|d| d.merchant_transaction_id.as_deref())
                .unwrap_or_default(),
            token_number: details.and_then(|d| d.token_number()).unwrap_or_default(),
            message: state.reason().unwrap_or_default(),
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
