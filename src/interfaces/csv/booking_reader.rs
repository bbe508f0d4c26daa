use crate::domain::booking::BookingParams;
use crate::error::{PaymentError, Result};
use std::io::Read;

/// Reads booking requests from a CSV source.
///
/// Columns use the backend's wire names (`mobile_no`, `p_id`, `doc_id`, ...).
/// Whitespace is trimmed and record lengths may vary.
pub struct BookingReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> BookingReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes bookings, one `Result` per row.
    pub fn bookings(self) -> impl Iterator<Item = Result<BookingParams>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
