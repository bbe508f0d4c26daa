use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive fee amount charged for an appointment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ContractViolationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// The booking inputs an OPD payment is made for.
///
/// Field aliases match the column names the backend uses on the wire, so a
/// booking can be read straight from a CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingParams {
    #[serde(alias = "mobile_no")]
    pub mobile: String,
    pub amount: Amount,
    #[serde(alias = "p_id")]
    pub patient_id: String,
    #[serde(alias = "name")]
    pub patient_name: String,
    #[serde(alias = "doc_name")]
    pub doctor_name: String,
    #[serde(alias = "doc_id")]
    pub doctor_id: String,
    /// Start of the appointment slot, as the backend formats it.
    #[serde(alias = "doc_time_from")]
    pub slot_start: String,
    /// Minutes allotted per patient.
    #[serde(alias = "duration_per_patient")]
    pub duration: u32,
    pub opd_type: String,
    pub order_id: String,
}
