pub mod booking_reader;
pub mod outcome_writer;
