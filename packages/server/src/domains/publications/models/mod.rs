pub mod publication;

pub use publication::PublicationRecord;
