//! Core of the diary: append-only record storage, logging of activities and aggregation of
//! reports.

pub mod entities;
pub mod error;
pub mod logger;
pub mod record_storage;
pub mod report;
