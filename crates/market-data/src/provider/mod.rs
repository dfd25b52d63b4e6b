//! Market data provider abstractions and implementations.
//!
//! Providers perform exactly one physical call per invocation and never
//! retry internally. Quota accounting and audit persistence belong to the
//! caller; the provider only reports what happened.

mod traits;

pub mod alpha_vantage;

pub use traits::DailySeriesProvider;
