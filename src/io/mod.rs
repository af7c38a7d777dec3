/// CSV telemetry and JSON results writers.
pub mod export;
