// Domain layer - Sensor readings, bounded series and dashboard state
pub mod baseline;
pub mod dashboard;
pub mod decimation;
pub mod sensor;
pub mod series;
pub mod status;
