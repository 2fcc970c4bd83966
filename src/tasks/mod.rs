pub mod forecast_runner;
