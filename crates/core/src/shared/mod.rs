pub mod constants;
pub mod model_resolver;
pub mod sync_config;
pub mod timeout;
