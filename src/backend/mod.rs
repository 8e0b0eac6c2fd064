pub mod factory;
pub mod inference_service;
pub mod interface;
pub mod limiter;
#[cfg(test)]
pub mod stub;

pub use factory::BackendFactory;
pub use interface::{BackendError, TranslationBackend};
