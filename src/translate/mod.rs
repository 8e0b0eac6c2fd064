pub mod interface;
pub mod service;

pub use interface::{TranslateRequest, TranslateResponse};
pub use service::{RequestPolicy, Translator};
