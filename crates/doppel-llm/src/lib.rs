pub mod converter;
pub mod provider;

pub mod mock;

pub use mock::{MockProvider, MockResponse};
pub use provider::{ChatCompletionsProvider, ProviderConfig};
