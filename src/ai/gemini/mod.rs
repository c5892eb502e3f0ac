pub mod clarify;
pub mod client;
pub mod extract;
pub mod payload;
pub mod pipeline;
pub mod types;

pub use clarify::ClarificationStage;
pub use client::{Endpoint, ReqwestTransport};
pub use extract::{extract, ResponseShape};
pub use payload::PayloadBuilder;
pub use pipeline::RequestPipeline;
