pub mod generate;

pub use generate::{GenerateClient, DEFAULT_BASE_URL};

use async_trait::async_trait;

use crate::error::RequestFailure;
use crate::persona::Persona;

/// Something that turns a question into a reply.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, question: &str, persona: Persona) -> Result<String, RequestFailure>;
}
