pub mod ai;
pub mod error;
pub mod persona;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{GenerateClient, GenerationService, DEFAULT_BASE_URL};
pub use error::{ParsePersonaError, RequestFailure};
pub use persona::Persona;
pub use session::{ChatSession, SessionState, SubmitOutcome, FAILURE_RESPONSE};
pub use state::{Exchange, Transcript};
