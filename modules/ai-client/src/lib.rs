pub mod error;
pub mod gemini;
pub mod groq;
pub mod roster;
pub mod util;

pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use roster::{Provider, Roster, RosterError};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
