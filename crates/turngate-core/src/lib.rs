pub mod anchor;
pub mod channel;
pub mod config;
pub mod deadline;
pub mod error;
pub mod fields;
pub mod guardrail;
pub mod ids;
pub mod lock;
pub mod outcome;
pub mod redact;
pub mod state;

pub use anchor::Anchor;
pub use channel::Channel;
pub use deadline::TurnDeadline;
pub use error::{CoreError, Result};
pub use guardrail::{CorrectionType, GuardrailAction, GuardrailVerdict, NeedsCorrection};
pub use ids::{BusinessId, SessionId, TurnId};
pub use lock::LockReason;
pub use outcome::{IdentityContext, Outcome, StateEvent, ToolResult};
pub use state::{FlowStatus, LastNotFound, ResponseGrounding, TurnState, VerificationState, VerificationStatus};
