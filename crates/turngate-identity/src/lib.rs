pub mod autoverify;
pub mod error;
pub mod lookup;
pub mod phone;
pub mod proof;
pub mod turkish;
pub mod verification;

pub use autoverify::{apply_autoverify, AnchorRefetch};
pub use error::{IdentityError, Result};
pub use lookup::{CustomerMatch, IdentityLookup, OrderMatch};
pub use proof::{derive_identity_proof, proof_applies_to, ChannelContext, IdentityProof, ProofStrength};
pub use turkish::compare_turkish_names;
pub use verification::{
    check_verification, create_anchor, get_full_result, get_minimal_result, requires_verification,
    verify_against_anchor, MatchedField, VerificationPrompt,
};
