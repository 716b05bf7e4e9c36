//! Prompt segment model for AI image and video prompts.
//!
//! A prompt is a comma-separated list of clauses ending in a fixed directive suffix. A
//! [`grammar::Grammar`] names the categories those clauses can fill; the classifier, the
//! extractor and the reassembler are pure functions over prompt text driven by it.

pub mod classify;
pub mod compose;
pub mod error_codes;
pub mod extract;
pub mod grammar;
pub mod normalize;
pub mod reassemble;
pub mod store;
pub mod vocab;

pub use classify::{classify_candidates, classify_segment, Classification};
pub use compose::{compose, structure_template, Composition};
pub use extract::{annotate, extract_parameters, Annotation, ClauseRole, ParameterRecord};
pub use grammar::Grammar;
pub use reassemble::{
    ensure_directive_suffix, ensure_leading_token, finalize, reassemble, Reassembly,
};
