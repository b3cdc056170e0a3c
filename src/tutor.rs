//! The tutor: free-text queries in, textual explanations out.
/// the five operations over the free variable x
pub mod evaluator;
/// response templates
pub mod response;
/// intent detection, operand extraction and dispatch
pub mod router;
/// interactive loop over any reader and writer
pub mod session;
