//! Error handling foundation for the workflow designer.
//!
//! This module provides only the `Result` type alias using rootcause.
//! The graph model defines plain error enums; the store and the CLI wrap
//! them in a `Report` carrying their own context.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{NodeId, ParseIdError};

    fn parse_node(raw: &str) -> Result<NodeId, ParseIdError> {
        Ok(raw.parse::<NodeId>()?)
    }

    #[test]
    fn result_carries_typed_context() {
        let err = parse_node("garbage").unwrap_err();
        assert_eq!(err.current_context().id_type, "NodeId");
    }

    #[test]
    fn result_passes_values_through() {
        let id = NodeId::new();
        assert_eq!(parse_node(&id.to_string()).expect("should parse"), id);
    }
}
