/// Settings for guard synthesis, carried from the grammar's declared
/// options.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoistingConfig {
    /// Maximum number of lookahead positions any search may consider.
    ///
    /// Must be positive. Enforced as a hard iteration cap (combination
    /// weight, repetition depth, identity windows), never a time limit, so
    /// behavior is reproducible across machines.
    pub token_limit: usize,

    /// Enables verbose tracing of rule processing. No behavioral effect.
    pub debug: bool,
}

impl Default for HoistingConfig {
    fn default() -> Self {
        Self {
            token_limit: 10,
            debug: false,
        }
    }
}

impl HoistingConfig {
    /// A configuration with the given token limit and tracing disabled.
    #[must_use]
    pub fn with_token_limit(token_limit: usize) -> Self {
        Self {
            token_limit,
            debug: false,
        }
    }
}
