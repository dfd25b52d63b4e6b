/// Classification for retry policy.
///
/// A provider client never retries on its own. The class tells the caller
/// whether the next scheduled opportunity is worth spending quota on.
///
/// | Class | Retry on next tick? | Likely cause |
/// |-------|---------------------|--------------|
/// | `Never` | No, until the symbol is fixed | Bad symbol, empty or malformed payload |
/// | `NextOpportunity` | Yes, never immediately | Provider-side rate limit or notice |
/// | `Transient` | Yes | Timeout, network, 5xx |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// The provider refused to serve data right now.
    NextOpportunity,

    /// Transport failure. Safe to try again on the next tick.
    Transient,
}

impl RetryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryClass::Never => "never",
            RetryClass::NextOpportunity => "next_opportunity",
            RetryClass::Transient => "transient",
        }
    }
}
