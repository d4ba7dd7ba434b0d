/// Classification for retry policy.
///
/// Fetch cycles never retry internally. The scheduler that drives them uses
/// this classification to decide how to react before the next cycle.
///
/// # Behavior Summary
///
/// | Class | Back off before next cycle? | Log level |
/// |-------|-----------------------------|-----------|
/// | `WithBackoff` | Yes | warn |
/// | `Never` | No (the next cycle is unlikely to fix it) | error |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retrying won't help until something outside the pipeline changes:
    /// the upstream schema drifted or the caller misused the client.
    Never,

    /// Transient upstream trouble (network, timeout, a glitchy payload).
    /// The next cycle may succeed; widen the gap between attempts.
    WithBackoff,
}
