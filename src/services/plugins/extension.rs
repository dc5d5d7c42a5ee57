/// Capability every loaded extension provides.
///
/// `execute` runs on a blocking thread; an `Err` or a panic is logged by the
/// monitor and never stops it.
pub trait Extension: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    fn execute(&self) -> anyhow::Result<()>;
}
