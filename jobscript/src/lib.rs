/// Snakemake `# properties = {...}` metadata embedded in job scripts
mod properties;
pub use properties::JobProperties;

/// Memory quantities, always normalized to megabytes
mod memory;
pub use memory::MemoryMb;

/// The resource request derived from a job script
mod descriptor;
pub use descriptor::{JobDescriptor, DEFAULT_THREADS};

/// Reasons a job script can't be turned into a `JobDescriptor`.
/// None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum MalformedDescriptor {
    #[error("Job script not found: {0}")]
    ScriptNotFound(String),
    #[error("Job script is not executable: {0}")]
    ScriptNotExecutable(String),
    #[error("Unable to read job script")]
    Io(#[from] std::io::Error),
    #[error("No '# properties = {{...}}' line found in job script")]
    MissingProperties,
    #[error("Job properties are not valid JSON")]
    InvalidProperties(#[from] serde_json::Error),
    #[error("Job properties have neither a rule nor a group name")]
    MissingName,
    #[error("Invalid thread count '{0}' (must be an integer >= 1)")]
    InvalidThreads(String),
    #[error("Invalid memory value '{0}' (expected e.g. '8000', '8G' or '1.5 GiB')")]
    InvalidMemory(String),
}
