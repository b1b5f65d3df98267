use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{JobProperties, MalformedDescriptor, MemoryMb};

/// Used when a job script doesn't specify a thread count.
pub const DEFAULT_THREADS: u32 = 1;

/// Resource keys that may hold a job's memory requirement, most specific first.
const MEMORY_KEYS: &[&str] = &["mem_mb", "mem"];

/// Everything we need to know about a job in order to submit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Rule (or group) name, submitted as the scheduler job name.
    pub name: String,
    /// Requested threads, always >= 1.
    pub threads: u32,
    /// Memory ceiling.
    pub memory: MemoryMb,
    /// Path to the executable job script.
    pub script: PathBuf,
}

impl JobDescriptor {
    /// Read the job script at `script` and derive its descriptor.
    pub fn read(script: &Path) -> Result<Self, MalformedDescriptor> {
        check_executable(script)?;
        let text = fs::read_to_string(script)?;
        let props = JobProperties::extract(&text)?;
        Self::from_properties(&props, script)
    }

    /// Derive a descriptor from already-decoded properties, applying defaults.
    pub fn from_properties(
        props: &JobProperties,
        script: &Path,
    ) -> Result<Self, MalformedDescriptor> {
        let name = props
            .job_name()
            .filter(|name| !name.trim().is_empty())
            .ok_or(MalformedDescriptor::MissingName)?
            .to_owned();

        let threads = match &props.threads {
            None | Some(Value::Null) => DEFAULT_THREADS,
            Some(value) => parse_threads(value)?,
        };

        let memory = match props.resource(MEMORY_KEYS) {
            None => MemoryMb::DEFAULT,
            Some(value) => MemoryMb::from_json(value)?,
        };

        Ok(Self {
            name,
            threads,
            memory,
            script: script.to_path_buf(),
        })
    }
}

fn parse_threads(value: &Value) -> Result<u32, MalformedDescriptor> {
    let threads = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    threads
        .filter(|&t| t >= 1)
        .and_then(|t| u32::try_from(t).ok())
        .ok_or_else(|| MalformedDescriptor::InvalidThreads(value.to_string()))
}

fn check_executable(script: &Path) -> Result<(), MalformedDescriptor> {
    let display = || script.to_string_lossy().into_owned();
    if !script.is_file() {
        return Err(MalformedDescriptor::ScriptNotFound(display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(script)?.permissions().mode();
        if mode & 0o111 == 0 {
            return Err(MalformedDescriptor::ScriptNotExecutable(display()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn props(json: &str) -> JobProperties {
        serde_json::from_str(json).unwrap()
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, text: &str, mode: u32) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("snakejob.align.3.sh");
        fs::write(&path, text)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
        Ok(path)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let desc = JobDescriptor::from_properties(&props(r#"{"rule": "index"}"#), "job.sh".as_ref())?;
        assert_eq!("index", desc.name);
        assert_eq!(DEFAULT_THREADS, desc.threads);
        assert_eq!(MemoryMb::DEFAULT, desc.memory);
        assert_eq!(PathBuf::from("job.sh"), desc.script);
        Ok(())
    }

    #[test]
    fn test_memory_keys() -> Result<()> {
        let script: &Path = "job.sh".as_ref();
        let desc = JobDescriptor::from_properties(
            &props(r#"{"rule": "a", "threads": 8, "resources": {"mem_mb": 4000, "mem": "64G"}}"#),
            script,
        )?;
        assert_eq!(8, desc.threads);
        assert_eq!(4000, desc.memory.get());

        let desc = JobDescriptor::from_properties(
            &props(r#"{"rule": "a", "resources": {"mem": "2GB"}}"#),
            script,
        )?;
        assert_eq!(2000, desc.memory.get());

        let desc = JobDescriptor::from_properties(
            &props(r#"{"rule": "a", "threads": "3", "resources": {"mem_mb": null, "mem": 1200}}"#),
            script,
        )?;
        assert_eq!(3, desc.threads);
        assert_eq!(1200, desc.memory.get());
        Ok(())
    }

    #[test]
    fn test_malformed() {
        let script: &Path = "job.sh".as_ref();
        let err = |json: &str| JobDescriptor::from_properties(&props(json), script).unwrap_err();

        assert!(matches!(err(r#"{"threads": 2}"#), MalformedDescriptor::MissingName));
        assert!(matches!(err(r#"{"rule": " "}"#), MalformedDescriptor::MissingName));
        assert!(matches!(
            err(r#"{"rule": "a", "threads": 0}"#),
            MalformedDescriptor::InvalidThreads(_)
        ));
        assert!(matches!(
            err(r#"{"rule": "a", "threads": "many"}"#),
            MalformedDescriptor::InvalidThreads(_)
        ));
        assert!(matches!(
            err(r#"{"rule": "a", "resources": {"mem_mb": "a lot"}}"#),
            MalformedDescriptor::InvalidMemory(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_read() -> Result<()> {
        let dir = tempdir()?;
        let text = "#!/bin/sh\n# properties = {\"rule\": \"align\", \"threads\": 4, \"resources\": {\"mem_mb\": 8000}}\nexit 0\n";
        let path = write_script(dir.path(), text, 0o755)?;

        let desc = JobDescriptor::read(&path)?;
        assert_eq!("align", desc.name);
        assert_eq!(4, desc.threads);
        assert_eq!(8000, desc.memory.get());
        assert_eq!(path, desc.script);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_read_bad_script() -> Result<()> {
        let dir = tempdir()?;

        let missing = dir.path().join("nope.sh");
        assert!(matches!(
            JobDescriptor::read(&missing),
            Err(MalformedDescriptor::ScriptNotFound(_))
        ));

        let path = write_script(dir.path(), "# properties = {\"rule\": \"a\"}\n", 0o644)?;
        assert!(matches!(
            JobDescriptor::read(&path),
            Err(MalformedDescriptor::ScriptNotExecutable(_))
        ));

        let path = write_script(dir.path(), "#!/bin/sh\nexit 0\n", 0o755)?;
        assert!(matches!(
            JobDescriptor::read(&path),
            Err(MalformedDescriptor::MissingProperties)
        ));
        Ok(())
    }
}
