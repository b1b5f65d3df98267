use std::process::Command;

use util::HashSet;

use crate::deps::JobId;

use super::Error;

/// Anything that can list the jobs currently known to the scheduler's active queue.
pub trait JobQueue {
    fn active_jobs(&mut self) -> Result<QueueSnapshot, Error>;
}

/// Job ids present in the active queue at one point in time.
#[derive(Debug, Default)]
pub struct QueueSnapshot {
    entries: HashSet<String>,
}

impl QueueSnapshot {
    /// Parse one job id per line, as printed by `squeue --noheader --format=%i`.
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// A job counts as present if it is listed itself, or any of its array tasks
    /// (`123_4`, `123_[5-9]`) or heterogeneous components (`123+1`) are.
    pub fn contains(&self, id: &JobId) -> bool {
        let id = id.as_str();
        self.entries.contains(id)
            || self.entries.iter().any(|entry| {
                entry
                    .strip_prefix(id)
                    .is_some_and(|rest| rest.starts_with('_') || rest.starts_with('+'))
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lists the active queue with `squeue`.
#[derive(Debug)]
pub struct Squeue {
    program: String,
    /// only list this user's jobs
    user: Option<String>,
}

impl Squeue {
    pub fn new(program: &str, user: Option<&str>) -> Self {
        Self {
            program: program.to_owned(),
            user: user.map(str::to_owned),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--noheader").arg("--format=%i");
        if let Some(user) = &self.user {
            cmd.arg("--user").arg(user);
        }
        cmd
    }
}

impl JobQueue for Squeue {
    fn active_jobs(&mut self) -> Result<QueueSnapshot, Error> {
        let output = self.command().output().map_err(|e| {
            Error::DependencyQueryFailed(format!("could not run '{}': {e}", self.program))
        })?;

        if !output.status.success() {
            return Err(Error::DependencyQueryFailed(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            )));
        }

        Ok(QueueSnapshot::parse(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_snapshot_contains() {
        let snapshot = QueueSnapshot::parse("  101\n\n2034_[1-10]\n2035_3\n3000+1\n");
        assert_eq!(4, snapshot.len());
        assert!(snapshot.contains(&JobId::new("101")));
        assert!(snapshot.contains(&JobId::new("2034")));
        assert!(snapshot.contains(&JobId::new("2035")));
        assert!(snapshot.contains(&JobId::new("3000")));
        assert!(!snapshot.contains(&JobId::new("10")));
        assert!(!snapshot.contains(&JobId::new("203")));
        assert!(!snapshot.contains(&JobId::new("1011")));
        assert!(QueueSnapshot::parse("").is_empty());
    }

    #[test]
    fn test_squeue_command() {
        let cmd = Squeue::new("squeue", Some("alice")).command();
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["--noheader", "--format=%i", "--user", "alice"]);

        let cmd = Squeue::new("/usr/bin/squeue", None).command();
        assert_eq!(2, cmd.get_args().count());
    }

    #[cfg(unix)]
    #[test]
    fn test_squeue_failure() {
        let mut queue = Squeue::new("/nonexistent/squeue", None);
        assert!(matches!(
            queue.active_jobs(),
            Err(Error::DependencyQueryFailed(_))
        ));
        let mut queue = Squeue::new("false", None);
        assert!(matches!(
            queue.active_jobs(),
            Err(Error::DependencyQueryFailed(_))
        ));
    }
}
