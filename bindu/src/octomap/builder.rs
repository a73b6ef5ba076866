//! External map builder invocation.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::config::OctomapSection;
use crate::error::{Error, Result};

/// Interval between child status polls
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for output pipes to close once the child is gone.
///
/// Processes spawned by the builder may inherit the pipes and outlive it.
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Inputs of one map build
#[derive(Clone, Copy, Debug)]
pub struct BuildJob<'a> {
    /// Points CSV to read
    pub csv: &'a Path,
    /// Map file to produce
    pub output: &'a Path,
    /// Voxel edge length (m)
    pub resolution: f64,
}

/// Something that turns a points CSV into a map file.
pub trait MapBuilder {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Build the map; `Ok` means the output file exists
    fn build(&self, job: &BuildJob<'_>) -> Result<()>;
}

/// Runs an executable with templated arguments.
///
/// `{csv}`, `{out}` and `{resolution}` in each argument are replaced by the
/// job values. The child is killed if it outlives the timeout.
#[derive(Clone, Debug)]
pub struct ProcessMapBuilder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessMapBuilder {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &OctomapSection) -> Self {
        Self::new(config.program.clone(), config.args.clone(), config.timeout())
    }

    /// Arguments with placeholders substituted
    pub fn expand_args(&self, job: &BuildJob<'_>) -> Vec<String> {
        let csv = job.csv.to_string_lossy();
        let out = job.output.to_string_lossy();
        let resolution = job.resolution.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{csv}", &csv)
                    .replace("{out}", &out)
                    .replace("{resolution}", &resolution)
            })
            .collect()
    }

    fn failure(&self, status: impl Into<String>, stderr: String) -> Error {
        Error::ExternalTool {
            tool: self.program.clone(),
            status: status.into(),
            stderr,
        }
    }

    /// Poll until exit or deadline; `None` means the child was killed
    fn wait_with_timeout(&self, child: &mut Child) -> Result<Option<std::process::ExitStatus>> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                // The child may exit between the poll and the kill
                if let Err(e) = child.kill() {
                    log::debug!("Map builder: kill failed: {}", e);
                }
                child.wait()?;
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl MapBuilder for ProcessMapBuilder {
    fn name(&self) -> &str {
        &self.program
    }

    fn build(&self, job: &BuildJob<'_>) -> Result<()> {
        let args = self.expand_args(job);
        log::info!("Map builder: {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(format!("spawn failed: {}", e), String::new()))?;

        let stdout = drain("builder-stdout", child.stdout.take())?;
        let stderr = drain("builder-stderr", child.stderr.take())?;

        let status = self.wait_with_timeout(&mut child)?;
        let deadline = Instant::now() + PIPE_GRACE;
        let stdout = collect("stdout", stdout, deadline);
        let stderr = collect("stderr", stderr, deadline);
        if !stdout.trim().is_empty() {
            log::debug!("Map builder output:\n{}", stdout.trim_end());
        }

        match status {
            None => Err(self.failure(format!("timed out after {:?}", self.timeout), stderr)),
            Some(status) if !status.success() => Err(self.failure(status.to_string(), stderr)),
            Some(_) if !job.output.exists() => Err(self.failure(
                format!("exited successfully but {} was not created", job.output.display()),
                stderr,
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Read a child pipe to the end on a named thread
fn drain<R: Read + Send + 'static>(name: &str, pipe: Option<R>) -> Result<Option<Receiver<String>>> {
    let Some(mut pipe) = pipe else {
        return Ok(None);
    };
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new().name(name.to_string()).spawn(move || {
        let mut bytes = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut bytes) {
            log::debug!("Map builder: pipe read failed: {}", e);
        }
        // The receiver is gone if the reader was abandoned
        let _ = tx.send(String::from_utf8_lossy(&bytes).into_owned());
    })?;
    Ok(Some(rx))
}

/// Output of a reader, or empty if the pipe is still open at `deadline`
fn collect(stream: &str, rx: Option<Receiver<String>>, deadline: Instant) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => text,
        Err(_) => {
            log::warn!(
                "Map builder: {} still held open by a leftover process, output discarded",
                stream
            );
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, timeout: Duration) -> ProcessMapBuilder {
        ProcessMapBuilder::new(
            "sh",
            vec!["-c".into(), script.into(), "sh".into(), "{csv}".into(), "{out}".into()],
            timeout,
        )
    }

    fn job_paths(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let csv = dir.path().join("points.csv");
        std::fs::write(&csv, "x,y,z\n1,2,3\n").unwrap();
        (csv, dir.path().join("map.bt"))
    }

    #[test]
    fn test_expand_args() {
        let builder = ProcessMapBuilder::new(
            "tool",
            vec!["--xyz_csv".into(), "{csv}".into(), "--out".into(), "{out}".into(), "-r{resolution}".into()],
            Duration::from_secs(1),
        );
        let job = BuildJob {
            csv: Path::new("/tmp/a.csv"),
            output: Path::new("/tmp/b.bt"),
            resolution: 0.5,
        };
        assert_eq!(
            builder.expand_args(&job),
            vec!["--xyz_csv", "/tmp/a.csv", "--out", "/tmp/b.bt", "-r0.5"]
        );
    }

    #[test]
    fn test_success() {
        let dir = TempDir::new().unwrap();
        let (csv, out) = job_paths(&dir);
        let builder = sh(r#"cp "$1" "$2""#, Duration::from_secs(10));
        let job = BuildJob { csv: &csv, output: &out, resolution: 10.0 };

        builder.build(&job).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "x,y,z\n1,2,3\n");
    }

    #[test]
    fn test_nonzero_exit_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let (csv, out) = job_paths(&dir);
        let builder = sh("echo 'bad input' >&2; exit 3", Duration::from_secs(10));
        let job = BuildJob { csv: &csv, output: &out, resolution: 10.0 };

        match builder.build(&job) {
            Err(Error::ExternalTool { tool, status, stderr }) => {
                assert_eq!(tool, "sh");
                assert!(status.contains('3'), "status: {}", status);
                assert_eq!(stderr.trim(), "bad input");
            }
            other => panic!("expected external tool error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_output_is_failure() {
        let dir = TempDir::new().unwrap();
        let (csv, out) = job_paths(&dir);
        let builder = sh("exit 0", Duration::from_secs(10));
        let job = BuildJob { csv: &csv, output: &out, resolution: 10.0 };
        assert!(matches!(builder.build(&job), Err(Error::ExternalTool { .. })));
    }

    #[test]
    fn test_timeout_kills_child() {
        let dir = TempDir::new().unwrap();
        let (csv, out) = job_paths(&dir);
        let builder = sh("exec sleep 30", Duration::from_millis(200));
        let job = BuildJob { csv: &csv, output: &out, resolution: 10.0 };

        let started = Instant::now();
        match builder.build(&job) {
            Err(Error::ExternalTool { status, .. }) => assert!(status.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_with_leftover_helper_process() {
        let dir = TempDir::new().unwrap();
        let (csv, out) = job_paths(&dir);
        // `sleep` runs as a child of the shell and keeps both pipes open
        let builder = sh("sleep 5; true", Duration::from_millis(200));
        let job = BuildJob { csv: &csv, output: &out, resolution: 10.0 };

        let started = Instant::now();
        match builder.build(&job) {
            Err(Error::ExternalTool { status, .. }) => assert!(status.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    }

    #[test]
    fn test_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let (csv, out) = job_paths(&dir);
        let builder = ProcessMapBuilder::new("/nonexistent/builder", Vec::new(), Duration::from_secs(1));
        let job = BuildJob { csv: &csv, output: &out, resolution: 10.0 };
        match builder.build(&job) {
            Err(Error::ExternalTool { status, .. }) => assert!(status.starts_with("spawn failed")),
            other => panic!("expected spawn failure, got {:?}", other),
        }
    }
}
