// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::env;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use aubellhop_base::defaults;
use aubellhop_base::env_writer::write_env_files;
use aubellhop_base::readers::{read_arrivals, read_rays};
use aubellhop_base::results::{Arrivals, RayFan};
use aubellhop_base::types::{FileExt, Task};
use aubellhop_base::Environment;

use crate::errors::AubellhopError;

/// Poll interval while waiting on the external process
const WAIT_POLL: Duration = Duration::from_millis(5);

/// Marker Bellhop writes to the `.prt` file before the reason of an abort
const PRT_FATAL: &str = "*** FATAL ERROR ***";

/// Options a simulator is created with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorOptions {
    /// Executable name looked up in `PATH`, or a path to it
    pub exe: String,
    /// 2 or 3
    pub dim: usize,
    /// Terminate the executable after this many seconds
    pub timeout_secs: Option<f64>,
    /// Write the run's files under this base name instead of a temporary directory
    pub work_base: Option<PathBuf>,
    /// Leave the files of a run with `work_base` in place
    pub keep_files: bool,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        SimulatorOptions {
            exe: defaults::MODEL_EXE_2D.to_string(),
            dim: 2,
            timeout_secs: None,
            work_base: None,
            keep_files: false,
        }
    }
}

/// Parsed output of one run
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Arrivals(Arrivals),
    Rays(RayFan),
}

impl TaskResult {
    pub fn as_arrivals(&self) -> Option<&Arrivals> {
        match self {
            TaskResult::Arrivals(a) => Some(a),
            _ => None
        }
    }

    pub fn as_rays(&self) -> Option<&RayFan> {
        match self {
            TaskResult::Rays(r) => Some(r),
            _ => None
        }
    }
}

/// Input files of a run. Dropping the bundle removes a temporary working directory.
#[derive(Debug)]
pub struct InputBundle {
    pub task: Task,
    /// Base name shared by the input and output files
    pub base: PathBuf,
    pub files: Vec<PathBuf>,
    workdir: Option<TempDir>,
}

impl InputBundle {
    /// Directory the executable runs in
    pub fn dir(&self) -> &Path {
        match &self.workdir {
            Some(dir) => dir.path(),
            None => self.base.parent().unwrap_or_else(|| Path::new(".")),
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.workdir.is_some()
    }
}

/// Output file produced by a finished run
#[derive(Debug, Clone)]
pub struct OutputBundle {
    pub task: Task,
    pub path: PathBuf,
}

/// A propagation model wrapping one external executable
pub trait Simulator: Send + Sync {
    fn name(&self) -> &str;

    /// 2 or 3
    fn dim(&self) -> usize;

    /// Why the model cannot run `task` on `env`, if it cannot
    fn check(&self, env: Option<&Environment>, task: Option<Task>, dim: Option<usize>) -> Result<(), AubellhopError>;

    fn supports(&self, env: Option<&Environment>, task: Option<Task>, dim: Option<usize>) -> bool {
        self.check(env, task, dim).is_ok()
    }

    /// Write the input files for `env` and `task`
    fn prepare(&self, env: &Environment, task: Task) -> Result<InputBundle, AubellhopError>;

    /// Run the executable on prepared inputs and wait for it
    fn execute(&self, input: &InputBundle) -> Result<OutputBundle, AubellhopError>;

    fn parse(&self, output: &OutputBundle) -> Result<TaskResult, AubellhopError>;

    /// Prepare, execute and parse; working files are removed afterwards
    fn run(&self, env: &Environment, task: Task) -> Result<TaskResult, AubellhopError> {
        self.check(Some(env), Some(task), None)?;
        let input = self.prepare(env, task)?;
        let result = self.execute(&input).and_then(|output| self.parse(&output));
        self.cleanup(input);
        result
    }

    /// Release the files of a run
    fn cleanup(&self, input: InputBundle) {
        drop(input);
    }

    /// Run an existing input file in place
    fn run_file(&self, env_file: &Path, _task: Task) -> Result<TaskResult, AubellhopError> {
        Err(AubellhopError::UnsupportedTaskError {
            model: self.name().to_string(),
            reason: format!("running `{}` in place", env_file.display()),
        })
    }
}

/// Wrapper around the Bellhop and Bellhop3D executables
#[derive(Debug, Clone)]
pub struct BellhopSimulator {
    name: String,
    options: SimulatorOptions,
}

impl BellhopSimulator {
    pub fn new(name: &str, options: SimulatorOptions) -> BellhopSimulator {
        BellhopSimulator { name: name.to_string(), options }
    }

    pub fn options(&self) -> &SimulatorOptions {
        &self.options
    }

    /// Full path of the executable, if it can be found
    pub fn executable(&self) -> Option<PathBuf> {
        which(&self.options.exe)
    }

    fn timeout(&self) -> Option<Duration> {
        self.options.timeout_secs
            .filter(|t| t.is_finite() && *t > 0.0)
            .map(Duration::from_secs_f64)
    }

    fn spawn(&self, exe: &Path, input: &InputBundle) -> Result<(Child, PathBuf), AubellhopError> {
        let log_path = with_ext(&input.base, FileExt::LOG);
        let stdout = File::create(&log_path)?;
        let stderr = stdout.try_clone()?;

        let child = Command::new(exe)
            .arg(&input.base)
            .current_dir(input.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()?;
        Ok((child, log_path))
    }

    fn wait(&self, exe: &Path, child: &mut Child) -> Result<ExitStatus, AubellhopError> {
        let timeout = match self.timeout() {
            Some(t) => t,
            None => return Ok(child.wait()?),
        };
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                warn!("`{}` exceeded {:?}; terminating", exe.display(), timeout);
                child.kill()?;
                child.wait()?;
                return Err(AubellhopError::TimeoutError { exe: exe.to_path_buf(), timeout });
            }
            thread::sleep(WAIT_POLL);
        }
    }
}

impl Simulator for BellhopSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.options.dim
    }

    fn check(&self, env: Option<&Environment>, _task: Option<Task>, dim: Option<usize>) -> Result<(), AubellhopError> {
        let dim = dim.or_else(|| env.map(|e| e.dim()));
        if let Some(d) = dim {
            if d != self.options.dim {
                return Err(AubellhopError::UnsupportedTaskError {
                    model: self.name.clone(),
                    reason: format!("{}-D environments (it is a {}-D model)", d, self.options.dim),
                });
            }
        }
        if self.executable().is_none() {
            return Err(AubellhopError::ExecutableNotFoundError(self.options.exe.clone()));
        }
        Ok(())
    }

    fn prepare(&self, env: &Environment, task: Task) -> Result<InputBundle, AubellhopError> {
        let (base, workdir) = match &self.options.work_base {
            Some(base) => {
                let base = absolute(base)?;
                // stale outputs of an earlier run must not be mistaken for this run's
                remove_run_files(&base, &FileExt::ALL);
                (base, None)
            },
            None => {
                let dir = tempfile::Builder::new().prefix("aubellhop-").tempdir()?;
                (dir.path().join(&self.name), Some(dir))
            },
        };
        let files = write_env_files(env, task, &base)?;
        Ok(InputBundle { task, base, files, workdir })
    }

    fn execute(&self, input: &InputBundle) -> Result<OutputBundle, AubellhopError> {
        let exe = self.executable()
            .ok_or_else(|| AubellhopError::ExecutableNotFoundError(self.options.exe.clone()))?;
        let command = format!("{} {}", exe.display(), input.base.display());
        debug!("Running: {}", command);

        let (mut child, log_path) = self.spawn(&exe, input)?;
        let status = self.wait(&exe, &mut child)?;
        let output = read_log(&log_path);
        if !output.trim().is_empty() {
            debug!("{}", output.trim());
        }

        if !status.success() {
            return Err(AubellhopError::ExternalToolError {
                exe,
                command,
                status: status.to_string(),
                output: output.trim().to_string(),
                prt: prt_extract(&with_ext(&input.base, FileExt::PRT)),
            });
        }
        Ok(OutputBundle { task: input.task, path: with_ext(&input.base, input.task.output_extension()) })
    }

    fn parse(&self, output: &OutputBundle) -> Result<TaskResult, AubellhopError> {
        Ok(match output.task {
            Task::Arrivals => TaskResult::Arrivals(read_arrivals(&output.path)?),
            Task::Eigenrays | Task::Rays => TaskResult::Rays(read_rays(&output.path)?),
        })
    }

    fn cleanup(&self, input: InputBundle) {
        if input.is_temporary() {
            debug!("Removing working directory `{}`", input.dir().display());
        } else if self.options.keep_files {
            debug!("Working files NOT deleted: {}.*", input.base.display());
        } else {
            remove_run_files(&input.base, &FileExt::ALL);
        }
        drop(input);
    }

    fn run_file(&self, env_file: &Path, task: Task) -> Result<TaskResult, AubellhopError> {
        let base = absolute(&env_file.with_extension(""))?;
        let input = InputBundle { task, base: base.clone(), files: vec![env_file.to_path_buf()], workdir: None };
        remove_run_files(&base, &[FileExt::ARR, FileExt::RAY, FileExt::PRT, FileExt::LOG]);

        let result = self.execute(&input).and_then(|output| self.parse(&output));
        if !self.options.keep_files {
            remove_run_files(&base, &[FileExt::ARR, FileExt::RAY, FileExt::PRT, FileExt::LOG]);
        }
        result
    }
}

/// Captured output of a run; bytes that are not UTF-8 are replaced
fn read_log(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Could not read output log `{}`: {}", path.display(), e);
            String::new()
        },
    }
}

/// Lines following Bellhop's fatal error marker, prefixed `[FATAL]`
pub fn prt_extract(prt: &Path) -> Option<String> {
    let file = File::open(prt).ok()?;
    let mut fatal = false;
    let mut err = String::new();
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if fatal && !line.trim().is_empty() {
            err.push_str("[FATAL] ");
            err.push_str(line.trim());
            err.push('\n');
        }
        if line.contains(PRT_FATAL) {
            fatal = true;
        }
    }
    if err.is_empty() { None } else { Some(err) }
}

/// Locate an executable: names with a path separator are taken as paths,
/// plain names are searched in `PATH`
pub fn which(exe: &str) -> Option<PathBuf> {
    let candidate = Path::new(exe);
    if candidate.components().count() > 1 {
        // the child runs in its working directory, so relative paths are resolved here
        return Some(candidate.to_path_buf())
            .filter(|p| is_executable(p))
            .and_then(|p| absolute(&p).ok());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(exe))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).map_or(false, |m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn with_ext(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(ext);
    PathBuf::from(s)
}

fn remove_run_files(base: &Path, exts: &[&str]) {
    for ext in exts {
        let path = with_ext(base, ext);
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed `{}`", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!("Could not remove `{}`: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prt_extract_keeps_lines_after_marker() {
        let dir = tempfile::tempdir().unwrap();
        let prt = dir.path().join("run.prt");
        fs::write(&prt, "BELLHOP\n\n *** FATAL ERROR ***\n Generated by program or module READIN\n\n Unknown option for SSP\n").unwrap();

        let extract = prt_extract(&prt).unwrap();
        assert_eq!(extract, "[FATAL] Generated by program or module READIN\n[FATAL] Unknown option for SSP\n");
        assert_eq!(prt_extract(&dir.path().join("missing.prt")), None);
    }

    #[test]
    fn which_rejects_missing_paths() {
        assert_eq!(which("/definitely/not/here/bellhop.exe"), None);
        assert_eq!(which("no-such-bellhop-binary-on-path.exe"), None);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: SimulatorOptions = serde_json::from_str(r#"{ "exe": "bellhop3d.exe", "dim": 3 }"#).unwrap();
        assert_eq!(opts.dim, 3);
        assert_eq!(opts.timeout_secs, None);
        assert!(serde_json::from_str::<SimulatorOptions>(r#"{ "exe_path": "x" }"#).is_err());
    }
}
