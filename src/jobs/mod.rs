//! Bounded pool of external processes.
//!
//! Jobs are deferred: a job is a closure that spawns a [`Child`], called only
//! once a slot is free, so process creation itself is rate limited. A single
//! controlling thread polls every running child with `try_wait` and drains its
//! pipes in between; no child is ever waited on while siblings still run.
//!
//! ## Example
//!
//! ```no_run
//! use srcinfo::jobs::{ProcessJob, ProcessPool};
//! use std::process::Command;
//!
//! let jobs = ["a.c", "b.c"].map(|f| {
//!     let mut cmd = Command::new("cppcheck");
//!     cmd.arg(f);
//!     ProcessJob::command(cmd)
//! });
//! let reports = ProcessPool::new(4).run(jobs, |done| {
//!     print!("{}", String::from_utf8_lossy(&done.stdout));
//!     Ok(None)
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod reader;

pub use reader::Captured;

use anyhow::{Context, Result};
use reader::PipeReader;
use std::io::{self, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

type StartFn = Box<dyn FnOnce() -> io::Result<Child>>;

/// A deferred process: nothing runs until the pool calls `start`.
pub struct ProcessJob {
    label: String,
    start: StartFn,
}

impl ProcessJob {
    pub fn new(label: impl Into<String>, start: impl FnOnce() -> io::Result<Child> + 'static) -> Self {
        Self {
            label: label.into(),
            start: Box::new(start),
        }
    }

    /// Spawn `cmd` with stdout/stderr piped and stdin closed.
    pub fn command(mut cmd: Command) -> Self {
        let label = std::iter::once(cmd.get_program())
            .chain(cmd.get_args())
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(label, move || {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
        })
    }
}

/// What the finish callback sees for one exited process.
#[derive(Debug)]
pub struct FinishedJob {
    /// Position of the job in the submitted sequence.
    pub index: usize,
    pub label: String,
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Killed because it outlived the pool's timeout.
    pub timed_out: bool,
}

/// Outcome of one job, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub index: usize,
    pub label: String,
    /// The callback's override when it returned one, else the process exit code.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl JobReport {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

type FinishFn<'a> = &'a mut dyn FnMut(&FinishedJob) -> Result<Option<i32>>;

struct RunningJob {
    index: usize,
    label: String,
    child: Child,
    reader: PipeReader,
    captured: Captured,
    started: Instant,
    timed_out: bool,
}

impl RunningJob {
    fn start(index: usize, job: ProcessJob) -> Result<Self> {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        let mut child = (job.start)().with_context(|| format!("Failed to start job {}", job.label))?;
        let reader = PipeReader::attach(&mut child);
        tracing::debug!(index, label = %job.label, pid = child.id(), "job started");
        Ok(Self {
            index,
            label: job.label,
            child,
            reader,
            captured: Captured::default(),
            started: Instant::now(),
            timed_out: false,
        })
    }

    fn kill_if_expired(&mut self, timeout: Option<Duration>) {
        if let Some(limit) = timeout
            && !self.timed_out
            && self.started.elapsed() >= limit
        {
            tracing::warn!(label = %self.label, ?limit, "job timed out, killing");
            let _ = self.child.kill();
            self.timed_out = true;
        }
    }

    /// Non-blocking: drain pipes, then check whether the child has exited.
    fn poll(&mut self, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
        self.reader.drain(&mut self.captured);
        let status = self.child.try_wait()?;
        if status.is_none() {
            self.kill_if_expired(timeout);
        }
        Ok(status)
    }

    /// Block until exit. Polls instead of `wait` only when a deadline applies.
    fn wait(&mut self, timeout: Option<Duration>, interval: Duration) -> io::Result<ExitStatus> {
        if timeout.is_none() {
            return self.child.wait();
        }
        loop {
            if let Some(status) = self.poll(timeout)? {
                return Ok(status);
            }
            thread::sleep(interval);
        }
    }

    fn finish(self, status: ExitStatus) -> FinishedJob {
        let RunningJob {
            index,
            label,
            reader,
            mut captured,
            timed_out,
            ..
        } = self;
        reader.finish(&mut captured);
        tracing::debug!(index, %label, code = ?status.code(), "job finished");
        FinishedJob {
            index,
            label,
            status,
            stdout: captured.stdout,
            stderr: captured.stderr,
            timed_out,
        }
    }

    /// Reap after an unrecoverable polling error.
    fn abandon(mut self) -> FinishedJob {
        let _ = self.child.kill();
        let status = self.child.wait().unwrap_or_default();
        self.finish(status)
    }
}

/// Runs [`ProcessJob`]s with at most `max_concurrency` alive at once.
#[derive(Debug, Clone)]
pub struct ProcessPool {
    max_concurrency: usize,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl Default for ProcessPool {
    fn default() -> Self {
        Self::new(default_jobs())
    }
}

/// Number of jobs to run when none is requested: one per available CPU.
pub fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ProcessPool {
    /// `max_concurrency` of 0 is treated as 1.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Kill any job still running after `timeout`; it is finalized like any other.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every job, calling `on_finish` once per job as it exits.
    ///
    /// A non-zero exit is not an error here. If `on_finish` (or starting a job)
    /// fails, no further jobs are started, jobs already running are drained and
    /// reaped without further callbacks, and then the first error is returned.
    pub fn run<I, F>(&self, jobs: I, mut on_finish: F) -> Result<Vec<JobReport>>
    where
        I: IntoIterator<Item = ProcessJob>,
        F: FnMut(&FinishedJob) -> Result<Option<i32>>,
    {
        self.run_inner(jobs, Some(&mut on_finish))
    }

    /// Run every job, discarding output.
    pub fn run_quiet<I>(&self, jobs: I) -> Result<Vec<JobReport>>
    where
        I: IntoIterator<Item = ProcessJob>,
    {
        self.run_inner(jobs, None)
    }

    fn run_inner<I>(&self, jobs: I, on_finish: Option<FinishFn<'_>>) -> Result<Vec<JobReport>>
    where
        I: IntoIterator<Item = ProcessJob>,
    {
        if self.max_concurrency == 1 {
            self.run_sequential(jobs, on_finish)
        } else {
            self.run_concurrent(jobs, on_finish)
        }
    }

    fn run_sequential<I>(&self, jobs: I, mut on_finish: Option<FinishFn<'_>>) -> Result<Vec<JobReport>>
    where
        I: IntoIterator<Item = ProcessJob>,
    {
        let mut reports = Vec::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let mut running = RunningJob::start(index, job)?;
            let status = running
                .wait(self.timeout, self.poll_interval)
                .with_context(|| format!("Failed to wait for job {}", running.label))?;
            let finished = running.finish(status);
            reports.push(finalize(&finished, &mut on_finish)?);
        }
        Ok(reports)
    }

    fn run_concurrent<I>(&self, jobs: I, mut on_finish: Option<FinishFn<'_>>) -> Result<Vec<JobReport>>
    where
        I: IntoIterator<Item = ProcessJob>,
    {
        let mut queue = jobs.into_iter().enumerate();
        let mut running: Vec<RunningJob> = Vec::new();
        let mut reports = Vec::new();
        let mut failure: Option<anyhow::Error> = None;

        loop {
            // 1. Fill free slots, in submission order
            while failure.is_none() && running.len() < self.max_concurrency {
                let Some((index, job)) = queue.next() else {
                    break;
                };
                match RunningJob::start(index, job) {
                    Ok(job) => running.push(job),
                    Err(e) => failure = Some(e),
                }
            }

            if running.is_empty() {
                break;
            }

            // 2. Poll everything in flight
            let mut finished_any = false;
            let mut i = 0;
            while i < running.len() {
                let finished = match running[i].poll(self.timeout) {
                    Ok(None) => {
                        i += 1;
                        continue;
                    }
                    Ok(Some(status)) => running.remove(i).finish(status),
                    Err(e) => {
                        let job = running.remove(i);
                        let label = job.label.clone();
                        job.abandon();
                        if failure.is_none() {
                            failure = Some(anyhow::Error::new(e).context(format!(
                                "Failed to poll job {}",
                                label
                            )));
                        }
                        finished_any = true;
                        continue;
                    }
                };
                finished_any = true;

                if failure.is_some() {
                    continue;
                }
                match finalize(&finished, &mut on_finish) {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        tracing::debug!(
                            in_flight = running.len(),
                            "finish callback failed, draining remaining jobs"
                        );
                        failure = Some(e);
                    }
                }
            }

            // 3. Back off only when nothing freed a slot
            if !finished_any {
                thread::sleep(self.poll_interval);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

fn finalize(finished: &FinishedJob, on_finish: &mut Option<FinishFn<'_>>) -> Result<JobReport> {
    let exit_code = match on_finish {
        Some(callback) => (*callback)(finished)?.or(finished.status.code()),
        None => finished.status.code(),
    };
    Ok(JobReport {
        index: finished.index,
        label: finished.label.clone(),
        exit_code,
        timed_out: finished.timed_out,
    })
}
