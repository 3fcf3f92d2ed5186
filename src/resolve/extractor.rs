use crate::resolve::classify::ExtractionTarget;
use crate::resolve::cookies::CookieAuth;
use crate::resolve::error::{ExtractionError, stderr_message};
use crate::resolve::models::ExtractionResult;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Out-of-process media info lookup.
pub trait Extractor {
    fn extract(
        &self,
        target: &ExtractionTarget,
        auth: Option<&CookieAuth>,
    ) -> impl Future<Output = Result<ExtractionResult, ExtractionError>> + Send;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
            extra_args: Vec::new(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    fn command(&self, target: &ExtractionTarget, auth: Option<&CookieAuth>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--dump-single-json",
            "--no-check-certificates",
            "--prefer-free-formats",
            "--no-warnings",
        ]);

        match auth {
            Some(CookieAuth::File(path)) => {
                cmd.arg("--cookies").arg(path);
            }
            Some(CookieAuth::Header(header)) => {
                cmd.arg("--add-header").arg(format!("Cookie:{header}"));
            }
            None => {}
        }

        cmd.args(&self.extra_args);
        // `--` keeps a query like "-v" from being read as a flag.
        cmd.arg("--").arg(target.as_str());

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers yt-dlp forks can be killed with it.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

/// SIGKILLs the extractor's process group when dropped unless disarmed.
/// Covers both the timeout path and a caller dropping the future.
struct GroupKill {
    pgid: Option<u32>,
}

impl GroupKill {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; pgid is the group created at spawn.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        tracing::debug!(pgid, error = %io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl Extractor for YtDlp {
    async fn extract(
        &self,
        target: &ExtractionTarget,
        auth: Option<&CookieAuth>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let mut child = self
            .command(target, auth)
            .spawn()
            .map_err(|source| ExtractionError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        tracing::debug!(pid = child.id(), %target, "spawned extractor");
        let mut group = GroupKill::new(child.id());

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let run = async {
            tokio::try_join!(read_all(stdout), read_all(stderr), child.wait())
        };
        let finished = tokio::time::timeout(self.timeout, run).await;

        let (stdout, stderr, status) = match finished {
            Ok(res) => {
                let out = res?;
                group.disarm();
                out
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, %target, "extractor timed out, killing it");
                group.kill();
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "extractor already exited");
                }
                if let Err(e) = child.wait().await {
                    tracing::warn!(error = %e, "failed to reap extractor");
                }
                return Err(ExtractionError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            tracing::debug!(code = ?status.code(), "extractor exited with failure");
            return Err(ExtractionError::Failed {
                message: stderr_message(&stderr),
            });
        }

        Ok(serde_json::from_slice(&stdout)?)
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
