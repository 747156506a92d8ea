//! Process supervision.
//!
//! The [`Supervisor`] owns the pid file for the lifetime of a run and turns
//! OS control signals into events on its own control channel:
//!
//! | Signal          | Event  | Effect                         |
//! |-----------------|--------|--------------------------------|
//! | SIGINT, SIGTERM | stop   | cancels the run token          |
//! | SIGUSR2         | reload | logged                         |
//!
//! [`send_control_signal`] is the other side: it reads the pid file of a
//! running instance and delivers the matching signal.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ControlSignal;
use crate::error_handling::ControlError;

/// Owns the pid file and the control channel of a running collector.
pub struct Supervisor {
    pid_file: PathBuf,
    cancel: CancellationToken,
    control: mpsc::UnboundedSender<ControlSignal>,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Claims `pid_file` and starts listening for control signals.
    ///
    /// A pid file naming a live process other than this one is refused;
    /// stale or unreadable pid files are replaced. Must be called from within
    /// a tokio runtime.
    pub fn start(pid_file: &Path) -> Result<Self, ControlError> {
        claim_pid_file(pid_file)?;

        let cancel = CancellationToken::new();
        let (control, events) = mpsc::unbounded_channel();

        let mut tasks = vec![tokio::spawn(control_loop(events, cancel.clone()))];
        tasks.extend(spawn_signal_listeners(&control));

        Ok(Supervisor {
            pid_file: pid_file.to_path_buf(),
            cancel,
            control,
            tasks,
        })
    }

    /// Token cancelled when a stop is requested.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Sender feeding the same channel as the OS signal listeners.
    pub fn control_sender(&self) -> mpsc::UnboundedSender<ControlSignal> {
        self.control.clone()
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Stops listening and removes the pid file if it is still ours.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }

        match read_pid(&self.pid_file) {
            Ok(pid) if pid == current_pid() => match fs::remove_file(&self.pid_file) {
                Ok(()) => info!("Removed pid file {}", self.pid_file.display()),
                Err(e) => error!("Failed to remove pid file {}: {}", self.pid_file.display(), e),
            },
            Ok(pid) => warn!(
                "Pid file {} now belongs to pid {}, leaving it",
                self.pid_file.display(),
                pid
            ),
            Err(e) => debug!("Pid file not removed: {}", e),
        }
    }
}

async fn control_loop(mut events: mpsc::UnboundedReceiver<ControlSignal>, cancel: CancellationToken) {
    while let Some(event) = events.recv().await {
        match event {
            ControlSignal::Stop => {
                if cancel.is_cancelled() {
                    info!("Stop already requested, waiting for in-flight lookups");
                } else {
                    info!("Stop requested, finishing in-flight lookups");
                    cancel.cancel();
                }
            }
            ControlSignal::Reload => {
                info!("Reload requested; configuration is read at startup only");
            }
        }
    }
}

#[cfg(unix)]
fn spawn_signal_listeners(control: &mpsc::UnboundedSender<ControlSignal>) -> Vec<JoinHandle<()>> {
    use tokio::signal::unix::SignalKind;

    [
        (SignalKind::interrupt(), "SIGINT", ControlSignal::Stop),
        (SignalKind::terminate(), "SIGTERM", ControlSignal::Stop),
        (SignalKind::user_defined2(), "SIGUSR2", ControlSignal::Reload),
    ]
    .into_iter()
    .map(|(kind, name, event)| {
        let control = control.clone();
        tokio::spawn(async move {
            let mut stream = match tokio::signal::unix::signal(kind) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to install {} handler: {}", name, e);
                    return;
                }
            };
            while stream.recv().await.is_some() {
                info!("Received {}", name);
                if control.send(event).is_err() {
                    break;
                }
            }
        })
    })
    .collect()
}

#[cfg(not(unix))]
fn spawn_signal_listeners(control: &mpsc::UnboundedSender<ControlSignal>) -> Vec<JoinHandle<()>> {
    let control = control.clone();
    vec![tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C");
            if control.send(ControlSignal::Stop).is_err() {
                break;
            }
        }
    })]
}

fn current_pid() -> i32 {
    std::process::id() as i32
}

fn claim_pid_file(pid_file: &Path) -> Result<(), ControlError> {
    match read_pid(pid_file) {
        Ok(pid) if pid != current_pid() && process_alive(pid) => {
            return Err(ControlError::AlreadyRunning(pid));
        }
        Ok(pid) => info!(
            "Replacing stale pid file {} (pid {})",
            pid_file.display(),
            pid
        ),
        Err(ControlError::PidFileRead { source, .. }) if source.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Replacing unreadable pid file: {}", e),
    }

    fs::write(pid_file, current_pid().to_string()).map_err(|source| ControlError::PidFileWrite {
        path: pid_file.display().to_string(),
        source,
    })?;
    info!("Collector pid {} written to {}", current_pid(), pid_file.display());
    Ok(())
}

/// Reads the process id stored in `pid_file`.
pub fn read_pid(pid_file: &Path) -> Result<i32, ControlError> {
    let content = fs::read_to_string(pid_file).map_err(|source| ControlError::PidFileRead {
        path: pid_file.display().to_string(),
        source,
    })?;
    match content.trim().parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(ControlError::InvalidPid {
            path: pid_file.display().to_string(),
            content,
        }),
    }
}

#[cfg(unix)]
fn process_alive(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid;

    // EPERM: the process exists but belongs to someone else
    matches!(
        signal::kill(Pid::from_raw(pid), None),
        Ok(()) | Err(Errno::EPERM)
    )
}

#[cfg(not(unix))]
fn process_alive(_pid: i32) -> bool {
    false
}

/// Delivers `signal` to the collector whose pid is stored in `pid_file`.
///
/// Stop is sent as SIGINT, reload as SIGUSR2.
#[cfg(unix)]
pub fn send_control_signal(pid_file: &Path, signal: ControlSignal) -> Result<i32, ControlError> {
    use nix::sys::signal::{self as nix_signal, Signal};
    use nix::unistd::Pid;

    let pid = read_pid(pid_file)?;
    let os_signal = match signal {
        ControlSignal::Stop => Signal::SIGINT,
        ControlSignal::Reload => Signal::SIGUSR2,
    };
    nix_signal::kill(Pid::from_raw(pid), os_signal).map_err(|e| ControlError::SignalDelivery {
        pid,
        reason: e.to_string(),
    })?;
    info!("Sent {:?} to pid {}", os_signal, pid);
    Ok(pid)
}

#[cfg(not(unix))]
pub fn send_control_signal(pid_file: &Path, _signal: ControlSignal) -> Result<i32, ControlError> {
    let pid = read_pid(pid_file)?;
    Err(ControlError::SignalDelivery {
        pid,
        reason: "control signals are only supported on Unix".to_string(),
    })
}
