use std::path::PathBuf;

/// File watcher failures. All of them stop the watcher for good.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot watch {0}")]
    Attach(PathBuf, #[source] notify::Error),

    #[error("cannot start file watcher")]
    Init(#[source] notify::Error),

    #[error("file watcher failed")]
    Notify(#[source] notify::Error),

    #[error("cannot start watcher runtime")]
    Runtime(#[source] std::io::Error),

    #[error("file watcher task ended unexpectedly")]
    Task(#[source] tokio::task::JoinError),
}
