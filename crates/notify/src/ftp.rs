//! FTP upload of the report into a dated remote directory.
//!
//! The remote layout is `<remote_root>/<DD-MM-YYYY>/<report name>`. Missing
//! directories are created on the way down. `suppaftp`'s client is blocking,
//! so the whole session runs on the blocking pool.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use digest_core::FtpCredentials;
use digest_report::{ReportError, ReportFile};
use suppaftp::types::FileType;
use suppaftp::FtpStream;

use crate::traits::{Deliverer, DeliveryError};

/// Commands the upload needs from an open, logged-in FTP session.
pub trait FtpSession: Send {
    fn cwd(&mut self, dir: &str) -> Result<(), DeliveryError>;
    fn mkdir(&mut self, dir: &str) -> Result<(), DeliveryError>;
    /// Store `reader` as `name` in the current directory, returning bytes sent.
    fn put(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, DeliveryError>;
    fn quit(&mut self) -> Result<(), DeliveryError>;
}

/// Opens sessions. Implementations log in and switch to binary mode.
pub trait FtpConnector: Send + Sync {
    fn connect(
        &self,
        host: &str,
        port: u16,
        credentials: &FtpCredentials,
    ) -> Result<Box<dyn FtpSession>, DeliveryError>;
}

/// Plain FTP via `suppaftp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppaFtpConnector;

struct SuppaFtpSession(FtpStream);

impl FtpConnector for SuppaFtpConnector {
    fn connect(
        &self,
        host: &str,
        port: u16,
        credentials: &FtpCredentials,
    ) -> Result<Box<dyn FtpSession>, DeliveryError> {
        let mut stream =
            FtpStream::connect((host, port)).map_err(|e| DeliveryError::ftp("connect", e))?;
        stream
            .login(credentials.username.as_str(), credentials.password.as_str())
            .map_err(|e| DeliveryError::ftp("login", e))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| DeliveryError::ftp("binary mode", e))?;
        Ok(Box::new(SuppaFtpSession(stream)))
    }
}

impl FtpSession for SuppaFtpSession {
    fn cwd(&mut self, dir: &str) -> Result<(), DeliveryError> {
        self.0.cwd(dir).map_err(|e| DeliveryError::ftp("cwd", e))
    }

    fn mkdir(&mut self, dir: &str) -> Result<(), DeliveryError> {
        self.0.mkdir(dir).map_err(|e| DeliveryError::ftp("mkdir", e))
    }

    fn put(&mut self, name: &str, mut reader: &mut dyn Read) -> Result<u64, DeliveryError> {
        self.0
            .put_file(name, &mut reader)
            .map_err(|e| DeliveryError::ftp("store", e))
    }

    fn quit(&mut self) -> Result<(), DeliveryError> {
        self.0.quit().map_err(|e| DeliveryError::ftp("quit", e))
    }
}

/// Uploads the report to an FTP server.
pub struct FtpDeliverer {
    host: String,
    port: u16,
    credentials: FtpCredentials,
    remote_root: String,
    connector: Arc<dyn FtpConnector>,
}

impl FtpDeliverer {
    pub fn new(
        host: String,
        port: u16,
        credentials: FtpCredentials,
        remote_root: String,
        connector: Arc<dyn FtpConnector>,
    ) -> Result<Self, DeliveryError> {
        if host.trim().is_empty() {
            return Err(DeliveryError::Config("FTP host must not be empty".to_string()));
        }
        Ok(Self {
            host,
            port,
            credentials,
            remote_root,
            connector,
        })
    }

    /// Directory segments, root first, for a report dated `report`.
    pub fn remote_dirs(&self, report: &ReportFile) -> Vec<String> {
        self.remote_root
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .chain(std::iter::once(
                report.report_date().format("%d-%m-%Y").to_string(),
            ))
            .collect()
    }
}

impl std::fmt::Debug for FtpDeliverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpDeliverer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .field("remote_root", &self.remote_root)
            .finish()
    }
}

/// Enter `dir`, creating it first if the server refuses.
fn enter_or_create(session: &mut dyn FtpSession, dir: &str) -> Result<(), DeliveryError> {
    if session.cwd(dir).is_ok() {
        return Ok(());
    }
    tracing::debug!(dir, "Creating remote directory");
    session.mkdir(dir)?;
    session.cwd(dir)
}

fn store(
    session: &mut dyn FtpSession,
    dirs: &[String],
    name: &str,
    local: &Path,
) -> Result<u64, DeliveryError> {
    for dir in dirs {
        enter_or_create(session, dir)?;
    }
    let mut file = std::fs::File::open(local).map_err(|e| DeliveryError::Encode(ReportError::Io(e)))?;
    session.put(name, &mut file)
}

struct Upload {
    host: String,
    port: u16,
    credentials: FtpCredentials,
    dirs: Vec<String>,
    name: String,
    local: PathBuf,
}

fn upload(connector: &dyn FtpConnector, job: &Upload) -> Result<u64, DeliveryError> {
    let mut session = connector.connect(&job.host, job.port, &job.credentials)?;
    let stored = store(session.as_mut(), &job.dirs, &job.name, &job.local);
    // The session is closed whether or not the store succeeded.
    if let Err(e) = session.quit() {
        tracing::warn!(error = %e, "FTP session did not close cleanly");
    }
    stored
}

#[async_trait::async_trait]
impl Deliverer for FtpDeliverer {
    async fn deliver(&self, report: &ReportFile) -> Result<(), DeliveryError> {
        let job = Upload {
            host: self.host.clone(),
            port: self.port,
            credentials: self.credentials.clone(),
            dirs: self.remote_dirs(report),
            name: report.name().to_string(),
            local: report.path().to_path_buf(),
        };
        let remote_path = format!("{}/{}", job.dirs.join("/"), job.name);
        tracing::debug!(host = %self.host, port = self.port, remote = %remote_path, "Uploading report");

        let connector = Arc::clone(&self.connector);
        let bytes = tokio::task::spawn_blocking(move || upload(connector.as_ref(), &job))
            .await
            .map_err(|e| DeliveryError::ftp("upload task", e))??;

        tracing::info!(host = %self.host, remote = %remote_path, bytes, "Report uploaded");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "ftp"
    }
}
