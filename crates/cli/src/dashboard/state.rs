//! Dashboard state and its text rendering.
//!
//! Every change goes through one of the `apply_*` methods so the runner
//! can own the state on a single task and redraw after each event.

use std::fmt::{self, Display, Write as _};

use scanflow_core::error::CoreError;
use scanflow_core::format::progress_bar;
use scanflow_core::types::{
    clamp_percent, short_id, Device, Profile, ProgressUpdate, ScanJob, ScanRequest, ServerStatus,
};

const BAR_WIDTH: usize = 30;

/// Result of the latest status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Checking,
    Connected { devices: u32 },
    Disconnected,
}

impl Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Checking => f.write_str("Checking..."),
            Connection::Connected { devices } => write!(f, "Connected ({devices} scanners)"),
            Connection::Disconnected => f.write_str("Not connected"),
        }
    }
}

/// A list panel loaded once from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    Loaded(Vec<T>),
    Failed,
}

/// Client-side view of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub id: String,
    pub status: String,
    pub profile: String,
    pub pages: usize,
    pub progress: u8,
}

impl From<&ScanJob> for JobCard {
    fn from(job: &ScanJob) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status.clone(),
            profile: job.profile.clone(),
            pages: job.page_count(),
            progress: job.progress_percent(),
        }
    }
}

/// Values that make up the next scan request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanForm {
    pub profile: String,
    pub output: String,
    pub title: String,
    pub submitting: bool,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub server: String,
    pub connection: Connection,
    pub devices: ListState<Device>,
    pub profiles: Vec<Profile>,
    pub form: ScanForm,
    pub jobs: Vec<JobCard>,
    pub alert: Option<String>,
    pub push_connected: bool,
}

impl Dashboard {
    pub fn new(
        server: impl Into<String>,
        profile: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            connection: Connection::Checking,
            devices: ListState::Loading,
            profiles: Vec::new(),
            form: ScanForm {
                profile: profile.into(),
                output: output.into(),
                title: String::new(),
                submitting: false,
            },
            jobs: Vec::new(),
            alert: None,
            push_connected: false,
        }
    }

    pub fn apply_status<E: Display>(&mut self, result: Result<ServerStatus, E>) {
        self.connection = match result {
            Ok(status) => Connection::Connected {
                devices: status.devices,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Status check failed");
                Connection::Disconnected
            }
        };
    }

    pub fn apply_devices<E: Display>(&mut self, result: Result<Vec<Device>, E>) {
        self.devices = match result {
            Ok(devices) => ListState::Loaded(devices),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load devices");
                ListState::Failed
            }
        };
    }

    /// Replace the profile options. A failure keeps whatever was loaded
    /// before.
    pub fn apply_profiles<E: Display>(&mut self, result: Result<Vec<Profile>, E>) {
        match result {
            Ok(profiles) => {
                let known = profiles.iter().any(|p| p.name() == self.form.profile);
                if !known {
                    if let Some(first) = profiles.first() {
                        self.form.profile = first.name().to_string();
                    }
                }
                self.profiles = profiles;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load profiles");
            }
        }
    }

    /// Select a profile. Only names from the loaded list are accepted
    /// once the list is known.
    pub fn select_profile(&mut self, name: &str) -> Result<(), CoreError> {
        if !self.profiles.is_empty() && !self.profiles.iter().any(|p| p.name() == name) {
            return Err(CoreError::NotFound {
                entity: "profile",
                id: name.to_string(),
            });
        }
        self.form.profile = name.to_string();
        Ok(())
    }

    pub fn set_output(&mut self, target: &str) {
        self.form.output = target.to_string();
    }

    pub fn set_title(&mut self, title: &str) {
        self.form.title = title.trim().to_string();
    }

    /// Request built from the current form values.
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest::for_profile(self.form.profile.as_str())
            .with_output(self.form.output.as_str())
            .with_title(&self.form.title)
    }

    /// Mark a submission as in flight. Returns `None` while another
    /// submission is still pending.
    pub fn begin_submit(&mut self) -> Option<ScanRequest> {
        if self.form.submitting {
            return None;
        }
        self.form.submitting = true;
        self.alert = None;
        Some(self.scan_request())
    }

    /// Outcome of a submission. Success adds a card and clears the title.
    pub fn scan_submitted<E: Display>(&mut self, result: Result<ScanJob, E>) {
        self.form.submitting = false;
        match result {
            Ok(job) => {
                self.add_job(&job);
                self.form.title.clear();
            }
            Err(e) => self.alert = Some(format!("Scan failed: {e}")),
        }
    }

    pub fn set_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    /// Prepend a card for `job`, replacing any card with the same id.
    pub fn add_job(&mut self, job: &ScanJob) {
        self.jobs.retain(|card| card.id != job.id);
        self.jobs.insert(0, JobCard::from(job));
    }

    /// Patch the matching card. Fields absent from the update are kept and
    /// updates for unknown jobs are dropped.
    pub fn apply_update(&mut self, update: &ProgressUpdate) {
        let Some(card) = self.jobs.iter_mut().find(|c| c.id == update.job_id) else {
            return;
        };
        if let Some(status) = &update.status {
            card.status = status.clone();
        }
        if let Some(progress) = update.progress {
            card.progress = clamp_percent(progress);
        }
    }

    pub fn set_push_connected(&mut self, connected: bool) {
        self.push_connected = connected;
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "ScanFlow  {}", self.server)?;
        let updates = if self.push_connected { "live" } else { "reconnecting" };
        writeln!(out, "Status: {}    Updates: {}", self.connection, updates)?;

        writeln!(out, "\nScanners")?;
        match &self.devices {
            ListState::Loading => writeln!(out, "  Loading...")?,
            ListState::Failed => writeln!(out, "  Failed to load")?,
            ListState::Loaded(devices) if devices.is_empty() => {
                writeln!(out, "  No scanner found")?
            }
            ListState::Loaded(devices) => {
                for device in devices {
                    writeln!(out, "  {} {}", device.vendor, device.model)?;
                    writeln!(out, "    {}", device.name)?;
                }
            }
        }

        writeln!(out, "\nProfiles")?;
        if self.profiles.is_empty() {
            writeln!(out, "  -")?;
        }
        for profile in &self.profiles {
            let marker = if profile.name() == self.form.profile { '*' } else { ' ' };
            writeln!(out, "  {marker} {}", profile.label())?;
        }

        writeln!(out, "\nScan")?;
        let title = if self.form.title.is_empty() {
            "-"
        } else {
            self.form.title.as_str()
        };
        writeln!(
            out,
            "  profile: {}  output: {}  title: {}",
            self.form.profile, self.form.output, title
        )?;
        if self.form.submitting {
            writeln!(out, "  Scanning...")?;
        }
        if let Some(alert) = &self.alert {
            writeln!(out, "\n! {alert}")?;
        }

        writeln!(out, "\nJobs")?;
        if self.jobs.is_empty() {
            writeln!(out, "  No jobs yet")?;
        }
        for card in &self.jobs {
            writeln!(out, "  {}  {}", short_id(&card.id), card.status)?;
            writeln!(out, "    Profile: {} | Pages: {}", card.profile, card.pages)?;
            writeln!(
                out,
                "    {} {:>3}%",
                progress_bar(card.progress, BAR_WIDTH),
                card.progress
            )?;
        }

        writeln!(
            out,
            "\nscan [profile] [output] [title...] | profile <name> | output <target> | title <text> | refresh | quit"
        )
    }
}
