//! One-shot pipeline: scan, provision, validate, export, hand off.
//!
//! ```text
//! Idle -> Scanning -> Provisioning -> Validating -> Exporting -> HandedOff
//! ```
//!
//! Every transition is unconditional. [`Pipeline::run`] consumes the
//! pipeline and [`Prepared::hand_off`] consumes the prepared state, so each
//! stage runs exactly once per value.

use {
    crate::{
        device::{DeviceCandidate, DeviceSet},
        error::{Error, Result},
        export::ExportedConfig,
        fs::DeviceFs,
        provision::{DeviceNodeProvisioner, ProvisionOutcome, Provisioned},
        scan::DeviceScanner,
        validate::{PermissionReport, PermissionValidator},
    },
    log::{debug, info},
    std::{os::unix::process::CommandExt, process::Command},
};

/// Pipeline progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Listing the device directory.
    Scanning,
    /// Creating sandbox nodes.
    Provisioning,
    /// Checking read/write access.
    Validating,
    /// Deriving the exported values.
    Exporting,
    /// Control passed to the consumer (terminal).
    HandedOff,
}

/// Everything observed during one run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Discovered devices in priority order.
    pub devices: DeviceSet,
    /// Provisioning outcome per device, same order.
    pub provisioned: Vec<Provisioned>,
    /// Accessibility per device, same order.
    pub permissions: Vec<PermissionReport>,
    /// Values published to the consumer.
    pub exported: ExportedConfig,
}

impl PipelineReport {
    /// Per-device view joining the three stage results.
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (&DeviceCandidate, &ProvisionOutcome, &PermissionReport)> {
        self.devices
            .iter()
            .zip(&self.provisioned)
            .zip(&self.permissions)
            .map(|((d, p), r)| (d, &p.outcome, r))
    }
}

/// Passes control to the consumer process.
pub trait Handoff {
    /// Start the consumer with the exported values in its environment.
    ///
    /// Implementations that replace the current process return only on
    /// failure.
    fn hand_off(&mut self, exported: &ExportedConfig) -> Result<()>;
}

/// Replaces the current process with the consumer command.
#[derive(Debug, Clone)]
pub struct ExecHandoff {
    command: Vec<String>,
}

impl ExecHandoff {
    /// Create a handoff for `program args...`.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// The consumer command line.
    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl Handoff for ExecHandoff {
    fn hand_off(&mut self, exported: &ExportedConfig) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(Error::Handoff("consumer command is empty".to_string()));
        };

        info!("Handing off to {}", self.command.join(" "));
        let err = Command::new(program)
            .args(args)
            .envs(exported.env_pairs())
            .exec();

        Err(Error::Handoff(format!("cannot execute {program}: {err}")))
    }
}

/// Sequences the stages over a [`DeviceFs`].
pub struct Pipeline<F: DeviceFs> {
    scanner: DeviceScanner,
    provisioner: DeviceNodeProvisioner,
    validator: PermissionValidator,
    fs: F,
    history: Vec<PipelineState>,
}

impl<F: DeviceFs> Pipeline<F> {
    /// Create a pipeline with the default provisioner.
    pub fn new(scanner: DeviceScanner, fs: F) -> Self {
        Self {
            scanner,
            provisioner: DeviceNodeProvisioner::default(),
            validator: PermissionValidator,
            fs,
            history: vec![PipelineState::Idle],
        }
    }

    /// Replace the provisioner.
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: DeviceNodeProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    fn advance(&mut self, next: PipelineState) {
        debug!("Pipeline: {:?} -> {next:?}", self.state());
        self.history.push(next);
    }

    /// Run Scan, Provision, Validate and Export.
    pub fn run(mut self) -> Prepared {
        self.advance(PipelineState::Scanning);
        let devices = self.scanner.scan(&self.fs);

        self.advance(PipelineState::Provisioning);
        let provisioned = self
            .provisioner
            .provision_all(&devices, &self.scanner, &self.fs);

        self.advance(PipelineState::Validating);
        let permissions = self
            .validator
            .validate(&devices, &self.fs);

        self.advance(PipelineState::Exporting);
        let exported = ExportedConfig::from_devices(&devices);
        info!(
            "Default serial port: {}",
            if exported.default_port.is_empty() {
                "<none>"
            } else {
                &exported.default_port
            }
        );

        Prepared {
            report: PipelineReport {
                devices,
                provisioned,
                permissions,
                exported,
            },
            history: self.history,
        }
    }
}

/// Pipeline state after export, awaiting handoff.
#[derive(Debug)]
pub struct Prepared {
    report: PipelineReport,
    history: Vec<PipelineState>,
}

impl Prepared {
    /// The run report.
    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    /// States visited so far.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Transfer control to the consumer.
    ///
    /// Returns the final report if the handoff returns control. A failed
    /// handoff leaves the pipeline in [`PipelineState::Exporting`].
    pub fn hand_off(mut self, handoff: &mut impl Handoff) -> Result<HandedOff> {
        if let Err(e) = handoff.hand_off(&self.report.exported) {
            debug!("Pipeline: handoff failed in Exporting: {e}");
            return Err(e);
        }

        debug!("Pipeline: Exporting -> HandedOff");
        self.history
            .push(PipelineState::HandedOff);

        Ok(HandedOff {
            report: self.report,
            history: self.history,
        })
    }
}

/// Terminal state for handoffs that return.
#[derive(Debug)]
pub struct HandedOff {
    /// The run report.
    pub report: PipelineReport,
    /// Every state visited, in order.
    pub history: Vec<PipelineState>,
}
