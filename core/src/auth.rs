//! Biometric gate: sensor availability, fingerprint prompt and the resulting state.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::watch;

use crate::config::{VERIFY_ANY_FINGER, VERIFY_TIMEOUT};
use crate::error::BiometricError;
use crate::fprintd;

/// Outcome of the gate, held by the view for the lifetime of one launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Pending,
    NotSupported,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    /// Whether the table may be fetched in this state.
    ///
    /// A missing sensor opens the app, so `NotSupported` passes the gate.
    pub fn allows_fetch(self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::NotSupported)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthState::Pending => "PENDING",
            AuthState::NotSupported => "NOT_SUPPORTED",
            AuthState::Authenticated => "AUTHENTICATED",
            AuthState::Unauthenticated => "UNAUTHENTICATED",
        };
        f.write_str(name)
    }
}

/// Capability report from the sensor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorInfo {
    pub available: bool,
    /// Reader kind, e.g. "press" or "swipe"
    pub sensor_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptResult {
    pub success: bool,
}

/// Platform biometric capability.
pub trait BiometricSensor: Send + Sync {
    /// Query whether a usable sensor is present.
    fn is_sensor_available(
        &self,
    ) -> impl Future<Output = Result<SensorInfo, BiometricError>> + Send;

    /// Ask the user to authenticate, showing `message`.
    fn simple_prompt(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<PromptResult, BiometricError>> + Send;
}

/// Handle that aborts a running fingerprint prompt.
///
/// Clones share one flag; once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct PromptCancel {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for PromptCancel {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl PromptCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called, immediately if it already was.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Run `work` until it finishes, the prompt is cancelled or `deadline` passes.
///
/// Returns `None` when stopped before `work` finished.
pub async fn until_stopped<F: Future>(
    work: F,
    cancel: &PromptCancel,
    deadline: Duration,
) -> Option<F::Output> {
    tokio::select! {
        output = work => Some(output),
        _ = cancel.cancelled() => {
            info!("Fingerprint prompt cancelled by the user");
            None
        }
        _ = tokio::time::sleep(deadline) => {
            warn!("No finger presented within {:?}", deadline);
            None
        }
    }
}

/// Returns `false` on any sensor failure.
pub async fn check_sensor_available<S: BiometricSensor>(sensor: &S) -> bool {
    match sensor.is_sensor_available().await {
        Ok(info) => {
            info!(
                "Biometric sensor available: {} (type: {})",
                info.available,
                info.sensor_type.as_deref().unwrap_or("unknown")
            );
            info.available
        }
        Err(e) => {
            warn!("Biometric sensor check failed: {}", e);
            false
        }
    }
}

/// Returns `false` on failure, cancellation or a non-matching finger alike.
pub async fn prompt_biometric<S: BiometricSensor>(sensor: &S, message: &str) -> bool {
    match sensor.simple_prompt(message).await {
        Ok(result) => {
            info!("Biometric prompt finished, success: {}", result.success);
            result.success
        }
        Err(e) => {
            warn!("Biometric prompt failed: {}", e);
            false
        }
    }
}

/// Run the gate once and return the new state.
pub async fn authenticate<S: BiometricSensor>(sensor: &S, message: &str) -> AuthState {
    if !check_sensor_available(sensor).await {
        info!("No usable biometric sensor, treating the app as open");
        return AuthState::NotSupported;
    }

    if prompt_biometric(sensor, message).await {
        AuthState::Authenticated
    } else {
        AuthState::Unauthenticated
    }
}

/// Fingerprint sensor served by the fprintd daemon on the system bus.
#[derive(Debug, Clone)]
pub struct FprintdSensor {
    cancel: PromptCancel,
    deadline: Duration,
}

impl Default for FprintdSensor {
    fn default() -> Self {
        Self {
            cancel: PromptCancel::new(),
            deadline: VERIFY_TIMEOUT,
        }
    }
}

impl FprintdSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensor whose prompt stops when `cancel` fires.
    pub fn with_cancel(cancel: PromptCancel) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    async fn device() -> Result<fprintd::Device, BiometricError> {
        let client = fprintd::Client::system().await?;
        fprintd::first_device(&client)
            .await?
            .ok_or(BiometricError::NoDeviceAvailable)
    }
}

impl BiometricSensor for FprintdSensor {
    async fn is_sensor_available(&self) -> Result<SensorInfo, BiometricError> {
        let device = match Self::device().await {
            Ok(device) => device,
            Err(BiometricError::NoDeviceAvailable) => {
                warn!("No fingerprint devices detected on this system");
                return Ok(SensorInfo::default());
            }
            Err(e) => return Err(e),
        };

        let name = device.name().await.unwrap_or_default();
        info!("Found fingerprint device '{}' at {}", name, device.object_path());

        let enrolled = match device.list_enrolled_fingers("").await {
            Ok(enrolled) => enrolled,
            Err(e) if fprintd::is_no_enrolled_prints(&e) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if enrolled.is_empty() {
            warn!("No fingerprints enrolled for the current user");
            return Ok(SensorInfo::default());
        }

        Ok(SensorInfo {
            available: true,
            sensor_type: device.scan_type().await.ok(),
        })
    }

    async fn simple_prompt(&self, message: &str) -> Result<PromptResult, BiometricError> {
        info!("Prompting for fingerprint: {}", message);
        let device = Self::device().await?;

        device.claim("").await?;
        let verify = device.verify(VERIFY_ANY_FINGER);
        let outcome = match until_stopped(verify, &self.cancel, self.deadline).await {
            Some(outcome) => outcome.map(|status| status.is_match()),
            None => {
                if let Err(e) = device.verify_stop().await {
                    warn!("Failed to stop verification: {}", e);
                }
                Ok(false)
            }
        };

        if let Err(e) = device.release().await {
            warn!("Failed to release fingerprint device: {}", e);
        }

        Ok(PromptResult { success: outcome? })
    }
}
