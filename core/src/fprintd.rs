//! Async helpers for the fprintd D-Bus interface.

use std::fmt;

use futures_util::StreamExt;
use log::{info, warn};
use serde::{de::DeserializeOwned, Serialize};
use zbus::{Connection, Proxy};
use zvariant::{OwnedObjectPath, Type};

// D-Bus API Reference:
// BUS_NAME = 'net.reactivated.Fprint'
// MAIN_OBJ = '/net/reactivated/Fprint/Manager'
// SYSTEM_BUS = True

// VALID_VERIFY_STATUS = [
//     'verify-no-match',
//     'verify-match',
//     'verify-retry-scan',
//     'verify-too-fast',
//     'verify-swipe-too-short',
//     'verify-finger-not-centered',
//     'verify-remove-and-retry',
//     'verify-disconnected',
//     'verify-unknown-error'
// ]

/// D-Bus service name for fprintd.
pub const SERVICE: &str = "net.reactivated.Fprint";

/// Manager object path.
pub const MANAGER_PATH: &str = "/net/reactivated/Fprint/Manager";

/// Manager interface name.
pub const IFACE_MANAGER: &str = "net.reactivated.Fprint.Manager";

/// Device interface name.
pub const IFACE_DEVICE: &str = "net.reactivated.Fprint.Device";

/// Final `VerifyStatus` result for a recognised finger.
pub const VERIFY_MATCH: &str = "verify-match";

/// Raised by `ListEnrolledFingers` instead of returning an empty list.
pub const ERROR_NO_ENROLLED_PRINTS: &str = "net.reactivated.Fprint.Error.NoEnrolledPrints";

/// Whether `err` is fprintd reporting that the user has no enrolled prints.
pub fn is_no_enrolled_prints(err: &zbus::Error) -> bool {
    matches!(err, zbus::Error::MethodError(name, _, _) if name.as_str() == ERROR_NO_ENROLLED_PRINTS)
}

/// Async client with system bus connection.
#[derive(Clone)]
pub struct Client {
    conn: Connection,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Connect to system bus.
    pub async fn system() -> zbus::Result<Self> {
        let conn = Connection::system().await?;
        Ok(Self { conn })
    }

    /// Create Manager helper.
    pub fn manager(&self) -> Manager {
        Manager {
            conn: self.conn.clone(),
        }
    }

    /// Create Device helper for specific path.
    pub fn device(&self, object_path: OwnedObjectPath) -> Device {
        Device {
            conn: self.conn.clone(),
            object_path,
        }
    }
}

/// Manager interface helper.
#[derive(Clone)]
pub struct Manager {
    conn: Connection,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager").finish_non_exhaustive()
    }
}

impl Manager {
    async fn proxy(&self) -> zbus::Result<Proxy<'_>> {
        Proxy::new(&self.conn, SERVICE, MANAGER_PATH, IFACE_MANAGER).await
    }

    async fn call<R>(
        &self,
        method: &str,
        args: &(impl Serialize + Type + fmt::Debug),
    ) -> zbus::Result<R>
    where
        R: DeserializeOwned + Type,
    {
        let proxy = self.proxy().await?;

        proxy.call(method, args).await
    }

    /// Get device object paths.
    pub async fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>> {
        let (paths,): (Vec<OwnedObjectPath>,) = self.call("GetDevices", &()).await?;
        Ok(paths)
    }

    /// Get default device path.
    pub async fn get_default_device(&self) -> zbus::Result<OwnedObjectPath> {
        let (path,): (OwnedObjectPath,) = self.call("GetDefaultDevice", &()).await?;
        Ok(path)
    }
}

/// Device interface helper.
#[derive(Clone)]
pub struct Device {
    conn: Connection,
    object_path: OwnedObjectPath,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("object_path", &self.object_path)
            .finish()
    }
}

impl Device {
    async fn proxy(&self) -> zbus::Result<Proxy<'_>> {
        Proxy::new(&self.conn, SERVICE, self.object_path.as_str(), IFACE_DEVICE).await
    }

    /// Get device object path.
    pub fn object_path(&self) -> &str {
        self.object_path.as_str()
    }

    async fn call<R>(
        &self,
        method: &str,
        args: &(impl Serialize + Type + fmt::Debug),
    ) -> zbus::Result<R>
    where
        R: DeserializeOwned + Type,
    {
        let proxy = self.proxy().await?;

        proxy.call(method, args).await
    }

    /// List enrolled fingers for user ("" for current user).
    pub async fn list_enrolled_fingers(&self, username: &str) -> zbus::Result<Vec<String>> {
        let (fingers,): (Vec<String>,) = self.call("ListEnrolledFingers", &(username,)).await?;
        Ok(fingers)
    }

    /// Start verification for finger.
    pub async fn verify_start(&self, finger: &str) -> zbus::Result<()> {
        let _: () = self.call("VerifyStart", &(finger,)).await?;
        Ok(())
    }

    /// Stop verification.
    pub async fn verify_stop(&self) -> zbus::Result<()> {
        let _: () = self.call("VerifyStop", &()).await?;
        Ok(())
    }

    /// Claim device for user ("" for current user).
    pub async fn claim(&self, username: &str) -> zbus::Result<()> {
        let _: () = self.call("Claim", &(username,)).await?;
        Ok(())
    }

    /// Release device.
    pub async fn release(&self) -> zbus::Result<()> {
        let _: () = self.call("Release", &()).await?;
        Ok(())
    }

    /// Get device name.
    pub async fn name(&self) -> zbus::Result<String> {
        let proxy = self.proxy().await?;
        proxy.get_property::<String>("name").await
    }

    /// Get scan type ("press" or "swipe").
    pub async fn scan_type(&self) -> zbus::Result<String> {
        let proxy = self.proxy().await?;
        proxy.get_property::<String>("scan-type").await
    }

    /// Run one verification round and return the final status.
    ///
    /// The device must already be claimed. Intermediate statuses such as
    /// `verify-retry-scan` are logged and skipped; the first status with
    /// `done` set ends the round.
    pub async fn verify(&self, finger: &str) -> zbus::Result<VerifyStatusEvent> {
        let proxy = self.proxy().await?;
        // Subscribe first so a fast reader cannot report before we listen.
        let mut stream = proxy.receive_signal("VerifyStatus").await?;

        self.verify_start(finger).await?;

        let mut last = VerifyStatusEvent {
            result: "verify-unknown-error".to_string(),
            done: true,
        };
        while let Some(msg) = stream.next().await {
            let (result, done): (String, bool) = msg.body().deserialize()?;
            info!("Verify status: {} (done: {})", result, done);
            last = VerifyStatusEvent { result, done };
            if last.done {
                break;
            }
        }

        if let Err(e) = self.verify_stop().await {
            warn!("Failed to stop verification: {}", e);
        }

        Ok(last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyStatusEvent {
    pub result: String,
    pub done: bool,
}

impl VerifyStatusEvent {
    /// Whether this status means the finger was recognised.
    pub fn is_match(&self) -> bool {
        self.result == VERIFY_MATCH
    }
}

/// Find first available device.
pub async fn first_device(client: &Client) -> zbus::Result<Option<Device>> {
    let mgr = client.manager();

    // Try default device first
    if let Ok(path) = mgr.get_default_device().await {
        return Ok(Some(client.device(path)));
    }

    // Fall back to first enumerated device
    let paths = mgr.get_devices().await?;
    Ok(paths.first().map(|path| client.device(path.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verify_match_counts_as_match() {
        let matched = VerifyStatusEvent {
            result: "verify-match".to_string(),
            done: true,
        };
        let no_match = VerifyStatusEvent {
            result: "verify-no-match".to_string(),
            done: true,
        };
        let disconnected = VerifyStatusEvent {
            result: "verify-disconnected".to_string(),
            done: true,
        };

        assert!(matched.is_match());
        assert!(!no_match.is_match());
        assert!(!disconnected.is_match());
    }

    fn method_error(name: &'static str) -> zbus::Error {
        let path = "/net/reactivated/Fprint/Device/0";
        let reply = zbus::Message::method_call(path, "ListEnrolledFingers")
            .and_then(|builder| builder.build(&("",)))
            .expect("build message");
        let name = zbus::names::ErrorName::from_static_str(name).expect("valid error name");
        zbus::Error::MethodError(name.into(), None, reply)
    }

    #[test]
    fn no_enrolled_prints_error_is_recognised() {
        assert!(is_no_enrolled_prints(&method_error(ERROR_NO_ENROLLED_PRINTS)));
        assert!(!is_no_enrolled_prints(&method_error(
            "net.reactivated.Fprint.Error.PermissionDenied"
        )));
        assert!(!is_no_enrolled_prints(&zbus::Error::InvalidReply));
    }
}
