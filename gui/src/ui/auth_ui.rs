//! Fingerprint gate flow.

use crate::context::AppContext;
use gtk4::glib;
use log::info;
use sheetgate_core::config::PROMPT_MESSAGE;
use sheetgate_core::{
    authenticate, AuthState, BiometricError, BiometricSensor, FprintdSensor, PromptCancel,
    PromptResult, SensorInfo,
};
use std::sync::mpsc::{self, TryRecvError};

/// Events sent during a gate run.
#[derive(Clone)]
pub enum AuthEvent {
    Prompting(String),
    Finished(AuthState),
}

/// Sensor wrapper that tells the UI when the reader starts waiting.
struct PromptingSensor<S> {
    inner: S,
    tx: mpsc::Sender<AuthEvent>,
}

impl<S: BiometricSensor> BiometricSensor for PromptingSensor<S> {
    async fn is_sensor_available(&self) -> Result<SensorInfo, BiometricError> {
        self.inner.is_sensor_available().await
    }

    async fn simple_prompt(&self, message: &str) -> Result<PromptResult, BiometricError> {
        let _ = self.tx.send(AuthEvent::Prompting(message.to_string()));
        self.inner.simple_prompt(message).await
    }
}

/// Run the gate once and store the resulting state.
pub fn start_authentication(ctx: AppContext) {
    info!("Starting fingerprint gate");
    ctx.set_auth_busy(true);

    let cancel = PromptCancel::new();
    ctx.prompt.replace(Some(cancel.clone()));

    let (tx, rx) = mpsc::channel::<AuthEvent>();
    setup_auth_listener(rx, ctx.clone());
    spawn_auth_task(tx, cancel, &ctx);
}

/// Set up UI listener for gate status updates.
fn setup_auth_listener(rx: mpsc::Receiver<AuthEvent>, ctx: AppContext) {
    glib::idle_add_local(move || {
        loop {
            match rx.try_recv() {
                Ok(AuthEvent::Prompting(message)) => {
                    ctx.show_status(&message);
                }
                Ok(AuthEvent::Finished(state)) => {
                    ctx.prompt.replace(None);
                    ctx.set_auth_state(state);
                    ctx.set_auth_busy(false);
                    return glib::ControlFlow::Break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    ctx.prompt.replace(None);
                    ctx.set_auth_busy(false);
                    return glib::ControlFlow::Break;
                }
            }
        }
        glib::ControlFlow::Continue
    });
}

/// Spawn async gate task.
fn spawn_auth_task(tx: mpsc::Sender<AuthEvent>, cancel: PromptCancel, ctx: &AppContext) {
    ctx.rt.spawn(async move {
        let sensor = PromptingSensor {
            inner: FprintdSensor::with_cancel(cancel),
            tx: tx.clone(),
        };
        let state = authenticate(&sensor, PROMPT_MESSAGE).await;
        info!("Fingerprint gate finished with {}", state);
        let _ = tx.send(AuthEvent::Finished(state));
    });
}
