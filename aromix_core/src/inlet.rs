//! Command hand-off between the receive path and the control loop.
//!
//! The receive path (interrupt context on the original hardware, a
//! background thread here) never touches actuators directly; it moves
//! whole `Command` values through bounded(1) channels, so the control
//! loop can never observe a half-copied message. Emergency stops travel
//! in their own slot and are always drained first.
//!
//! `LinkPump` spawns a thread that owns the `Transport`, pushes decoded
//! inbound frames into the inlet, drains an outbox of frames to
//! transmit, and tracks the last-receive timestamp for the
//! communication-active flag. The thread is shut down and joined when
//! the pump is dropped, preventing thread leaks.

use crossbeam_channel as xch;

use aromix_traits::clock::Clock;
use aromix_traits::Transport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::message::{Command, MessageKind};

/// Sentinel for "no frame received yet".
const NEVER: u64 = u64::MAX;

/// Producer half of the command hand-off.
pub struct CommandSender {
    tx: xch::Sender<Command>,
    estop_tx: xch::Sender<Command>,
}

/// Consumer half of the command hand-off.
pub struct CommandInlet {
    rx: xch::Receiver<Command>,
    estop_rx: xch::Receiver<Command>,
}

/// Build the depth-1 hand-off pair.
pub fn command_channel() -> (CommandSender, CommandInlet) {
    let (tx, rx) = xch::bounded(1);
    let (estop_tx, estop_rx) = xch::bounded(1);
    (
        CommandSender { tx, estop_tx },
        CommandInlet { rx, estop_rx },
    )
}

impl CommandSender {
    /// Non-blocking offer. Returns false when the slot is still occupied
    /// (the frame is dropped; the consumer is behind). An occupied
    /// emergency slot means a stop is already pending, so dropping a
    /// duplicate is harmless.
    pub fn offer(&self, cmd: Command) -> bool {
        let slot = if cmd.kind == MessageKind::EmergencyStop as u8 {
            &self.estop_tx
        } else {
            &self.tx
        };
        slot.try_send(cmd).is_ok()
    }
}

impl CommandInlet {
    /// Take the next pending command; emergency stops strictly first.
    pub fn take(&self) -> Option<Command> {
        self.estop_rx
            .try_recv()
            .ok()
            .or_else(|| self.rx.try_recv().ok())
    }
}

pub struct LinkPump {
    inlet: CommandInlet,
    outbox_tx: xch::Sender<Vec<u8>>,
    last_rx: Arc<AtomicU64>,
    epoch: Instant,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl LinkPump {
    pub fn spawn<T: Transport + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut transport: T,
        poll_ms: u64,
        clock: C,
    ) -> Self {
        let (sender, inlet) = command_channel();
        let (outbox_tx, outbox_rx) = xch::bounded::<Vec<u8>>(8);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_rx = Arc::new(AtomicU64::new(NEVER));
        let last_rx_clone = last_rx.clone();
        let period = Duration::from_millis(poll_ms.max(1));
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("LinkPump thread received shutdown signal");
                    break;
                }

                match transport.receive_frame() {
                    Ok(Some(frame)) => {
                        last_rx_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                        let cmd = Command::decode(&frame);
                        if !sender.offer(cmd) {
                            tracing::warn!("command slot occupied; inbound frame dropped");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "transport receive failed");
                    }
                }

                // Drain anything the control loop wants transmitted.
                while let Ok(frame) = outbox_rx.try_recv() {
                    if let Err(e) = transport.send_frame(&frame) {
                        tracing::warn!(error = %e, "transport send failed");
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("LinkPump thread exiting cleanly");
        });

        Self {
            inlet,
            outbox_tx,
            last_rx,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Next pending command, emergency stops first.
    pub fn take(&self) -> Option<Command> {
        self.inlet.take()
    }

    /// Queue a frame for transmission, fire-and-forget. A full outbox
    /// drops the frame; status pushes are periodic and self-correcting.
    pub fn send(&self, frame: &[u8]) {
        if self.outbox_tx.try_send(frame.to_vec()).is_err() {
            tracing::warn!("outbox full; push frame dropped");
        }
    }

    /// Milliseconds since the last received frame, `u64::MAX` when none
    /// has arrived yet.
    pub fn idle_ms(&self) -> u64 {
        let last = self.last_rx.load(Ordering::Relaxed);
        if last == NEVER {
            return NEVER;
        }
        let now_ms = {
            let dur = Instant::now().saturating_duration_since(self.epoch);
            (dur.as_millis().min(u128::from(u64::MAX))) as u64
        };
        now_ms.saturating_sub(last)
    }
}

impl Drop for LinkPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("LinkPump thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "LinkPump thread panicked during shutdown");
                }
            }
        }
    }
}

#[cfg(test)]
mod inlet_tests {
    use super::*;
    use crate::message::OdorId;

    fn odor_cmd() -> Command {
        Command {
            kind: MessageKind::OdorCommand as u8,
            odor: OdorId::COFFEE,
            intensity: 50,
            duration_s: 10,
            pump_config: [0; 5],
            timestamp: 1,
            checksum: 0,
        }
        .sealed()
    }

    fn estop_cmd() -> Command {
        Command {
            kind: MessageKind::EmergencyStop as u8,
            odor: OdorId::new(0),
            intensity: 0,
            duration_s: 0,
            pump_config: [0; 5],
            timestamp: 2,
            checksum: 0,
        }
        .sealed()
    }

    #[test]
    fn estop_offered_last_is_taken_first() {
        let (tx, rx) = command_channel();
        assert!(tx.offer(odor_cmd()));
        assert!(tx.offer(estop_cmd()));

        let first = rx.take().expect("estop pending");
        assert_eq!(first.kind, MessageKind::EmergencyStop as u8);
        let second = rx.take().expect("odor command pending");
        assert_eq!(second.kind, MessageKind::OdorCommand as u8);
        assert!(rx.take().is_none());
    }

    #[test]
    fn occupied_slot_drops_the_frame() {
        let (tx, rx) = command_channel();
        assert!(tx.offer(odor_cmd()));
        assert!(!tx.offer(odor_cmd()));
        // A duplicate pending estop is also dropped.
        assert!(tx.offer(estop_cmd()));
        assert!(!tx.offer(estop_cmd()));
        let _ = rx.take();
    }
}
