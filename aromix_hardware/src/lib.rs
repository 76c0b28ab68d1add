pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aromix_traits::{Actuators, Transport, FRAME_LEN};

/// Simulated actuator bank for host runs: prints what the hardware
/// would do and remembers nothing (the core driver owns the state).
#[derive(Default)]
pub struct SimulatedActuators;

impl SimulatedActuators {
    pub fn new() -> Self {
        Self
    }
}

impl Actuators for SimulatedActuators {
    fn set_pump(
        &mut self,
        id: u8,
        percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("Pump {id} -> {percent}% (simulated)");
        Ok(())
    }

    fn set_valve(
        &mut self,
        id: u8,
        open: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!(
            "Valve {id} -> {} (simulated)",
            if open { "open" } else { "closed" }
        );
        Ok(())
    }

    fn set_fan(
        &mut self,
        id: u8,
        percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("Fan {id} -> {percent}% (simulated)");
        Ok(())
    }
}

/// Scripted transport: delivers a prepared sequence of inbound frames
/// and captures everything sent. The sent log is shared so callers can
/// keep inspecting it after the transport moves into the control loop.
#[derive(Default)]
pub struct ScriptedTransport {
    inbound: VecDeque<[u8; FRAME_LEN]>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame for delivery on a later `receive_frame` call.
    pub fn enqueue(&mut self, frame: [u8; FRAME_LEN]) {
        self.inbound.push_back(frame);
    }

    /// Shared handle to the log of transmitted frames.
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        self.sent.clone()
    }
}

impl Transport for ScriptedTransport {
    fn receive_frame(
        &mut self,
    ) -> Result<Option<[u8; FRAME_LEN]>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.inbound.pop_front())
    }

    fn send_frame(
        &mut self,
        frame: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| std::io::Error::other("sent log poisoned"))?;
        sent.push(frame.to_vec());
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub use gpio::GpioActuators;
