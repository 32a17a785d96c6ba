//! Multi-port example — routes frames for two logical ports through a
//! dispatcher while traffic for an unregistered port is discarded.
//!
//! Run with:
//!   cargo run --example multi-port

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use panlink::session::{PortDispatcher, RadioSession};
use panlink::transport::Loopback;

const TELEMETRY: u8 = 10;
const COMMANDS: u8 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (left, right) = Loopback::pair();

    let mut sender = RadioSession::new(left);
    sender.initialize()?;

    let mut receiver = RadioSession::new(right);
    receiver.initialize()?;

    sender.send_on(TELEMETRY, b"t=21.5C")?;
    sender.send_on(COMMANDS, b"reboot")?;
    sender.send_on(99, b"nobody listens here")?;

    let mut dispatcher = PortDispatcher::new(receiver);
    let routed = Rc::new(RefCell::new(0u32));

    let count = Rc::clone(&routed);
    dispatcher.on_port(TELEMETRY, move |delivery| {
        eprintln!(
            "[telemetry] {} (rssi 0x{:02X})",
            String::from_utf8_lossy(&delivery.payload),
            delivery.rssi
        );
        *count.borrow_mut() += 1;
    });

    let count = Rc::clone(&routed);
    dispatcher.on_port(COMMANDS, move |delivery| {
        eprintln!("[commands] {}", String::from_utf8_lossy(&delivery.payload));
        *count.borrow_mut() += 1;
    });

    // Three packets are on the link; only two have handlers.
    for _ in 0..3 {
        dispatcher.poll(Duration::from_millis(250))?;
    }

    assert_eq!(*routed.borrow(), 2);
    eprintln!("routed {} frames", routed.borrow());
    Ok(())
}
