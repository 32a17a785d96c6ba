//! Loopback echo — one endpoint echoes a default-port frame back.
//!
//! Run with:
//!   cargo run --example echo

use std::thread;
use std::time::Duration;

use panlink::session::{RadioSession, Received};
use panlink::transport::Loopback;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let (left, right) = Loopback::pair();

    let echo = thread::spawn(
        move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let mut session = RadioSession::new(right);
            session.initialize()?;

            for _ in 0..20 {
                match session.receive(Duration::from_millis(250))? {
                    Received::Payload { payload, rssi, .. } => {
                        eprintln!("[echo] {} bytes (rssi 0x{rssi:02X})", payload.len());
                        session.send(&payload)?;
                        return Ok(());
                    }
                    _ => continue,
                }
            }
            Err("no frame arrived at the echo endpoint".into())
        },
    );

    let mut session = RadioSession::new(left);
    let report = session.initialize()?;
    eprintln!(
        "[main] local address 0x{:04X}, {:?}",
        report.local_address,
        report.state()
    );

    session.send(b"ping over the pan")?;

    for _ in 0..20 {
        if let Received::Payload { payload, .. } = session.receive(Duration::from_millis(250))? {
            eprintln!("[main] echoed: {}", String::from_utf8_lossy(&payload));
            echo.join()
                .expect("echo thread should not panic")
                .expect("echo endpoint should complete");
            return Ok(());
        }
    }
    Err("echo reply never arrived".into())
}
