// Device discovery example
//
// Lists serial ports and marks the ones that look like a Teensy running the
// lock-in firmware.

use lockin_rs::LockInConnector;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Lock-in Device Discovery");
    println!("========================\n");

    let candidates = LockInConnector::get_available_devices()?;
    let ports = LockInConnector::list_ports()?;

    if ports.is_empty() {
        println!("No serial ports found. Please connect a device and try again.");
        return Ok(());
    }

    for (i, port) in ports.iter().enumerate() {
        let marker = if candidates.contains(port) { "*" } else { " " };
        println!("{} {}. {} at {}", marker, i + 1, port.name, port.port);
    }
    println!("\n{} lock-in candidate(s) marked with *", candidates.len());

    Ok(())
}
