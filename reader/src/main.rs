//! Remote reader for the sensor buffer peripheral.
//!
//! Connects to the device, drains its sensor log chunk by chunk with the
//! CONTINUE/DONE handshake and prints the decoded bursts.

mod assembler;
mod client;
mod protocol;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use assembler::StreamAssembler;
use client::SensorClient;

#[derive(Parser)]
#[command(name = "reader")]
#[command(about = "Drain the sensor buffer peripheral over BLE")]
struct Args {
    /// BLE device name
    #[arg(short, long, default_value = "TinyGo Sensor")]
    name: String,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,

    /// Stop after this many chunks and send DONE
    #[arg(long, default_value = "1000")]
    max_chunks: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{}", "Sensor Buffer Reader".bold());
    println!("Scanning for BLE device \"{}\"...", args.name);

    let device =
        SensorClient::connect_by_name(&args.name, Duration::from_secs(args.scan_timeout)).await?;
    println!("{}", "  Connected!".green());

    let revision = device.firmware_revision().await?;
    let counters = device.counters().await?;
    println!("  Firmware: {}", revision);
    println!(
        "  Buffered: {} bytes ({}% of budget, halved)",
        counters.total_size, counters.memory_percent
    );

    for entry in device.device_log().await? {
        println!("  [{:>12} us] {}", entry.timestamp, entry.message.dimmed());
    }
    println!();

    let mut assembler = StreamAssembler::new();
    let mut bursts = 0usize;
    let mut chunks = 0usize;

    loop {
        let chunk = device.read_chunk().await?;
        for record in assembler.push(&chunk) {
            bursts += 1;
            let samples: Vec<String> = record.samples().map(|s| s.to_string()).collect();
            println!(
                "  {} t={} us, {} us @ {} Hz: [{}]",
                format!("#{}", bursts).cyan(),
                record.timestamp,
                record.duration_us,
                record.sample_rate,
                samples.join(", ")
            );
        }
        chunks += 1;

        if chunk.is_empty() || chunks >= args.max_chunks {
            device.confirm_done().await?;
            break;
        }
        device.confirm_continue().await?;
    }

    // Device drops the link after DONE
    let _ = device.disconnect().await;

    println!("\n{}", "=".repeat(60));
    println!(
        "  {} bursts from {} bytes in {} chunks",
        bursts.to_string().green(),
        assembler.received(),
        chunks
    );
    if assembler.pending_len() > 0 {
        println!(
            "  {}",
            format!("{} trailing bytes did not form a whole record", assembler.pending_len()).yellow()
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}
