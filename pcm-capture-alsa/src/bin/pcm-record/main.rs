//! pcm-record - mono PCM recorder for Linux ALSA devices
//!
//! Captures from a capture device for a fixed duration (or until Ctrl-C),
//! prints a loudness line per period, and writes a WAV file.

mod cli;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::info;

use pcm_capture_alsa::AlsaCapture;
use pcm_capture_core::storage::metadata;
use pcm_capture_core::{CaptureProvider, CaptureSession};

use console::ConsoleDelegate;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    cli::init_logging(&args);

    let provider = AlsaCapture::new();

    if args.list_devices {
        return match provider.list_devices() {
            Ok(devices) => {
                for device in devices {
                    println!("{}\t{}", device.id, device.description);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("pcm-record: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match args.capture_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pcm-record: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut session = CaptureSession::new(config);
    session.set_delegate(Arc::new(ConsoleDelegate::new(args.quiet)));

    let stop = session.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.request_stop()) {
        log::warn!("failed to install Ctrl-C handler: {}", e);
    }

    let config = session.config();
    info!(
        "recording from {} into {} at {} Hz, {:?}",
        args.device,
        args.output.display(),
        config.sample_rate(),
        config.duration()
    );
    let result = match session.run(&provider, &args.device, &args.output) {
        Ok(result) => result,
        // already reported by the console delegate
        Err(_) => return ExitCode::FAILURE,
    };

    if args.metadata {
        match metadata::write_metadata(&result.metadata, &result.file_path) {
            Ok(path) => info!("wrote metadata to {}", path.display()),
            Err(e) => {
                eprintln!("pcm-record: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
