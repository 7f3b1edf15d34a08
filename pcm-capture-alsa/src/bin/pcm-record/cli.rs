//! Command-line interface for pcm-record
//!
//! Handles argument parsing and logging configuration.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use pcm_capture_core::{CaptureConfiguration, CaptureDuration, CaptureError, OverrunPolicy, ReadErrorPolicy};

/// pcm-record - capture mono 16-bit PCM from an ALSA device into a WAV file
#[derive(Parser, Debug)]
#[command(name = "pcm-record")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ALSA capture device
    #[arg(short = 'D', long, default_value = "hw:0,0")]
    pub device: String,

    /// Output WAV file (created or truncated)
    #[arg(short, long, default_value = "record8k.wav")]
    pub output: PathBuf,

    /// Requested sample rate in Hz; the device may grant a nearby rate
    #[arg(short, long, default_value_t = 8000)]
    pub rate: u32,

    /// Capture duration in seconds
    #[arg(short, long, default_value_t = 10.0, conflicts_with = "unbounded")]
    pub seconds: f64,

    /// Capture until interrupted with Ctrl-C
    #[arg(long)]
    pub unbounded: bool,

    /// Frames per period read
    #[arg(long, default_value_t = 1024)]
    pub period_frames: u32,

    /// Frames in the device ring buffer
    #[arg(long, default_value_t = 32 * 1024)]
    pub buffer_frames: u32,

    /// Abort the capture on the first read error instead of skipping the period
    #[arg(long)]
    pub strict_reads: bool,

    /// Append nothing for a period that overran (default re-appends the buffer)
    #[arg(long)]
    pub drop_overrun_periods: bool,

    /// Write a JSON metadata sidecar next to the recording
    #[arg(long)]
    pub metadata: bool,

    /// List capture devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Increase logging verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// Build the validated capture configuration from the flags.
    pub fn capture_configuration(&self) -> Result<CaptureConfiguration, CaptureError> {
        let duration = if self.unbounded {
            CaptureDuration::Unbounded
        } else {
            CaptureDuration::Seconds(self.seconds)
        };
        let overrun_policy = if self.drop_overrun_periods {
            OverrunPolicy::DropPeriod
        } else {
            OverrunPolicy::KeepBuffer
        };
        let read_error_policy = if self.strict_reads {
            ReadErrorPolicy::Abort
        } else {
            ReadErrorPolicy::Continue
        };

        Ok(
            CaptureConfiguration::new(self.rate, self.period_frames, self.buffer_frames, duration)?
                .with_overrun_policy(overrun_policy)
                .with_read_error_policy(read_error_policy),
        )
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for dependencies
    builder.filter_level(LevelFilter::Warn);

    builder.filter_module("pcm_capture_core", args.log_level());
    builder.filter_module("pcm_capture_alsa", args.log_level());
    builder.filter_module("pcm_record", args.log_level());

    // RUST_LOG, when set, takes precedence
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.format_timestamp_millis();
    builder.init();
}
