//! Per-period loudness estimation.
//!
//! Maps one period of interleaved signed 16-bit little-endian samples to an
//! RMS amplitude and its decibel value. Stateless and deterministic.

use crate::models::audio_models::Loudness;

/// Decibel value reported for a silent period (`rms == 0`).
pub const DB_FLOOR: f64 = -100.0;

/// Estimate the loudness of one period.
///
/// `period` is read as `frame_count * channels` signed 16-bit little-endian
/// samples; trailing bytes beyond that are ignored.
///
/// # Panics
///
/// Panics if `frame_count * channels` is zero or if `period` holds fewer
/// bytes than that many samples. An empty period has no defined loudness.
pub fn estimate(period: &[u8], frame_count: usize, channels: u16) -> Loudness {
    let sample_count = frame_count * usize::from(channels);
    assert!(sample_count > 0, "loudness of an empty period is undefined");
    assert!(
        period.len() >= sample_count * 2,
        "period holds {} bytes, {} samples need {}",
        period.len(),
        sample_count,
        sample_count * 2
    );

    let rms = rms(&period[..sample_count * 2]);
    Loudness {
        rms,
        db: to_decibels(rms),
    }
}

/// Root-mean-square of S16_LE samples. An odd trailing byte is ignored.
pub fn rms(bytes: &[u8]) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for pair in bytes.chunks_exact(2) {
        let sample = f64::from(i16::from_le_bytes([pair[0], pair[1]]));
        sum += sample * sample;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).sqrt()
}

/// `20 * log10(rms)`, with non-positive values mapped to [`DB_FLOOR`].
pub fn to_decibels(rms: f64) -> f64 {
    if rms <= 0.0 {
        return DB_FLOOR;
    }
    20.0 * rms.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn to_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn silence_hits_floor() {
        let period = vec![0u8; 2048];
        let loudness = estimate(&period, 1024, 1);
        assert_eq!(loudness.rms, 0.0);
        assert_eq!(loudness.db, -100.0);
    }

    #[test]
    fn constant_signal() {
        let period = to_bytes(&[1000; 256]);
        let loudness = estimate(&period, 256, 1);
        assert_relative_eq!(loudness.rms, 1000.0);
        assert_relative_eq!(loudness.db, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn square_wave_rms_equals_amplitude() {
        let samples: Vec<i16> = (0..1000).map(|i| if i % 2 == 0 { 500 } else { -500 }).collect();
        let loudness = estimate(&to_bytes(&samples), 1000, 1);
        assert_relative_eq!(loudness.rms, 500.0);
    }

    #[test]
    fn negation_does_not_change_loudness() {
        let samples: Vec<i16> = (0..1024).map(|i| ((i * 37) % 20000 - 10000) as i16).collect();
        let negated: Vec<i16> = samples.iter().map(|s| -s).collect();

        let a = estimate(&to_bytes(&samples), 1024, 1);
        let b = estimate(&to_bytes(&negated), 1024, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn full_scale_min_sample() {
        let loudness = estimate(&to_bytes(&[i16::MIN; 4]), 4, 1);
        assert_relative_eq!(loudness.rms, 32768.0);
    }

    #[test]
    fn only_frame_count_samples_are_used() {
        let mut samples = vec![100i16; 10];
        samples.extend_from_slice(&[30000; 10]);
        let loudness = estimate(&to_bytes(&samples), 10, 1);
        assert_relative_eq!(loudness.rms, 100.0);
    }

    #[test]
    fn two_channels_count_all_samples() {
        let loudness = estimate(&to_bytes(&[300, -400, 300, -400]), 2, 2);
        assert_relative_eq!(loudness.rms, (125_000.0f64).sqrt());
    }

    #[test]
    #[should_panic(expected = "empty period")]
    fn empty_period_panics() {
        estimate(&[], 0, 1);
    }

    #[test]
    #[should_panic]
    fn short_buffer_panics() {
        estimate(&[0u8; 10], 10, 1);
    }

    #[test]
    fn decibel_conversion() {
        assert_eq!(to_decibels(0.0), DB_FLOOR);
        assert_eq!(to_decibels(-3.0), DB_FLOOR);
        assert_relative_eq!(to_decibels(1.0), 0.0);
        assert_relative_eq!(to_decibels(10.0), 20.0, epsilon = 1e-12);
    }
}
