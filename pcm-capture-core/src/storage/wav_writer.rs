use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, RIFF_OVERHEAD};

/// Largest payload a RIFF size field can describe.
pub const MAX_DATA_SIZE: u64 = (u32::MAX - RIFF_OVERHEAD) as u64;

/// Lifecycle of a [`WavWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Unopened,
    HeaderReserved,
    Finalized,
}

/// Summary of a finalized WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedWav {
    pub total_frames: u64,
    pub data_size: u32,
    /// SHA-256 hex digest of the complete file.
    pub checksum: String,
}

/// Streaming PCM WAV writer.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header]
/// [raw PCM data, appended verbatim in arrival order...]
/// ```
///
/// `begin` reserves the header with a provisional data size, `append` streams
/// sample bytes, and `finalize` rewrites the two size fields from the bytes
/// actually appended. A writer dropped while still in `HeaderReserved`
/// patches its header the same way, so the declared size always matches the
/// data on disk.
pub struct WavWriter {
    file_path: PathBuf,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
    state: WriterState,
}

impl WavWriter {
    pub fn new(file_path: PathBuf, sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            file_path,
            sample_rate,
            channels,
            bits_per_sample,
            file: None,
            data_bytes: 0,
            state: WriterState::Unopened,
        }
    }

    /// Create (or truncate) the file and write the header.
    ///
    /// `provisional_frames` fills the data-size field until `finalize`; pass
    /// `None` when the total is unknown and a zero placeholder is written.
    pub fn begin(&mut self, provisional_frames: Option<u64>) -> Result<(), CaptureError> {
        if self.state != WriterState::Unopened {
            return Err(CaptureError::Io(format!(
                "writer for {} already begun",
                self.file_path.display()
            )));
        }

        let provisional_size = provisional_frames
            .map(|frames| frames.saturating_mul(self.block_align()).min(MAX_DATA_SIZE) as u32)
            .unwrap_or(0);
        let header = wav_format::generate_wav_header(
            self.sample_rate,
            self.channels,
            self.bits_per_sample,
            provisional_size,
        )?;

        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::Io(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&self.file_path)
            .map_err(|e| CaptureError::Io(format!("failed to create {}: {}", self.file_path.display(), e)))?;
        let mut file = BufWriter::new(file);

        if let Err(e) = file.write_all(&header).and_then(|_| file.flush()) {
            drop(file);
            fs::remove_file(&self.file_path).ok();
            return Err(CaptureError::Io(format!("failed to write WAV header: {}", e)));
        }

        log::debug!(
            "reserved WAV header for {} (provisional data size {})",
            self.file_path.display(),
            provisional_size
        );
        self.file = Some(file);
        self.state = WriterState::HeaderReserved;
        Ok(())
    }

    /// Append raw sample bytes.
    pub fn append(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if self.state != WriterState::HeaderReserved {
            return Err(CaptureError::Io("file is not open for writing".into()));
        }
        let new_total = self.data_bytes + data.len() as u64;
        if new_total > MAX_DATA_SIZE {
            return Err(CaptureError::Io(format!(
                "WAV data would grow to {} bytes, beyond the {} byte limit",
                new_total, MAX_DATA_SIZE
            )));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Io("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::Io(format!("write failed: {}", e)))?;
        self.data_bytes = new_total;
        Ok(())
    }

    /// Rewrite the size fields from the frames actually captured and close the file.
    ///
    /// If `actual_total_frames` disagrees with the bytes appended, the bytes on
    /// disk win.
    pub fn finalize(&mut self, actual_total_frames: u64) -> Result<FinalizedWav, CaptureError> {
        if self.state != WriterState::HeaderReserved {
            return Err(CaptureError::Io("file is not open".into()));
        }

        let expected = actual_total_frames * self.block_align();
        if expected != self.data_bytes {
            log::warn!(
                "finalize asked for {} frames ({} bytes) but {} bytes were written; using bytes on disk",
                actual_total_frames,
                expected,
                self.data_bytes
            );
        }

        self.patch_header()
            .map_err(|e| CaptureError::Io(format!("failed to patch WAV header: {}", e)))?;
        self.file = None;
        self.state = WriterState::Finalized;

        let data_size = self.data_bytes as u32;
        let checksum = sha256_file(&self.file_path)?;
        log::info!(
            "finalized {} ({} frames, {} data bytes)",
            self.file_path.display(),
            self.frames_written(),
            data_size
        );

        Ok(FinalizedWav {
            total_frames: self.frames_written(),
            data_size,
            checksum,
        })
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Payload bytes appended so far (header excluded).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Whole frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.data_bytes / self.block_align()
    }

    /// Path of the output file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn block_align(&self) -> u64 {
        u64::from(wav_format::block_align(self.channels, self.bits_per_sample).max(1))
    }

    fn patch_header(&mut self) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        for (offset, bytes) in wav_format::size_patches(self.data_bytes as u32) {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&bytes)?;
        }
        file.seek(SeekFrom::End(0))?;
        file.flush()?;
        // A failed append may have left bytes past the declared data.
        file.get_ref()
            .set_len(wav_format::WAV_HEADER_SIZE as u64 + self.data_bytes)?;
        file.get_ref().sync_all()
    }
}

impl Drop for WavWriter {
    fn drop(&mut self) {
        if self.state == WriterState::HeaderReserved {
            log::warn!(
                "WAV writer for {} dropped before finalize; patching header",
                self.file_path.display()
            );
            if let Err(e) = self.patch_header() {
                log::error!("failed to patch WAV header on drop: {}", e);
            }
        }
    }
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let mut file = File::open(path)
        .map_err(|e| CaptureError::Io(format!("failed to read file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| CaptureError::Io(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::parse_wav_header;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pcm_capture_test_{}_{}", uuid::Uuid::new_v4(), name))
    }

    fn read_header(path: &Path) -> wav_format::WavHeader {
        let data = fs::read(path).unwrap();
        parse_wav_header(&data).unwrap()
    }

    #[test]
    fn begin_writes_provisional_header() {
        let path = temp_file_path("provisional.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(Some(8000)).unwrap();
        assert_eq!(writer.state(), WriterState::HeaderReserved);

        let header = read_header(&path);
        assert_eq!(header.data_size, 16000);
        assert_eq!(header.overall_size, 16036);

        writer.finalize(0).unwrap();
        fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_total_writes_zero_placeholder() {
        let path = temp_file_path("placeholder.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(None).unwrap();

        assert_eq!(read_header(&path).data_size, 0);

        writer.finalize(0).unwrap();
        fs::remove_file(&path).ok();
    }

    #[test]
    fn round_trip_reproduces_format_and_size() {
        let path = temp_file_path("round_trip.wav");
        let mut writer = WavWriter::new(path.clone(), 22050, 1, 16);
        writer.begin(Some(22050)).unwrap();

        let chunks: [&[u8]; 3] = [&[1, 0, 2, 0], &[3, 0], &[4, 0, 5, 0, 6, 0]];
        for chunk in chunks {
            writer.append(chunk).unwrap();
        }
        let summary = writer.finalize(6).unwrap();
        assert_eq!(summary.total_frames, 6);
        assert_eq!(summary.data_size, 12);
        assert_eq!(summary.checksum.len(), 64);

        let data = fs::read(&path).unwrap();
        let header = parse_wav_header(&data).unwrap();
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.channels, 1);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_size, 12);
        assert_eq!(&data[44..], &[1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0]);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn finalize_uses_actual_bytes_not_provisional() {
        let path = temp_file_path("early_stop.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(Some(80000)).unwrap();
        writer.append(&[0u8; 1000]).unwrap();
        writer.finalize(500).unwrap();

        let header = read_header(&path);
        assert_eq!(header.data_size, 1000);
        assert_eq!(header.overall_size, 1036);
        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 1000);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn finalize_trusts_bytes_on_disk_over_frame_argument() {
        let path = temp_file_path("mismatch.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(None).unwrap();
        writer.append(&[0u8; 200]).unwrap();
        let summary = writer.finalize(1000).unwrap();

        assert_eq!(summary.total_frames, 100);
        assert_eq!(read_header(&path).data_size, 200);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn append_requires_begin() {
        let path = temp_file_path("unopened.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        assert!(matches!(writer.append(&[0u8; 2]), Err(CaptureError::Io(_))));
        assert!(writer.finalize(0).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn no_appends_after_finalize() {
        let path = temp_file_path("finalized.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(None).unwrap();
        writer.finalize(0).unwrap();

        assert_eq!(writer.state(), WriterState::Finalized);
        assert!(writer.append(&[0u8; 2]).is_err());
        assert!(writer.begin(None).is_err());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn drop_patches_header() {
        let path = temp_file_path("dropped.wav");
        {
            let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
            writer.begin(Some(80000)).unwrap();
            writer.append(&[7u8; 64]).unwrap();
        }

        let header = read_header(&path);
        assert_eq!(header.data_size, 64);
        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 64);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn begin_truncates_existing_file() {
        let path = temp_file_path("truncate.wav");
        fs::write(&path, vec![0xFFu8; 4096]).unwrap();

        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(None).unwrap();
        writer.append(&[0u8; 4]).unwrap();
        writer.finalize(2).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 48);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn append_past_riff_limit_is_refused() {
        let path = temp_file_path("limit.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(None).unwrap();
        writer.append(&[1, 0, 2, 0]).unwrap();

        // Pretend the file already holds all but one byte of the allowed payload.
        writer.data_bytes = MAX_DATA_SIZE - 1;
        assert!(matches!(writer.append(&[0u8; 2]), Err(CaptureError::Io(_))));
        assert_eq!(writer.data_bytes(), MAX_DATA_SIZE - 1);
        assert!(writer.append(&[]).is_ok());

        writer.data_bytes = 4;
        let summary = writer.finalize(2).unwrap();
        assert_eq!(summary.data_size, 4);

        let header = read_header(&path);
        assert_eq!(header.data_size, 4);
        assert_eq!(header.overall_size, 40);
        assert_eq!(fs::metadata(&path).unwrap().len(), 48);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn finalize_trims_bytes_beyond_declared_size() {
        let path = temp_file_path("stray.wav");
        let mut writer = WavWriter::new(path.clone(), 8000, 1, 16);
        writer.begin(None).unwrap();
        writer.append(&[1, 0, 2, 0]).unwrap();

        // Bytes that reached the file without being counted, as after a failed write.
        writer.file.as_mut().unwrap().write_all(&[9, 9, 9]).unwrap();
        writer.finalize(2).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 48);
        assert_eq!(parse_wav_header(&data).unwrap().data_size, 4);
        assert_eq!(&data[44..], &[1, 0, 2, 0]);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn begin_rejects_rate_beyond_header_range() {
        let path = temp_file_path("huge_rate.wav");
        let mut writer = WavWriter::new(path.clone(), 3_000_000_000, 1, 16);
        assert!(matches!(
            writer.begin(Some(1)),
            Err(CaptureError::UnsupportedParameters(_))
        ));
        assert_eq!(writer.state(), WriterState::Unopened);
        assert!(!path.exists());
    }

    #[test]
    fn begin_fails_when_parent_is_a_file() {
        let blocker = temp_file_path("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let mut writer = WavWriter::new(blocker.join("out.wav"), 8000, 1, 16);
        assert!(matches!(writer.begin(None), Err(CaptureError::Io(_))));
        assert_eq!(writer.state(), WriterState::Unopened);

        fs::remove_file(&blocker).ok();
    }
}
