pub mod loudness;
pub mod wav_format;
