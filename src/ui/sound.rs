/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::{DeathCause, GameEvent};

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_chop: Arc<Vec<u8>>,
        sfx_start: Arc<Vec<u8>>,
        sfx_crushed: Arc<Vec<u8>>,
        sfx_starved: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("sound: no output device ({e}), audio disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_chop: Arc::new(make_wav(&gen_chop())),
                sfx_start: Arc::new(make_wav(&gen_start())),
                sfx_crushed: Arc::new(make_wav(&gen_crushed())),
                sfx_starved: Arc::new(make_wav(&gen_starved())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Chop pitch climbs slowly with the score so long runs sound busier.
        pub fn play_chop(&self, score: u32) {
            if score % 10 == 0 {
                let freq = 500.0 + (score.min(200) as f32) * 4.0;
                let buf = make_wav(&gen_blip(freq, 0.06, 0.25));
                self.play(&Arc::new(buf));
            } else {
                self.play(&self.sfx_chop);
            }
        }
        pub fn play_start(&self) { self.play(&self.sfx_start); }
        pub fn play_crushed(&self) { self.play(&self.sfx_crushed); }
        pub fn play_starved(&self) { self.play(&self.sfx_starved); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Chop: short noisy thwack with a low thump under it
    pub(super) fn gen_chop() -> Vec<f32> {
        let duration = 0.07;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x5EED_1234;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let thump = (ti * 140.0 * TAU).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(2.0);
                (thump * 0.5 + noise * 0.5) * env * 0.35
            })
            .collect()
    }

    /// Start: two rising notes
    pub(super) fn gen_start() -> Vec<f32> {
        let mut samples = gen_blip(660.0, 0.06, 0.25);
        samples.extend(gen_blip(990.0, 0.09, 0.25));
        samples
    }

    /// Crushed: heavy descending thud
    pub(super) fn gen_crushed() -> Vec<f32> {
        let duration = 0.35;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 170.0; // 220Hz → 50Hz
                phase += freq / SAMPLE_RATE as f32;
                let square = if (phase * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                let env = (1.0 - t).powf(0.7);
                square * env * 0.25
            })
            .collect()
    }

    /// Starved: sad three-note fall
    pub(super) fn gen_starved() -> Vec<f32> {
        let notes = [392.0_f32, 330.0, 262.0]; // G4→E4→C4
        let mut samples = Vec::new();
        for &freq in &notes {
            samples.extend(gen_blip(freq, 0.14, 0.3));
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_chop(&self, _score: u32) {}
    pub fn play_start(&self) {}
    pub fn play_crushed(&self) {}
    pub fn play_starved(&self) {}
}

/// Map session events to effects.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Started => sfx.play_start(),
            GameEvent::Chopped { score, .. } => sfx.play_chop(*score),
            GameEvent::GameOver { cause: DeathCause::Crushed, .. } => sfx.play_crushed(),
            GameEvent::GameOver { cause: DeathCause::Starved, .. } => sfx.play_starved(),
            GameEvent::Ready => {}
        }
    }
}

#[cfg(all(test, feature = "sound"))]
mod tests {
    use super::inner::*;

    #[test]
    fn wav_header_matches_sample_count() {
        let samples = gen_start();
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
    }

    #[test]
    fn effects_stay_in_range() {
        for samples in [gen_chop(), gen_start(), gen_crushed(), gen_starved()] {
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
        }
    }
}
