/// Sound engine: procedural 8-bit style cues via rodio.
///
/// Every cue is generated as an in-memory WAV buffer at init time and
/// played fire-and-forget through a detached Sink.
///
/// Build without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_dig: Arc<Vec<u8>>,
        sfx_squirt: Arc<Vec<u8>>,
        sfx_sonar: Arc<Vec<u8>>,
        sfx_pickup: Arc<Vec<u8>>,
        sfx_oil: Arc<Vec<u8>>,
        sfx_fall: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_annoyed: Arc<Vec<u8>>,
        sfx_gave_up: Arc<Vec<u8>>,
        sfx_yell: Arc<Vec<u8>>,
        sfx_bribe: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let wav = |s: Vec<f32>| Arc::new(make_wav(&s));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_dig: wav(gen_dig()),
                sfx_squirt: wav(gen_squirt()),
                sfx_sonar: wav(gen_sonar()),
                sfx_pickup: wav(gen_arpeggio(&[1047.0, 1319.0, 1568.0], 0.045)),
                sfx_oil: wav(gen_arpeggio(&[784.0, 1047.0, 1319.0, 1568.0], 0.07)),
                sfx_fall: wav(gen_fall()),
                sfx_die: wav(gen_descending(&[440.0, 370.0, 311.0, 261.0], 0.12)),
                sfx_annoyed: wav(gen_grunt(180.0, 0.09)),
                sfx_gave_up: wav(gen_descending(&[330.0, 247.0, 196.0], 0.1)),
                sfx_yell: wav(gen_grunt(240.0, 0.2)),
                sfx_bribe: wav(gen_arpeggio(&[659.0, 523.0, 659.0], 0.05)),
                sfx_clear: wav(gen_arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.1)),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_dig(&self) { self.play(&self.sfx_dig); }
        pub fn play_squirt(&self) { self.play(&self.sfx_squirt); }
        pub fn play_sonar(&self) { self.play(&self.sfx_sonar); }
        pub fn play_pickup(&self) { self.play(&self.sfx_pickup); }
        pub fn play_oil(&self) { self.play(&self.sfx_oil); }
        pub fn play_fall(&self) { self.play(&self.sfx_fall); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_annoyed(&self) { self.play(&self.sfx_annoyed); }
        pub fn play_gave_up(&self) { self.play(&self.sfx_gave_up); }
        pub fn play_yell(&self) { self.play(&self.sfx_yell); }
        pub fn play_bribe(&self) { self.play(&self.sfx_bribe); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// LCG white noise in -1..1.
    fn noise(state: &mut u32) -> f32 {
        *state = state.wrapping_mul(1103515245).wrapping_add(12345);
        (*state as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Quick rising notes, sine plus a third harmonic.
    fn gen_arpeggio(notes: &[f32], note_dur: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Falling tones with a tail fade.
    fn gen_descending(notes: &[f32], note_dur: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                samples.push((t * freq * 2.0 * PI).sin() * env * 0.3);
            }
        }
        let total = samples.len();
        let fade_len = total / 4;
        for i in (total - fade_len)..total {
            samples[i] *= (total - i) as f32 / fade_len.max(1) as f32;
        }
        samples
    }

    /// Dig: short noise burst with descending pitch
    fn gen_dig() -> Vec<f32> {
        let n = samples_for(0.06);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 200.0 + (1.0 - t) * 300.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * PI).sin();
                let env = (1.0 - t).powf(0.8);
                (tone * 0.4 + noise(&mut rng) * 0.6) * env * 0.15
            })
            .collect()
    }

    /// Squirt: filtered hiss.
    fn gen_squirt() -> Vec<f32> {
        let n = samples_for(0.18);
        let mut rng: u32 = 777;
        let mut last = 0.0f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                last = last * 0.6 + noise(&mut rng) * 0.4;
                last * (1.0 - t) * 0.35
            })
            .collect()
    }

    /// Sonar: a ping with a slow decay.
    fn gen_sonar() -> Vec<f32> {
        let n = samples_for(0.5);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (-(i as f32) / n as f32 * 5.0).exp();
                (t * 1400.0 * 2.0 * PI).sin() * env * 0.3
            })
            .collect()
    }

    /// Boulder loosening: descending whistle.
    fn gen_fall() -> Vec<f32> {
        let n = samples_for(0.25);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 600.0 - t * 400.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (ti * freq * 2.0 * PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Protester voice: low square wave with a little wobble.
    fn gen_grunt(freq: f32, duration: f32) -> Vec<f32> {
        let n = samples_for(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let wobble = 1.0 + (t * 12.0 * 2.0 * PI).sin() * 0.05;
                let square = if (t * freq * wobble * 2.0 * PI).sin() >= 0.0 { 1.0 } else { -1.0 };
                let env = 1.0 - i as f32 / n as f32;
                square * env * 0.15
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

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
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_dig(&self) {}
    pub fn play_squirt(&self) {}
    pub fn play_sonar(&self) {}
    pub fn play_pickup(&self) {}
    pub fn play_oil(&self) {}
    pub fn play_fall(&self) {}
    pub fn play_die(&self) {}
    pub fn play_annoyed(&self) {}
    pub fn play_gave_up(&self) {}
    pub fn play_yell(&self) {}
    pub fn play_bribe(&self) {}
    pub fn play_clear(&self) {}
}
