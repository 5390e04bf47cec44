use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, Stream};
use std::sync::{Arc, RwLock};

use crate::core::oscillator::Waveform;
use crate::core::playback::AudioEngine;
use crate::core::synth::Synth;

/// Default cpal output device rendering the shared [`Synth`].
///
/// Nothing is opened until [`AudioEngine::start`], which the session only
/// calls in response to a user gesture.
pub struct AudioOutput {
    synth: Arc<RwLock<Synth>>,
    stream: Option<Stream>,
    pending_volume_db: f32,
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput {
    pub fn new() -> Self {
        Self {
            synth: Arc::new(RwLock::new(Synth::new(44_100.0))),
            stream: None,
            pending_volume_db: 0.0,
        }
    }
}

impl AudioEngine for AudioOutput {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        log::info!("Using audio host: {}", host.id().name());

        let device = host.default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No output device available"))?;
        log::info!("Using output device: {:?}", device.name());

        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        let config = cpal::StreamConfig::from(config);
        let sample_rate = config.sample_rate.0 as f32;
        log::info!("Using sample rate: {}", sample_rate);

        // Fresh engine at the device rate; the audio clock starts at zero here.
        {
            let mut synth = Synth::new(sample_rate);
            synth.set_volume(self.pending_volume_db);
            let mut guard = self.synth.write()
                .map_err(|_| anyhow::anyhow!("synth lock poisoned"))?;
            *guard = synth;
        }

        let stream = match sample_format {
            SampleFormat::F32 => create_stream::<f32>(&device, &config, Arc::clone(&self.synth)),
            SampleFormat::I16 => create_stream::<i16>(&device, &config, Arc::clone(&self.synth)),
            SampleFormat::U16 => create_stream::<u16>(&device, &config, Arc::clone(&self.synth)),
            _ => anyhow::bail!("Unsupported sample format"),
        }?;

        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn now(&self) -> f64 {
        self.synth.read().map(|s| s.now()).unwrap_or(0.0)
    }

    fn trigger(&mut self, waveform: Waveform, frequency: f64, start_at: f64, duration: f64) {
        if let Ok(mut synth) = self.synth.write() {
            synth.trigger(waveform, frequency as f32, start_at, duration as f32);
        }
    }

    fn set_volume(&mut self, db: f32) {
        self.pending_volume_db = db;
        if let Ok(mut synth) = self.synth.write() {
            synth.set_volume(db);
        }
    }
}

fn create_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    synth: Arc<RwLock<Synth>>,
) -> Result<Stream>
where
    T: Sample + Send + 'static + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let err_fn = |err| log::error!("an error occurred on the audio stream: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            // Hold the lock once per buffer, not per frame
            let mut guard = synth.write().ok();
            for frame in data.chunks_mut(channels) {
                let value = match guard.as_mut() {
                    Some(synth) => synth.next_sample(),
                    None => 0.0,
                };
                let value_t = T::from_sample(value);
                for sample in frame.iter_mut() {
                    *sample = value_t;
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
