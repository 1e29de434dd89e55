//! Strand - device setup, control threads and the keyboard loop

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use strand_dsp::{
    dsp::{noise::NoiseSource, Waveform},
    Controller, EngineConfig, SynthEngine, MAX_BLOCK_SIZE,
};

pub struct Strand {
    config: EngineConfig,
    strum_interval: Duration,
}

impl Strand {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            strum_interval: Duration::from_millis(200),
        }
    }

    /// Time between strings while strumming.
    pub fn strum_interval_ms(mut self, ms: u64) -> Self {
        self.strum_interval = Duration::from_millis(ms);
        self
    }

    /// Open the default device and play until `q` is entered.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (mut engine, controller) =
            SynthEngine::new(self.config.clone()).wrap_err("invalid engine config")?;
        engine
            .prepare(sample_rate, MAX_BLOCK_SIZE)
            .wrap_err("failed to prepare engine")?;

        println!("=== Strand ===");
        println!("Model: {:?}", self.config.model);
        println!("Voices: {}", controller.voice_count());
        println!("Sample rate: {} Hz", sample_rate);
        println!("Channels: {}", channels);
        println!();
        println!("  1-9  pluck a string");
        println!("  s    start/stop strumming");
        println!("  w    next waveform");
        println!("  q    quit");
        println!();

        // The engine moves into the callback; nothing else touches it.
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                // Errors already zero the buffer
                let _ = engine.render_interleaved(data, channels);
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let controller = Arc::new(Mutex::new(controller));
        let running = Arc::new(AtomicBool::new(true));
        let strumming = Arc::new(AtomicBool::new(true));

        let strummer = spawn_strummer(
            Arc::clone(&controller),
            Arc::clone(&running),
            Arc::clone(&strumming),
            self.strum_interval,
            self.config.seed,
        );

        let result = keyboard_loop(&controller, &strumming, self.config.waveform);

        running.store(false, Ordering::Release);
        if strummer.join().is_err() {
            log::warn!("strum thread panicked");
        }
        drop(stream);

        result
    }
}

/// Pluck each string in turn, forever, at random positions.
fn spawn_strummer(
    controller: Arc<Mutex<Controller>>,
    running: Arc<AtomicBool>,
    strumming: Arc<AtomicBool>,
    interval: Duration,
    seed: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = NoiseSource::new(seed ^ 0x5742_554D);
        let mut voice = 0;

        while running.load(Ordering::Acquire) {
            if strumming.load(Ordering::Acquire) {
                let Ok(ctl) = controller.lock() else {
                    break;
                };
                let position = rng.next_unipolar();
                if ctl.pluck(voice, position).is_ok() {
                    voice = (voice + 1) % ctl.voice_count();
                }
            }
            thread::sleep(interval);
        }
    })
}

fn keyboard_loop(
    controller: &Mutex<Controller>,
    strumming: &AtomicBool,
    mut waveform: Waveform,
) -> EyreResult<()> {
    let mut rng = NoiseSource::new(0xC0FFEE);
    let stdin = std::io::stdin();

    for line in stdin.lock().lines() {
        let line = line.wrap_err("failed to read stdin")?;
        let mut ctl = controller
            .lock()
            .map_err(|_| eyre!("controller lock poisoned"))?;

        match line.trim() {
            "q" => break,
            "s" => {
                let now = !strumming.load(Ordering::Acquire);
                strumming.store(now, Ordering::Release);
                println!("strumming {}", if now { "on" } else { "off" });
            }
            "w" => {
                waveform = waveform.next();
                match ctl.select_waveform(waveform) {
                    Ok(()) => println!("waveform: {}", waveform.name()),
                    Err(e) => println!("{e}"),
                }
            }
            key => match key.parse::<usize>() {
                Ok(n @ 1..=9) => {
                    if let Err(e) = ctl.pluck(n - 1, rng.next_unipolar()) {
                        println!("{e}");
                    }
                }
                _ => println!("unknown command: {key:?}"),
            },
        }
    }
    Ok(())
}
