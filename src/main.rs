use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jamline::audio::AudioOutput;
use jamline::messaging::{CollabBus, LoopbackServer};
use jamline::render::LogRenderer;
use jamline::utils::helpers::now_ms;
use jamline::{FrameLoop, JamSession, SessionConfig, Viewport};

const SURFACE: (f64, f64) = (1280.0, 720.0);
const DEFAULT_RUN_SECS: i64 = 8;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("[MAIN] Starting jamline session");

    let run_secs = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<i64>().context("run time must be whole seconds")?,
        None => DEFAULT_RUN_SECS,
    };

    let config = SessionConfig::load_or_default();

    // The loopback server plays the collaboration layer and mirrors our cursor as a peer
    let (bus, endpoint) = CollabBus::channel();
    let server_stop = Arc::new(AtomicBool::new(false));
    let server = LoopbackServer::new(endpoint)
        .with_zoom_y(config.zoom_y)
        .with_waveform(config.waveform)
        .with_mirror("echo", "#888")
        .spawn(Arc::clone(&server_stop));

    let started = now_ms();
    let mut session = JamSession::new(config.clone(), started, AudioOutput::new(), LogRenderer::default(), bus);
    session.set_viewport(Some(Viewport::new(SURFACE.0, SURFACE.1)));

    let frame_loop = FrameLoop::new(config.frame_rate);
    let handle = frame_loop.handle();
    let (cx, cy) = (SURFACE.0 / 2.0, SURFACE.1 / 2.0);

    // Scripted gesture: a rising stroke drawn 300 px ahead of the playhead
    let mut pressed = false;
    let frames = frame_loop.run(&mut session, |s, now| {
        let t = now - started;
        if t >= run_secs * 1_000 {
            handle.stop();
        } else if t >= 200 && !pressed {
            s.pointer_down(now, (cx + 300.0, cy + 100.0));
            pressed = true;
        } else if (400..1_900).contains(&t) {
            let progress = (t - 400) as f64 / 1_500.0;
            s.pointer_move(now, (cx + 300.0 + progress * 40.0, cy + 100.0 - progress * 200.0));
        } else if t >= 1_900 {
            s.pointer_up();
        }
    });

    log::info!(
        "[MAIN] {} frames, {} notes fired, {} notes live",
        frames,
        session.scheduler().fired_total(),
        session.store().len()
    );

    session.teardown();
    server_stop.store(true, Ordering::Relaxed);
    server.join().map_err(|_| anyhow::anyhow!("[MAIN] loopback server panicked"))?;
    Ok(())
}
