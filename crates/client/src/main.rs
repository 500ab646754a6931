mod feed;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use feed::{deliver, ScriptedFeed};
use rollsync::{
    ClientConfig, ClientMessage, Command, InputOutcome, LinkSimulation, NetworkStatus,
    ReconcileConfig, ReconcileReport, Session,
};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Headless reconciliation client against a scripted loopback feed")]
struct Args {
    #[arg(short, long, default_value_t = rollsync::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 50.0, help = "Server update interval in ms")]
    update_interval: f64,

    #[arg(long, default_value_t = 0, help = "One-way latency in ms")]
    latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(short, long, default_value_t = 10.0, help = "Seconds to run")]
    duration: f64,

    #[arg(long, help = "Drop the connection after this many seconds")]
    disconnect_after: Option<f64>,

    #[arg(long, default_value = rollsync::DEFAULT_PLAYER_ID)]
    player_id: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let link = LinkSimulation::new(args.latency, args.jitter, args.loss_percent);
    let config = ClientConfig {
        tick_rate: args.tick_rate,
        player_id: args.player_id.clone(),
        reconcile: ReconcileConfig::default().with_update_interval(args.update_interval),
        ..Default::default()
    };
    log::info!(
        "Client starting: {} Hz, updates every {} ms, link {:?}",
        config.tick_rate,
        args.update_interval,
        link
    );

    let start = Instant::now();
    let now_ms = move || start.elapsed().as_secs_f64() * 1000.0;

    let (to_client, mut inbox) = mpsc::channel::<String>(256);
    let (outbox, from_client) = mpsc::channel::<String>(256);
    let feed = ScriptedFeed {
        link: link.clone(),
        player_id: args.player_id.clone(),
        update_interval: Duration::from_secs_f64(args.update_interval.max(1.0) / 1000.0),
        clock_offset_ms: 5_000.0,
        start,
    };
    let feed_task = tokio::spawn(feed.run(to_client, from_client));

    let mut session = Session::new(config);
    session.monitor_mut().begin_connect();
    session.monitor_mut().on_open();

    let frame_period = Duration::from_secs_f64(1.0 / args.tick_rate.max(1) as f64);
    let mut frames = time::interval(frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pings = time::interval(Duration::from_secs(1));
    let mut inputs = time::interval(Duration::from_secs(2));
    inputs.reset();
    let mut reports = time::interval(Duration::from_secs(1));
    reports.reset();

    let deadline = time::sleep(Duration::from_secs_f64(args.duration.max(0.0)));
    tokio::pin!(deadline);
    let disconnect_at = args
        .disconnect_after
        .map(|secs| start + Duration::from_secs_f64(secs.max(0.0)));

    let mut last_frame = Instant::now();
    let mut window = ReconcileReport::default();
    let mut window_steps = 0u32;
    let mut window_frames = 0u32;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = frames.tick() => {
                let now = Instant::now();
                let delta = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                if let Some(at) = disconnect_at {
                    if now >= at && session.monitor().is_connected() {
                        session.monitor_mut().on_close();
                    }
                }

                let report = session.frame(delta, now_ms());
                window.merge(&report.reconcile);
                window_steps += report.steps;
                window_frames += 1;
            }
            Some(text) = inbox.recv() => {
                if !session.monitor().is_connected() {
                    continue;
                }
                if let Err(e) = session.handle_text(&text, now_ms()) {
                    log::warn!("Dropped server frame: {}", e);
                }
            }
            _ = pings.tick() => {
                if session.monitor().is_connected() {
                    let ping = session.ping(now_ms());
                    send(&link, &outbox, &ping);
                }
            }
            _ = inputs.tick() => {
                match session.input(Command::Jump, now_ms()) {
                    InputOutcome::Send(message) => send(&link, &outbox, &message),
                    outcome => log::debug!("Jump handled locally: {:?}", outcome),
                }
            }
            _ = reports.tick() => {
                log_window(&session, &window, window_frames, window_steps);
                window = ReconcileReport::default();
                window_steps = 0;
                window_frames = 0;
            }
        }
    }

    drop(outbox);
    feed_task.abort();
    session.teardown();
    log::info!("Client finished after {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn send(link: &LinkSimulation, outbox: &mpsc::Sender<String>, message: &ClientMessage) {
    match message.to_json() {
        Ok(text) => deliver(link, outbox, text),
        Err(e) => log::error!("Failed to encode client frame: {}", e),
    }
}

fn log_window(session: &Session, window: &ReconcileReport, frames: u32, steps: u32) {
    let player = session.config().player_id.as_str();
    let visual = session.visual_position(player);
    let body = session.body_position(player);
    let drift = match (visual, body) {
        (Some(v), Some(b)) => (v - b).length(),
        _ => 0.0,
    };

    log::info!(
        "gate={:?} frames={} steps={} ping={:.0}ms | fallback={} dead_zone={} blend={} teleport={} velocity_only={} failed={} | drift={:.3}",
        session.gate(),
        frames,
        steps,
        session.monitor().current_ping_ms(),
        window.local_fallback,
        window.dead_zone,
        window.blended,
        window.teleports,
        window.velocity_only,
        window.failed,
        drift
    );
    if let Some(params) = window.params {
        log::debug!(
            "blend={:.3} correction={:.2} teleport={:.2}",
            params.blend_factor,
            params.correction_strength,
            params.teleport_threshold
        );
    }
}
