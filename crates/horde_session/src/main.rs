//! Headless match runner
//!
//! Loads the session config (`HORDE_CONFIG`, or a built-in courtyard
//! scenario when the config places no spawners), then plays a scripted
//! defender for a fixed number of ticks and logs snapshots.
//!
//! Run with: cargo run -p horde_session --bin horde

mod demo;

use horde_session::prelude::*;

/// Two minutes at the default tick rate
const MATCH_TICKS: u64 = 3600;
const SUMMARY_EVERY: u64 = 300;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match SessionConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load session config: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = if config.spawners.is_empty() {
        log::info!("No spawners configured, running the courtyard scenario");
        let (config, quests, weapons) = demo::courtyard(config);
        GameSession::new(config, &quests, weapons)
    } else {
        match GameSession::from_config(config) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Failed to load static data: {}", e);
                std::process::exit(1);
            }
        }
    };

    let mut defender = demo::Defender::new(PlayerId(1));
    for _ in 0..MATCH_TICKS {
        defender.act(&mut session);
        session.tick();

        for event in session.drain_events() {
            log::debug!("{:?}", event);
        }
        if session.tick_count() % SUMMARY_EVERY == 0 {
            log::info!("{}", SessionSnapshot::project(&session).summary());
        }
    }

    let snapshot = SessionSnapshot::project(&session);
    log::info!("Match over: {}", snapshot.summary());
    match snapshot.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialise snapshot: {}", e),
    }
}
