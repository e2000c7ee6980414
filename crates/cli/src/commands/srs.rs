//! `neura review` / `neura interval` — SM-2 arithmetic without a store.

use std::path::Path;

use chrono::Utc;
use neura_core::FlashcardSchedule;
use neura_srs::{Sm2Scheduler, describe_interval};

use super::runtime;

pub async fn review(
    config_path: Option<&Path>,
    quality: i64,
    efactor: f64,
    repetitions: i64,
    interval: i64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let scheduler = Sm2Scheduler::new(config.scheduler.max_interval_days);

    let current = FlashcardSchedule {
        efactor,
        repetitions,
        interval_days: interval,
        next_review: Utc::now(),
    };
    let next = scheduler.review(quality, &current)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&next)?);
        return Ok(());
    }

    println!("   EFactor:      {:.2} → {:.2}", current.efactor, next.efactor);
    println!("   Repetitions:  {} → {}", current.repetitions, next.repetitions);
    println!(
        "   Interval:     {} → {} ({})",
        current.interval_days,
        next.interval_days,
        describe_interval(next.interval_days)?
    );
    println!("   Next review:  {}", next.next_review.to_rfc3339());
    Ok(())
}

pub async fn interval(days: i64) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", describe_interval(days)?);
    Ok(())
}
