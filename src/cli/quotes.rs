use super::ui;
use crate::scheduler::{FirstTick, QuoteScheduler, SchedulerPhase};
use anyhow::{Context, Result, anyhow};
use indicatif::ProgressBar;
use tracing::debug;

/// Prints the current quotes once: served from the cache when it is still valid,
/// otherwise fetched. With `force` the cache is dropped first.
pub async fn show(scheduler: &QuoteScheduler, force: bool) -> Result<()> {
    let mut quotes_rx = scheduler.subscribe_quotes();
    let mut phase_rx = scheduler.subscribe_phase();

    let first_tick = if force {
        scheduler.force_refresh()
    } else {
        scheduler.start()
    };

    if first_tick == FirstTick::Immediate {
        let spinner = ui::new_spinner("Fetching quotes...");
        let fetched = tokio::select! {
            changed = quotes_rx.changed() => changed.context("Quote scheduler went away"),
            errored = phase_rx.wait_for(|phase| *phase == SchedulerPhase::Errored) => match errored {
                Ok(_) => Err(anyhow!(scheduler.error().unwrap_or_default())),
                Err(e) => Err(e).context("Quote scheduler went away"),
            }
        };
        spinner.finish_and_clear();
        if let Err(e) = fetched {
            scheduler.stop();
            return Err(e).context("Failed to fetch quotes");
        }
    } else {
        debug!(?first_tick, "Serving quotes from cache");
    }
    scheduler.stop();

    println!("{}", ui::style_text("Currency quotes", ui::StyleType::Title));
    println!("{}", ui::quotes_table(&scheduler.quotes()));
    if let FirstTick::Deferred(remaining) = first_tick {
        println!(
            "{}",
            ui::style_text(
                &format!("Cached, refreshes in {}s", remaining.as_secs()),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

/// Keeps polling and reprints the quotes whenever they change, until Ctrl-C or a
/// failed fetch.
pub async fn watch(scheduler: &QuoteScheduler) -> Result<()> {
    let mut quotes_rx = scheduler.subscribe_quotes();
    let mut loading_rx = scheduler.subscribe_loading();
    let mut phase_rx = scheduler.subscribe_phase();

    scheduler.start();
    print_quotes(scheduler);

    let mut spinner: Option<ProgressBar> = None;
    let result = loop {
        tokio::select! {
            changed = quotes_rx.changed() => {
                if let Err(e) = changed {
                    break Err(e).context("Quote scheduler went away");
                }
                if let Some(spinner) = spinner.take() {
                    spinner.finish_and_clear();
                }
                print_quotes(scheduler);
            }
            changed = loading_rx.changed() => {
                if let Err(e) = changed {
                    break Err(e).context("Quote scheduler went away");
                }
                let loading = *loading_rx.borrow_and_update();
                if loading && spinner.is_none() {
                    spinner = Some(ui::new_spinner("Refreshing quotes..."));
                } else if !loading {
                    if let Some(spinner) = spinner.take() {
                        spinner.finish_and_clear();
                    }
                }
            }
            changed = phase_rx.changed() => {
                if let Err(e) = changed {
                    break Err(e).context("Quote scheduler went away");
                }
                if *phase_rx.borrow_and_update() == SchedulerPhase::Errored {
                    let message = scheduler.error().unwrap_or_default();
                    eprintln!("{}", ui::style_text(&message, ui::StyleType::Error));
                    break Err(anyhow!(message)).context("Polling stopped after a failed fetch");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                break signal.context("Failed to listen for Ctrl-C");
            }
        }
    };

    if let Some(spinner) = spinner.take() {
        spinner.finish_and_clear();
    }
    scheduler.stop();
    result
}

fn print_quotes(scheduler: &QuoteScheduler) {
    println!("{}", ui::quotes_table(&scheduler.quotes()));
}
