mod config;
mod logging;
mod state;

use std::{error::Error, time::Duration};

use config::DemoConfig;
use rowsync_core::{
    ApplyError, OrderKey, PipelineState, RowApplyError, RowList, ScreenPipeline, ScrollIntent,
    ScrollRequest, Themed, Transition,
};
use state::{RowContent, RowId, TranscriptState, describe_row};
use tracing::{debug, error, info, warn};

type TranscriptPipeline = ScreenPipeline<RowId, OrderKey, Themed<RowContent>>;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    info!("starting rowsync-demo");

    let config = DemoConfig::from_env()?;
    debug!(?config, "loaded demo config");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rowsync-demo")
        .build()?;

    let (pipeline, mut queue): (TranscriptPipeline, _) =
        ScreenPipeline::spawn(config.pipeline, runtime.handle());
    let status_rx = pipeline.subscribe_status();

    let producer = {
        let sender = pipeline.sender();
        let config = config.clone();
        runtime.spawn(async move {
            let mut transcript = TranscriptState::new("alice");
            transcript.push_message(0, "bob", "welcome to the room");
            let mut last_seq = match sender.submit(transcript.snapshot(ScrollRequest::None)) {
                Ok(seq) => seq,
                Err(err) => {
                    warn!(error = %err, "pipeline rejected initial snapshot");
                    return 0;
                }
            };

            let theme_switch_at = config.theme_switch.then_some(config.steps / 2);
            for step in 0..config.steps {
                tokio::time::sleep(Duration::from_millis(config.tick_ms)).await;
                let scroll = transcript.run_script_step(step, theme_switch_at);
                match sender.submit(transcript.snapshot(scroll)) {
                    Ok(seq) => last_seq = seq,
                    Err(err) => {
                        warn!(step, error = %err, "pipeline stopped accepting snapshots");
                        break;
                    }
                }
            }
            info!(
                messages = transcript.message_count(),
                appearance = transcript.appearance().0,
                last_seq,
                "producer finished"
            );
            last_seq
        })
    };

    // Waits until the final snapshot is on screen, then tears the pipeline down
    // so the UI loop below drains out.
    let supervisor = runtime.spawn(async move {
        let last_seq = producer.await.unwrap_or_else(|err| {
            error!(error = %err, "producer task failed");
            0
        });
        let mut status = pipeline.subscribe_status();
        let _ = status
            .wait_for(|s| {
                s.state == PipelineState::TornDown
                    || (s.last_seq >= last_seq && s.state == PipelineState::Idle)
            })
            .await;
        pipeline.shutdown().await;
    });

    let mut view: RowList<String> = RowList::new();
    while let Some(pending) = queue.blocking_recv() {
        let generation = pending.generation();
        let applied = pending.apply(|transition| {
            let scroll = transition.scroll;
            let animated = transition.animated;
            debug!(generation, summary = %transition, "applying transition");
            view.apply(render(transition))?;
            Ok::<_, RowApplyError>((scroll, animated))
        });

        match applied {
            Ok((scroll, animated)) => print_view(generation, &view, scroll, animated),
            Err(ApplyError::Cancelled) => {
                debug!(generation, "transition cancelled before it reached the view");
            }
            Err(ApplyError::View(err)) => {
                error!(generation, error = %err, "view rejected transition");
                break;
            }
        }
    }
    drop(queue);

    if let Err(err) = runtime.block_on(supervisor) {
        error!(error = %err, "supervisor task failed");
    }

    let status = *status_rx.borrow();
    println!("{}", serde_json::to_string_pretty(&status)?);
    info!(rows = view.len(), "rowsync-demo finished");
    Ok(())
}

fn render(transition: Transition<Themed<RowContent>>) -> Transition<String> {
    transition.map(|row| describe_row(&row))
}

fn print_view(generation: u64, view: &RowList<String>, scroll: ScrollIntent, animated: bool) {
    println!("── generation {generation} (animated: {animated}, scroll: {scroll:?}) ──");
    for (position, row) in view.rows().iter().enumerate() {
        let marker = match scroll {
            ScrollIntent::Reveal { position: target, .. } if target == position => ">",
            _ => " ",
        };
        println!("{marker} {position:>3} {row}");
    }
}
