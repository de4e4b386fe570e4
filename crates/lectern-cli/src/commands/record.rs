//! The live recording session: microphone → chunks → pipeline → Markdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use clap::Args;
use console::style;
use tokio::sync::mpsc;

use lectern_core::{
    Chunker, LectureSession, SessionCommand, SessionEvent, export_notes, run_session,
    start_capture,
};

use crate::app;

#[derive(Args, Default)]
pub struct RecordArgs {
    /// Audio input device (overrides configuration)
    #[arg(long)]
    device: Option<String>,

    /// Backend URL (overrides configuration)
    #[arg(long)]
    backend_url: Option<String>,

    /// Directory for the exported Markdown file (default: current dir)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

pub async fn run(args: RecordArgs) -> Result<()> {
    let config = app::load_record_config(args.backend_url, args.device)?;
    let tuning = config.settings.tuning.clone();
    let output_dir = args.output.unwrap_or_else(|| PathBuf::from("."));

    let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<Vec<f32>>();
    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    // Microphone problems are fatal before the session starts; nothing
    // network-related ever is.
    let capture = match start_capture(config.device.as_deref(), sample_tx) {
        Ok(capture) => capture,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("\nCheck your microphone, or pick another device:");
            eprintln!("  lectern devices");
            std::process::exit(1);
        }
    };

    // Reassemble capture batches into fixed-duration chunks.
    let chunker_task = tokio::spawn(async move {
        let mut chunker = Chunker::new(tuning.chunk_secs);
        while let Some(batch) = sample_rx.recv().await {
            for chunk in chunker.push(&batch) {
                if chunk_tx.send(chunk).is_err() {
                    return;
                }
            }
        }
        if let Some(tail) = chunker.finish() {
            let _ = chunk_tx.send(tail);
        }
    });

    let mut session = LectureSession::new(
        Arc::new(config.backend),
        config.settings.tuning.clone(),
        Some(event_tx),
    );

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(event);
        }
    });

    spawn_keyboard_thread(cmd_tx);

    app::print_heading("Recording.");
    app::print_dim("Type a title + Enter for a new section, q + Enter to stop.");
    println!();

    run_session(&mut session, chunk_rx, cmd_rx).await;

    capture.stop();
    chunker_task.abort();

    let stats = session.stats();
    let input = session.export_input(Local::now());
    let path = export_notes(&input, &output_dir)?;

    println!();
    app::print_ok(&format!("Notes exported to {}", path.display()));
    app::print_dim(&format!(
        "{} chunks · {} fragments · {} repaired · {} segments kept · {} skipped",
        stats.chunks,
        stats.fragments,
        stats.reconstructions_applied,
        stats.segments_accepted,
        stats.segments_discarded
    ));
    if session.reconstruction_disabled() {
        app::print_warn("AI cleanup was disabled mid-session after repeated failures.");
    }

    drop(session);
    let _ = printer.await;

    Ok(())
}

/// Read control lines from stdin: `q` stops, anything else opens a section.
fn spawn_keyboard_thread(cmd_tx: mpsc::UnboundedSender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        let mut section_count = 1usize;

        loop {
            line.clear();
            if stdin.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed.eq_ignore_ascii_case("q") {
                let _ = cmd_tx.send(SessionCommand::Stop);
                break;
            }

            section_count += 1;
            let title = if trimmed.is_empty() {
                format!("Section {section_count}")
            } else {
                trimmed.to_string()
            };
            if cmd_tx.send(SessionCommand::NewSection(title)).is_err() {
                break;
            }
        }
    });
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::TranscriptAppended { polished, .. } => {
            println!("  {polished}");
        }
        SessionEvent::SegmentAccepted { .. } => {
            // Already visible as transcript text
        }
        SessionEvent::SegmentDiscarded { text, .. } => {
            println!("{}", style(format!("  (off-topic) {text}")).dim());
        }
        SessionEvent::SectionStarted { title } => {
            println!("{}", style(format!("── {title} ──")).cyan().bold());
        }
        SessionEvent::StudyContentAdded {
            notes,
            flashcards,
            keywords,
        } => {
            println!(
                "{}",
                style(format!(
                    "  + {notes} notes · {flashcards} flashcards · {keywords} terms"
                ))
                .green()
            );
        }
        SessionEvent::ReconstructionDisabled => {
            app::print_warn("AI cleanup disabled after repeated failures; keeping raw text.");
        }
        SessionEvent::Degraded { message } => {
            println!("{}", style(format!("  {message}")).dim());
        }
    }
}
