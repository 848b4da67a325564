//! `taxi-cli chat` — interactive REPL over [`BookingOrchestrator`].
//!
//! Stands in for the realtime speech layer during manual/local testing: a
//! caller line is parsed into a single slash command, turned into a
//! `ToolSync`, and stepped through the orchestrator. Whenever the returned
//! action requires a backend call (geocode/dispatch/amend), this loop
//! performs it itself and feeds the `BackendResult` straight back in —
//! the orchestrator never performs I/O itself, so something outside it
//! always has to.

use taxi_domain::contracts::{Amender, Dispatcher, Geocoder, HumanTransferSink};
use taxi_domain::{BackendKind, BackendResult, Event, NextAction, ToolSync};

use taxi_core::BookingOrchestrator;

pub struct Backends {
    pub geocoder: Box<dyn Geocoder>,
    pub dispatcher: Box<dyn Dispatcher>,
    pub amender: Box<dyn Amender>,
    pub transfer_sink: Box<dyn HumanTransferSink>,
}

/// Drive one call's worth of REPL turns against one orchestrator.
///
/// A production outer shell would hold many `BookingOrchestrator`s keyed
/// by call id behind a lock. This CLI intentionally owns exactly one, for
/// exactly the lifetime of the process: multi-call coordination is a
/// declared Non-goal of the core, so the shell that would need it isn't
/// built here either.
pub async fn chat(mut orch: BookingOrchestrator, backends: Backends) -> anyhow::Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".taxi-cli")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let _ = rl.load_history(&history_path);

    eprintln!("taxi-cli — local booking REPL. Type /help for commands, Ctrl+D to exit.");
    eprintln!();

    let greeting = orch.start();
    print_action(&greeting);

    let mut turn_counter: u64 = 0;
    let mut ended = false;

    loop {
        if ended {
            break;
        }
        let readline = rl.readline("caller> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed == "/exit" || trimmed == "/quit" {
                    break;
                }
                if trimmed == "/help" {
                    print_help();
                    continue;
                }
                if trimmed == "/state" {
                    println!("{:#?}", orch.snapshot());
                    continue;
                }

                let tool = match parse_tool_sync(trimmed, &mut turn_counter) {
                    Ok(tool) => tool,
                    Err(message) => {
                        eprintln!("\x1B[31m{message}\x1B[0m");
                        continue;
                    }
                };

                let action = orch.step(Event::ToolSync(tool));
                ended = drive_to_rest(&mut orch, &backends, action).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

/// Run the action, and whenever it requires a backend call, perform it
/// and feed the resulting `BackendResult` back into the orchestrator —
/// repeating until a caller-facing action (`Ask`/`Hangup`/`TransferToHuman`/
/// `None`) is reached. Returns `true` once the call has ended.
async fn drive_to_rest(
    orch: &mut BookingOrchestrator,
    backends: &Backends,
    mut action: NextAction,
) -> bool {
    loop {
        match action {
            NextAction::GeocodePickup { raw } => {
                let result = backends.geocoder.geocode(&raw).await;
                let backend_result = to_backend_result(BackendKind::GeocodePickup, result);
                action = orch.step(Event::BackendResult(backend_result));
            }
            NextAction::GeocodeDropoff { raw } => {
                let result = backends.geocoder.geocode(&raw).await;
                let backend_result = to_backend_result(BackendKind::GeocodeDropoff, result);
                action = orch.step(Event::BackendResult(backend_result));
            }
            NextAction::Dispatch { slots } => {
                let result = backends.dispatcher.dispatch(&slots).await;
                let backend_result = match result {
                    Ok(r) => BackendResult {
                        kind: BackendKind::Dispatch,
                        ok: r.ok,
                        normalized_address: None,
                        booking_id: r.booking_id,
                        error: r.error,
                    },
                    Err(e) => BackendResult {
                        kind: BackendKind::Dispatch,
                        ok: false,
                        normalized_address: None,
                        booking_id: None,
                        error: Some(e.to_string()),
                    },
                };
                action = orch.step(Event::BackendResult(backend_result));
            }
            NextAction::Amend { booking_id, slots } => {
                let result = backends.amender.amend(&booking_id, &slots).await;
                let backend_result = match result {
                    Ok(r) => BackendResult {
                        kind: BackendKind::Amend,
                        ok: r.ok,
                        normalized_address: None,
                        booking_id: None,
                        error: r.error,
                    },
                    Err(e) => BackendResult {
                        kind: BackendKind::Amend,
                        ok: false,
                        normalized_address: None,
                        booking_id: None,
                        error: Some(e.to_string()),
                    },
                };
                action = orch.step(Event::BackendResult(backend_result));
            }
            NextAction::TransferToHuman { reason } => {
                backends.transfer_sink.transfer(&reason).await;
                print_action(&NextAction::TransferToHuman { reason });
                return false;
            }
            NextAction::Hangup { text } => {
                backends.transfer_sink.hangup(&text).await;
                print_action(&NextAction::Hangup { text });
                return true;
            }
            other => {
                print_action(&other);
                return false;
            }
        }
    }
}

fn to_backend_result(
    kind: BackendKind,
    result: taxi_domain::error::Result<taxi_domain::contracts::GeocodeResponse>,
) -> BackendResult {
    match result {
        Ok(r) => BackendResult {
            kind,
            ok: r.ok,
            normalized_address: r.normalized_address,
            booking_id: None,
            error: None,
        },
        Err(e) => BackendResult {
            kind,
            ok: false,
            normalized_address: None,
            booking_id: None,
            error: Some(e.to_string()),
        },
    }
}

fn print_action(action: &NextAction) {
    match action {
        NextAction::Ask { text } => println!("agent> {text}"),
        NextAction::TransferToHuman { reason } => {
            println!("agent> [transferring to a human operator: {reason}]")
        }
        NextAction::Hangup { text } => println!("agent> {text}\n[call ended]"),
        NextAction::None { reason } => eprintln!("\x1B[2m(no action: {reason})\x1B[0m"),
        other => eprintln!("\x1B[2m(unexpected caller-facing action: {other:?})\x1B[0m"),
    }
}

fn print_help() {
    eprintln!("Commands (each line is treated as one ToolSync turn):");
    eprintln!("  /pickup <address>         Set the pickup address");
    eprintln!("  /dropoff <address>        Set the destination address");
    eprintln!("  /passengers <n>           Set passenger count (1-8)");
    eprintln!("  /time <phrase>            Set pickup time (e.g. \"ASAP\", \"18:30\")");
    eprintln!("  /instructions <text>      Set special instructions");
    eprintln!("  /distance <meters>        Set the fare distance hint for this turn");
    eprintln!("  /confirm                  Confirm the booking / amendment");
    eprintln!("  /decline                  Decline");
    eprintln!("  /cancel                   Cancel the call");
    eprintln!("  /amend                    Signal intent to amend a booked ride");
    eprintln!("  /state                    Print the current BookingState snapshot");
    eprintln!("  /exit, /quit              Exit the REPL");
}

/// Parse one slash command into a `ToolSync`, stamping an auto-incrementing
/// turn id (the REPL plays the role of the outer shell that tags each
/// inbound tool call, so duplicate deliveries can be detected and dropped).
fn parse_tool_sync(line: &str, turn_counter: &mut u64) -> Result<ToolSync, String> {
    let (cmd, arg) = match line.split_once(' ') {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    *turn_counter += 1;
    let mut tool = ToolSync {
        turn_id: Some(format!("t{turn_counter}")),
        ..Default::default()
    };

    match cmd {
        "/pickup" => {
            if arg.is_empty() {
                return Err("usage: /pickup <address>".into());
            }
            tool.pickup = Some(arg.to_string());
        }
        "/dropoff" => {
            if arg.is_empty() {
                return Err("usage: /dropoff <address>".into());
            }
            tool.destination = Some(arg.to_string());
        }
        "/passengers" => {
            let n: u8 = arg
                .parse()
                .map_err(|_| "usage: /passengers <1-8>".to_string())?;
            tool.passengers = Some(n);
        }
        "/time" => {
            if arg.is_empty() {
                return Err("usage: /time <phrase>".into());
            }
            tool.pickup_time = Some(arg.to_string());
        }
        "/instructions" => {
            if arg.is_empty() {
                return Err("usage: /instructions <text>".into());
            }
            tool.special_instructions = Some(arg.to_string());
        }
        "/distance" => {
            let meters: f64 = arg
                .parse()
                .map_err(|_| "usage: /distance <meters>".to_string())?;
            tool.distance_hint_meters = Some(meters);
        }
        "/confirm" => tool.intent = Some("confirm".into()),
        "/decline" => tool.intent = Some("no".into()),
        "/cancel" => tool.intent = Some("cancel".into()),
        "/amend" => tool.intent = Some("amend".into()),
        other => return Err(format!("unknown command: {other} (type /help for a list)")),
    }

    Ok(tool)
}
