//! Interactive shell driving a [`Session`]
//!
//! Plain lines replace the input and submit it. Lines starting with `:`
//! are commands. Backend calls complete in the background while the
//! shell keeps reading input.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use kner_client::NerBackend;
use kner_session::{Mode, RequestId, Session, Tab};

use crate::render;

const HELP: &str = "\
<text>          analyse text
:submit         analyse the current input again
:history        load the history list
:input          back to the input tab
:select <id>    show a history record
:file <path>    load a .txt file and analyse it
:show           show the current result
:status         show session status
:clear          clear the input
:quit           leave";

enum Step {
    Line(std::io::Result<Option<String>>),
    Applied,
}

/// Outcome-relevant parts of the state, compared before and after an event
struct Snapshot {
    live: Option<RequestId>,
    history_loading: bool,
}

fn snapshot<B: NerBackend + 'static>(session: &Session<B>) -> Snapshot {
    let state = session.state();
    Snapshot {
        live: state.live.as_ref().map(|l| l.request),
        history_loading: state.history_loading(),
    }
}

pub async fn run<B: NerBackend + 'static>(backend: B, history_page_size: u32) -> anyhow::Result<()> {
    let mut session = Session::new(Arc::new(backend), history_page_size);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("KNER interactive session, :help for commands");

    loop {
        let before = snapshot(&session);

        let step = tokio::select! {
            line = lines.next_line() => Step::Line(line),
            _ = session.process_next(), if session.outstanding() > 0 => Step::Applied,
        };

        match step {
            Step::Line(line) => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(&mut session, line.trim()).await {
                    break;
                }
            }
            Step::Applied => report_changes(&session, &before),
        }

        for alert in session.take_alerts() {
            eprintln!("! {alert}");
        }
    }

    Ok(())
}

/// Returns `false` when the user asked to quit
async fn handle_line<B: NerBackend + 'static>(session: &mut Session<B>, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    let Some(command) = line.strip_prefix(':') else {
        session.edit_input(line);
        session.submit();
        return true;
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "q" | "quit" | "exit" => return false,
        "help" => println!("{HELP}"),
        "submit" => session.submit(),
        "history" => session.open_tab(Tab::History),
        "input" => session.open_tab(Tab::Input),
        "select" => {
            session.select_history(arg);
            let selected = session.state().selected_history.as_ref().map(|r| r.id.as_str());
            if session.state().mode == Mode::DisplayingHistorySelection && selected == Some(arg) {
                show(session);
            } else {
                println!("No history record {arg:?}, run :history first");
            }
        }
        "file" => {
            if let Err(e) = session.open_file(arg).await {
                eprintln!("! {e}");
            }
        }
        "show" => show(session),
        "status" => {
            let state = session.state();
            println!(
                "mode: {}  tab: {:?}  words: {}  history: {}{}",
                state.mode,
                state.active_tab,
                state.word_count,
                state.history.len(),
                if state.history_loading() { " (loading)" } else { "" }
            );
        }
        "clear" => session.clear_input(),
        other => println!("Unknown command :{other}, :help for commands"),
    }

    true
}

fn report_changes<B: NerBackend + 'static>(session: &Session<B>, before: &Snapshot) {
    let after = snapshot(session);
    let state = session.state();

    if after.live != before.live {
        show(session);
    }
    if before.history_loading && !after.history_loading && state.active_tab == Tab::History {
        render::print_history(&state.history);
    }
}

fn show<B: NerBackend + 'static>(session: &Session<B>) {
    match session.state().display() {
        Some(view) => render::print_view(&view),
        None => println!("Nothing to show"),
    }
}
