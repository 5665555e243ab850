//! Yes/no prompt used before deleting worklog entries.

use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::Confirm;
use jira_api::WorklogEntry;

fn removal_prompt(entry: &WorklogEntry) -> String {
    format!("Remove {entry}")
}

/// Asks `Remove <entry> (y/N): ` on `output` and reads one answer line from
/// `input`. Anything but `y`/`Y`, including a read failure, means no.
pub fn confirm_removal<R: BufRead, W: Write>(
    entry: &WorklogEntry,
    input: &mut R,
    output: &mut W,
) -> bool {
    if write!(output, "{} (y/N): ", removal_prompt(entry))
        .and_then(|()| output.flush())
        .is_err()
    {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(err) => {
            log::warn!("Failed to read confirmation: {}", err);
            false
        }
    }
}

/// Confirmation bound to the process terminal. Piped stdin falls back to
/// [`confirm_removal`].
pub fn stdin_confirmation(entry: &WorklogEntry) -> bool {
    if !io::stdin().is_terminal() {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        return confirm_removal(entry, &mut input, &mut io::stdout());
    }
    Confirm::new()
        .with_prompt(removal_prompt(entry))
        .default(false)
        .interact()
        .unwrap_or(false)
}
