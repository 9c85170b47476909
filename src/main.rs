//! timecard main entrypoint.

use timecard::run;

fn main() {
    if let Err(e) = run() {
        timecard::ui::messages::error(e.to_string());
        std::process::exit(1);
    }
}
