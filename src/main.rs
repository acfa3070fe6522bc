//! Merge a CJK font and a Latin monospace font into one programming font
//! family.

use fontmerge::core;

fn main() {
    let cli_args = core::platform::get_cli_args();
    if let Err(error) = core::run_app(cli_args) {
        core::platform::handle_error(error);
    }
}
