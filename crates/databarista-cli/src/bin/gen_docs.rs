//! Binary that emits command-line options markdown to stdout.
//!
//! Run with `cargo run -p databarista-cli --bin gen_docs > docs/command-line-options.md`.

fn main() {
    print!("{}", databarista_cli::render_options_markdown());
}
