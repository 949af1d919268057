//! functest CLI entry point

fn main() {
    functest::cli::run();
}
