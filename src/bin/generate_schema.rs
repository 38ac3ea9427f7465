//! Create a schema JSON from the master metadata workbook.
//! Usage: generate_schema <xlsx> <beamline> [outputjson]
//! Writes <outputjson>.json (or <beamline>.json) and echoes it to stdout.

use std::env;
use std::process;

use chess_meta::cli;

fn main() {
    let mut args = vec!["generate_schema".to_string(), "schema".to_string()];
    args.extend(env::args().skip(1));
    process::exit(cli::run_with_args(&args));
}
