use std::ffi::OsString;

fn main() {
    let mut args: Vec<OsString> = std::env::args_os().collect();
    if args.is_empty() {
        args.push(OsString::from("usage-query"));
    }
    args.insert(1, OsString::from("query"));
    if let Err(err) = usage_report::cli::run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
