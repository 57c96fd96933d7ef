fn main() {
    if let Err(err) = chartcard::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
