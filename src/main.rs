fn main() {
    if let Err(err) = gradeledger::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
