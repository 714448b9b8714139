fn main() {
    if let Err(err) = proctor_lib::run() {
        eprintln!("proctor: {err:#}");
        std::process::exit(1);
    }
}
