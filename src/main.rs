fn main() {
    if let Err(err) = meta_conform::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
