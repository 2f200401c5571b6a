fn main() {
    if let Err(e) = particle_workshop::core::App::run() {
        eprintln!("Particle workshop failed: {}", e);
        std::process::exit(1);
    }
}
