fn main() {
    impedance_pivot::cli::run();
}
