use colored::Colorize;

fn main() {
    if let Err(e) = sbatch_submit::run() {
        // nothing may reach stdout here; the workflow engine reads it as a job id.
        eprintln!("{}: {e:?}", "ERROR".red());
        std::process::exit(1);
    }
}
