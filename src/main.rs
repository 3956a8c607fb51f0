use dayledger::cli::run;
use dayledger::error::LedgerError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        match e.downcast_ref::<LedgerError>() {
            Some(err) if !err.is_internal() => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
            _ => {
                // Full chain goes to the log only
                log::error!("{:#}", e);
                eprintln!("Internal error: {}", e);
                std::process::exit(2);
            }
        }
    }
}
