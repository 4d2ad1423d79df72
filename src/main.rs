use std::env;

#[tokio::main]
async fn main() {
    wealth_optimizer::logging::init_logging("info");

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = wealth_optimizer::api::run_http_server(port).await {
            tracing::error!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match wealth_optimizer::api::run_cli(raw_args) {
        Ok(report) => println!("{report}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
