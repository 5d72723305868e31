use smtpmock::{Configuration, Server};
use std::env;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SMTPMOCK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let host = if args.len() > 1 {
        args[1].as_str()
    } else {
        "127.0.0.1"
    };

    let port = match args.get(2).map(|port| port.parse::<u16>()) {
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            eprintln!("Invalid port {:?}: {e}", args[2]);
            std::process::exit(2);
        }
        None => 2525,
    };

    let configuration = Configuration::builder()
        .host_address(host)
        .port_number(port)
        .log_to_stdout(true)
        .log_server_activity(true)
        .build();
    let mut server = Server::new(configuration);

    if let Err(e) = server.start() {
        eprintln!("Failed to start server: {e}");
        std::process::exit(1);
    }

    println!("Starting smtpmock SMTP server...");
    println!("Address: {host}:{}", server.port_number());
    println!("Close stdin (Ctrl-D) to stop");

    // Any input is discarded; the server runs until EOF.
    let mut sink = Vec::new();
    let _ = io::stdin().read_to_end(&mut sink);

    if let Err(e) = server.stop() {
        eprintln!("Failed to stop server: {e}");
    }

    for (index, message) in server.messages().iter().enumerate() {
        println!("Message #{}", index + 1);
        println!("{message}");
    }
}
