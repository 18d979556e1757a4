// ABOUTME: Command-line sender that binds, submits one message and unbinds
// ABOUTME: Prints the session event log as it changes

use argh::FromArgs;
use smpp_sender::client::{
    ConnectionConfig, EngineConfig, KeepAliveConfig, OutboundMessage, PartResult, SessionEngine,
};
use smpp_sender::datatypes::BindType;
use std::error::Error;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Send an SMS through an SMSC and show the session log
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: String,

    /// the password
    #[argh(option)]
    password: String,

    /// the hostname or IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// bind as transceiver instead of transmitter
    #[argh(switch)]
    transceiver: bool,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the sender address
    #[argh(option, short = 'f')]
    from: String,

    /// the message body
    #[argh(option, short = 'm')]
    message: String,

    /// request a delivery receipt and wait this many seconds for it (default: 0)
    #[argh(option)]
    wait: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let wait = Duration::from_secs(cli_args.wait.unwrap_or(0));
    let bind_type = if cli_args.transceiver || !wait.is_zero() {
        BindType::Transceiver
    } else {
        BindType::Transmitter
    };

    let engine = SessionEngine::new(
        EngineConfig::default()
            .with_keep_alive(KeepAliveConfig::new(Duration::from_secs(30)))
            .with_request_timeout(Duration::from_secs(30)),
    );

    let mut log = engine.subscribe_log();
    tokio::spawn(async move {
        while log.changed().await.is_ok() {
            let newest = log.borrow_and_update().first().cloned();
            if let Some(entry) = newest {
                println!("[{}] {} {:?}", entry.category, entry.message, entry.payload);
            }
        }
    });

    let stats = engine.message_stats(&cli_args.message);
    info!(
        "Message is {} units of {}, {} part(s)",
        stats.length,
        stats.encoding.name(),
        stats.parts
    );

    info!("Connecting to {host}:{port}");
    let config = ConnectionConfig::new(host, port, cli_args.system_id, cli_args.password)
        .with_bind_type(bind_type);
    engine.bind(config).await.map_err(|e| {
        error!("Bind failed: {e}");
        e
    })?;

    let mut builder = OutboundMessage::builder()
        .from(cli_args.from)
        .to(cli_args.to)
        .text(cli_args.message);
    if !wait.is_zero() {
        builder = builder.with_delivery_receipt();
    }

    for outcome in engine.submit(&builder.build()?).await? {
        match outcome.result {
            PartResult::Accepted { message_id } => info!(
                "Part {} of {} accepted as {message_id}",
                outcome.part_index, outcome.part_count
            ),
            other => error!(
                "Part {} of {} failed: {other:?}",
                outcome.part_index, outcome.part_count
            ),
        }
    }

    if !wait.is_zero() {
        info!("Waiting {}s for delivery receipts", wait.as_secs());
        tokio::time::sleep(wait).await;
    }

    if engine.is_bound() {
        engine.unbind().await?;
    }
    info!("Done");

    Ok(())
}
