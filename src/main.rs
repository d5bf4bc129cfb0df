mod artwork;
mod cli;
mod config;
mod dispatcher;
mod media_probe;
mod now_playing;
mod page;
mod page_source;
mod protocol;
mod relay;
mod sink;
mod time_codec;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use artwork::ArtworkResolver;
use cli::{CliCommand, CliOptions};
use config::Config;
use dispatcher::Dispatcher;
use log::{error, info};
use media_probe::MediaProbeChain;
use now_playing::NowPlayingAssembler;
use page_source::{CaptureFileSource, MockPageSource, PageSource};
use protocol::Message;
use relay::RelayManager;
use tokio::sync::broadcast;
use transport::{UreqWebhookTransport, WebhookTransport};

pub(crate) fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_string()
}

fn load_config(options: &CliOptions) -> Result<Config, config::ConfigError> {
    let path = match &options.config_path {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    config::load_or_create(&path)
}

fn capture_path(capture: Option<PathBuf>, config: &Config) -> Option<PathBuf> {
    capture.or_else(|| {
        let configured = config.page.capture_path.trim();
        (!configured.is_empty()).then(|| PathBuf::from(configured))
    })
}

fn run_bridge(page_source: Box<dyn PageSource>, config: &Config) -> std::io::Result<()> {
    // Bus for communication between the dispatcher and the relay
    let (bus_sender, _) = broadcast::channel::<Message>(256);

    let http_transport = UreqWebhookTransport::new(&config.sink.webhook_url, &config.dispatch);
    info!(
        "Delivering now-playing updates to {}",
        http_transport.webhook_url()
    );
    let transport: Arc<dyn WebhookTransport> = Arc::new(http_transport);

    // Setup relay
    let relay_bus_receiver = bus_sender.subscribe();
    let relay_transport = Arc::clone(&transport);
    thread::Builder::new()
        .name("relay".to_string())
        .spawn(move || {
            let run_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut relay = RelayManager::new(relay_bus_receiver, relay_transport);
                relay.run();
            }));
            if let Err(payload) = run_result {
                error!(
                    "RelayManager thread terminated due to panic: {}",
                    panic_payload_to_string(payload.as_ref())
                );
            }
        })?;

    let assembler = NowPlayingAssembler::new(
        MediaProbeChain::standard(),
        ArtworkResolver::new(&config.artwork),
    );
    let mut dispatcher = Dispatcher::new(
        page_source,
        assembler,
        transport,
        bus_sender,
        &config.dispatch,
    );
    dispatcher.run();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli::build_cli().get_matches();
    let options = cli::parse_matches(&matches).ok_or("unrecognized command")?;

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if options.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config = load_config(&options)?;

    match options.command {
        CliCommand::Run { capture } => {
            let path = capture_path(capture, &config)
                .ok_or("no capture file given; pass --capture or set [page] capture_path")?;
            let source = CaptureFileSource::new(path);
            info!("Reading page captures from {}", source.path().display());
            run_bridge(Box::new(source), &config)?;
        }
        CliCommand::Mock { seed } => {
            info!("Dispatching from the mock player");
            run_bridge(Box::new(MockPageSource::new(seed)), &config)?;
        }
        CliCommand::Sink { listen } => {
            let listen_addr = listen.unwrap_or_else(|| config.sink.listen_addr.clone());
            sink::run_sink(&listen_addr)?;
        }
    }
    Ok(())
}
