//! sdi-cli
//!
//! Command-line interface for querying and monitoring instruments.

use std::io;

use clap::{Parser, Subcommand};
use sdi_client::catalog::{
    Action, Catalog, DeviceFamily, DumpSection, Instrument, MnemonicForm, PulseSettings,
};
use sdi_client::config::{DEFAULT_BAUD_RATE, DEFAULT_TCP_PORT, DEFAULT_UDP_PORT};
use sdi_client::listen::{FrameSource, UdpFrameSource};
use sdi_client::{
    CancelToken, CommandClient, Config, ListenSession, Notification, Query, Result, SdiError,
};
use tracing_subscriber::{fmt, EnvFilter};

/// sdi-cli
#[derive(Parser, Debug)]
#[command(name = "sdi-cli")]
#[command(about = "Query and monitor SCPI-like bench instruments")]
#[command(version)]
struct Args {
    /// Serial port (e.g. /dev/ttyACM0)
    #[arg(long, conflicts_with = "host")]
    serial: Option<String>,

    /// Instrument host name or IP address
    #[arg(long)]
    host: Option<String>,

    /// Instrument TCP port
    #[arg(short, long, default_value_t = DEFAULT_TCP_PORT)]
    port: u16,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Read timeout in milliseconds (0 blocks)
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Device family: pulsegen, slowdio or detectron
    #[arg(short, long, default_value = "pulsegen")]
    device: DeviceFamily,

    /// Send short-form mnemonics
    #[arg(long)]
    short: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a raw command and print the reply
    Query {
        /// Command text, e.g. "*IDN?"
        command: String,
    },

    /// Read one setting
    Get {
        /// Setting group, e.g. pulse
        group: String,

        /// Setting name in either form, e.g. DELAY or DEL
        setting: String,

        /// Channel number for channelized groups
        #[arg(short, long)]
        channel: Option<u8>,
    },

    /// Assign one setting
    Set {
        group: String,
        setting: String,
        value: String,

        #[arg(short, long)]
        channel: Option<u8>,
    },

    /// Run an action: trig, save, recall, reset, reboot
    Action {
        action: Action,
    },

    /// Dump one group, or everything
    Dump {
        group: Option<String>,

        #[arg(short, long)]
        channel: Option<u8>,
    },

    /// Program a pulse channel (pulsegen)
    SetPulse {
        channel: u8,

        /// Delay in seconds
        #[arg(long, default_value = "0.04")]
        delay: f64,

        /// Width in seconds
        #[arg(long, default_value = "0.005")]
        width: f64,

        /// Period in seconds
        #[arg(long, default_value = "0.02")]
        period: f64,

        #[arg(long, default_value = "3")]
        cycles: u32,

        #[arg(long)]
        invert: bool,
    },

    /// Print state-change notifications from the serial line until Ctrl+C
    Listen {
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Print state-change notifications received over UDP until Ctrl+C
    ListenUdp {
        /// Interface address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// UDP port to bind
        #[arg(long, default_value_t = DEFAULT_UDP_PORT)]
        udp_port: u16,

        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Logs go to stderr; stdout carries replies and notifications
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sdi_client=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let form = if args.short {
        MnemonicForm::Short
    } else {
        MnemonicForm::Long
    };
    let catalog = Catalog::new(args.device, form);

    // UDP listening needs no command channel
    if let Commands::ListenUdp { bind, udp_port, json } = &args.command {
        let config = Config::builder().udp_bind(bind.as_str(), *udp_port).build();
        config.validate()?;
        let mut session = ListenSession::new(UdpFrameSource::from_config(&config));
        return listen(&mut session, *json);
    }

    let config = build_config(&args)?;
    tracing::info!("sdi-cli v{} connecting to {}", sdi_client::VERSION, config.endpoint.target());
    let mut client = CommandClient::connect(&config)?;

    match args.command {
        Commands::Listen { json } => {
            let mut session = client.listen(config.listen);
            listen(&mut session, json)?;
        }
        command => {
            let mut instrument = Instrument::new(&mut client, catalog);
            execute(&mut instrument, command)?;
        }
    }

    client.close()
}

fn build_config(args: &Args) -> Result<Config> {
    let builder = match (&args.serial, &args.host) {
        (Some(port), _) => Config::builder().serial(port.as_str()).baud_rate(args.baud),
        (None, Some(host)) => Config::builder().tcp(host.as_str(), args.port),
        (None, None) => {
            return Err(SdiError::Config(
                "one of --serial or --host is required".to_string(),
            ))
        }
    };

    let config = builder.timeout_ms(args.timeout_ms).build();
    config.validate()?;
    Ok(config)
}

fn execute<Q: Query>(instrument: &mut Instrument<Q>, command: Commands) -> Result<()> {
    match command {
        Commands::Query { command } => println!("{}", instrument.query(&command)?),
        Commands::Get { group, setting, channel } => {
            println!("{}", instrument.get(&group, &setting, channel)?)
        }
        Commands::Set { group, setting, value, channel } => {
            println!("{}", instrument.set(&group, &setting, channel, value)?)
        }
        Commands::Action { action } => println!("{}", instrument.action(action)?),
        Commands::Dump { group: Some(group), channel } => {
            print!("{}", instrument.dump(&group, channel)?)
        }
        Commands::Dump { group: None, .. } => {
            for section in instrument.dump_all()? {
                print!("{}", section);
            }
        }
        Commands::SetPulse { channel, delay, width, period, cycles, invert } => {
            let settings = PulseSettings { delay, width, period, cycles, invert };
            let section = DumpSection {
                title: format!("pulse {}", channel),
                lines: instrument.set_pulse(channel, &settings)?,
            };
            print!("{}", section);
        }
        Commands::Listen { .. } | Commands::ListenUdp { .. } => {
            return Err(SdiError::InvalidState(
                "listen commands are not instrument commands".to_string(),
            ))
        }
    }
    Ok(())
}

fn listen<S: FrameSource>(session: &mut ListenSession<S>, json: bool) -> Result<()> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, stopping listener...");
        handler_token.cancel();
    })
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let summary = session.run(&cancel, |notification| print_notification(&notification, json))?;
    tracing::info!("Listener stopped: {} frames, {} edges", summary.frames, summary.edges);
    Ok(())
}

fn print_notification(notification: &Notification, json: bool) -> Result<()> {
    if json {
        let line = serde_json::to_string(notification).map_err(io::Error::from)?;
        println!("{}", line);
    } else {
        println!("{}", notification);
    }
    Ok(())
}
