//! socketio-emitter command line.
//!
//! `emit` publishes a single event; `monitor` subscribes to every channel
//! under the key prefix and logs each decoded envelope. Settings come
//! from the environment (see [`socketio_emitter::config`]) and can be
//! overridden with flags.

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

use socketio_emitter::config::EmitterConfig;
use socketio_emitter::domain::Payload;
use socketio_emitter::emitter::Emitter;
use socketio_emitter::protocol::{ProtocolEncoder, ProtocolVersion};
use socketio_emitter::transport::RedisTransport;

#[derive(Debug, Parser)]
#[command(name = "socketio-emitter")]
#[command(about = "Publish Socket.IO events through the Redis adapter", long_about = None)]
struct Cli {
    /// Redis host (overrides EMITTER_REDIS_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Redis port (overrides EMITTER_REDIS_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Channel key prefix (overrides EMITTER_KEY)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Protocol version: legacy or current (overrides EMITTER_PROTOCOL_VERSION)
    #[arg(long, global = true)]
    protocol: Option<ProtocolVersion>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Emit one event
    Emit {
        /// Event name
        event: String,

        /// Payload as JSON; anything that is not valid JSON is sent as a string
        payload: Option<String>,

        /// Target namespace
        #[arg(long, default_value = "/")]
        nsp: String,

        /// Target room (repeatable)
        #[arg(long = "room")]
        rooms: Vec<String>,

        /// Flag to set to true, e.g. volatile (repeatable)
        #[arg(long = "flag")]
        flags: Vec<String>,

        /// Send the payload bytes as raw binary
        #[arg(long)]
        binary: bool,
    },

    /// Log every envelope published under the key prefix
    Monitor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = EmitterConfig::from_env()?;
    if let Some(host) = cli.host {
        config.bus.host = Some(host);
    }
    if let Some(port) = cli.port {
        config.bus.port = Some(port);
    }
    if let Some(key) = cli.key {
        config = config.with_key_prefix(key);
    }
    if let Some(version) = cli.protocol {
        config = config.with_protocol_version(version);
    }
    tracing::info!(
        prefix = %config.key_prefix,
        version = %config.protocol_version,
        uid = %config.uid,
        "socketio-emitter starting"
    );

    match cli.command {
        Command::Emit {
            event,
            payload,
            nsp,
            rooms,
            flags,
            binary,
        } => {
            let payload = match payload {
                Some(raw) if binary => Payload::binary(raw.into_bytes()),
                Some(raw) => parse_payload(&raw),
                None => Payload::nil(),
            };

            let emitter = Emitter::connect(&config)?;
            let mut request = emitter.of(nsp).rooms(rooms);
            for flag in flags {
                request = request.flag(flag, true);
            }
            let outcome = request.emit_async(&event, &payload).await?;
            tracing::info!(
                event,
                packet_type = %outcome.packet_type,
                channels = ?outcome.channels,
                receivers = outcome.receivers,
                "event published"
            );
        }
        Command::Monitor => monitor(&config).await?,
    }

    Ok(())
}

/// JSON if it parses, otherwise the raw string.
fn parse_payload(raw: &str) -> Payload {
    serde_json::from_str::<serde_json::Value>(raw).map_or_else(|_| Payload::from(raw), Payload::from)
}

async fn monitor(config: &EmitterConfig) -> anyhow::Result<()> {
    let transport = RedisTransport::connect(&config.bus)?;
    let encoder = ProtocolEncoder::new(config);
    let mut messages = transport.monitor(&encoder.subscription_pattern()).await?;

    loop {
        tokio::select! {
            message = messages.next() => {
                let Some(message) = message else {
                    tracing::warn!("subscription closed");
                    break;
                };
                match encoder.decode(&message.payload) {
                    Ok(envelope) => tracing::info!(
                        channel = %message.channel,
                        uid = ?envelope.uid,
                        event = envelope.packet.event_name(),
                        nsp = envelope.packet.namespace(),
                        packet_type = %envelope.packet.packet_type(),
                        rooms = ?envelope.rooms,
                        payload = %envelope.packet.payload().as_value(),
                        "envelope"
                    ),
                    Err(e) => tracing::warn!(
                        channel = %message.channel,
                        error = %e,
                        "undecodable message"
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
