//! Follows one game session and prints what happens in it.
//!
//! ```text
//! LOREKEEP_HOST=localhost:8000 cargo run -p observer -- session-001
//! ```

use lorekeep::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let session = std::env::args().nth(1).unwrap_or_else(|| "session-001".into());
    let mut client = GameClient::new(ClientConfig::from_env());
    let mut states = client.subscribe();
    let mut effects = client.effects();

    client.connect_to(session.as_str()).await?;
    if client.status() == ConnectionStatus::Disconnected {
        return Err(format!("could not reach {}", client.config().host).into());
    }

    let mut printed = 0;
    let mut last_toast = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                for line in &state.narrative[printed..] {
                    println!("{line}");
                }
                printed = state.narrative.len();

                if let Some(toast) = state.toasts.last() {
                    if last_toast != Some(toast.id) {
                        eprintln!("[{}] {}", toast.level.label(), toast.message);
                        last_toast = Some(toast.id);
                    }
                }
                if state.screen_shake {
                    client.clear_screen_shake();
                }
                if state.session.status == ConnectionStatus::Disconnected {
                    eprintln!("disconnected");
                    break;
                }
            }

            effect = effects.recv() => {
                if let Ok(effect) = effect {
                    eprintln!("{:+} hp ({})", effect.signed_amount(), effect.kind());
                }
            }
        }
    }

    client.disconnect().await;
    Ok(())
}
