//! Host statistics card.

use dioxus::prelude::*;
use dispatch_core::SystemStats;

use super::sleep_ms;

const REFRESH_INTERVAL_MS: u32 = 5000;

fn gib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

fn rows(s: &SystemStats) -> Vec<(&'static str, String)> {
    vec![
        ("CPU", format!("{:.1}%", s.cpu_percent)),
        (
            "Memory",
            format!(
                "{:.1} / {:.1} GiB ({:.1}%)",
                gib(s.memory.used),
                gib(s.memory.total),
                s.memory.percent
            ),
        ),
        (
            "Disk",
            format!(
                "{:.1} / {:.1} GiB ({:.1}%)",
                gib(s.disk.used),
                gib(s.disk.total),
                s.disk.percent
            ),
        ),
        ("Uptime", s.uptime.to_string()),
        ("Server time", s.current_time.clone()),
    ]
}

#[component]
pub fn SystemStatsCard() -> Element {
    let mut stats = use_signal(|| None::<SystemStats>);

    let _refresh = use_coroutine(move |_rx: UnboundedReceiver<()>| async move {
        loop {
            match api::get_stats().await {
                Ok(s) => stats.set(Some(s)),
                Err(e) => tracing::warn!("Failed to load stats: {}", e),
            }
            sleep_ms(REFRESH_INTERVAL_MS).await;
        }
    });

    rsx! {
        div { class: "stats-card",
            h3 { "Server" }
            if let Some(s) = stats() {
                dl {
                    for (label, value) in rows(&s) {
                        dt { key: "{label}", "{label}" }
                        dd { "{value}" }
                    }
                }
            } else {
                p { class: "loading", "Loading..." }
            }
        }
    }
}
