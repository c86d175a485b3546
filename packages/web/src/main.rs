// Dioxus `rsx!` macro expands to unwraps internally; allow to avoid false positives.
#![allow(clippy::disallowed_methods)]

use dioxus::prelude::*;

use ui::dispatch::DispatchPage;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Shell)]
        #[route("/")]
        Home {},
        #[route("/:..segments")]
        NotFound { segments: Vec<String> },
}

fn main() {
    #[cfg(feature = "server")]
    {
        use tracing_subscriber::EnvFilter;

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Message Dispatch" }
        Router::<Route> {}
    }
}

/// Page chrome shared by every route.
#[component]
fn Shell() -> Element {
    rsx! {
        div { class: "app-shell",
            nav { class: "top-nav",
                Link { to: Route::Home {}, class: "nav-link", "Dispatch" }
            }
            main { class: "app-main",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Home() -> Element {
    rsx! {
        DispatchPage {}
    }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div { class: "not-found",
            h2 { "Page not found" }
            p { "/{path}" }
            Link { to: Route::Home {}, "Back to dispatch" }
        }
    }
}
