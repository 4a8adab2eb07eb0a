pub mod app;
pub mod config;
pub mod error;
pub mod models {
    pub mod document;
    pub mod slug;
}
pub mod content {
    pub mod client;
    pub mod demo;
    pub mod query;
    pub mod sanity;
}
pub mod preview {
    pub mod secret;
    pub mod session;
}
pub mod rendering {
    pub mod page;
    pub mod portable_text;
}
pub mod components {
    pub mod body;
    pub mod layout;
    pub mod post;
    pub mod project;
    pub mod status;
}
pub mod pages {
    pub mod cache;
    pub mod routes;
}
pub mod api {
    pub mod errors;
    pub mod health;
    pub mod preview;
}

pub use app::{router, AppState};
pub use config::Settings;
