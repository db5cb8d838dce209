// Infrastructure layer - External dependencies and adapters
pub mod broadcast_surface;
pub mod chunked_json;
pub mod config;
pub mod event_stream;
pub mod firebase_feed;
pub mod http_response;
pub mod snapshot_tree;
