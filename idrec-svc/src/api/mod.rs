//! HTTP API handlers for idrec-svc

pub mod buildinfo;
pub mod health;
pub mod identify;
pub mod root;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use identify::identify_contact;
pub use root::serve_index;
