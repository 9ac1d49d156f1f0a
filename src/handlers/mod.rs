// handlers/mod.rs - Handler tiers
//
// public    - no authentication (/, /health)
// functions - admin bearer token, file-touching operations (/functions/v1/*)
// console   - session-guarded admin pages served as JSON

pub mod console;
pub mod functions;
pub mod public;
