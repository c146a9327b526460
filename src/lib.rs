pub mod auth;
pub mod banner;
pub mod cases;
pub mod chat;
pub mod config;
pub mod consts;
pub mod events;
pub mod llm;
pub mod prompts;
pub mod render;
pub mod research;
pub mod risk;
pub mod server;
pub mod spinner;
