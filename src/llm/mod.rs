pub mod models;
pub mod openai;
pub mod provider;
