//! HTTP adapters for the remote generation ports.

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiImageGenerator, OpenAiTextGenerator};
