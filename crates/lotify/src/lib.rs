//! lotify: LINE Notify client
//!
//! LINE Notify の OAuth2 認可コードフローと通知 API (status / notify / revoke) のクライアントです。
//!
//! ```no_run
//! use lotify::{ClientConfig, NotifyClient, NotifyMessage};
//!
//! # async fn run() -> lotify::Result<()> {
//! let config = ClientConfig::new("client-id", "client-secret", "https://example.com/callback");
//! let client = NotifyClient::new(config)?;
//!
//! let link = client.auth_link("csrf-state");
//! println!("open {}", link);
//!
//! let token = client.get_token("code-from-redirect").await?;
//! client.send(&token, &NotifyMessage::new("hello")).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::NotifyClient;
pub use config::ClientConfig;
pub use error::{NotifyError, Result};
pub use types::{ApiResponse, NotifyMessage, StatusResponse, TargetType, TokenResponse};
