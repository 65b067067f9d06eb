// ABOUTME: OAuth1/OAuth2 token lifecycle: persistence (C1), in-memory state (C2), and the SSO login flow (C4)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod login;
mod token_manager;
mod token_store;

pub use login::{ClientState, LoginFlow, LoginOutcome};
pub use token_manager::{OAuth1Exchanger, TokenManager};
pub use token_store::TokenStore;
