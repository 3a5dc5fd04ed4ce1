//! Cross-messenger abstractions used for operator-facing status text.

pub mod port;
