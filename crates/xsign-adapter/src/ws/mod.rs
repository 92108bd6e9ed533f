/*
[INPUT]:  Signed upgrade requests and stream kind selection
[OUTPUT]: Decoded stream messages and session lifecycle
[POS]:    WebSocket layer - authenticated real-time streams
[UPDATE]: When adding message kinds or changing connection logic
*/

pub mod message;
pub mod session;

pub use message::{ActionUpdate, LiquidityUpdate, StreamMessage, decode};
pub use session::{CloseReason, SessionConfig, SessionState, StreamSession};
