//! Core data models: signals, positions, response envelopes.

mod envelope;
mod position;
mod signal;

pub use envelope::{
    ClosedPosition, EnvelopeStatus, FailedPosition, FillDetails, OrderDetails, ResponseEnvelope,
};
pub use position::Position;
pub use signal::{Side, TradeAction, TradeSignal};
