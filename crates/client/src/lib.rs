//! Job lifecycle client for the Casablanca avatar-generation service.
//!
//! Submits image + audio or image + text jobs and drives them to
//! completion by batch polling, incremental chunk streaming, or a single
//! synchronous call, normalizing every outcome into a
//! [`PredictionResult`](result::PredictionResult) or a typed
//! [`PredictError`](casablanca_core::error::PredictError).

pub mod api;
mod batch;
pub mod client;
pub mod config;
mod oneshot;
mod poll;
pub mod result;
pub mod stream;
pub mod transport;

pub use api::{CasablancaApi, JobHandle, ModelDescriptor};
pub use client::{CasablancaClient, Strategy};
pub use config::ClientConfig;
pub use result::{Prediction, PredictionOutput, PredictionResult, RawDataLoader};
pub use stream::{ChunkStream, StreamEvent};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
