//! The message boundary for background solving.
//!
//! Solving is computationally heavy and must never block the thread driving
//! a user-facing surface, so the engine runs on its own thread and talks to
//! the caller over a channel: exactly one [`SolveRequest`] in, exactly one
//! [`SolveResponse`] out. All three message types serialize to JSON, so the
//! same shapes work over any wire. A panic anywhere inside the solve
//! surfaces as a `worker_crash` response instead of a dead channel.

use crate::dispatch::Attempt;
use crate::stages::{Engine, EngineConfig};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Algorithm-selection mode of a solve request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveMode {
    /// Try the strategies one at a time in canonical order.
    HybridSequential,
    /// Race all strategies concurrently; first success wins.
    HybridAll,
}

impl Default for SolveMode {
    fn default() -> Self {
        SolveMode::HybridSequential
    }
}

/// One board to solve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveRequest {
    /// Row-major tile values, `0` for the empty cell.
    pub tiles: Vec<u8>,
    /// Board side length (3 to 5).
    pub size: usize,
    #[serde(default)]
    pub mode: SolveMode,
}

/// The single terminal answer to a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveResponse {
    /// Tile values to move in order, or `None` on total failure.
    pub moves: Option<Vec<u8>>,
    /// Which algorithm or stage path produced (or failed to produce) the
    /// result, e.g. `already_solved`, `hybrid-multi`, `4x4_stage2_ida`.
    pub method: String,
    /// Per-attempt diagnostics when the hybrid dispatcher ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<Attempt>>,
    /// Present only on `worker_crash`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolveResponse {
    pub fn success(moves: Vec<u8>, method: &str) -> Self {
        SolveResponse {
            moves: Some(moves),
            method: method.to_string(),
            trace: None,
            error: None,
        }
    }

    pub fn failure(method: &str) -> Self {
        SolveResponse {
            moves: None,
            method: method.to_string(),
            trace: None,
            error: None,
        }
    }

    pub fn with_trace(mut self, trace: Vec<Attempt>) -> Self {
        self.trace = Some(trace);
        self
    }

    fn crash(message: String) -> Self {
        SolveResponse {
            moves: None,
            method: "worker_crash".to_string(),
            trace: None,
            error: Some(message),
        }
    }
}

/// Handle to a background solve: a receiver for the single response plus the
/// thread handle.
pub struct SolveHandle {
    receiver: Receiver<SolveResponse>,
    handle: JoinHandle<()>,
}

impl SolveHandle {
    /// Blocks until the response arrives and the worker thread stops.
    pub fn wait(self) -> SolveResponse {
        let response = self
            .receiver
            .recv()
            .unwrap_or_else(|_| SolveResponse::crash("worker channel closed".to_string()));
        let _ = self.handle.join();
        response
    }

    /// Non-blocking poll; `None` while the solve is still running.
    pub fn poll(&self) -> Option<SolveResponse> {
        self.receiver.try_recv().ok()
    }
}

/// Spawns one solve on a dedicated thread. The thread builds its own engine
/// from `config`, so no state is shared with the caller; panics inside the
/// solve are caught and reported as `worker_crash`.
pub fn spawn_solve(config: EngineConfig, request: SolveRequest) -> SolveHandle {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            Engine::new(config).solve(&request)
        }));
        let response = match outcome {
            Ok(response) => response,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("solve panicked: {}", message);
                SolveResponse::crash(message)
            }
        };
        let _ = tx.send(response);
    });
    SolveHandle {
        receiver: rx,
        handle,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_solve_delivers_one_response() {
        let request = SolveRequest {
            tiles: vec![1, 2, 3, 4, 5, 6, 7, 8, 0],
            size: 3,
            mode: SolveMode::HybridSequential,
        };
        let handle = spawn_solve(EngineConfig::standard(), request);
        let response = handle.wait();
        assert_eq!(response.method, "already_solved");
        assert_eq!(response.moves, Some(Vec::new()));
    }

    #[test]
    fn test_invalid_request_over_the_boundary() {
        let request = SolveRequest {
            tiles: vec![1, 1, 2, 3, 4, 5, 6, 7, 8],
            size: 3,
            mode: SolveMode::HybridSequential,
        };
        let handle = spawn_solve(EngineConfig::standard(), request);
        let response = handle.wait();
        assert_eq!(response.method, "invalid_input");
        assert_eq!(response.moves, None);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_request_round_trips_through_json() {
        let json = r#"{"tiles":[1,2,3,4,5,6,7,0,8],"size":3,"mode":"hybrid-all"}"#;
        let request: SolveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mode, SolveMode::HybridAll);
        assert_eq!(request.tiles.len(), 9);
        let back = serde_json::to_string(&request).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_response_omits_empty_trace_and_error() {
        let response = SolveResponse::success(vec![8], "hybrid-multi");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"moves":[8],"method":"hybrid-multi"}"#);
    }

    #[test]
    fn test_mode_defaults_to_sequential() {
        let json = r#"{"tiles":[1,2,3,4,5,6,7,0,8],"size":3}"#;
        let request: SolveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mode, SolveMode::HybridSequential);
    }
}
